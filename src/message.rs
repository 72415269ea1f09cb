//! Message identity, chunking, and buffer admission codes.

/// Maximum bytes transferred per chunk, modelling a Bluetooth-LE-like link
/// layer's path MTU.
pub const PATH_MTU: u64 = 247;

pub type MessageId = u64;

/// Immutable message identity plus a mutable, append-only hop path.
///
/// A message is **replicated**, not moved, on every successful forward: the
/// header is shared by value and the new owner clones the hop path before
/// appending itself, so the sender's copy is never mutated in place.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub from: u32,
    pub to: u32,
    pub size_bytes: u64,
    pub created_at: f64,
    pub response_size_bytes: u64,
    pub hop_path: Vec<u32>,
    /// Spray-and-Wait copy budget. Unused (always `None`) under epidemic
    /// routing.
    pub copy_budget: Option<u32>,
}

impl Message {
    pub fn new(id: MessageId, from: u32, to: u32, size_bytes: u64, created_at: f64) -> Self {
        Self {
            id,
            from,
            to,
            size_bytes,
            created_at,
            response_size_bytes: 0,
            hop_path: vec![from],
            copy_budget: None,
        }
    }

    /// Replicate this message as forwarded onward to `next_hop`, appending
    /// to a cloned hop path. The original (`self`) is untouched.
    pub fn replicate_forwarded_to(&self, next_hop: u32) -> Self {
        let mut hop_path = self.hop_path.clone();
        hop_path.push(next_hop);
        Self { hop_path, ..self.clone() }
    }

    pub fn is_delivered(&self) -> bool {
        self.hop_path.last() == Some(&self.to)
    }

    /// Chunk count and residual tail size for a `PATH_MTU`-limited transfer.
    /// `(full_chunks, tail_bytes)`; `tail_bytes == 0` means the size divides
    /// evenly and there is no residual chunk.
    pub fn chunk_plan(&self) -> (u64, u64) {
        chunk_plan(self.size_bytes)
    }
}

pub fn chunk_plan(size_bytes: u64) -> (u64, u64) {
    let full_chunks = size_bytes / PATH_MTU;
    let tail = size_bytes % PATH_MTU;
    (full_chunks, tail)
}

/// Admission outcome returned by `Host::receive_message` / the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionCode {
    RcvOk,
    DeniedOld,
    DeniedNoSpace,
    DeniedUnreachable,
    TryLater,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_plan_exact_multiple_has_no_tail() {
        assert_eq!(chunk_plan(PATH_MTU * 3), (3, 0));
    }

    #[test]
    fn chunk_plan_with_residual_tail() {
        assert_eq!(chunk_plan(PATH_MTU * 3 + 1), (3, 1));
    }

    #[test]
    fn replicate_forwarded_does_not_mutate_original() {
        let m = Message::new(1, 10, 20, 100, 0.0);
        let forwarded = m.replicate_forwarded_to(15);
        assert_eq!(m.hop_path, vec![10]);
        assert_eq!(forwarded.hop_path, vec![10, 15]);
    }

    #[test]
    fn delivered_iff_last_hop_is_destination() {
        let mut m = Message::new(1, 10, 20, 100, 0.0);
        assert!(!m.is_delivered());
        m = m.replicate_forwarded_to(20);
        assert!(m.is_delivered());
    }
}
