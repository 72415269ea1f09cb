//! Host: a passive aggregate of address, location, interface, router and
//! message buffer.

use std::collections::HashSet;

use crate::geometry::Coordinate;
use crate::interface::Interface;
use crate::message::{AdmissionCode, Message, MessageId};
use crate::router::Router;

/// Bounded per-host message store with FIFO eviction.
#[derive(Debug, Clone)]
pub struct Buffer {
    capacity_bytes: u64,
    messages: Vec<Message>,
}

impl Buffer {
    pub fn new(capacity_bytes: u64) -> Self {
        Self { capacity_bytes, messages: Vec::new() }
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn total_bytes(&self) -> u64 {
        self.messages.iter().map(|m| m.size_bytes).sum()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Admit `m`, evicting the oldest-stored messages (FIFO) to make room.
    /// Refused outright if `m` alone would exceed capacity, or if already
    /// held.
    pub fn admit(&mut self, m: Message) -> AdmissionCode {
        if m.size_bytes > self.capacity_bytes {
            return AdmissionCode::DeniedNoSpace;
        }
        if self.contains(m.id) {
            return AdmissionCode::DeniedOld;
        }
        while !self.messages.is_empty() && self.total_bytes() + m.size_bytes > self.capacity_bytes {
            self.messages.remove(0);
        }
        self.messages.push(m);
        AdmissionCode::RcvOk
    }

    pub fn evict(&mut self, id: MessageId) {
        self.messages.retain(|m| m.id != id);
    }
}

pub type HostId = u32;

#[derive(Debug, Clone)]
pub struct Host {
    pub address: HostId,
    pub location: Coordinate,
    pub cluster_id: Option<usize>,
    pub interface: Interface,
    pub router: Router,
    pub buffer: Buffer,
    /// Message ids this host has received as final destination, tracked
    /// separately from buffer contents since epidemic routing retains
    /// delivered messages in the buffer by default.
    pub delivered: HashSet<MessageId>,
}

impl Host {
    pub fn new(address: HostId, location: Coordinate, cluster_id: Option<usize>, interface: Interface, router: Router, buffer_capacity_bytes: u64) -> Self {
        Self {
            address,
            location,
            cluster_id,
            interface,
            router,
            buffer: Buffer::new(buffer_capacity_bytes),
            delivered: HashSet::new(),
        }
    }

    /// Admit an incoming message into the buffer, marking delivery if this
    /// host is its final destination.
    pub fn receive_message(&mut self, m: Message) -> AdmissionCode {
        let is_destination = m.to == self.address && m.is_delivered();
        let code = self.buffer.admit(m.clone());
        if code == AdmissionCode::RcvOk && is_destination {
            self.delivered.insert(m.id);
            if !self.router.retain_after_delivery() {
                self.buffer.evict(m.id);
            }
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_refuses_oversized_message() {
        let mut buf = Buffer::new(100);
        let code = buf.admit(Message::new(1, 0, 1, 200, 0.0));
        assert_eq!(code, AdmissionCode::DeniedNoSpace);
    }

    #[test]
    fn buffer_evicts_oldest_to_make_room() {
        let mut buf = Buffer::new(150);
        assert_eq!(buf.admit(Message::new(1, 0, 1, 100, 0.0)), AdmissionCode::RcvOk);
        assert_eq!(buf.admit(Message::new(2, 0, 1, 100, 1.0)), AdmissionCode::RcvOk);
        assert!(!buf.contains(1));
        assert!(buf.contains(2));
        assert!(buf.total_bytes() <= 150);
    }

    #[test]
    fn buffer_rejects_duplicate_ids() {
        let mut buf = Buffer::new(1000);
        buf.admit(Message::new(1, 0, 1, 10, 0.0));
        assert_eq!(buf.admit(Message::new(1, 0, 1, 10, 0.0)), AdmissionCode::DeniedOld);
    }
}
