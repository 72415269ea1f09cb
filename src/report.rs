//! Reporters: plain-text, deterministic output, written per §6/§4.J.

use std::fmt::Write as _;

use crate::message::{AdmissionCode, MessageId};
use crate::world::{TickEvent, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Create,
    Forward,
    Deliver,
    Drop,
}

#[derive(Debug, Clone)]
pub struct LifecycleRecord {
    pub message_id: MessageId,
    pub kind: LifecycleKind,
    pub time: f64,
    pub hop_path: Vec<u32>,
    pub size_bytes: u64,
}

/// Per-message lifecycle log: create, forward, deliver, drop.
#[derive(Debug, Default)]
pub struct UnifiedReport {
    records: Vec<LifecycleRecord>,
}

impl UnifiedReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message-creation attempt. `code` is the real outcome of
    /// admitting it into the creating host's own buffer: a denial (a
    /// duplicate id, or the message alone exceeding capacity) is recorded as
    /// a DROP rather than lying about the message having entered the buffer.
    pub fn record_create(&mut self, message_id: MessageId, time: f64, from: u32, size_bytes: u64, code: AdmissionCode) {
        let kind = if code == AdmissionCode::RcvOk { LifecycleKind::Create } else { LifecycleKind::Drop };
        self.records.push(LifecycleRecord { message_id, kind, time, hop_path: vec![from], size_bytes });
    }

    pub fn observe_tick(&mut self, events: &[TickEvent]) {
        for event in events {
            if let TickEvent::Delivered { message, code, .. } = event {
                let kind = match code {
                    AdmissionCode::RcvOk if message.is_delivered() => LifecycleKind::Deliver,
                    AdmissionCode::RcvOk => LifecycleKind::Forward,
                    _ => LifecycleKind::Drop,
                };
                self.records.push(LifecycleRecord {
                    message_id: message.id,
                    kind,
                    time: message.created_at,
                    hop_path: message.hop_path.clone(),
                    size_bytes: message.size_bytes,
                });
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for r in &self.records {
            let kind = match r.kind {
                LifecycleKind::Create => "CREATE",
                LifecycleKind::Forward => "FORWARD",
                LifecycleKind::Deliver => "DELIVER",
                LifecycleKind::Drop => "DROP",
            };
            let hops: Vec<String> = r.hop_path.iter().map(|h| h.to_string()).collect();
            writeln!(out, "{:.3}\t{}\t{}\t{}\t{}", r.time, r.message_id, kind, r.size_bytes, hops.join(",")).expect("String write is infallible");
        }
        out
    }
}

/// Periodic NxN host-adjacency snapshot, rows ordered by ascending address.
#[derive(Debug)]
pub struct AdjacencyMatrixReport {
    granularity_s: f64,
    next_due: f64,
    blocks: Vec<String>,
}

impl AdjacencyMatrixReport {
    pub fn new(granularity_s: f64) -> Self {
        Self { granularity_s, next_due: 0.0, blocks: Vec::new() }
    }

    pub fn maybe_snapshot(&mut self, world: &World) {
        while world.now >= self.next_due {
            self.blocks.push(Self::render_block(world, self.next_due));
            self.next_due += self.granularity_s;
        }
    }

    fn render_block(world: &World, t: f64) -> String {
        let mut addresses: Vec<u32> = world.hosts.iter().map(|h| h.address).collect();
        addresses.sort_unstable();
        let n = addresses.len();

        let mut adjacency = vec![vec![0u8; n]; n];
        for i in 0..n {
            adjacency[i][i] = 1;
        }
        for conn in world.connections.values() {
            let i = addresses.iter().position(|&a| a == conn.host_a).unwrap();
            let j = addresses.iter().position(|&a| a == conn.host_b).unwrap();
            adjacency[i][j] = 1;
            adjacency[j][i] = 1;
        }

        let mut out = String::new();
        writeln!(out, "[{t}]").expect("String write is infallible");
        writeln!(out, "# Node IDs:").expect("String write is infallible");
        let ids: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
        writeln!(out, "{}", ids.join(" ")).expect("String write is infallible");
        for row in adjacency {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(out, "{}", cells.join(" ")).expect("String write is infallible");
        }
        out
    }

    pub fn render(&self) -> String {
        self.blocks.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;
    use crate::host::Host;
    use crate::interface::Interface;
    use crate::rng::RngService;
    use crate::router::Router;
    use crate::signal::LinkBudget;

    fn world_of(n: u32) -> World {
        let hosts = (0..n)
            .map(|i| Host::new(i, Coordinate::new(i as f64 * 5.0, 0.0), None, Interface::new(100.0, 0.0, 8, None), Router::Epidemic { retain_after_delivery: true }, 10_000))
            .collect();
        World::new(hosts, vec![], LinkBudget::default(), &RngService::new(1))
    }

    #[test]
    fn adjacency_matrix_diagonal_is_always_one() {
        let world = world_of(3);
        let block = AdjacencyMatrixReport::render_block(&world, 0.0);
        assert!(block.contains("[0]"));
        assert!(block.contains("# Node IDs:"));
    }

    #[test]
    fn adjacency_matrix_is_symmetric_for_open_connections() {
        let mut world = world_of(2);
        world.tick(1.0); // hosts are in range, should connect
        let block = AdjacencyMatrixReport::render_block(&world, world.now);
        let rows: Vec<&str> = block.lines().skip(2).collect();
        let row0: Vec<&str> = rows[0].split(' ').collect();
        let row1: Vec<&str> = rows[1].split(' ').collect();
        assert_eq!(row0[1], row1[0]);
    }

    #[test]
    fn unified_report_records_creation() {
        let mut report = UnifiedReport::new();
        report.record_create(1, 0.0, 10, 100, AdmissionCode::RcvOk);
        let rendered = report.render();
        assert!(rendered.contains("CREATE"));
    }

    #[test]
    fn unified_report_records_denied_creation_as_drop_not_create() {
        let mut report = UnifiedReport::new();
        report.record_create(1, 0.0, 10, 100, AdmissionCode::DeniedNoSpace);
        let rendered = report.render();
        assert!(rendered.contains("DROP"));
        assert!(!rendered.contains("CREATE"));
    }
}
