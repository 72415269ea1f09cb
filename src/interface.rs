//! Per-host radio: range/line-of-sight neighbour predicate, connection
//! bookkeeping, churn, blacklist and the INTRA/INTER cluster filter.
//!
//! The connect/teardown orchestration that needs simultaneous access to two
//! hosts' interfaces lives in [`crate::world::World`]; this module holds the
//! per-interface state and the pure predicates it is built from.

use std::collections::HashSet;

use crate::connection::ConnectionId;
use crate::geometry::{line_of_sight_clear, Coordinate, Room};

/// Gate applied to candidate connections in addition to range/LoS/capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationMode {
    /// Only connect within the same cluster.
    Intra,
    /// No cluster-membership restriction.
    Inter,
}

#[derive(Debug, Clone)]
pub struct Interface {
    pub transmit_range_m: f64,
    pub churn_rate: f64,
    pub max_parallel_connections: usize,
    pub mode: Option<CommunicationMode>,
    pub open_connections: Vec<ConnectionId>,
    pub blacklist: HashSet<u32>,
}

impl Interface {
    pub fn new(transmit_range_m: f64, churn_rate: f64, max_parallel_connections: usize, mode: Option<CommunicationMode>) -> Self {
        Self {
            transmit_range_m,
            churn_rate,
            max_parallel_connections,
            mode,
            open_connections: Vec::new(),
            blacklist: HashSet::new(),
        }
    }

    pub fn has_connection_capacity(&self) -> bool {
        self.open_connections.len() < self.max_parallel_connections
    }

    pub fn is_blacklisted(&self, peer: u32) -> bool {
        self.blacklist.contains(&peer)
    }

    pub fn blacklist_peer(&mut self, peer: u32) {
        self.blacklist.insert(peer);
    }

    pub fn add_connection(&mut self, id: ConnectionId) {
        self.open_connections.push(id);
    }

    pub fn remove_connection(&mut self, id: ConnectionId) {
        self.open_connections.retain(|&existing| existing != id);
    }
}

/// Reachability predicate: in range and unobstructed line of sight. Range is
/// checked first because it is O(1); the polygon crossing test is O(rooms ×
/// edges) and only runs if range already passed.
pub fn reachable(a: &Coordinate, b: &Coordinate, range_m: f64, rooms: &[Room]) -> bool {
    if a.distance_to(b) >= range_m {
        return false;
    }
    line_of_sight_clear(a, b, rooms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_respects_max_parallel() {
        let mut iface = Interface::new(10.0, 0.0, 2, None);
        assert!(iface.has_connection_capacity());
        iface.add_connection(1);
        iface.add_connection(2);
        assert!(!iface.has_connection_capacity());
    }

    #[test]
    fn blacklist_is_checked_independently_of_capacity() {
        let mut iface = Interface::new(10.0, 0.0, 4, None);
        iface.blacklist_peer(7);
        assert!(iface.is_blacklisted(7));
        assert!(!iface.is_blacklisted(8));
    }

    #[test]
    fn reachable_false_beyond_range() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(20.0, 0.0);
        assert!(!reachable(&a, &b, 10.0, &[]));
    }

    #[test]
    fn reachable_true_within_range_no_obstruction() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(5.0, 0.0);
        assert!(reachable(&a, &b, 10.0, &[]));
    }
}
