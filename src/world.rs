//! Central arena: owns every host, every open connection and the
//! read-only room/link model, and drives one simulation tick.
//!
//! Hosts and connections reference each other only through stable integer
//! ids (`HostId = u32` is the host's own address; `ConnectionId` is an
//! incrementing counter) rather than direct pointers, so the host/interface/
//! connection/host cycle never needs `Rc`/`RefCell`.

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::connection::{Connection, ConnectionId};
use crate::geometry::Room;
use crate::host::{Host, HostId};
use crate::interface::CommunicationMode;
use crate::message::{AdmissionCode, Message};
use crate::rng::RngService;
use crate::signal::LinkBudget;

pub struct World {
    pub hosts: Vec<Host>,
    pub connections: HashMap<ConnectionId, Connection>,
    pub rooms: Vec<Room>,
    pub link_budget: LinkBudget,
    pub now: f64,
    next_connection_id: ConnectionId,
    churn_rngs: Vec<ChaCha8Rng>,
}

/// Per-message lifecycle events a tick can produce, for reporters.
#[derive(Debug, Clone)]
pub enum TickEvent {
    ConnectionOpened { a: HostId, b: HostId },
    ConnectionClosed { a: HostId, b: HostId, churned: bool },
    Delivered { message: Message, to: HostId, code: AdmissionCode },
}

impl World {
    pub fn new(hosts: Vec<Host>, rooms: Vec<Room>, link_budget: LinkBudget, rng: &RngService) -> Self {
        let churn_rngs = hosts.iter().map(|h| rng.churn_stream(h.address)).collect();
        Self {
            hosts,
            connections: HashMap::new(),
            rooms,
            link_budget,
            now: 0.0,
            next_connection_id: 0,
            churn_rngs,
        }
    }

    pub fn host(&self, address: HostId) -> &Host {
        &self.hosts[address as usize]
    }

    pub fn host_mut(&mut self, address: HostId) -> &mut Host {
        &mut self.hosts[address as usize]
    }

    fn bitrate_between(&self, a: HostId, b: HostId) -> (f64, f64) {
        let dist = self.host(a).location.distance_to(&self.host(b).location);
        let rate_a_to_b = self.link_budget.bitrate_bps(dist, self.host(b).interface.transmit_range_m);
        let rate_b_to_a = self.link_budget.bitrate_bps(dist, self.host(a).interface.transmit_range_m);
        (rate_a_to_b, rate_b_to_a)
    }

    fn reachable(&self, a: HostId, b: HostId) -> bool {
        let loc_a = self.host(a).location;
        let loc_b = self.host(b).location;
        let range = self.host(a).interface.transmit_range_m.min(self.host(b).interface.transmit_range_m);
        crate::interface::reachable(&loc_a, &loc_b, range, &self.rooms)
    }

    /// Advance the world by one tick of `dt` seconds: tear down stale or
    /// churned connections, form new ones, let routers start transfers, and
    /// advance every open connection's byte counters. Returns the tick's
    /// observable events for reporters, in deterministic order.
    pub fn tick(&mut self, dt: f64) -> Vec<TickEvent> {
        self.now += dt;
        let mut events = Vec::new();
        self.tick_interfaces(dt, &mut events);
        self.tick_routers(&mut events);
        self.tick_connections(&mut events);
        events
    }

    fn tick_interfaces(&mut self, dt: f64, events: &mut Vec<TickEvent>) {
        let mut torn_down = Vec::new();
        for host_idx in 0..self.hosts.len() {
            let host_address = self.hosts[host_idx].address;
            let open: Vec<ConnectionId> = self.hosts[host_idx].interface.open_connections.clone();
            for conn_id in open {
                let Some(conn) = self.connections.get(&conn_id) else { continue };
                let peer = conn.peer_of(host_address);
                let churn_rate = self.hosts[host_idx].interface.churn_rate;
                let out_of_range = !self.reachable(host_address, peer);
                let churned = churn_rate > 0.0 && self.churn_rngs[host_idx].gen_bool(churn_rate);
                if out_of_range || churned {
                    torn_down.push((conn_id, host_address, peer, churned));
                }
            }
        }

        // Apply every side's own churn decision before removing the shared
        // connection: if both interfaces independently roll a churn success
        // this tick, each still records its own blacklist entry rather than
        // only the first-processed side's.
        for (_, initiator, peer, churned) in &torn_down {
            if *churned {
                self.host_mut(*initiator).interface.blacklist_peer(*peer);
            }
        }

        let mut already_removed = std::collections::HashSet::new();
        for (conn_id, initiator, peer, churned) in torn_down {
            if !already_removed.insert(conn_id) {
                continue;
            }
            self.connections.remove(&conn_id);
            self.host_mut(initiator).interface.remove_connection(conn_id);
            self.host_mut(peer).interface.remove_connection(conn_id);
            events.push(TickEvent::ConnectionClosed { a: initiator, b: peer, churned });
        }

        let addresses: Vec<HostId> = self.hosts.iter().map(|h| h.address).collect();
        for &a in &addresses {
            for &b in &addresses {
                if b <= a {
                    continue;
                }
                if !self.host(a).interface.has_connection_capacity() || !self.host(b).interface.has_connection_capacity() {
                    continue;
                }
                if self.host(a).interface.is_blacklisted(b) || self.host(b).interface.is_blacklisted(a) {
                    continue;
                }
                let already_connected = self.host(a).interface.open_connections.iter().any(|id| self.connections.get(id).is_some_and(|c| c.peer_of(a) == b));
                if already_connected {
                    continue;
                }
                if let Some(CommunicationMode::Intra) = self.host(a).interface.mode
                    && self.host(a).cluster_id != self.host(b).cluster_id {
                        continue;
                    }
                if let Some(CommunicationMode::Intra) = self.host(b).interface.mode
                    && self.host(a).cluster_id != self.host(b).cluster_id {
                        continue;
                    }
                if !self.reachable(a, b) {
                    continue;
                }
                let id = self.next_connection_id;
                self.next_connection_id += 1;
                // Back-date to the tick's start so the connection accrues a
                // full tick's transfer budget the moment it is updated below,
                // instead of losing its first tick to a zero-length dt.
                self.connections.insert(id, Connection::new(id, a, b, self.now - dt));
                self.host_mut(a).interface.add_connection(id);
                self.host_mut(b).interface.add_connection(id);
                events.push(TickEvent::ConnectionOpened { a, b });
            }
        }
    }

    fn tick_routers(&mut self, events: &mut Vec<TickEvent>) {
        let addresses: Vec<HostId> = self.hosts.iter().map(|h| h.address).collect();
        for &address in &addresses {
            let conn_ids: Vec<ConnectionId> = self.host(address).interface.open_connections.clone();
            for conn_id in conn_ids {
                let Some(peer) = self.connections.get(&conn_id).map(|c| c.peer_of(address)) else { continue };
                if self.connections.get(&conn_id).map(|c| c.slot(address).is_some()).unwrap_or(true) {
                    // A transfer is already in flight in this direction; any
                    // message still waiting behind it must try again next tick.
                    let waiting = self.host(address).buffer.messages().iter().find(|m| !self.host(peer).buffer.contains(m.id)).cloned();
                    if let Some(message) = waiting {
                        events.push(TickEvent::Delivered { message, to: peer, code: AdmissionCode::TryLater });
                    }
                    continue;
                }
                let candidate_ids: Vec<_> = self.host(address).buffer.messages().iter().map(|m| m.id).collect();
                let router = self.host(address).router;
                for message_id in candidate_ids {
                    let Some(message) = self.host(address).buffer.messages().iter().find(|m| m.id == message_id).cloned() else { continue };
                    if message.to as usize >= self.hosts.len() {
                        // The destination address doesn't name any host in the
                        // network; stop offering it instead of flooding it forever.
                        events.push(TickEvent::Delivered { message, to: peer, code: AdmissionCode::DeniedUnreachable });
                        continue;
                    }
                    let peer_has = self.host(peer).buffer.contains(message.id);
                    let peer_is_destination = peer == message.to;
                    let Some(plan) = router.plan_forward(&message, peer, peer_has, peer_is_destination) else { continue };
                    let conn = self.connections.get_mut(&conn_id).expect("connection exists");
                    if conn.start_transfer(address, plan.sent).is_ok() {
                        if let Some(budget) = plan.retained_copy_budget
                            && let Some(stored) = self.host_mut(address).buffer.get_mut(message_id) {
                                stored.copy_budget = Some(budget);
                            }
                        break; // one new transfer per connection per tick
                    }
                }
            }
        }
    }

    fn tick_connections(&mut self, events: &mut Vec<TickEvent>) {
        let ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        let mut ids = ids;
        ids.sort_unstable();
        for conn_id in ids {
            let (host_a, host_b) = match self.connections.get(&conn_id) {
                Some(c) => (c.host_a, c.host_b),
                None => continue,
            };
            let (rate_a_to_b, rate_b_to_a) = self.bitrate_between(host_a, host_b);
            let now = self.now;
            let completed = self.connections.get_mut(&conn_id).unwrap().update(now, rate_a_to_b, rate_b_to_a);
            for (_from, to, message) in completed {
                let code = self.host_mut(to).receive_message(message.clone());
                events.push(TickEvent::Delivered { message, to, code });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;
    use crate::host::Host;
    use crate::interface::Interface;
    use crate::router::Router;

    fn host(address: u32, x: f64, y: f64, range: f64) -> Host {
        Host::new(address, Coordinate::new(x, y), None, Interface::new(range, 0.0, 8, None), Router::Epidemic { retain_after_delivery: true }, 10_000)
    }

    #[test]
    fn two_hosts_in_range_connect_and_deliver() {
        let rng = RngService::new(1);
        let mut world = World::new(vec![host(0, 50.0, 50.0, 20.0), host(1, 50.0, 60.0, 20.0)], vec![], LinkBudget::default(), &rng);
        world.host_mut(0).buffer.admit(Message::new(1, 0, 1, 100, 0.0));

        let mut delivered = false;
        for _ in 0..5 {
            let events = world.tick(1.0);
            if events.iter().any(|e| matches!(e, TickEvent::Delivered { to, .. } if *to == 1)) {
                delivered = true;
            }
        }
        assert!(delivered);
        assert!(world.connections.values().next().is_some());
    }

    #[test]
    fn two_hosts_out_of_range_never_connect() {
        let rng = RngService::new(1);
        let mut world = World::new(vec![host(0, 50.0, 50.0, 20.0), host(1, 50.0, 90.0, 20.0)], vec![], LinkBudget::default(), &rng);
        for _ in 0..10 {
            world.tick(1.0);
        }
        assert!(world.connections.is_empty());
    }

    #[test]
    fn churn_with_certainty_tears_down_and_blacklists() {
        let rng = RngService::new(1);
        let mut h0 = host(0, 50.0, 50.0, 20.0);
        h0.interface.churn_rate = 1.0;
        let mut world = World::new(vec![h0, host(1, 50.0, 60.0, 20.0)], vec![], LinkBudget::default(), &rng);

        world.tick(1.0);
        assert_eq!(world.connections.len(), 1);
        world.tick(1.0);
        assert!(world.connections.is_empty());
        assert!(world.host(0).interface.is_blacklisted(1));

        for _ in 0..5 {
            world.tick(1.0);
        }
        assert!(world.connections.is_empty());
    }

    #[test]
    fn both_sides_churning_the_same_tick_blacklist_each_other() {
        let rng = RngService::new(1);
        let mut h0 = host(0, 50.0, 50.0, 20.0);
        h0.interface.churn_rate = 1.0;
        let mut h1 = host(1, 50.0, 60.0, 20.0);
        h1.interface.churn_rate = 1.0;
        let mut world = World::new(vec![h0, h1], vec![], LinkBudget::default(), &rng);

        world.tick(1.0);
        assert_eq!(world.connections.len(), 1);
        world.tick(1.0);
        assert!(world.connections.is_empty());
        assert!(world.host(0).interface.is_blacklisted(1), "host 0's own churn trial must be recorded even if host 1's teardown wins the removal race");
        assert!(world.host(1).interface.is_blacklisted(0), "host 1's own churn trial must be recorded even if host 0's teardown wins the removal race");
    }

    #[test]
    fn message_to_nonexistent_host_is_denied_unreachable() {
        let rng = RngService::new(1);
        let mut world = World::new(vec![host(0, 50.0, 50.0, 20.0), host(1, 50.0, 60.0, 20.0)], vec![], LinkBudget::default(), &rng);
        world.host_mut(0).buffer.admit(Message::new(1, 0, 99, 100, 0.0));

        let mut saw_denied_unreachable = false;
        for _ in 0..5 {
            let events = world.tick(1.0);
            if events.iter().any(|e| matches!(e, TickEvent::Delivered { code: AdmissionCode::DeniedUnreachable, .. })) {
                saw_denied_unreachable = true;
            }
        }
        assert!(saw_denied_unreachable);
    }

    #[test]
    fn backlogged_message_behind_an_in_flight_transfer_is_try_later() {
        let rng = RngService::new(1);
        let big_buffer = Host::new(0, Coordinate::new(50.0, 50.0), None, Interface::new(20.0, 0.0, 8, None), Router::Epidemic { retain_after_delivery: true }, 100_000_000);
        let mut world = World::new(vec![big_buffer, host(1, 50.0, 60.0, 20.0)], vec![], LinkBudget::default(), &rng);
        // A large message occupies the only transfer slot for many ticks, so
        // a second message queued behind it must be reported as TryLater.
        world.host_mut(0).buffer.admit(Message::new(1, 0, 1, 50_000_000, 0.0));
        world.host_mut(0).buffer.admit(Message::new(2, 0, 1, 100, 0.0));

        let mut saw_try_later = false;
        for _ in 0..10 {
            let events = world.tick(1.0);
            if events.iter().any(|e| matches!(e, TickEvent::Delivered { code: AdmissionCode::TryLater, .. })) {
                saw_try_later = true;
            }
        }
        assert!(saw_try_later);
    }
}
