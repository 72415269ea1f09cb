//! Connection: a bidirectional wireless link between two interfaces, and
//! the path-MTU-limited chunked transfer running in each direction.
//!
//! A single `Connection` value represents the link itself (both endpoints
//! create and tear it down together, by construction — see `World::teardown_connection`),
//! while each direction (`a_to_b`, `b_to_a`) carries its own independent
//! in-flight transfer, matching the spec's oriented `(fromInterface,
//! toInterface)` connection pair without duplicating link bookkeeping.

use crate::error::ScenarioError;
use crate::message::{Message, PATH_MTU};

pub type ConnectionId = u64;

/// One direction's in-flight chunked transfer state.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub message: Message,
    full_chunks: u64,
    tail_bytes: u64,
    chunks_sent: u64,
    tail_sent: bool,
    pub bytes_sent: u64,
}

impl Transfer {
    fn new(message: Message) -> Self {
        let (full_chunks, tail_bytes) = message.chunk_plan();
        Self {
            message,
            full_chunks,
            tail_bytes,
            chunks_sent: 0,
            tail_sent: false,
            bytes_sent: 0,
        }
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.message.size_bytes.saturating_sub(self.bytes_sent)
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_sent >= self.message.size_bytes
    }

    /// Spend up to `budget_bytes` of the transfer's remaining chunks,
    /// deducting whole `PATH_MTU` chunks first, then the tail chunk if it
    /// fits. Returns the number of bytes actually spent this call.
    fn advance(&mut self, budget_bytes: u64) -> u64 {
        let mut remaining_budget = budget_bytes;
        let mut spent = 0u64;

        while self.chunks_sent < self.full_chunks && remaining_budget >= PATH_MTU {
            self.chunks_sent += 1;
            self.bytes_sent += PATH_MTU;
            remaining_budget -= PATH_MTU;
            spent += PATH_MTU;
        }

        if self.chunks_sent >= self.full_chunks && !self.tail_sent && self.tail_bytes > 0 && remaining_budget >= self.tail_bytes {
            self.tail_sent = true;
            self.bytes_sent += self.tail_bytes;
            spent += self.tail_bytes;
        }

        spent
    }
}

/// A live wireless link between host `a`'s interface and host `b`'s
/// interface. Alive only while both endpoints are in range and have clear
/// line of sight (enforced by the interface update loop, not here).
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub host_a: u32,
    pub host_b: u32,
    pub a_to_b: Option<Transfer>,
    pub b_to_a: Option<Transfer>,
    pub last_update: f64,
}

impl Connection {
    pub fn new(id: ConnectionId, host_a: u32, host_b: u32, now: f64) -> Self {
        Self {
            id,
            host_a,
            host_b,
            a_to_b: None,
            b_to_a: None,
            last_update: now,
        }
    }

    fn slot_mut(&mut self, from: u32) -> &mut Option<Transfer> {
        if from == self.host_a { &mut self.a_to_b } else { &mut self.b_to_a }
    }

    pub fn slot(&self, from: u32) -> &Option<Transfer> {
        if from == self.host_a { &self.a_to_b } else { &self.b_to_a }
    }

    pub fn peer_of(&self, host: u32) -> u32 {
        if host == self.host_a { self.host_b } else { self.host_a }
    }

    /// Start sending `message` from `from` across this connection. Exactly
    /// one in-flight message per direction: calling this while a transfer
    /// is already in flight in that direction is a logic-level precondition
    /// violation, not a recoverable condition.
    pub fn start_transfer(&mut self, from: u32, message: Message) -> Result<(), ScenarioError> {
        let slot = self.slot_mut(from);
        if slot.is_some() {
            return Err(ScenarioError::TransferAlreadyInFlight {
                connection: (self.host_a, self.host_b),
            });
        }
        *slot = Some(Transfer::new(message));
        Ok(())
    }

    /// Advance both directions' transfers by the elapsed time, at the given
    /// per-direction link rates (bps). Returns the messages that completed
    /// this tick, tagged with the direction they traveled.
    pub fn update(&mut self, now: f64, rate_a_to_b_bps: f64, rate_b_to_a_bps: f64) -> Vec<(u32, u32, Message)> {
        let dt = (now - self.last_update).max(0.0);
        self.last_update = now;
        let mut completed = Vec::new();

        if let Some(transfer) = self.a_to_b.as_mut() {
            let budget = ((rate_a_to_b_bps / 8.0) * dt) as u64;
            transfer.advance(budget);
            if transfer.is_complete() {
                let finished = self.a_to_b.take().unwrap();
                completed.push((self.host_a, self.host_b, finished.message));
            }
        }

        if let Some(transfer) = self.b_to_a.as_mut() {
            let budget = ((rate_b_to_a_bps / 8.0) * dt) as u64;
            transfer.advance(budget);
            if transfer.is_complete() {
                let finished = self.b_to_a.take().unwrap();
                completed.push((self.host_b, self.host_a, finished.message));
            }
        }

        completed
    }
}
