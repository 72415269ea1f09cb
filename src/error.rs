//! Crate-wide error taxonomy.
//!
//! `ConfigError` and `ScenarioError` are fatal: they surface at the process
//! boundary and abort the run. `DataError` is recovered locally by the
//! caller (a malformed WKT line is skipped with a warning); it is still
//! modeled as a variant here so callers that *do* want to propagate it can.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}:{line}: {message}")]
    Parse { path: String, line: usize, message: String },

    #[error("missing required key `{0}`")]
    MissingKey(String),

    #[error("unknown {kind} class `{name}`")]
    UnknownClass { kind: &'static str, name: String },

    #[error("cluster id {id} out of range (only {available} valid cells)")]
    ClusterIdOutOfRange { id: usize, available: usize },

    #[error("host address ranges overlap: [{a_start},{a_end}) and [{b_start},{b_end})")]
    OverlappingHostRanges { a_start: u32, a_end: u32, b_start: u32, b_end: u32 },

    #[error("{nrof_clusters} clusters * {hosts_per_cluster} hosts-per-cluster != {nrof_hosts} total hosts")]
    ClusterHostCountMismatch { nrof_clusters: usize, hosts_per_cluster: usize, nrof_hosts: usize },

    #[error("placement rejection sampling failed after {attempts} attempts (degenerate polygon or cluster cell)")]
    PlacementExhausted { attempts: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("buffer over-admission on host {host}: {size} bytes exceeds capacity {capacity}")]
    BufferOverAdmission { host: u32, size: u64, capacity: u64 },

    #[error("connection {connection:?} already has a message in flight")]
    TransferAlreadyInFlight { connection: (u32, u32) },

    #[error("asymmetric connection state between interfaces of host {a} and host {b}")]
    AsymmetricConnection { a: u32, b: u32 },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{path}:{line}: malformed WKT coordinate pair: {content}")]
    MalformedCoordinate { path: String, line: usize, content: String },

    #[error("{path}:{line}: non-numeric coordinate: {token}")]
    NonNumericCoordinate { path: String, line: usize, token: String },
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}
