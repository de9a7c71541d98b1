//! Monitoring state types and the persisted snapshot blob.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

/// A block-producing participant as reported by the leader API.
///
/// Leaders are ephemeral: only the latest snapshot and the previous one
/// (retained for comparison) ever exist. The name is the stable identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub name: String,

    /// Cumulative blocks produced.
    #[serde(default)]
    pub produced: u64,

    /// Cumulative blocks missed; non-decreasing while the leader is
    /// registered. The upstream payload may omit it entirely.
    #[serde(default)]
    pub missed: u64,
}

/// An active, unresolved missing streak for one leader.
///
/// Exists iff the leader is currently missing blocks. Created when the
/// missed-count first increases, deleted (with a resolution alert) the cycle
/// the count stops increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisserRecord {
    /// Missed-count value at which the current streak began.
    pub start: u64,

    /// Missed-count value at which the most recent alert was sent.
    pub last: u64,
}

/// An endpoint currently failing its liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownRecord {
    pub node: String,

    /// When the downtime was first observed; carried forward unchanged
    /// across polls while the node stays down.
    pub since: SystemTime,
}

/// Snapshot blob persisted between polling cycles.
///
/// Loaded once at startup (empty default on absence or corruption), mutated
/// in-memory per cycle, persisted at the end of every successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Latest leader snapshot.
    #[serde(default)]
    pub leaders: Vec<Leader>,

    /// Active missers keyed by leader name.
    #[serde(default)]
    pub missers: BTreeMap<String, MisserRecord>,

    /// Endpoints currently considered down.
    #[serde(default)]
    pub down: Vec<DownRecord>,
}
