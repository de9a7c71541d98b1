//! State-diffing and alert-decision engine for leader and endpoint monitoring.
//!
//! This crate is the pure core of the leaderwatch daemon: it compares
//! successive polled snapshots against persisted prior state, classifies
//! each change, and decides exactly when a notification fires versus stays
//! silent. It performs no network I/O; fetching, probing and alert delivery
//! live in the server crate.
//!
//! # Components
//!
//! - **Trigger policy**: shared escalation-schedule evaluator deciding
//!   repeat-alert cadence for ongoing conditions
//! - **Leader diff engine**: old-vs-new snapshot comparison and misser
//!   streak lifecycle
//! - **Endpoint availability engine**: down-set tracking with
//!   downtime-driven re-alerts
//! - **Snapshot store**: flat-file persistence of the last known state
//!
//! # Example
//!
//! ```
//! use leaderwatch::{diff_leaders, Leader, TriggerSchedule};
//! use std::collections::BTreeMap;
//!
//! let schedule = TriggerSchedule::new(10, vec![2, 5]);
//! let old = vec![Leader { name: "alice".into(), produced: 90, missed: 0 }];
//! let new = vec![Leader { name: "alice".into(), produced: 90, missed: 3 }];
//! let mut missers = BTreeMap::new();
//!
//! let alerts = diff_leaders(&old, &new, &mut missers, &schedule);
//! assert_eq!(alerts, vec!["Leader `alice` missed *3* block(s)".to_string()]);
//! assert!(missers.contains_key("alice"));
//! ```

pub mod endpoints;
pub mod leaders;
pub mod store;
pub mod trigger;
pub mod types;

pub use endpoints::diff_endpoints;
pub use leaders::diff_leaders;
pub use store::StateStore;
pub use trigger::TriggerSchedule;
pub use types::{DownRecord, Leader, MisserRecord, PersistedState};
