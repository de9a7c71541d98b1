//! Leaderwatch daemon.
//!
//! Watches a set of block-producing leaders and a set of API endpoints,
//! diffing each polled snapshot against the persisted prior state and
//! alerting an operator (via Telegram) when something changes.
//!
//! # Components
//!
//! - **Watchers**: periodic leader and endpoint polling cycles driving the
//!   core diff engines in the `leaderwatch` crate
//! - **Fetcher**: reqwest-backed leader source and liveness prober
//! - **Notifier**: Telegram delivery task fed by an alert channel
//! - **Config**: YAML configuration with validation and search paths

pub mod config;
pub mod fetcher;
pub mod notifier;
pub mod server;
pub mod watcher;

pub use config::{Config, ConfigError};
pub use fetcher::{FetchError, HttpLeaderSource, HttpProber, LeaderSource, Prober};
pub use notifier::{LogNotifier, Notifier, NotifierTask, TelegramNotifier};
pub use server::WatchServer;
pub use watcher::{EndpointWatcher, LeaderWatcher};
