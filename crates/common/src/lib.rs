//! Common utilities and types shared across leaderwatch components.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
