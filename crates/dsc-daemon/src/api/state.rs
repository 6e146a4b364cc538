//! Application state for API handlers

use chrono::{DateTime, Utc};
use dsc_negotiation::MessageDispatcher;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MessageDispatcher>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(dispatcher: Arc<MessageDispatcher>) -> Self {
        Self {
            dispatcher,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// Human readable uptime, e.g. `2h 5m 13s`.
    pub fn uptime(&self) -> String {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        let secs = elapsed.num_seconds().max(0);
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if hours > 0 {
            format!("{hours}h {minutes}m {seconds}s")
        } else if minutes > 0 {
            format!("{minutes}m {seconds}s")
        } else {
            format!("{seconds}s")
        }
    }
}
