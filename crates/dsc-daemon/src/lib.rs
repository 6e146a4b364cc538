//! Dataspace connector daemon library
//!
//! Wires the connector components into a runnable service:
//! - layered configuration (defaults, file, `DSC_` environment)
//! - catalog bootstrapping from JSON or TOML files
//! - the HTTP surface receiving protocol messages
//! - server lifecycle with graceful shutdown

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod server;

pub use bootstrap::{bootstrap, BootstrapSummary};
pub use config::ConnectorConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use server::{build_dispatcher, Server};
