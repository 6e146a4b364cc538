//! Policy gate for artifact requests.
//!
//! The usage-control rule language is evaluated by an external policy
//! decision point. The gate's only job is to call it once per artifact
//! request with the right context and turn its verdict into the protocol's
//! rejection vocabulary:
//!
//! - `Permit` lets the request through to data resolution
//! - `Deny` rejects with `NotAuthorized`
//! - a failing decision point counts as `Deny`

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod context;
pub mod error;
pub mod gate;
pub mod mocks;
pub mod traits;

pub use context::{PolicyContext, PolicyDecision};
pub use error::{PolicyError, PolicyResult};
pub use gate::{PolicyGate, StaticDecisionPoint};
pub use mocks::{FailingDecisionPoint, MockDecisionPoint};
pub use traits::PolicyDecisionPoint;
