//! Protocol message handling for the dataspace connector.
//!
//! The [`MessageDispatcher`] routes each inbound [`Envelope`] by message
//! type to one of the registered [`MessageHandler`]s:
//!
//! - description requests, answered from the catalog graph
//! - contract requests, matched against stored offers and turned into
//!   agreements
//! - contract agreements echoed back by the consumer, which confirm the
//!   stored agreement and are logged at the clearing house
//! - artifact requests, checked against the transfer contract and the
//!   policy gate before data is resolved
//!
//! Local updates go through [`ConnectorContext`] so that subscribers of the
//! changed element, and of everything below it, are notified.
//!
//! The protocol version is checked before anything else. Handler failures
//! become rejections through [`NegotiationError::rejection_reason`].
//!
//! [`Envelope`]: dsc_types::Envelope

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod clearing_house;
pub mod config;
pub mod context;
pub mod description;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod notifier;
pub mod updates;

pub use clearing_house::{ClearingHouse, HttpClearingHouse, NoopClearingHouse};
pub use config::{NegotiationConfig, NotificationConfig};
pub use context::ConnectorContext;
pub use description::DescriptionBuilder;
pub use dispatcher::MessageDispatcher;
pub use error::{NegotiationError, NegotiationResult};
pub use handlers::{MessageHandler, Reply};
pub use locks::{KeyGuard, KeyedLocks};
pub use notifier::{Notification, SubscriberNotifier};
pub use updates::NotifyOnDataUpdate;
