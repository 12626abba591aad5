//! # satchel
//!
//! Background request-authorization controller for a blockchain
//! key/account browser extension.
//!
//! ## Architecture
//!
//! Untrusted pages reach the controller through a message bridge (not part
//! of this crate). The [`State`] controller then:
//! 1. tracks per-origin authorization grants and their account scope,
//! 2. serializes authorization, metadata and signing requests into durable
//!    consent queues,
//! 3. arbitrates a single notification popup across all requesting tabs and
//!    keeps the toolbar badge in sync with the queues,
//! 4. bridges long-lived RPC provider connections per browser port,
//!    including subscription lifecycle and teardown on disconnect.
//!
//! Durable collections live behind [`store::StorageBackend`]; the browser
//! shell (windows, toolbar badge) is injected via the [`popup`] traits, so
//! the controller is testable outside an extension host. Cryptographic
//! signing stays with the keyring collaborator; this crate only queues and
//! arbitrates the requests.

pub mod config;
pub mod error;
pub mod popup;
pub mod port;
pub mod provider;
pub mod pubsub;
pub mod state;
pub mod store;

pub use config::{Config, NotificationMode};
pub use error::StateError;
pub use port::{Port, PortId};
pub use provider::ProviderRegistry;
pub use pubsub::ConnectedSubscription;
pub use state::{canonical_origin, State};
