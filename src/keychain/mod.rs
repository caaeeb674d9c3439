//! Keychain module — encrypted credential storage.
//!
//! This module provides:
//! - Record encoding bound to the record's pseudonym (`record`)
//! - The `Keychain` state machine (`store`)
//! - Snapshot serialization with signature and checksum (`snapshot`)
//! - A mutex-guarded handle for shared use (`shared`)

pub mod record;
pub mod shared;
pub mod snapshot;
pub mod store;

pub use record::MAX_SECRET_LEN;
pub use shared::SharedKeychain;
pub use snapshot::Snapshot;
pub use store::Keychain;
