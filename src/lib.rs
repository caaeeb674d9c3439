pub mod config;
pub mod crypto;
pub mod errors;
pub mod keychain;

pub use errors::{KeychainError, Result};
pub use keychain::{Keychain, SharedKeychain, Snapshot};
