//! Cryptographic building blocks for CredVault.
//!
//! This module provides:
//! - AES-128-GCM encryption and decryption (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - HMAC-based subkey derivation and domain pseudonyms (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

use sha2::{Digest, Sha256};

pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_master_key, derive_master_key_into, generate_salt, Argon2Params, SALT_LEN};
pub use keys::{MasterKey, SubkeySet, PSEUDONYM_LEN};

/// Unkeyed SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}
