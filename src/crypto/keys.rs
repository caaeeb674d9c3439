//! Subkey derivation using HMAC-SHA256.
//!
//! From a single Argon2id master key we derive three independent keys:
//! - an **auth key** that proves password knowledge across dump/load,
//! - a **pseudonym key** that hides domain names behind an HMAC,
//! - a **cipher key** that encrypts record payloads.
//!
//! Each subkey is `HMAC-SHA256(master_key, context)` truncated to its
//! target length, with a distinct fixed context string per subkey.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::{derive_master_key_into, Argon2Params, MASTER_KEY_LEN};
use crate::errors::{KeychainError, Result};

/// Length of the AES-128-GCM keys (auth + cipher).
pub const CIPHER_KEY_LEN: usize = 16;

/// Length of the pseudonym HMAC key.
pub const PSEUDONYM_KEY_LEN: usize = 32;

/// Length of a pseudonym (one HMAC-SHA256 tag).
pub const PSEUDONYM_LEN: usize = 32;

const AUTH_CONTEXT: &[u8] = b"credvault-auth-key";
const PSEUDONYM_CONTEXT: &[u8] = b"credvault-pseudonym-key";
const CIPHER_CONTEXT: &[u8] = b"credvault-cipher-key";

/// HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; 32]> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| KeychainError::KeyDerivationFailed(format!("HMAC init failed: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().into())
}

/// The Argon2id output, zeroed when dropped.
///
/// Only lives long enough to derive a `SubkeySet`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl MasterKey {
    /// Stretch `password` with Argon2id under `salt`.
    pub fn derive(password: &[u8], salt: &[u8], params: &Argon2Params) -> Result<Self> {
        let mut key = Self {
            bytes: [0u8; MASTER_KEY_LEN],
        };
        derive_master_key_into(password, salt, params, &mut key.bytes)?;
        Ok(key)
    }

    /// Derive only the auth key.
    ///
    /// `load` checks the signature with this before deriving the rest.
    pub fn auth_key(&self) -> Result<[u8; CIPHER_KEY_LEN]> {
        self.subkey(AUTH_CONTEXT)
    }

    /// Derive all three subkeys.
    pub fn subkeys(&self) -> Result<SubkeySet> {
        Ok(SubkeySet {
            auth: self.auth_key()?,
            pseudonym: self.subkey(PSEUDONYM_CONTEXT)?,
            cipher: self.subkey(CIPHER_CONTEXT)?,
        })
    }

    fn subkey<const N: usize>(&self, context: &[u8]) -> Result<[u8; N]> {
        let mut tag = hmac_sha256(&self.bytes, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&tag[..N]);
        tag.zeroize();
        Ok(out)
    }
}

/// The three subkeys held by an unlocked keychain, zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SubkeySet {
    auth: [u8; CIPHER_KEY_LEN],
    pseudonym: [u8; PSEUDONYM_KEY_LEN],
    cipher: [u8; CIPHER_KEY_LEN],
}

impl SubkeySet {
    /// Convenience: password + salt straight to subkeys.
    pub fn derive(password: &[u8], salt: &[u8], params: &Argon2Params) -> Result<Self> {
        MasterKey::derive(password, salt, params)?.subkeys()
    }

    pub fn auth_key(&self) -> &[u8; CIPHER_KEY_LEN] {
        &self.auth
    }

    pub fn cipher_key(&self) -> &[u8; CIPHER_KEY_LEN] {
        &self.cipher
    }

    /// Map a domain name to its pseudonym: `HMAC(pseudonym_key, name)`.
    pub fn pseudonym(&self, name: &str) -> Result<[u8; PSEUDONYM_LEN]> {
        hmac_sha256(&self.pseudonym, name.as_bytes())
    }
}
