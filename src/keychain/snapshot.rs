//! Serialized keychain representation and its integrity checks.
//!
//! A snapshot is a JSON object with exactly three fields:
//!
//! ```text
//! { "salt": <base64>, "signature": <base64>, "store": { <pseudonym b64>: <record b64>, ... } }
//! ```
//!
//! - **salt**: the Argon2id salt, fixed for the life of a keychain.
//! - **signature**: AES-GCM encryption of `AUTH_SIGNATURE` under the auth
//!   key.  Decrypting it proves the password is right.
//! - **store**: pseudonym -> record ciphertext.
//!
//! `dump` also returns a detached checksum, `base64(SHA-256(text))`, that
//! the caller keeps somewhere trusted and hands back to `load` to detect a
//! stale snapshot being replayed.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::crypto::{decrypt, encrypt, sha256, PSEUDONYM_LEN};
use crate::errors::{KeychainError, Result};

/// Known plaintext encrypted under the auth key.
const AUTH_SIGNATURE: &[u8] = b"AUTH_SIGNATURE";

/// Pseudonym -> record ciphertext.
pub type Records = BTreeMap<[u8; PSEUDONYM_LEN], Vec<u8>>;

/// The serialized keychain plus its detached checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// JSON text to persist anywhere.
    pub contents: String,
    /// `base64(SHA-256(contents))`; keep it somewhere tamper-proof.
    pub checksum: String,
}

/// Wire form of a snapshot.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotDoc {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    salt: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    signature: Vec<u8>,

    store: BTreeMap<String, String>,
}

/// A snapshot parsed back into bytes, not yet authenticated.
pub struct ParsedSnapshot {
    pub salt: Vec<u8>,
    pub signature: Vec<u8>,
    pub records: Records,
}

/// Encrypt the known signature plaintext under `auth_key`.
pub fn sign(auth_key: &[u8]) -> Result<Vec<u8>> {
    encrypt(auth_key, AUTH_SIGNATURE)
}

/// Check that `signature` decrypts to the known plaintext under `auth_key`.
///
/// A wrong key and a forged signature are indistinguishable here.
pub fn verify_signature(auth_key: &[u8], signature: &[u8]) -> Result<()> {
    let plaintext =
        decrypt(auth_key, signature).map_err(|_| KeychainError::AuthenticationFailure)?;
    if bool::from(plaintext.as_slice().ct_eq(AUTH_SIGNATURE)) {
        Ok(())
    } else {
        Err(KeychainError::AuthenticationFailure)
    }
}

/// `base64(SHA-256(contents))`.
pub fn checksum(contents: &str) -> String {
    BASE64.encode(sha256(contents.as_bytes()))
}

/// Compare the checksum of `contents` against a trusted one in constant time.
pub fn verify_checksum(contents: &str, trusted: &str) -> Result<()> {
    let actual = checksum(contents);
    if bool::from(actual.as_bytes().ct_eq(trusted.as_bytes())) {
        Ok(())
    } else {
        Err(KeychainError::RollbackDetected)
    }
}

/// Serialize the keychain state and compute its checksum.
pub fn serialize(salt: &[u8], signature: Vec<u8>, records: &Records) -> Result<Snapshot> {
    let doc = SnapshotDoc {
        salt: salt.to_vec(),
        signature,
        store: records
            .iter()
            .map(|(pseudonym, record)| (BASE64.encode(pseudonym), BASE64.encode(record)))
            .collect(),
    };

    let contents = serde_json::to_string(&doc)
        .map_err(|e| KeychainError::MalformedSnapshot(format!("serialize: {e}")))?;
    let checksum = checksum(&contents);
    Ok(Snapshot { contents, checksum })
}

/// Parse snapshot text into raw salt, signature and records.
///
/// Only the structure is validated here; authenticity is the caller's job.
pub fn deserialize(contents: &str) -> Result<ParsedSnapshot> {
    let doc: SnapshotDoc = serde_json::from_str(contents)
        .map_err(|e| KeychainError::MalformedSnapshot(format!("snapshot JSON: {e}")))?;

    let mut records = Records::new();
    for (pseudonym, record) in doc.store {
        let key = BASE64.decode(&pseudonym).map_err(|e| {
            KeychainError::MalformedSnapshot(format!("pseudonym {pseudonym:?}: {e}"))
        })?;
        let key: [u8; PSEUDONYM_LEN] = key.as_slice().try_into().map_err(|_| {
            KeychainError::MalformedSnapshot(format!(
                "pseudonym {pseudonym:?} is {} bytes, expected {PSEUDONYM_LEN}",
                key.len()
            ))
        })?;
        let record = BASE64.decode(&record).map_err(|e| {
            KeychainError::MalformedSnapshot(format!("record for {pseudonym:?}: {e}"))
        })?;
        records.insert(key, record);
    }

    Ok(ParsedSnapshot {
        salt: doc.salt,
        signature: doc.signature,
        records,
    })
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
