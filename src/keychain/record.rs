//! Per-record encryption bound to the record's own pseudonym.
//!
//! Plaintext layout before AES-GCM:
//!
//! ```text
//! [ padded secret: 65 bytes ][ pseudonym: 32 bytes ]
//! ```
//!
//! The secret is padded ISO/IEC 7816-4 style (value, `0x80`, zeros) to a
//! fixed 65 bytes, so every record has the same ciphertext length.  The
//! pseudonym travels inside the encrypted payload: a ciphertext moved to
//! another slot still decrypts, but its embedded pseudonym no longer
//! matches the slot and `decode` reports a swap.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{decrypt, encrypt, PSEUDONYM_LEN};
use crate::errors::{KeychainError, Result};

/// Longest secret a record can hold, in UTF-8 bytes.
pub const MAX_SECRET_LEN: usize = 64;

/// Padded secret length: one byte longer than the longest secret.
pub const PADDED_LEN: usize = MAX_SECRET_LEN + 1;

const PAD_MARKER: u8 = 0x80;

/// Encrypt `value` under `cipher_key`, bound to `pseudonym`.
pub fn encode(cipher_key: &[u8], pseudonym: &[u8; PSEUDONYM_LEN], value: &str) -> Result<Vec<u8>> {
    let mut plaintext = Zeroizing::new(pad(value.as_bytes())?);
    plaintext.extend_from_slice(pseudonym);
    encrypt(cipher_key, &plaintext)
}

/// Decrypt `record` found under `pseudonym` and recover the secret.
pub fn decode(cipher_key: &[u8], pseudonym: &[u8; PSEUDONYM_LEN], record: &[u8]) -> Result<String> {
    let plaintext = Zeroizing::new(decrypt(cipher_key, record)?);
    if plaintext.len() != PADDED_LEN + PSEUDONYM_LEN {
        return Err(KeychainError::DecryptionFailure);
    }

    let (padded, embedded) = plaintext.split_at(PADDED_LEN);
    if !bool::from(embedded.ct_eq(pseudonym)) {
        return Err(KeychainError::SwapAttackDetected {
            pseudonym: BASE64.encode(pseudonym),
        });
    }

    let value = unpad(padded)?;
    String::from_utf8(value).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        KeychainError::DecryptionFailure
    })
}

/// Pad `value` to exactly `PADDED_LEN` bytes.
fn pad(value: &[u8]) -> Result<Vec<u8>> {
    if value.len() > MAX_SECRET_LEN {
        return Err(KeychainError::SecretTooLong {
            len: value.len(),
            max: MAX_SECRET_LEN,
        });
    }
    let mut padded = Vec::with_capacity(PADDED_LEN + PSEUDONYM_LEN);
    padded.extend_from_slice(value);
    padded.push(PAD_MARKER);
    padded.resize(PADDED_LEN, 0);
    Ok(padded)
}

/// Strip the padding added by `pad`.
fn unpad(padded: &[u8]) -> Result<Vec<u8>> {
    let end = padded
        .iter()
        .rposition(|&b| b != 0)
        .filter(|&i| padded[i] == PAD_MARKER)
        .ok_or(KeychainError::DecryptionFailure)?;
    Ok(padded[..end].to_vec())
}
