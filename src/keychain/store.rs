//! The keychain state machine.
//!
//! A `Keychain` starts out not ready.  `init` or a successful `load`
//! unlocks it; any failed `load` locks it again and drops whatever it
//! held before.  Record operations require an unlocked keychain.

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::kdf::{generate_salt, Argon2Params, SALT_LEN};
use crate::crypto::keys::{MasterKey, SubkeySet};
use crate::errors::{KeychainError, Result};

use super::record;
use super::snapshot::{self, Records, Snapshot};

/// Everything an unlocked keychain holds.
struct Unlocked {
    salt: [u8; SALT_LEN],
    /// Zeroized on drop.
    keys: SubkeySet,
    records: Records,
}

enum State {
    NotReady,
    Ready(Unlocked),
}

/// A password-protected map of domain name -> secret.
///
/// Domain names never appear in the clear: each is replaced by an HMAC
/// pseudonym, and each secret is encrypted together with that pseudonym.
pub struct Keychain {
    params: Argon2Params,
    state: State,
}

impl Default for Keychain {
    fn default() -> Self {
        Self::new()
    }
}

impl Keychain {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A locked keychain using the default Argon2id work factor.
    pub fn new() -> Self {
        Self {
            params: Argon2Params::default(),
            state: State::NotReady,
        }
    }

    /// A locked keychain using explicit Argon2id parameters.
    ///
    /// The same parameters must be used to `load` a snapshot that was
    /// produced by a keychain built with them.
    pub fn with_params(params: Argon2Params) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            state: State::NotReady,
        })
    }

    /// A locked keychain configured from `Settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::with_params(settings.argon2_params())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a new, empty keychain protected by `password`.
    ///
    /// Any previous contents and keys are discarded.
    pub fn init(&mut self, password: &str) -> Result<()> {
        self.state = State::NotReady;

        let salt = generate_salt();
        let keys = SubkeySet::derive(password.as_bytes(), &salt, &self.params)?;

        self.state = State::Ready(Unlocked {
            salt,
            keys,
            records: Records::new(),
        });
        debug!("keychain initialized");
        Ok(())
    }

    /// Replace this keychain with the contents of a snapshot.
    ///
    /// Returns `Ok(false)` for a wrong password or a forged signature.
    /// Returns `RollbackDetected` if `trusted_checksum` is given and does
    /// not match `contents`.  On anything but `Ok(true)` the keychain is
    /// left not ready.
    pub fn load(
        &mut self,
        password: &str,
        contents: &str,
        trusted_checksum: Option<&str>,
    ) -> Result<bool> {
        self.state = State::NotReady;

        let parsed = snapshot::deserialize(contents)?;

        // A salt of the wrong length can only come from tampering.
        let Ok(salt) = <[u8; SALT_LEN]>::try_from(parsed.salt.as_slice()) else {
            warn!(len = parsed.salt.len(), "snapshot salt has wrong length");
            return Ok(false);
        };

        let master = MasterKey::derive(password.as_bytes(), &salt, &self.params)?;
        let auth_key = Zeroizing::new(master.auth_key()?);
        match snapshot::verify_signature(auth_key.as_slice(), &parsed.signature) {
            Ok(()) => {}
            Err(KeychainError::AuthenticationFailure) => {
                warn!("keychain authentication failed");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        if let Some(trusted) = trusted_checksum {
            if let Err(e) = snapshot::verify_checksum(contents, trusted) {
                warn!("snapshot checksum mismatch, possible rollback");
                return Err(e);
            }
        }

        let keys = master.subkeys()?;
        let count = parsed.records.len();
        self.state = State::Ready(Unlocked {
            salt,
            keys,
            records: parsed.records,
        });
        debug!(records = count, "keychain loaded");
        Ok(true)
    }

    /// Serialize the keychain, or `None` if it is not ready.
    pub fn dump(&self) -> Result<Option<Snapshot>> {
        let State::Ready(unlocked) = &self.state else {
            return Ok(None);
        };

        let signature = snapshot::sign(unlocked.keys.auth_key())?;
        let snap = snapshot::serialize(&unlocked.salt, signature, &unlocked.records)?;
        debug!(records = unlocked.records.len(), "keychain dumped");
        Ok(Some(snap))
    }

    /// `true` after a successful `init` or `load`.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Add or replace the secret for `name`.
    ///
    /// Always re-encrypts under a fresh nonce, even for an unchanged value.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let unlocked = self.unlocked_mut("set")?;
        let pseudonym = unlocked.keys.pseudonym(name)?;
        let record = record::encode(unlocked.keys.cipher_key(), &pseudonym, value)?;
        unlocked.records.insert(pseudonym, record);
        Ok(())
    }

    /// Fetch the secret for `name`, or `None` if there is no such record.
    ///
    /// A record that fails to decrypt or sits under the wrong pseudonym is
    /// an error, never `None`.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let unlocked = self.unlocked("get")?;
        let pseudonym = unlocked.keys.pseudonym(name)?;
        let Some(record) = unlocked.records.get(&pseudonym) else {
            return Ok(None);
        };

        match record::decode(unlocked.keys.cipher_key(), &pseudonym, record) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(error = %e, "record failed integrity check");
                Err(e)
            }
        }
    }

    /// Delete the record for `name`.  Returns whether one existed.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let unlocked = self.unlocked_mut("remove")?;
        let pseudonym = unlocked.keys.pseudonym(name)?;
        Ok(unlocked.records.remove(&pseudonym).is_some())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Number of records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.unlocked("len")?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The Argon2id parameters this keychain derives keys with.
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    fn unlocked(&self, operation: &'static str) -> Result<&Unlocked> {
        match &self.state {
            State::Ready(unlocked) => Ok(unlocked),
            State::NotReady => Err(KeychainError::NotReady { operation }),
        }
    }

    fn unlocked_mut(&mut self, operation: &'static str) -> Result<&mut Unlocked> {
        match &mut self.state {
            State::Ready(unlocked) => Ok(unlocked),
            State::NotReady => Err(KeychainError::NotReady { operation }),
        }
    }
}
