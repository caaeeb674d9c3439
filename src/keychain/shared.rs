//! Thread-safe handle around a single `Keychain`.
//!
//! One mutex guards the whole keychain: `load` swaps every key the other
//! operations depend on, so nothing finer-grained is safe.

use std::sync::{Arc, Mutex, MutexGuard};

use super::snapshot::Snapshot;
use super::store::Keychain;
use crate::errors::Result;

/// A cloneable, lock-protected `Keychain`.
#[derive(Clone, Default)]
pub struct SharedKeychain {
    inner: Arc<Mutex<Keychain>>,
}

impl SharedKeychain {
    pub fn new(keychain: Keychain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(keychain)),
        }
    }

    pub fn init(&self, password: &str) -> Result<()> {
        self.lock().init(password)
    }

    pub fn load(&self, password: &str, contents: &str, trusted_checksum: Option<&str>) -> Result<bool> {
        self.lock().load(password, contents, trusted_checksum)
    }

    pub fn dump(&self) -> Result<Option<Snapshot>> {
        self.lock().dump()
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        self.lock().set(name, value)
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        self.lock().get(name)
    }

    pub fn remove(&self, name: &str) -> Result<bool> {
        self.lock().remove(name)
    }

    pub fn is_ready(&self) -> bool {
        self.lock().is_ready()
    }

    /// Run `f` with exclusive access, for multi-step operations that must
    /// not interleave with other callers.
    ///
    /// If `f` panics after some of its steps, those steps stay applied:
    /// the lock is recovered and later callers see the keychain as `f`
    /// left it.
    pub fn with<T>(&self, f: impl FnOnce(&mut Keychain) -> T) -> T {
        f(&mut self.lock())
    }

    // Each single `Keychain` method computes fully before it mutates, so a
    // poisoned lock still guards a consistent keychain. Partial state can
    // only come from a panicking `with` closure.
    fn lock(&self) -> MutexGuard<'_, Keychain> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
