//! Integration tests for the keychain lifecycle and record operations.

use credvault::crypto::Argon2Params;
use credvault::{Keychain, KeychainError};
use proptest::prelude::*;

/// Helper: a keychain with a cheap Argon2 work factor.
fn keychain() -> Keychain {
    Keychain::with_params(Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid params")
}

fn ready(password: &str) -> Keychain {
    let mut kc = keychain();
    kc.init(password).expect("init");
    kc
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn operations_before_init_are_not_ready() {
    let mut kc = keychain();
    assert!(matches!(
        kc.set("a.com", "x"),
        Err(KeychainError::NotReady { .. })
    ));
    assert!(matches!(kc.get("a.com"), Err(KeychainError::NotReady { .. })));
    assert!(matches!(
        kc.remove("a.com"),
        Err(KeychainError::NotReady { .. })
    ));
    assert!(kc.dump().unwrap().is_none(), "dump is a sentinel, not an error");
}

#[test]
fn init_makes_keychain_ready_and_empty() {
    let kc = ready("pw1");
    assert!(kc.is_ready());
    assert_eq!(kc.len().unwrap(), 0);
}

#[test]
fn invalid_params_are_rejected_at_construction() {
    let result = Keychain::with_params(Argon2Params {
        memory_kib: 16,
        iterations: 1,
        parallelism: 1,
    });
    assert!(matches!(result, Err(KeychainError::KeyDerivationFailed(_))));
}

#[test]
fn keychain_from_settings_uses_configured_work_factor() {
    let settings = credvault::config::Settings {
        argon2_memory_kib: 8_192,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    };
    let mut kc = Keychain::from_settings(&settings).unwrap();
    assert_eq!(kc.params().iterations, 1);

    kc.init("pw1").unwrap();
    kc.set("a.com", "secretA").unwrap();
    let snap = kc.dump().unwrap().unwrap();

    // A keychain with a different work factor derives different keys.
    let mut other = Keychain::with_params(Argon2Params {
        memory_kib: 8_192,
        iterations: 2,
        parallelism: 1,
    })
    .unwrap();
    assert!(!other.load("pw1", &snap.contents, None).unwrap());
}

// ---------------------------------------------------------------------------
// set / get / remove
// ---------------------------------------------------------------------------

#[test]
fn get_returns_what_was_set() {
    let mut kc = ready("pw1");
    kc.set("a.com", "secretA").unwrap();
    kc.set("b.com", "secretB").unwrap();

    assert_eq!(kc.get("a.com").unwrap().as_deref(), Some("secretA"));
    assert_eq!(kc.get("b.com").unwrap().as_deref(), Some("secretB"));
}

#[test]
fn get_of_unknown_name_is_none() {
    let mut kc = ready("pw1");
    kc.set("a.com", "secretA").unwrap();
    assert_eq!(kc.get("never-set.com").unwrap(), None);
}

#[test]
fn remove_reports_existence_once() {
    let mut kc = ready("pw1");
    kc.set("a.com", "secretA").unwrap();

    assert!(kc.remove("a.com").unwrap());
    assert!(!kc.remove("a.com").unwrap());
    assert_eq!(kc.get("a.com").unwrap(), None);
}

#[test]
fn empty_and_max_length_secrets_roundtrip() {
    let mut kc = ready("pw1");
    let longest = "z".repeat(credvault::keychain::MAX_SECRET_LEN);
    kc.set("empty.com", "").unwrap();
    kc.set("long.com", &longest).unwrap();

    assert_eq!(kc.get("empty.com").unwrap().as_deref(), Some(""));
    assert_eq!(kc.get("long.com").unwrap(), Some(longest));
}

#[test]
fn domain_names_do_not_appear_in_dump() {
    let mut kc = ready("pw1");
    kc.set("very-recognizable-domain.example", "hunter2").unwrap();
    let snap = kc.dump().unwrap().unwrap();

    assert!(!snap.contents.contains("very-recognizable-domain"));
    assert!(!snap.contents.contains("hunter2"));
}

// ---------------------------------------------------------------------------
// dump / load
// ---------------------------------------------------------------------------

#[test]
fn dump_and_load_preserves_every_record() {
    let mut kc = ready("pw1");
    kc.set("a.com", "secretA").unwrap();
    kc.set("b.com", "secretB").unwrap();
    kc.set("c.com", "secretC").unwrap();
    kc.remove("b.com").unwrap();
    let snap = kc.dump().unwrap().unwrap();

    let mut restored = keychain();
    assert!(restored
        .load("pw1", &snap.contents, Some(&snap.checksum))
        .unwrap());
    for name in ["a.com", "b.com", "c.com", "d.com"] {
        assert_eq!(restored.get(name).unwrap(), kc.get(name).unwrap(), "{name}");
    }
}

#[test]
fn load_without_checksum_skips_rollback_check() {
    let mut kc = ready("pw1");
    kc.set("a.com", "secretA").unwrap();
    let snap = kc.dump().unwrap().unwrap();

    let mut restored = keychain();
    assert!(restored.load("pw1", &snap.contents, None).unwrap());
    assert_eq!(restored.get("a.com").unwrap().as_deref(), Some("secretA"));
}

#[test]
fn loaded_keychain_accepts_further_writes() {
    let mut kc = ready("pw1");
    kc.set("a.com", "secretA").unwrap();
    let snap = kc.dump().unwrap().unwrap();

    let mut restored = keychain();
    assert!(restored.load("pw1", &snap.contents, None).unwrap());
    restored.set("b.com", "secretB").unwrap();
    let again = restored.dump().unwrap().unwrap();

    let mut third = keychain();
    assert!(third.load("pw1", &again.contents, Some(&again.checksum)).unwrap());
    assert_eq!(third.get("a.com").unwrap().as_deref(), Some("secretA"));
    assert_eq!(third.get("b.com").unwrap().as_deref(), Some("secretB"));
}

#[test]
fn two_store_scenario() {
    let mut kc = ready("pw1");
    kc.set("a.com", "secretA").unwrap();
    kc.set("b.com", "secretB").unwrap();
    let snap = kc.dump().unwrap().unwrap();

    let mut restored = keychain();
    assert!(restored
        .load("pw1", &snap.contents, Some(&snap.checksum))
        .unwrap());
    assert_eq!(restored.get("a.com").unwrap().as_deref(), Some("secretA"));
    assert_eq!(restored.get("b.com").unwrap().as_deref(), Some("secretB"));

    let mut other = keychain();
    assert!(!other
        .load("wrong", &snap.contents, Some(&snap.checksum))
        .unwrap());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn set_get_roundtrip_survives_dump_and_load(
        entries in proptest::collection::btree_map("[a-z]{1,12}\\.com", "\\PC{0,16}", 1..8)
    ) {
        let mut kc = ready("prop-pw");
        for (name, value) in &entries {
            kc.set(name, value).unwrap();
            let got = kc.get(name).unwrap();
            prop_assert_eq!(got.as_ref(), Some(value));
        }

        let snap = kc.dump().unwrap().unwrap();
        let mut restored = keychain();
        prop_assert!(restored.load("prop-pw", &snap.contents, Some(&snap.checksum)).unwrap());
        for (name, value) in &entries {
            let got = restored.get(name).unwrap();
            prop_assert_eq!(got.as_ref(), Some(value));
        }
    }
}
