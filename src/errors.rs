use thiserror::Error;

/// All errors that can occur in CredVault.
///
/// Wrong passwords are not errors from the caller's point of view:
/// `Keychain::load` reports them as `Ok(false)`.  Everything that signals
/// tampering (rollback, swap, corrupted ciphertext) is a hard error and is
/// never folded into "not found" or `false`.
#[derive(Debug, Error)]
pub enum KeychainError {
    // --- Lifecycle errors ---
    #[error("Keychain is not ready — call init or load before {operation}")]
    NotReady { operation: &'static str },

    // --- Integrity errors ---
    #[error("Authentication failed — wrong password or forged signature")]
    AuthenticationFailure,

    #[error("Rollback detected — snapshot does not match the trusted checksum")]
    RollbackDetected,

    #[error("Swap attack detected — record under {pseudonym} belongs to another domain")]
    SwapAttackDetected { pseudonym: String },

    #[error("Decryption failed — record ciphertext is corrupted")]
    DecryptionFailure,

    // --- Input errors ---
    #[error("Secret is {len} bytes, the maximum is {max}")]
    SecretTooLong { len: usize, max: usize },

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, KeychainError>;
