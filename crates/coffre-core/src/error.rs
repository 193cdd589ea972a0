use thiserror::Error;

pub type CoffreResult<T> = Result<T, CoffreError>;

/// Failure taxonomy for encryption and decryption operations.
///
/// Every cryptographic verification failure during decryption maps to the
/// single `Authentication` variant; the display string does not distinguish
/// a wrong password from tampered data.
#[derive(Debug, Error)]
pub enum CoffreError {
    /// Authentication tag verification failed: wrong key/password, or the
    /// ciphertext, additional data, or chunk order was altered.
    #[error("incorrect password/key, or the data has been tampered with or corrupted")]
    Authentication,

    /// The plaintext length declared in the header disagrees with the
    /// reconstructed output (truncation or extension of the container).
    #[error("decrypted length does not match the declared length")]
    LengthMismatch,

    /// The container is structurally invalid before any cryptography runs
    /// (too short, unknown algorithm tag, unsupported version).
    #[error("malformed container: {0}")]
    Format(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
