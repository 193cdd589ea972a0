//! coffre-core: shared error taxonomy, configuration schema, and format constants

pub mod config;
pub mod error;

pub use config::{BehaviorConfig, CoffreConfig, CryptoConfig};
pub use error::{CoffreError, CoffreResult};

/// Size of a symmetric encryption key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of a KDF salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of an X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Plaintext bytes per encrypted chunk (16 KiB)
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Size of a generated keyfile in bytes
pub const KEYFILE_SIZE: usize = 64;
