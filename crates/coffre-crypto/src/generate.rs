//! Random material: salts, nonces, data-encryption keys, keyfiles
//!
//! Everything here draws from the process CSPRNG. Entropy exhaustion is not
//! a recoverable condition (the operation cannot start without randomness),
//! so these functions are infallible and the RNG aborts the process if the
//! OS source is unavailable.

use rand::RngCore;
use zeroize::Zeroizing;

use crate::keys::Dek;
use coffre_core::{KEYFILE_SIZE, KEY_SIZE, NONCE_SIZE, SALT_SIZE};

/// Fresh KDF salt.
pub fn salt() -> [u8; SALT_SIZE] {
    random_array()
}

/// Fresh XChaCha20-Poly1305 starting nonce.
pub fn nonce() -> [u8; NONCE_SIZE] {
    random_array()
}

/// Fresh per-file data-encryption key.
pub fn data_encryption_key() -> Dek {
    Dek::from_bytes(random_array::<KEY_SIZE>())
}

/// Random contents for a new keyfile.
pub fn keyfile_bytes() -> Zeroizing<[u8; KEYFILE_SIZE]> {
    Zeroizing::new(random_array())
}

fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}
