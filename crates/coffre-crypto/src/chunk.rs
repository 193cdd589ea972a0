//! Per-chunk XChaCha20-Poly1305 with tag-chaining additional data
//!
//! A chunk unit on disk is `ciphertext ‖ 16-byte tag`; the plaintext is at
//! most `CHUNK_SIZE` bytes. The AD for a chunk is the authentication tag of
//! the unit before it (the encrypted header for the first chunk), so a
//! chunk only verifies in exactly the position it was written in. Nonces
//! are consumed in order: one little-endian increment of the header nonce
//! per chunk.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};

use crate::keys::Dek;
use coffre_core::{CoffreError, CoffreResult, CHUNK_SIZE, NONCE_SIZE, TAG_SIZE};

/// Largest chunk unit on disk: full plaintext chunk plus tag.
pub const MAX_UNIT_SIZE: usize = CHUNK_SIZE + TAG_SIZE;

/// Encrypt one plaintext chunk. `ad` is the previous unit's tag.
pub fn encrypt_chunk(
    dek: &Dek,
    nonce: &[u8; NONCE_SIZE],
    ad: &[u8; TAG_SIZE],
    plaintext: &[u8],
) -> CoffreResult<Vec<u8>> {
    debug_assert!(plaintext.len() <= CHUNK_SIZE);

    let cipher = XChaCha20Poly1305::new(dek.as_bytes().into());
    cipher
        .encrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad: ad,
            },
        )
        .map_err(|e| CoffreError::Other(anyhow::anyhow!("chunk encryption failed: {e}")))
}

/// Decrypt one chunk unit. Fails with `Authentication` when the tag does
/// not verify against the expected key, nonce, and chain position.
pub fn decrypt_chunk(
    dek: &Dek,
    nonce: &[u8; NONCE_SIZE],
    ad: &[u8; TAG_SIZE],
    unit: &[u8],
) -> CoffreResult<Vec<u8>> {
    if unit.len() <= TAG_SIZE || unit.len() > MAX_UNIT_SIZE {
        return Err(CoffreError::Format(format!(
            "chunk unit is {} bytes (expected {} to {MAX_UNIT_SIZE})",
            unit.len(),
            TAG_SIZE + 1
        )));
    }

    let cipher = XChaCha20Poly1305::new(dek.as_bytes().into());
    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: unit,
                aad: ad,
            },
        )
        .map_err(|_| CoffreError::Authentication)
}

/// The unit's trailing authentication tag — the next chunk's AD.
pub fn tag(unit: &[u8]) -> CoffreResult<[u8; TAG_SIZE]> {
    if unit.len() < TAG_SIZE {
        return Err(CoffreError::Format(format!(
            "chunk unit too short for a tag: {} bytes",
            unit.len()
        )));
    }
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&unit[unit.len() - TAG_SIZE..]);
    Ok(tag)
}

/// Increment a nonce by one, little-endian with carry (libsodium
/// `sodium_increment` semantics).
pub fn increment_nonce(nonce: &mut [u8; NONCE_SIZE]) {
    for byte in nonce.iter_mut() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}
