//! Encrypted file header
//!
//! Plaintext layout, fixed 40 bytes:
//! ```text
//! [4: last chunk plaintext length, u32 LE][4: appended name length, u32 LE][32: DEK]
//! ```
//!
//! The header is the only place the DEK travels, encrypted under the KEK
//! with the container's starting nonce. Its additional data is
//! (total plaintext length ‖ ephemeral public key), so a header cannot be
//! transplanted onto a file of a different size or onto a container built
//! with different key-exchange parameters. The trailing tag seeds the
//! chunk AD chain.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use zeroize::Zeroize;

use crate::keys::{Dek, Kek};
use coffre_core::{
    CoffreError, CoffreResult, CHUNK_SIZE, KEY_SIZE, NONCE_SIZE, PUBLIC_KEY_SIZE, TAG_SIZE,
};

/// Plaintext header length
pub const HEADER_LEN: usize = 4 + 4 + KEY_SIZE;

/// Encrypted header length including its tag
pub const ENCRYPTED_HEADER_LEN: usize = HEADER_LEN + TAG_SIZE;

/// Header additional-data length
pub const AD_LEN: usize = 8 + PUBLIC_KEY_SIZE;

/// Decoded file header.
pub struct FileHeader {
    last_chunk_len: u32,
    name_len: u32,
    dek: Dek,
}

impl FileHeader {
    /// Build a header for a file of `plaintext_len` bytes. `name_len` is the
    /// length of the obfuscated file name appended to the plaintext by the
    /// housekeeping layer, 0 when name obfuscation is off.
    pub fn new(plaintext_len: u64, name_len: u32, dek: Dek) -> Self {
        Self {
            last_chunk_len: (plaintext_len % CHUNK_SIZE as u64) as u32,
            name_len,
            dek,
        }
    }

    /// Declared plaintext length of the final chunk. Zero means the final
    /// chunk is full-size (or that the file is empty).
    pub fn last_chunk_len(&self) -> u32 {
        self.last_chunk_len
    }

    pub fn name_len(&self) -> u32 {
        self.name_len
    }

    pub fn dek(&self) -> &Dek {
        &self.dek
    }
}

impl std::fmt::Debug for FileHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHeader")
            .field("last_chunk_len", &self.last_chunk_len)
            .field("name_len", &self.name_len)
            .field("dek", &"[REDACTED]")
            .finish()
    }
}

/// Additional data binding the header to the file's total plaintext length
/// and the ephemeral public key it was keyed with.
pub fn additional_data(
    plaintext_len: u64,
    ephemeral_public_key: &[u8; PUBLIC_KEY_SIZE],
) -> [u8; AD_LEN] {
    let mut ad = [0u8; AD_LEN];
    ad[..8].copy_from_slice(&plaintext_len.to_le_bytes());
    ad[8..].copy_from_slice(ephemeral_public_key);
    ad
}

/// Encrypt a header under the KEK. Output is ciphertext ‖ tag, 56 bytes.
pub fn encrypt(
    header: &FileHeader,
    nonce: &[u8; NONCE_SIZE],
    kek: &Kek,
    ad: &[u8; AD_LEN],
) -> CoffreResult<[u8; ENCRYPTED_HEADER_LEN]> {
    let mut plaintext = [0u8; HEADER_LEN];
    plaintext[..4].copy_from_slice(&header.last_chunk_len.to_le_bytes());
    plaintext[4..8].copy_from_slice(&header.name_len.to_le_bytes());
    plaintext[8..].copy_from_slice(header.dek.as_bytes());

    let cipher = XChaCha20Poly1305::new(kek.as_bytes().into());
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: &plaintext,
                aad: ad,
            },
        )
        .map_err(|e| CoffreError::Other(anyhow::anyhow!("header encryption failed: {e}")));
    plaintext.zeroize();
    let ciphertext = ciphertext?;

    let mut out = [0u8; ENCRYPTED_HEADER_LEN];
    out.copy_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt and decode a header. Fails with `Authentication` when the tag
/// does not verify: wrong KEK, altered ciphertext, or additional data that
/// disagrees with the observed file (size or ephemeral public key).
pub fn decrypt(
    encrypted: &[u8],
    nonce: &[u8; NONCE_SIZE],
    kek: &Kek,
    ad: &[u8; AD_LEN],
) -> CoffreResult<FileHeader> {
    if encrypted.len() != ENCRYPTED_HEADER_LEN {
        return Err(CoffreError::Format(format!(
            "encrypted header is {} bytes (expected {ENCRYPTED_HEADER_LEN})",
            encrypted.len()
        )));
    }

    let cipher = XChaCha20Poly1305::new(kek.as_bytes().into());
    let mut plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: encrypted,
                aad: ad,
            },
        )
        .map_err(|_| CoffreError::Authentication)?;

    let last_chunk_len = u32::from_le_bytes([plaintext[0], plaintext[1], plaintext[2], plaintext[3]]);
    let name_len = u32::from_le_bytes([plaintext[4], plaintext[5], plaintext[6], plaintext[7]]);
    let mut dek_bytes = [0u8; KEY_SIZE];
    dek_bytes.copy_from_slice(&plaintext[8..]);
    plaintext.zeroize();

    Ok(FileHeader {
        last_chunk_len,
        name_len,
        dek: Dek::from_bytes(dek_bytes),
    })
}

/// The header's authentication tag, seed of the chunk AD chain.
pub fn tag(encrypted: &[u8; ENCRYPTED_HEADER_LEN]) -> [u8; TAG_SIZE] {
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&encrypted[HEADER_LEN..]);
    tag
}
