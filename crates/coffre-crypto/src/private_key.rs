//! Password-protected private-key storage
//!
//! Container layout:
//! ```text
//! [4: algorithm tag][2: format version][16: salt][24: nonce][ciphertext + 16: tag]
//! ```
//!
//! The AEAD additional data is exactly `algorithm tag ‖ format version`, so
//! the prefix cannot be swapped onto a different key blob without failing
//! verification. The symmetric key is derived from the passphrase with
//! Argon2id over the embedded salt.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::generate;
use crate::kdf::{derive_password_key, KdfParams};
use coffre_core::{CoffreError, CoffreResult, NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// Algorithm tag for X25519 (Curve25519) private keys.
pub const ALGORITHM_TAG_X25519: [u8; 4] = *b"Cu25";

/// Private-key container format version.
pub const FORMAT_VERSION: [u8; 2] = [1, 0];

const PREFIX_LEN: usize = ALGORITHM_TAG_X25519.len() + FORMAT_VERSION.len();
const SALT_OFFSET: usize = PREFIX_LEN;
const NONCE_OFFSET: usize = SALT_OFFSET + SALT_SIZE;
const CIPHERTEXT_OFFSET: usize = NONCE_OFFSET + NONCE_SIZE;
const MIN_CONTAINER_LEN: usize = CIPHERTEXT_OFFSET + TAG_SIZE + 1;

/// Encrypt a private key for at-rest storage.
///
/// The key blob is consumed and zeroized when this returns, on success or
/// failure; only the container survives.
pub fn encrypt_private_key(
    passphrase: &SecretString,
    params: &KdfParams,
    private_key: Zeroizing<Vec<u8>>,
) -> CoffreResult<Vec<u8>> {
    let salt = generate::salt();
    let key = derive_password_key(passphrase, &salt, params)?;
    let nonce = generate::nonce();

    let mut ad = [0u8; PREFIX_LEN];
    ad[..4].copy_from_slice(&ALGORITHM_TAG_X25519);
    ad[4..].copy_from_slice(&FORMAT_VERSION);

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: &private_key,
                aad: &ad,
            },
        )
        .map_err(|e| CoffreError::Other(anyhow::anyhow!("private-key encryption failed: {e}")))?;

    let mut container = Vec::with_capacity(CIPHERTEXT_OFFSET + ciphertext.len());
    container.extend_from_slice(&ad);
    container.extend_from_slice(&salt);
    container.extend_from_slice(&nonce);
    container.extend_from_slice(&ciphertext);
    Ok(container)
}

/// Decrypt a stored private key with the owner's passphrase.
///
/// A wrong passphrase and a tampered container both surface as
/// `Authentication`; the two cases cannot be told apart.
pub fn decrypt_private_key(
    container: &[u8],
    passphrase: &SecretString,
    params: &KdfParams,
) -> CoffreResult<Zeroizing<Vec<u8>>> {
    if container.len() < MIN_CONTAINER_LEN {
        return Err(CoffreError::Format(format!(
            "private-key container is {} bytes (minimum {MIN_CONTAINER_LEN})",
            container.len()
        )));
    }
    if container[..4] != ALGORITHM_TAG_X25519 {
        return Err(CoffreError::Format("unknown key algorithm tag".into()));
    }
    if container[4..PREFIX_LEN] != FORMAT_VERSION {
        return Err(CoffreError::Format("unsupported key format version".into()));
    }

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&container[SALT_OFFSET..NONCE_OFFSET]);
    let nonce = &container[NONCE_OFFSET..CIPHERTEXT_OFFSET];
    let ciphertext = &container[CIPHERTEXT_OFFSET..];

    let key = derive_password_key(passphrase, &salt, params)?;
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: &container[..PREFIX_LEN],
            },
        )
        .map_err(|_| CoffreError::Authentication)?;

    Ok(Zeroizing::new(plaintext))
}
