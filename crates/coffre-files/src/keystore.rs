//! Encrypted private-key files on disk
//!
//! Thin I/O layer over `coffre_crypto::private_key`: the key pair is stored
//! as a password-protected container, and reading one asks the
//! [`PasswordSource`] collaborator for the passphrase.

use std::path::Path;

use secrecy::SecretString;
use zeroize::Zeroizing;

use coffre_core::{CoffreError, CoffreResult, KEY_SIZE};
use coffre_crypto::kdf::KdfParams;
use coffre_crypto::keys::KeyPair;
use coffre_crypto::private_key;

use crate::password::PasswordSource;

/// Encrypt a key pair's secret half and write the container to `path`.
pub fn write_private_key(
    path: &Path,
    passphrase: &SecretString,
    params: &KdfParams,
    keypair: &KeyPair,
) -> CoffreResult<()> {
    let blob = Zeroizing::new(keypair.secret_bytes().to_vec());
    let container = private_key::encrypt_private_key(passphrase, params, blob)?;
    std::fs::write(path, container)?;
    Ok(())
}

/// Read a private-key container from `path` and decrypt it with a passphrase
/// obtained from `source`.
pub fn read_private_key(
    path: &Path,
    source: &dyn PasswordSource,
    params: &KdfParams,
) -> CoffreResult<KeyPair> {
    let container = std::fs::read(path)?;
    let passphrase = source.passphrase()?;
    let blob = private_key::decrypt_private_key(&container, &passphrase, params)?;

    if blob.len() != KEY_SIZE {
        return Err(CoffreError::Format(format!(
            "decrypted private key is {} bytes (expected {KEY_SIZE})",
            blob.len()
        )));
    }
    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&blob);
    Ok(KeyPair::from_secret_bytes(bytes))
}
