//! Key derivation: X25519 agreement → keyed BLAKE2b-256 → KEK,
//! and Argon2id passphrase hashing for private-key protection

use argon2::{Algorithm, Argon2, Params, Version};
use blake2::digest::consts::U32;
use blake2::digest::Mac;
use blake2::Blake2bMac;
use secrecy::{ExposeSecret, SecretString};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::generate;
use crate::keys::{Kek, KeyPair, SharedSecret};
use coffre_core::{CoffreError, CoffreResult, KEY_SIZE, PUBLIC_KEY_SIZE, SALT_SIZE};

type Blake2bKdf = Blake2bMac<U32>;

/// Argon2id cost parameters for passphrase-based derivation
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl From<&coffre_core::CryptoConfig> for KdfParams {
    fn from(config: &coffre_core::CryptoConfig) -> Self {
        Self {
            mem_cost_kib: config.argon2_mem_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// X25519 Diffie-Hellman between our secret and a peer's public key.
pub fn agree(secret: &StaticSecret, public: &PublicKey) -> SharedSecret {
    SharedSecret::from_bytes(secret.diffie_hellman(public).to_bytes())
}

/// Derive a KEK from both shared secrets (mutual key agreement).
///
/// Input keying material is static ‖ ephemeral. Both shared secrets are
/// consumed and zeroized here; the caller cannot reuse them.
pub fn derive_kek(
    static_shared: SharedSecret,
    ephemeral_shared: SharedSecret,
    salt: &[u8; SALT_SIZE],
) -> CoffreResult<Kek> {
    let mut ikm = [0u8; KEY_SIZE * 2];
    ikm[..KEY_SIZE].copy_from_slice(static_shared.as_bytes());
    ikm[KEY_SIZE..].copy_from_slice(ephemeral_shared.as_bytes());
    let kek = keyed_blake2b(&ikm, salt);
    ikm.zeroize();
    kek
}

/// Derive a KEK from the ephemeral shared secret alone (anonymous-recipient
/// and self-encryption flows, where no long-term sender key exists).
pub fn derive_kek_ephemeral(
    ephemeral_shared: SharedSecret,
    salt: &[u8; SALT_SIZE],
) -> CoffreResult<Kek> {
    keyed_blake2b(ephemeral_shared.as_bytes(), salt)
}

/// Keyed BLAKE2b-256: key = input keying material, message = salt.
fn keyed_blake2b(ikm: &[u8], salt: &[u8; SALT_SIZE]) -> CoffreResult<Kek> {
    let mut mac = Blake2bKdf::new_from_slice(ikm)
        .map_err(|e| CoffreError::Other(anyhow::anyhow!("BLAKE2b key setup: {e}")))?;
    mac.update(salt);
    let mut okm = mac.finalize().into_bytes();

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&okm);
    okm.as_mut_slice().zeroize();
    Ok(Kek::from_bytes(key))
}

/// Derive a symmetric key from a passphrase and salt using Argon2id.
///
/// Deterministic for identical inputs, so the decrypting side recomputes the
/// same key from the salt embedded in the container.
pub fn derive_password_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> CoffreResult<Kek> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CoffreError::Other(anyhow::anyhow!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| CoffreError::Other(anyhow::anyhow!("Argon2id KDF failed: {e}")))?;

    Ok(Kek::from_bytes(key))
}

/// Everything the sender needs before writing a container: a fresh salt, the
/// ephemeral public key that leads the file, and the derived KEK.
///
/// With `sender_secret` the two-party path is used (the recipient must know
/// the sender's public key to decrypt); without it, the ephemeral-only path.
pub fn prepare_encryption(
    recipient_public: &PublicKey,
    sender_secret: Option<&StaticSecret>,
) -> CoffreResult<([u8; PUBLIC_KEY_SIZE], [u8; SALT_SIZE], Kek)> {
    let salt = generate::salt();
    let ephemeral = KeyPair::generate();
    let ephemeral_shared = agree(ephemeral.secret(), recipient_public);

    let kek = match sender_secret {
        Some(secret) => derive_kek(agree(secret, recipient_public), ephemeral_shared, &salt)?,
        None => derive_kek_ephemeral(ephemeral_shared, &salt)?,
    };

    Ok((*ephemeral.public().as_bytes(), salt, kek))
}

/// Recompute the KEK on the recipient side from the container's ephemeral
/// public key and salt. `sender_public` must be given exactly when the file
/// was encrypted on the two-party path.
pub fn recover_kek(
    ephemeral_public_key: &[u8; PUBLIC_KEY_SIZE],
    salt: &[u8; SALT_SIZE],
    recipient_secret: &StaticSecret,
    sender_public: Option<&PublicKey>,
) -> CoffreResult<Kek> {
    let ephemeral_public = PublicKey::from(*ephemeral_public_key);
    let ephemeral_shared = agree(recipient_secret, &ephemeral_public);

    match sender_public {
        Some(public) => derive_kek(agree(recipient_secret, public), ephemeral_shared, salt),
        None => derive_kek_ephemeral(ephemeral_shared, salt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_kek_derivation_deterministic() {
        let salt = [3u8; SALT_SIZE];
        let a = derive_kek(
            SharedSecret::from_bytes([1u8; KEY_SIZE]),
            SharedSecret::from_bytes([2u8; KEY_SIZE]),
            &salt,
        )
        .unwrap();
        let b = derive_kek(
            SharedSecret::from_bytes([1u8; KEY_SIZE]),
            SharedSecret::from_bytes([2u8; KEY_SIZE]),
            &salt,
        )
        .unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_kek_derivation_salt_sensitive() {
        let a = derive_kek(
            SharedSecret::from_bytes([1u8; KEY_SIZE]),
            SharedSecret::from_bytes([2u8; KEY_SIZE]),
            &[3u8; SALT_SIZE],
        )
        .unwrap();
        let b = derive_kek(
            SharedSecret::from_bytes([1u8; KEY_SIZE]),
            SharedSecret::from_bytes([2u8; KEY_SIZE]),
            &[4u8; SALT_SIZE],
        )
        .unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_one_party_and_two_party_paths_differ() {
        let salt = [5u8; SALT_SIZE];
        let two = derive_kek(
            SharedSecret::from_bytes([1u8; KEY_SIZE]),
            SharedSecret::from_bytes([2u8; KEY_SIZE]),
            &salt,
        )
        .unwrap();
        let one = derive_kek_ephemeral(SharedSecret::from_bytes([2u8; KEY_SIZE]), &salt).unwrap();
        assert_ne!(two.as_bytes(), one.as_bytes());
    }

    #[test]
    fn test_agreement_is_symmetric() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let from_alice = agree(alice.secret(), bob.public());
        let from_bob = agree(bob.secret(), alice.public());
        assert_eq!(from_alice.as_bytes(), from_bob.as_bytes());
    }

    #[test]
    fn test_prepare_and_recover_kek_one_party() {
        let recipient = KeyPair::generate();
        let (epk, salt, kek) = prepare_encryption(recipient.public(), None).unwrap();
        let recovered = recover_kek(&epk, &salt, recipient.secret(), None).unwrap();
        assert_eq!(kek.as_bytes(), recovered.as_bytes());
    }

    #[test]
    fn test_prepare_and_recover_kek_two_party() {
        let sender = KeyPair::generate();
        let recipient = KeyPair::generate();

        let (epk, salt, kek) =
            prepare_encryption(recipient.public(), Some(sender.secret())).unwrap();
        let recovered =
            recover_kek(&epk, &salt, recipient.secret(), Some(sender.public())).unwrap();
        assert_eq!(kek.as_bytes(), recovered.as_bytes());
    }

    #[test]
    fn test_recover_kek_wrong_recipient() {
        let recipient = KeyPair::generate();
        let stranger = KeyPair::generate();

        let (epk, salt, kek) = prepare_encryption(recipient.public(), None).unwrap();
        let recovered = recover_kek(&epk, &salt, stranger.secret(), None).unwrap();
        assert_ne!(kek.as_bytes(), recovered.as_bytes());
    }

    #[test]
    fn test_password_key_deterministic() {
        let passphrase = SecretString::from("correct horse battery staple");
        let salt = [9u8; SALT_SIZE];
        let params = fast_params();

        let a = derive_password_key(&passphrase, &salt, &params).unwrap();
        let b = derive_password_key(&passphrase, &salt, &params).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_password_key_passphrase_sensitive() {
        let salt = [9u8; SALT_SIZE];
        let params = fast_params();

        let a = derive_password_key(&SecretString::from("passphrase-a"), &salt, &params).unwrap();
        let b = derive_password_key(&SecretString::from("passphrase-b"), &salt, &params).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_kdf_params_from_config() {
        let config = coffre_core::CryptoConfig::default();
        let params = KdfParams::from(&config);
        assert_eq!(params.mem_cost_kib, 65536);
        assert_eq!(params.time_cost, 3);
        assert_eq!(params.parallelism, 4);
    }
}
