//! coffre-crypto: authenticated file-encryption codec
//!
//! On-disk file container:
//! ```text
//! [32: ephemeral X25519 public key][16: salt][24: header nonce]
//! [56: encrypted header + tag][chunk units...]
//! ```
//!
//! Every chunk unit is `CHUNK_SIZE` plaintext bytes plus a 16-byte tag,
//! except the final one, which holds `plaintext_len % CHUNK_SIZE` bytes
//! (a full unit when the length is a nonzero multiple of the chunk size).
//!
//! Key schedule:
//! ```text
//! X25519 shared secret(s) + salt ──keyed BLAKE2b-256──▶ KEK (header only)
//! header plaintext: [4: last chunk len][4: name len][32: DEK]
//! DEK (random per file) encrypts the chunk units
//! ```
//!
//! Nonces count up from the header nonce, one increment per chunk, so no
//! (key, nonce) pair repeats within a file. Additional data chains the
//! units together: the header's AD is (plaintext length ‖ ephemeral public
//! key), chunk 1's AD is the header tag, and every later chunk's AD is the
//! previous chunk's tag. Reordering, duplicating, or dropping a unit breaks
//! the chain and fails tag verification.

pub mod chunk;
pub mod generate;
pub mod header;
pub mod kdf;
pub mod keys;
pub mod private_key;

pub use chunk::{decrypt_chunk, encrypt_chunk, increment_nonce};
pub use header::FileHeader;
pub use kdf::{
    agree, derive_kek, derive_kek_ephemeral, derive_password_key, prepare_encryption, recover_kek,
    KdfParams,
};
pub use keys::{Dek, Kek, KeyPair, SharedSecret};
pub use private_key::{decrypt_private_key, encrypt_private_key};

pub use coffre_core::{
    CHUNK_SIZE, KEYFILE_SIZE, KEY_SIZE, NONCE_SIZE, PUBLIC_KEY_SIZE, SALT_SIZE, TAG_SIZE,
};
