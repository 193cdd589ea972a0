//! coffre-files: streaming file encryption over the coffre-crypto codec
//!
//! One file is one strictly sequential pipeline: the AD chain makes every
//! chunk depend on its predecessor's tag, so chunks cannot be processed out
//! of order. Independent files carry independent key/nonce state and may run
//! on separate worker threads.
//!
//! The engine owns failure cleanup (zeroed keys, deleted partial output) and
//! defers everything else to collaborator traits: password prompting
//! ([`PasswordSource`]), post-success bookkeeping and deletion
//! ([`Housekeeping`]), and platform secret-memory protection
//! ([`SecretGuard`]).

pub mod engine;
pub mod guard;
pub mod housekeeping;
pub mod keystore;
pub mod password;

pub use engine::{decrypt_file, encrypt_file, DecryptResult, EncryptResult, FilePrelude};
pub use guard::{NoopGuard, SecretGuard};
pub use housekeeping::{FsHousekeeping, Housekeeping};
pub use keystore::{read_private_key, write_private_key};
pub use password::{PasswordSource, StaticPassword};
