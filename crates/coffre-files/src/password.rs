//! Password acquisition collaborator
//!
//! The codec never prompts; whatever UI owns the terminal (or test harness)
//! implements this trait and hands passphrases over on demand.

use secrecy::{ExposeSecret, SecretString};

use coffre_core::CoffreResult;

/// Supplies the passphrase for private-key decryption.
pub trait PasswordSource {
    fn passphrase(&self) -> CoffreResult<SecretString>;
}

/// A fixed passphrase, for non-interactive callers and tests.
pub struct StaticPassword(SecretString);

impl StaticPassword {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self(SecretString::from(passphrase.into()))
    }
}

impl PasswordSource for StaticPassword {
    fn passphrase(&self) -> CoffreResult<SecretString> {
        Ok(SecretString::from(self.0.expose_secret().to_owned()))
    }
}
