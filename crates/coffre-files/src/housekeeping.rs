//! Post-processing and deletion collaborator
//!
//! The engine reports success or failure; what happens to the original file
//! afterwards (overwrite-in-place, name-obfuscation bookkeeping) and how
//! partial output is scrubbed lives behind this trait.

use std::io;
use std::path::Path;

use coffre_core::BehaviorConfig;

/// File bookkeeping around an encrypt/decrypt operation.
pub trait Housekeeping {
    /// Invoked by the caller only after the engine reports success.
    fn finalize(&self, original: &Path, output: &Path) -> io::Result<()>;

    /// Remove a file; invoked by the engine to scrub partial output on
    /// failure.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Default filesystem housekeeping driven by [`BehaviorConfig`].
#[derive(Debug, Clone, Default)]
pub struct FsHousekeeping {
    behavior: BehaviorConfig,
}

impl FsHousekeeping {
    pub fn new(behavior: BehaviorConfig) -> Self {
        Self { behavior }
    }
}

impl Housekeeping for FsHousekeeping {
    fn finalize(&self, original: &Path, output: &Path) -> io::Result<()> {
        if self.behavior.overwrite_cleartext {
            // Replace the cleartext original with the encrypted output
            std::fs::rename(output, original)?;
        }
        // Name-obfuscation rename bookkeeping is the caller's concern; the
        // engine only accounts for the appended name length in the header.
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_finalize_overwrite() {
        let tmp = TempDir::new().unwrap();
        let original = tmp.path().join("notes.txt");
        let output = tmp.path().join("notes.txt.cfr");
        std::fs::write(&original, b"cleartext").unwrap();
        std::fs::write(&output, b"ciphertext").unwrap();

        let housekeeping = FsHousekeeping::new(BehaviorConfig {
            overwrite_cleartext: true,
            obfuscate_names: false,
        });
        housekeeping.finalize(&original, &output).unwrap();

        assert!(!output.exists());
        assert_eq!(std::fs::read(&original).unwrap(), b"ciphertext");
    }

    #[test]
    fn test_finalize_keep_both() {
        let tmp = TempDir::new().unwrap();
        let original = tmp.path().join("notes.txt");
        let output = tmp.path().join("notes.txt.cfr");
        std::fs::write(&original, b"cleartext").unwrap();
        std::fs::write(&output, b"ciphertext").unwrap();

        FsHousekeeping::default()
            .finalize(&original, &output)
            .unwrap();

        assert!(original.exists());
        assert!(output.exists());
    }

    #[test]
    fn test_remove() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partial.cfr");
        std::fs::write(&path, b"half a container").unwrap();

        FsHousekeeping::default().remove(&path).unwrap();
        assert!(!path.exists());
    }
}
