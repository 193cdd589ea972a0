//! Chunk engine: sequential encrypt/decrypt loops over blocking file I/O
//!
//! Encryption writes the container prelude (ephemeral public key, salt,
//! header nonce), the encrypted header, then one chunk unit per `CHUNK_SIZE`
//! bytes of input. Decryption reverses it, failing closed on the first tag
//! that does not verify. On any failure the partially written output is
//! removed before the error propagates, so a bad run never leaves a file
//! that looks complete.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use coffre_core::{
    CoffreError, CoffreResult, CHUNK_SIZE, NONCE_SIZE, PUBLIC_KEY_SIZE, SALT_SIZE, TAG_SIZE,
};
use coffre_crypto::header::{self, FileHeader, ENCRYPTED_HEADER_LEN};
use coffre_crypto::keys::Kek;
use coffre_crypto::{chunk, generate};

use crate::housekeeping::{FsHousekeeping, Housekeeping};

/// Unencrypted fields leading every container.
pub const PRELUDE_LEN: usize = PUBLIC_KEY_SIZE + SALT_SIZE + NONCE_SIZE;

const UNIT_SIZE: u64 = (CHUNK_SIZE + TAG_SIZE) as u64;

/// The plaintext prefix of a container: everything the recipient needs to
/// recompute the KEK (see `coffre_crypto::kdf::recover_kek`) before calling
/// [`decrypt_file`].
#[derive(Debug, Clone)]
pub struct FilePrelude {
    pub ephemeral_public_key: [u8; PUBLIC_KEY_SIZE],
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
}

impl FilePrelude {
    /// Read the prelude fields from the start of an encrypted file.
    pub fn read(path: &Path) -> CoffreResult<Self> {
        let mut file = File::open(path)?;
        let mut bytes = [0u8; PRELUDE_LEN];
        file.read_exact(&mut bytes).map_err(|_| {
            CoffreError::Format("file too short to hold a container prelude".into())
        })?;

        let mut prelude = Self {
            ephemeral_public_key: [0u8; PUBLIC_KEY_SIZE],
            salt: [0u8; SALT_SIZE],
            nonce: [0u8; NONCE_SIZE],
        };
        prelude
            .ephemeral_public_key
            .copy_from_slice(&bytes[..PUBLIC_KEY_SIZE]);
        prelude
            .salt
            .copy_from_slice(&bytes[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + SALT_SIZE]);
        prelude
            .nonce
            .copy_from_slice(&bytes[PUBLIC_KEY_SIZE + SALT_SIZE..]);
        Ok(prelude)
    }
}

/// Result of encrypting a single file
#[derive(Debug)]
pub struct EncryptResult {
    pub output_path: PathBuf,
    /// Plaintext bytes consumed
    pub bytes: u64,
    /// Chunk units written
    pub chunks: u64,
}

/// Result of decrypting a single file
#[derive(Debug)]
pub struct DecryptResult {
    pub output_path: PathBuf,
    /// Plaintext bytes restored
    pub bytes: u64,
    /// Chunk units read
    pub chunks: u64,
    /// Length of the obfuscated name appended to the plaintext (0 if none);
    /// stripping it is housekeeping's job
    pub name_len: u32,
}

/// Encrypt `input` into the container at `output`.
///
/// The caller supplies the ephemeral public key and salt the KEK was derived
/// from (see `coffre_crypto::kdf::prepare_encryption`); the KEK is consumed
/// and zeroized once the header is written. `name_len` records how many
/// trailing plaintext bytes are an appended obfuscated file name (0 when the
/// feature is off).
pub fn encrypt_file(
    input: &Path,
    output: &Path,
    ephemeral_public_key: &[u8; PUBLIC_KEY_SIZE],
    salt: &[u8; SALT_SIZE],
    kek: Kek,
    name_len: u32,
) -> CoffreResult<EncryptResult> {
    encrypt_file_with(
        input,
        output,
        ephemeral_public_key,
        salt,
        kek,
        name_len,
        &FsHousekeeping::default(),
    )
}

/// [`encrypt_file`] with an explicit housekeeping collaborator for partial
/// output removal.
pub fn encrypt_file_with(
    input: &Path,
    output: &Path,
    ephemeral_public_key: &[u8; PUBLIC_KEY_SIZE],
    salt: &[u8; SALT_SIZE],
    kek: Kek,
    name_len: u32,
    housekeeping: &dyn Housekeeping,
) -> CoffreResult<EncryptResult> {
    debug!(input = %input.display(), output = %output.display(), "encrypting file");
    match encrypt_inner(input, output, ephemeral_public_key, salt, kek, name_len) {
        Ok(result) => Ok(result),
        Err(e) => {
            scrub_partial_output(housekeeping, output);
            Err(e)
        }
    }
}

fn encrypt_inner(
    input: &Path,
    output: &Path,
    ephemeral_public_key: &[u8; PUBLIC_KEY_SIZE],
    salt: &[u8; SALT_SIZE],
    kek: Kek,
    name_len: u32,
) -> CoffreResult<EncryptResult> {
    let plaintext_len = input.metadata()?.len();
    let mut reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);

    let dek = generate::data_encryption_key();
    let mut nonce = generate::nonce();
    let file_header = FileHeader::new(plaintext_len, name_len, dek);

    let ad = header::additional_data(plaintext_len, ephemeral_public_key);
    let encrypted_header = header::encrypt(&file_header, &nonce, &kek, &ad)?;
    drop(kek); // zeroized; only the DEK is needed from here on

    writer.write_all(ephemeral_public_key)?;
    writer.write_all(salt)?;
    writer.write_all(&nonce)?;
    writer.write_all(&encrypted_header)?;

    let mut ad = header::tag(&encrypted_header);
    let mut buf = Zeroizing::new(vec![0u8; CHUNK_SIZE]);
    let mut bytes = 0u64;
    let mut chunks = 0u64;

    loop {
        let n = read_full(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        chunk::increment_nonce(&mut nonce);
        let unit = chunk::encrypt_chunk(file_header.dek(), &nonce, &ad, &buf[..n])?;
        ad = chunk::tag(&unit)?;
        writer.write_all(&unit)?;
        bytes += n as u64;
        chunks += 1;
        if n < CHUNK_SIZE {
            break;
        }
    }
    writer.flush()?;

    debug!(bytes, chunks, "encryption complete");
    Ok(EncryptResult {
        output_path: output.to_path_buf(),
        bytes,
        chunks,
    })
}

/// Decrypt the container at `input` into `output`.
///
/// The KEK must have been recomputed from the container's prelude (see
/// [`FilePrelude::read`] and `coffre_crypto::kdf::recover_kek`); it is
/// consumed and zeroized once the header is decrypted.
pub fn decrypt_file(input: &Path, output: &Path, kek: Kek) -> CoffreResult<DecryptResult> {
    decrypt_file_with(input, output, kek, &FsHousekeeping::default())
}

/// [`decrypt_file`] with an explicit housekeeping collaborator for partial
/// output removal.
pub fn decrypt_file_with(
    input: &Path,
    output: &Path,
    kek: Kek,
    housekeeping: &dyn Housekeeping,
) -> CoffreResult<DecryptResult> {
    debug!(input = %input.display(), output = %output.display(), "decrypting file");
    match decrypt_inner(input, output, kek) {
        Ok(result) => Ok(result),
        Err(e) => {
            scrub_partial_output(housekeeping, output);
            Err(e)
        }
    }
}

fn decrypt_inner(input: &Path, output: &Path, kek: Kek) -> CoffreResult<DecryptResult> {
    let total_len = input.metadata()?.len();
    let min_len = (PRELUDE_LEN + ENCRYPTED_HEADER_LEN) as u64;
    if total_len < min_len {
        return Err(CoffreError::Format(format!(
            "container is {total_len} bytes (minimum {min_len})"
        )));
    }

    // Reconstruct the plaintext length from the container size alone: every
    // unit is full except possibly the last. The header AD then binds the
    // ciphertext to exactly this length, so a truncated or extended body
    // fails header verification.
    let body_len = total_len - min_len;
    let n_units = body_len.div_ceil(UNIT_SIZE);
    if n_units > 0 {
        let last_unit_len = body_len - (n_units - 1) * UNIT_SIZE;
        if last_unit_len <= TAG_SIZE as u64 {
            return Err(CoffreError::Format(
                "final chunk unit too short to hold a tag".into(),
            ));
        }
    }
    let plaintext_len = body_len - n_units * TAG_SIZE as u64;

    let prelude = FilePrelude::read(input)?;
    let mut reader = BufReader::new(File::open(input)?);
    let mut skip = [0u8; PRELUDE_LEN];
    reader.read_exact(&mut skip)?;

    let mut encrypted_header = [0u8; ENCRYPTED_HEADER_LEN];
    reader.read_exact(&mut encrypted_header)?;

    let ad = header::additional_data(plaintext_len, &prelude.ephemeral_public_key);
    let file_header = header::decrypt(&encrypted_header, &prelude.nonce, &kek, &ad)?;
    drop(kek);

    // Declared-length consistency: the header says how long the final chunk
    // is; the container must agree before any chunk is trusted.
    if u64::from(file_header.last_chunk_len()) != plaintext_len % CHUNK_SIZE as u64 {
        return Err(CoffreError::LengthMismatch);
    }

    let mut writer = BufWriter::new(File::create(output)?);
    let mut nonce = prelude.nonce;
    let mut ad = header::tag(&encrypted_header);
    let mut unit_buf = vec![0u8; chunk::MAX_UNIT_SIZE];
    let mut remaining = body_len;
    let mut bytes = 0u64;
    let mut chunks = 0u64;

    while remaining > 0 {
        let unit_len = remaining.min(UNIT_SIZE) as usize;
        reader.read_exact(&mut unit_buf[..unit_len])?;
        chunk::increment_nonce(&mut nonce);
        let plaintext = Zeroizing::new(chunk::decrypt_chunk(
            file_header.dek(),
            &nonce,
            &ad,
            &unit_buf[..unit_len],
        )?);
        ad = chunk::tag(&unit_buf[..unit_len])?;
        writer.write_all(&plaintext)?;
        bytes += plaintext.len() as u64;
        chunks += 1;
        remaining -= unit_len as u64;
    }
    writer.flush()?;

    if bytes != plaintext_len {
        return Err(CoffreError::LengthMismatch);
    }

    debug!(bytes, chunks, "decryption complete");
    Ok(DecryptResult {
        output_path: output.to_path_buf(),
        bytes,
        chunks,
        name_len: file_header.name_len(),
    })
}

/// Read until `buf` is full or the reader is exhausted; plain `read` may
/// return short counts mid-stream.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn scrub_partial_output(housekeeping: &dyn Housekeeping, path: &Path) {
    if let Err(e) = housekeeping.remove(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "failed to remove partial output: {e}");
        }
    }
}
