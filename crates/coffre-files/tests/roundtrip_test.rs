//! End-to-end container round-trips: encrypt to disk, recover the KEK from
//! the prelude, decrypt, compare bytes.

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tempfile::TempDir;

use coffre_core::{CoffreResult, CHUNK_SIZE, TAG_SIZE};
use coffre_crypto::header::ENCRYPTED_HEADER_LEN;
use coffre_crypto::kdf;
use coffre_crypto::keys::KeyPair;
use coffre_files::engine::{self, DecryptResult, FilePrelude, PRELUDE_LEN};

fn encrypt_to(tmp: &TempDir, content: &[u8]) -> (KeyPair, PathBuf, PathBuf) {
    let src = tmp.path().join("plain.bin");
    std::fs::write(&src, content).unwrap();
    let dst = tmp.path().join("plain.bin.cfr");

    let recipient = KeyPair::generate();
    let (epk, salt, kek) = kdf::prepare_encryption(recipient.public(), None).unwrap();
    engine::encrypt_file(&src, &dst, &epk, &salt, kek, 0).unwrap();

    (recipient, src, dst)
}

fn decrypt_with(
    recipient: &KeyPair,
    container: &Path,
    out: &Path,
) -> CoffreResult<DecryptResult> {
    let prelude = FilePrelude::read(container)?;
    let kek = kdf::recover_kek(
        &prelude.ephemeral_public_key,
        &prelude.salt,
        recipient.secret(),
        None,
    )?;
    engine::decrypt_file(container, out, kek)
}

fn roundtrip(content: &[u8]) -> DecryptResult {
    let tmp = TempDir::new().unwrap();
    let (recipient, _src, dst) = encrypt_to(&tmp, content);
    let out = tmp.path().join("restored.bin");

    let result = decrypt_with(&recipient, &dst, &out).expect("decryption should succeed");
    assert_eq!(std::fs::read(&out).unwrap(), content);
    result
}

#[test]
fn roundtrip_small_file() {
    let result = roundtrip(b"a modest amount of plaintext");
    assert_eq!(result.bytes, 28);
    assert_eq!(result.chunks, 1);
}

#[test]
fn roundtrip_empty_file() {
    let result = roundtrip(b"");
    assert_eq!(result.bytes, 0);
    assert_eq!(result.chunks, 0);
}

#[test]
fn empty_file_container_is_prelude_and_header_only() {
    let tmp = TempDir::new().unwrap();
    let (_recipient, _src, dst) = encrypt_to(&tmp, b"");
    let len = std::fs::metadata(&dst).unwrap().len();
    assert_eq!(len, (PRELUDE_LEN + ENCRYPTED_HEADER_LEN) as u64);
}

#[test]
fn roundtrip_exact_chunk_multiple() {
    // Length an exact multiple of the chunk size: the declared final-chunk
    // length is zero and must not confuse the accounting
    let result = roundtrip(&vec![0x5Au8; CHUNK_SIZE]);
    assert_eq!(result.chunks, 1);

    let result = roundtrip(&vec![0xA5u8; 2 * CHUNK_SIZE]);
    assert_eq!(result.chunks, 2);
}

#[test]
fn roundtrip_multi_chunk_with_partial_tail() {
    let mut content = vec![0u8; 2 * CHUNK_SIZE + 100];
    for (i, byte) in content.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    let result = roundtrip(&content);
    assert_eq!(result.chunks, 3);
    assert_eq!(result.bytes, content.len() as u64);
}

#[test]
fn container_size_matches_layout() {
    let tmp = TempDir::new().unwrap();
    let content = vec![7u8; CHUNK_SIZE + 10];
    let (_recipient, _src, dst) = encrypt_to(&tmp, &content);

    // prelude + header + full unit + partial unit
    let expected = PRELUDE_LEN + ENCRYPTED_HEADER_LEN + (CHUNK_SIZE + TAG_SIZE) + (10 + TAG_SIZE);
    assert_eq!(std::fs::metadata(&dst).unwrap().len(), expected as u64);
}

#[test]
fn roundtrip_two_party() {
    let tmp = TempDir::new().unwrap();
    let content = b"mutual key agreement between known parties";
    let src = tmp.path().join("plain.bin");
    std::fs::write(&src, content).unwrap();
    let dst = tmp.path().join("plain.bin.cfr");
    let out = tmp.path().join("restored.bin");

    let sender = KeyPair::generate();
    let recipient = KeyPair::generate();
    let (epk, salt, kek) =
        kdf::prepare_encryption(recipient.public(), Some(sender.secret())).unwrap();
    engine::encrypt_file(&src, &dst, &epk, &salt, kek, 0).unwrap();

    let prelude = FilePrelude::read(&dst).unwrap();
    let kek = kdf::recover_kek(
        &prelude.ephemeral_public_key,
        &prelude.salt,
        recipient.secret(),
        Some(sender.public()),
    )
    .unwrap();
    engine::decrypt_file(&dst, &out, kek).unwrap();

    assert_eq!(std::fs::read(&out).unwrap(), content);
}

#[test]
fn two_party_container_needs_sender_public() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("plain.bin");
    std::fs::write(&src, b"two-party only").unwrap();
    let dst = tmp.path().join("plain.bin.cfr");

    let sender = KeyPair::generate();
    let recipient = KeyPair::generate();
    let (epk, salt, kek) =
        kdf::prepare_encryption(recipient.public(), Some(sender.secret())).unwrap();
    engine::encrypt_file(&src, &dst, &epk, &salt, kek, 0).unwrap();

    // Recovering without the sender's public key lands on the one-party
    // path and a different KEK
    let out = tmp.path().join("restored.bin");
    let prelude = FilePrelude::read(&dst).unwrap();
    let kek = kdf::recover_kek(
        &prelude.ephemeral_public_key,
        &prelude.salt,
        recipient.secret(),
        None,
    )
    .unwrap();
    assert!(engine::decrypt_file(&dst, &out, kek).is_err());
}

#[test]
fn name_len_travels_through_the_header() {
    let tmp = TempDir::new().unwrap();
    let content = b"file body with an appended obfuscated name tail";
    let src = tmp.path().join("plain.bin");
    std::fs::write(&src, content).unwrap();
    let dst = tmp.path().join("plain.bin.cfr");
    let out = tmp.path().join("restored.bin");

    let recipient = KeyPair::generate();
    let (epk, salt, kek) = kdf::prepare_encryption(recipient.public(), None).unwrap();
    engine::encrypt_file(&src, &dst, &epk, &salt, kek, 9).unwrap();

    let result = decrypt_with(&recipient, &dst, &out).unwrap();
    assert_eq!(result.name_len, 9);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn roundtrip_arbitrary_lengths(
        data in proptest::collection::vec(any::<u8>(), 0..=(3 * CHUNK_SIZE + 257))
    ) {
        let tmp = TempDir::new().unwrap();
        let (recipient, _src, dst) = encrypt_to(&tmp, &data);
        let out = tmp.path().join("restored.bin");

        decrypt_with(&recipient, &dst, &out).unwrap();
        prop_assert_eq!(std::fs::read(&out).unwrap(), data);
    }
}
