//! Edge case tests: malformed input, tampered armor, codec mismatches,
//! unusual names and messages, and failures that must not leave records.

use std::sync::Arc;

use agentic_keyring::armor::{decode_block, encode_block};
use agentic_keyring::identity::{BincodeCodec, JsonCodec, RecordCodec};
use agentic_keyring::{
    verify, HdPath, Identity, IdentityKind, KdfParams, KeyValueStore, Keybase, KeybaseConfig,
    KeyringError, Language, MemoryStore, PublicKey, SigningAlgo,
};

const WORDS: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn fast_config() -> KeybaseConfig {
    KeybaseConfig::new().with_kdf(KdfParams::new(64, 1, 1))
}

fn keybase() -> Keybase {
    Keybase::in_memory(fast_config())
}

/// Rebuild an armor with one header replaced.
fn with_header(armor: &str, key: &str, value: &str) -> String {
    let block = decode_block(armor).unwrap();
    let headers: Vec<(&str, String)> = block
        .headers
        .iter()
        .map(|(k, v)| {
            if k == key {
                (k.as_str(), value.to_string())
            } else {
                (k.as_str(), v.clone())
            }
        })
        .collect();
    encode_block(&block.block_type, &headers, &block.body)
}

// === Validation leaves nothing behind ===

#[test]
fn edge_unsupported_parameters_write_nothing() {
    let kb = keybase();
    assert!(matches!(
        kb.create_mnemonic("a", Language::Japanese, "pw", SigningAlgo::Secp256k1),
        Err(KeyringError::UnsupportedLanguage)
    ));
    assert!(matches!(
        kb.create_mnemonic("a", Language::English, "pw", SigningAlgo::Ed25519),
        Err(KeyringError::UnsupportedAlgorithm)
    ));
    assert!(kb.list().unwrap().is_empty());
}

#[test]
fn edge_bad_checksum_mnemonic() {
    let kb = keybase();
    let bad = WORDS.replace("about", "abandon");
    let err = kb.restore_from_mnemonic("a", &bad, "pw").unwrap_err();
    assert!(matches!(err, KeyringError::InvalidMnemonic(_)));
    assert!(err.is_validation());
    assert!(kb.list().unwrap().is_empty());
}

#[test]
fn edge_mnemonic_whitespace_is_normalized() {
    let spaced = format!("  {}  ", WORDS.replace(' ', "   \t"));
    let a = keybase().restore_from_mnemonic("a", &spaced, "pw").unwrap();
    let b = keybase().restore_from_mnemonic("a", WORDS, "pw").unwrap();
    assert_eq!(a.public_key, b.public_key);
}

#[test]
fn edge_invalid_paths() {
    for bad in ["", "m", "m/", "m/44'/x", "m/44''", "m/4294967295'", "m//0"] {
        assert!(
            bad.parse::<HdPath>().is_err(),
            "path {bad:?} should be rejected"
        );
    }
    let path: HdPath = "44h/118h/0h/0/0".parse().unwrap();
    assert_eq!(path.to_string(), "m/44'/118'/0'/0/0");
}

#[test]
fn edge_invalid_public_keys() {
    assert!(PublicKey::from_hex("zz").is_err());
    assert!(PublicKey::from_bytes(&[0x02; 10]).is_err());
    assert!(PublicKey::from_bytes(&[0x05; 33]).is_err());
}

// === Tampered armor ===

#[test]
fn edge_corrupted_info_armor_rejected() {
    let kb = keybase();
    kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();
    let armor = kb.export("alice").unwrap();

    let truncated = &armor[..armor.len() / 2];
    assert!(matches!(
        kb.import("copy", truncated),
        Err(KeyringError::MalformedArmor(_))
    ));

    let wrong_type = armor.replace("KEYRING KEY INFO", "KEYRING PUBLIC KEY");
    assert!(matches!(
        kb.import("copy", &wrong_type),
        Err(KeyringError::MalformedArmor(_))
    ));
    assert!(kb.lookup("copy").is_err());
}

#[test]
fn edge_public_armor_is_not_a_record() {
    let kb = keybase();
    kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();
    let public = kb.export_public("alice").unwrap();
    assert!(kb.import("copy", &public).is_err());
    assert!(kb.import_public("copy", &kb.export("alice").unwrap()).is_err());
}

#[test]
fn edge_unknown_armor_version_rejected() {
    let kb = keybase();
    kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();
    let armor = with_header(&kb.export_public("alice").unwrap(), "version", "9");
    assert!(matches!(
        kb.import_public("copy", &armor),
        Err(KeyringError::MalformedArmor(_))
    ));
}

#[test]
fn edge_private_armor_kdf_bounds_checked() {
    use agentic_keyring::armor::{encrypt_armor_private_key, unarmor_decrypt_private_key};
    use agentic_keyring::PrivateKey;

    let key = PrivateKey::from_bytes(&[7u8; 32]).unwrap();
    let armor = encrypt_armor_private_key(&key, "pw", &KdfParams::new(64, 1, 1)).unwrap();

    let huge = with_header(&armor, "kdf-params", "m=4294967295,t=1,p=1");
    assert!(matches!(
        unarmor_decrypt_private_key(&huge, "pw"),
        Err(KeyringError::MalformedArmor(_))
    ));

    // Below what Argon2 accepts: rejected as armor, never reaching the KDF.
    for low in ["m=1,t=0,p=0", "m=64,t=0,p=1", "m=8,t=1,p=2"] {
        let tampered = with_header(&armor, "kdf-params", low);
        assert!(
            matches!(
                unarmor_decrypt_private_key(&tampered, "pw"),
                Err(KeyringError::MalformedArmor(_))
            ),
            "kdf-params {low} should be malformed"
        );
    }

    // In-range but different parameters derive a different key.
    let altered = with_header(&armor, "kdf-params", "m=128,t=1,p=1");
    assert!(matches!(
        unarmor_decrypt_private_key(&altered, "pw"),
        Err(KeyringError::DecryptionFailed)
    ));
}

#[test]
fn edge_tampered_kdf_params_in_stored_record() {
    let store = Arc::new(MemoryStore::new());
    let kb = Keybase::new(store.clone(), fast_config());
    let identity = kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();
    let IdentityKind::Local {
        private_key_armor: Some(armor),
    } = &identity.kind
    else {
        panic!("expected a local record");
    };

    let tampered = Identity::local(
        "alice",
        identity.public_key.clone(),
        with_header(armor, "kdf-params", "m=1,t=0,p=0"),
    );
    store
        .set(b"alice.info", &BincodeCodec.encode(&tampered).unwrap())
        .unwrap();

    assert!(matches!(
        kb.sign("alice", "pw", b"m"),
        Err(KeyringError::MalformedArmor(_))
    ));
    assert!(matches!(
        kb.delete("alice", "pw"),
        Err(KeyringError::MalformedArmor(_))
    ));
    assert!(matches!(
        kb.rotate_passphrase("alice", "pw", || Ok("new".into())),
        Err(KeyringError::MalformedArmor(_))
    ));
    assert!(kb.lookup("alice").is_ok());
}

// === Codecs ===

#[test]
fn edge_codec_mismatch_is_a_serialization_error() {
    let store = Arc::new(MemoryStore::new());
    let writer = Keybase::new(store.clone(), fast_config().with_codec(Arc::new(JsonCodec)));
    writer.restore_from_mnemonic("alice", WORDS, "pw").unwrap();

    let reader = Keybase::new(store, fast_config().with_codec(Arc::new(BincodeCodec)));
    assert!(matches!(
        reader.lookup("alice"),
        Err(KeyringError::SerializationError(_))
    ));
}

// === Names and messages ===

#[test]
fn edge_unicode_and_punctuated_names() {
    let kb = keybase();
    for name in ["ålice", "名前", "a.b", "a/b", "with space"] {
        kb.restore_from_mnemonic(name, WORDS, "").unwrap();
        assert_eq!(kb.lookup(name).unwrap().name, name);
    }
    assert_eq!(kb.list().unwrap().len(), 5);
}

#[test]
fn edge_empty_and_large_messages() {
    let kb = keybase();
    kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();

    let (sig, pk) = kb.sign("alice", "pw", b"").unwrap();
    verify(&pk, b"", &sig).unwrap();

    let large = vec![0xABu8; 1 << 20];
    let (sig, pk) = kb.sign("alice", "pw", &large).unwrap();
    verify(&pk, &large, &sig).unwrap();
    assert!(verify(&pk, &large[1..], &sig).is_err());
}

#[test]
fn edge_delete_twice() {
    let kb = keybase();
    kb.restore_from_mnemonic("alice", WORDS, "").unwrap();
    kb.delete("alice", "yes").unwrap();
    assert!(matches!(
        kb.delete("alice", "yes"),
        Err(KeyringError::NotFound(_))
    ));
    // the name is free again
    kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();
}

#[test]
fn edge_confirmation_is_exact() {
    let kb = keybase();
    kb.restore_from_mnemonic("w", WORDS, "").unwrap();
    for almost in ["YES", "yes ", " yes", "y", ""] {
        assert!(matches!(
            kb.delete("w", almost),
            Err(KeyringError::ConfirmationRequired)
        ));
    }
    assert!(kb.lookup("w").is_ok());
}

#[test]
fn edge_wrong_passphrase_never_leaks_detail() {
    let kb = keybase();
    kb.restore_from_mnemonic("alice", WORDS, "correct horse").unwrap();
    let err = kb.sign("alice", "correct hors", b"m").unwrap_err();
    let message = err.to_string();
    assert_eq!(message, "Wrong passphrase");
    assert!(!message.contains("correct"));
}
