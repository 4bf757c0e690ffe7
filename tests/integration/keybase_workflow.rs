//! Integration test: keybase lifecycle across all three identity kinds.
//!
//! Covers:
//! 1. Create / restore / derive local identities
//! 2. Sign through the local, hardware and offline branches
//! 3. Export and import records and public keys between keybases
//! 4. Passphrase rotation and deletion rules
//! 5. Persistence through a file-backed store

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use agentic_keyring::crypto::provider::Secp256k1Provider;
use agentic_keyring::crypto::signing;
use agentic_keyring::identity::JsonCodec;
use agentic_keyring::keybase::derive::derive_key;
use agentic_keyring::{
    signature_to_base64, verify, Bip44Params, ChannelSigner, DeviceRef, HardwareDevice, HdPath,
    IdentityKind, KdfParams, Keybase, KeybaseConfig, KeyringError, Language, Mnemonic, PublicKey,
    Result, SigningAlgo,
};

const WORDS: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const OTHER_WORDS: &str = "legal winner thank year wave sausage worth useful legal winner thank yellow";

fn fast_config() -> KeybaseConfig {
    KeybaseConfig::new().with_kdf(KdfParams::new(64, 1, 1))
}

fn keybase() -> Keybase {
    Keybase::in_memory(fast_config())
}

// ── Test doubles ──────────────────────────────────────────────────────────────

/// A hardware device backed by a mnemonic held in memory.
struct MockDevice {
    id: &'static str,
    words: &'static str,
    delay: Duration,
    broken: bool,
}

impl MockDevice {
    fn new(id: &'static str) -> Self {
        Self {
            id,
            words: OTHER_WORDS,
            delay: Duration::ZERO,
            broken: false,
        }
    }

    fn key_at(&self, path: &HdPath) -> Result<agentic_keyring::PrivateKey> {
        if self.broken {
            return Err(KeyringError::DeviceUnavailable("usb handshake failed".into()));
        }
        thread::sleep(self.delay);
        derive_key(&Secp256k1Provider, &Mnemonic::parse(self.words)?, path)
    }
}

impl HardwareDevice for MockDevice {
    fn device_ref(&self) -> DeviceRef {
        DeviceRef::new(self.id)
    }

    fn query_public_key(&self, path: &HdPath) -> Result<PublicKey> {
        self.key_at(path)?.public_key()
    }

    fn sign(&self, path: &HdPath, message: &[u8]) -> Result<Vec<u8>> {
        signing::sign(&self.key_at(path)?, message)
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn scenario_create_lookup_sign() {
    let kb = keybase();

    let (created, mnemonic) = kb
        .create_mnemonic("alice", Language::English, "pw1", SigningAlgo::Secp256k1)
        .expect("create should succeed");
    assert_eq!(mnemonic.word_count(), 24);

    let found = kb.lookup("alice").unwrap();
    assert!(matches!(found.kind, IdentityKind::Local { .. }));
    assert_eq!(found, created);

    let (signature, public_key) = kb.sign("alice", "pw1", b"msg").unwrap();
    assert_eq!(public_key, created.public_key);
    verify(&public_key, b"msg", &signature).expect("signature should verify");

    assert!(matches!(
        kb.sign("alice", "bad", b"msg"),
        Err(KeyringError::WrongPassphrase)
    ));

    // The returned mnemonic restores the same key elsewhere.
    let other = keybase();
    let restored = other
        .restore_from_mnemonic("alice", mnemonic.as_str(), "pw2")
        .unwrap();
    assert_eq!(restored.public_key, created.public_key);
}

#[test]
fn scenario_watch_only_delete_needs_confirmation() {
    let kb = keybase();
    let pk = keybase()
        .restore_from_mnemonic("src", WORDS, "")
        .unwrap()
        .public_key;

    kb.register_watch_only("bob", pk).unwrap();
    assert!(matches!(
        kb.delete("bob", "no"),
        Err(KeyringError::ConfirmationRequired)
    ));
    assert!(kb.lookup("bob").is_ok());

    kb.delete("bob", "yes").unwrap();
    assert!(matches!(kb.lookup("bob"), Err(KeyringError::NotFound(_))));
}

// ── Properties ────────────────────────────────────────────────────────────────

#[test]
fn derivation_is_deterministic_and_creation_is_fresh() {
    let a = keybase().restore_from_mnemonic("x", WORDS, "pw").unwrap();
    let b = keybase().restore_from_mnemonic("x", WORDS, "other").unwrap();
    assert_eq!(a.public_key, b.public_key);

    let kb = keybase();
    let (one, _) = kb
        .create_mnemonic("one", Language::English, "pw", SigningAlgo::Secp256k1)
        .unwrap();
    let (two, _) = kb
        .create_mnemonic("two", Language::English, "pw", SigningAlgo::Secp256k1)
        .unwrap();
    assert_ne!(one.public_key, two.public_key);
}

#[test]
fn derive_at_bip44_path_differs_from_default() {
    let kb = keybase();
    let default = kb.restore_from_mnemonic("default", WORDS, "pw").unwrap();
    let path = Bip44Params::new(118, 0, false, 1).to_path().unwrap();
    let indexed = kb.derive_at_path("indexed", WORDS, "pw", &path).unwrap();
    assert_ne!(default.public_key, indexed.public_key);

    let again = keybase().derive_at_path("again", WORDS, "pw", &path).unwrap();
    assert_eq!(again.public_key, indexed.public_key);
}

#[test]
fn list_is_sorted_regardless_of_creation_order() {
    let kb = keybase();
    for name in ["mallory", "carol", "zed", "alice", "bob"] {
        kb.restore_from_mnemonic(name, WORDS, "").unwrap();
    }
    let names: Vec<String> = kb.list().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["alice", "bob", "carol", "mallory", "zed"]);

    // snapshot, not a live view
    let before = kb.list().unwrap();
    kb.delete("zed", "yes").unwrap();
    assert_eq!(before.len(), 5);
    assert_eq!(kb.list().unwrap().len(), 4);
}

#[test]
fn local_delete_requires_passphrase() {
    let kb = keybase();
    kb.restore_from_mnemonic("alice", WORDS, "pw1").unwrap();

    assert!(matches!(
        kb.delete("alice", "wrong"),
        Err(KeyringError::WrongPassphrase)
    ));
    assert!(matches!(
        kb.delete("alice", "yes"),
        Err(KeyringError::WrongPassphrase)
    ));
    assert!(kb.lookup("alice").is_ok());

    kb.delete("alice", "pw1").unwrap();
    assert!(kb.lookup("alice").is_err());
}

// ── Export / import ───────────────────────────────────────────────────────────

#[test]
fn export_import_moves_local_key_between_keybases() {
    let source = keybase();
    let original = source.restore_from_mnemonic("alice", WORDS, "pw1").unwrap();
    let armor = source.export("alice").unwrap();
    assert!(armor.starts_with("-----BEGIN KEYRING KEY INFO-----"));

    let target = keybase();
    let imported = target.import("alice-copy", &armor).unwrap();
    assert_eq!(imported.name, "alice-copy");
    assert_eq!(imported.public_key, original.public_key);

    let (signature, pk) = target.sign("alice-copy", "pw1", b"moved").unwrap();
    verify(&pk, b"moved", &signature).unwrap();
}

#[test]
fn import_into_occupied_name_leaves_record_unchanged() {
    let kb = keybase();
    let existing = kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();

    let other = keybase();
    other.restore_from_mnemonic("alice", OTHER_WORDS, "pw").unwrap();
    let armor = other.export("alice").unwrap();
    let public_armor = other.export_public("alice").unwrap();

    assert!(matches!(
        kb.import("alice", &armor),
        Err(KeyringError::AlreadyExists(_))
    ));
    assert!(matches!(
        kb.import_public("alice", &public_armor),
        Err(KeyringError::AlreadyExists(_))
    ));
    assert_eq!(kb.lookup("alice").unwrap(), existing);
}

#[test]
fn public_export_import_creates_watch_only() {
    let source = keybase();
    let original = source.restore_from_mnemonic("alice", WORDS, "pw").unwrap();
    let armor = source.export_public("alice").unwrap();
    assert!(armor.starts_with("-----BEGIN KEYRING PUBLIC KEY-----"));

    let target = keybase();
    let imported = target.import_public("alice", &armor).unwrap();
    assert!(matches!(imported.kind, IdentityKind::WatchOnly));
    assert_eq!(imported.public_key, original.public_key);
}

#[test]
fn rotate_then_export_private_key() {
    let kb = keybase();
    let identity = kb.restore_from_mnemonic("alice", WORDS, "old").unwrap();
    kb.rotate_passphrase("alice", "old", || Ok("new".to_string()))
        .unwrap();

    assert!(matches!(
        kb.export_private_key("alice", "old"),
        Err(KeyringError::WrongPassphrase)
    ));
    let key = kb.export_private_key("alice", "new").unwrap();
    assert_eq!(key.public_key().unwrap(), identity.public_key);
}

// ── Hardware ──────────────────────────────────────────────────────────────────

#[test]
fn hardware_register_and_sign() {
    let device = Arc::new(MockDevice::new("ledger-1"));
    let kb = Keybase::in_memory(fast_config().with_device(device));

    let path = HdPath::fundraiser();
    let identity = kb
        .register_hardware("hw", &path, SigningAlgo::Secp256k1)
        .unwrap();
    assert!(matches!(identity.kind, IdentityKind::Hardware { .. }));

    // Same words and path give the same key as a local restore.
    let local = keybase()
        .restore_from_mnemonic("local", OTHER_WORDS, "pw")
        .unwrap();
    assert_eq!(identity.public_key, local.public_key);

    let (signature, pk) = kb.sign("hw", "", b"on device").unwrap();
    assert_eq!(pk, identity.public_key);
    verify(&pk, b"on device", &signature).unwrap();

    assert!(matches!(
        kb.rotate_passphrase("hw", "", || Ok("x".into())),
        Err(KeyringError::WrongKeyType { .. })
    ));
    assert!(matches!(
        kb.delete("hw", "no"),
        Err(KeyringError::ConfirmationRequired)
    ));
    kb.delete("hw", "yes").unwrap();
}

#[test]
fn hardware_failures_are_distinguishable() {
    let broken = MockDevice {
        broken: true,
        ..MockDevice::new("broken")
    };
    let kb = Keybase::in_memory(fast_config().with_device(Arc::new(broken)));
    assert!(matches!(
        kb.register_hardware("hw", &HdPath::fundraiser(), SigningAlgo::Secp256k1),
        Err(KeyringError::DeviceUnavailable(_))
    ));
    assert!(kb.list().unwrap().is_empty());

    let slow = MockDevice {
        delay: Duration::from_millis(500),
        ..MockDevice::new("slow")
    };
    let kb = Keybase::in_memory(
        fast_config()
            .with_device(Arc::new(slow))
            .with_device_timeout(Duration::from_millis(20)),
    );
    assert!(matches!(
        kb.register_hardware("hw", &HdPath::fundraiser(), SigningAlgo::Secp256k1),
        Err(KeyringError::DeviceTimeout(_))
    ));
}

#[test]
fn hardware_sign_requires_the_registering_device() {
    let first = Keybase::in_memory(fast_config().with_device(Arc::new(MockDevice::new("dev-a"))));
    first
        .register_hardware("hw", &HdPath::fundraiser(), SigningAlgo::Secp256k1)
        .unwrap();
    let armor = first.export("hw").unwrap();

    let second = Keybase::in_memory(fast_config().with_device(Arc::new(MockDevice::new("dev-b"))));
    second.import("hw", &armor).unwrap();
    assert!(matches!(
        second.sign("hw", "", b"m"),
        Err(KeyringError::DeviceUnavailable(_))
    ));

    let unplugged = keybase();
    unplugged.import("hw", &armor).unwrap();
    assert!(matches!(
        unplugged.sign("hw", "", b"m"),
        Err(KeyringError::DeviceUnavailable(_))
    ));
}

// ── Offline signing ───────────────────────────────────────────────────────────

#[test]
fn watch_only_sign_returns_operator_reply() {
    let (signer, inbox) = ChannelSigner::new(Duration::from_secs(10));
    let kb = Keybase::in_memory(fast_config().with_offline_signer(Arc::new(signer)));
    let identity = kb.restore_from_mnemonic("cold", WORDS, "").unwrap();

    let operator = thread::spawn(move || {
        let pending = inbox.next().expect("a request should arrive");
        assert_eq!(pending.request().name, "cold");
        assert_eq!(pending.request().message, b"pay 10");
        let key = derive_key(
            &Secp256k1Provider,
            &Mnemonic::parse(WORDS).unwrap(),
            &HdPath::fundraiser(),
        )
        .unwrap();
        let signature = signing::sign(&key, &pending.request().message).unwrap();
        pending.respond(signature_to_base64(&signature));
        signature
    });

    let (signature, pk) = kb.sign("cold", "ignored", b"pay 10").unwrap();
    let expected = operator.join().unwrap();
    assert_eq!(signature, expected);
    assert_eq!(pk, identity.public_key);
    verify(&pk, b"pay 10", &signature).unwrap();
}

#[test]
fn watch_only_sign_cancel_and_garbage() {
    let (signer, inbox) = ChannelSigner::new(Duration::from_secs(10));
    let kb = Keybase::in_memory(fast_config().with_offline_signer(Arc::new(signer)));
    kb.restore_from_mnemonic("cold", WORDS, "").unwrap();

    let operator = thread::spawn(move || {
        inbox.next().unwrap().cancel();
        inbox.next().unwrap().respond("not a signature");
    });

    assert!(matches!(
        kb.sign("cold", "", b"m"),
        Err(KeyringError::Cancelled)
    ));
    assert!(matches!(
        kb.sign("cold", "", b"m"),
        Err(KeyringError::MalformedSignature(_))
    ));
    operator.join().unwrap();
}

#[test]
fn watch_only_sign_without_signer_or_reply() {
    let kb = keybase();
    kb.restore_from_mnemonic("cold", WORDS, "").unwrap();
    assert!(matches!(
        kb.sign("cold", "", b"m"),
        Err(KeyringError::NoOfflineSigner)
    ));

    let (signer, _inbox) = ChannelSigner::new(Duration::from_millis(50));
    let kb = Keybase::in_memory(fast_config().with_offline_signer(Arc::new(signer)));
    kb.restore_from_mnemonic("cold", WORDS, "").unwrap();
    assert!(matches!(
        kb.sign("cold", "", b"m"),
        Err(KeyringError::Timeout(_))
    ));
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[test]
fn file_backed_keybase_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = || fast_config().with_codec(Arc::new(JsonCodec));

    {
        let kb = Keybase::open(dir.path(), config()).unwrap();
        kb.restore_from_mnemonic("alice", WORDS, "pw").unwrap();
        kb.restore_from_mnemonic("bob", OTHER_WORDS, "").unwrap();
    }

    let kb = Keybase::open(dir.path(), config()).unwrap();
    let names: Vec<String> = kb.list().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["alice", "bob"]);
    let (signature, pk) = kb.sign("alice", "pw", b"after reopen").unwrap();
    verify(&pk, b"after reopen", &signature).unwrap();
}
