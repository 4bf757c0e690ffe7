//! Integration tests for the CLI binary.
//!
//! Verifies that the `akr` binary responds to basic flags and drives a
//! keyring through recover, sign, export and delete.
//!
//! This test is registered as a [[test]] in the agentic-keyring-cli crate
//! so that CARGO_BIN_EXE_akr is available.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const WORDS: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Get a Command pointing to the `akr` binary.
fn akr_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_akr"))
}

/// A keyring home with cheap KDF settings.
fn fast_home() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let settings = serde_json::json!({
        "kdf": { "m_cost": 64, "t_cost": 1, "p_cost": 1 },
        "offline_timeout_secs": 5
    });
    std::fs::write(dir.path().join("config.json"), settings.to_string()).unwrap();
    dir
}

/// Run `akr --home HOME ARGS...` feeding `stdin`.
fn run(home: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = akr_binary()
        .arg("--home")
        .arg(home)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to execute akr");
    // the child may exit without reading stdin
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_responds_to_help() {
    let output = akr_binary()
        .arg("--help")
        .output()
        .expect("failed to execute akr --help");

    assert!(
        output.status.success(),
        "akr --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("akr") || stdout.contains("AgenticKeyring") || stdout.contains("Usage"),
        "akr --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = akr_binary()
        .arg("--version")
        .output()
        .expect("failed to execute akr --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0.1") || stdout.contains("akr"),
        "akr --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = akr_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute akr");

    assert!(
        !output.status.success(),
        "akr with unknown flag should exit with error"
    );
}

#[test]
fn cli_recover_sign_verify_delete() {
    let home = fast_home();

    let added = run(
        home.path(),
        &["add", "alice", "--recover"],
        &format!("{WORDS}\npw1\npw1\n"),
    );
    assert!(
        added.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&added.stderr)
    );
    assert!(stdout(&added).contains("Stored local key 'alice'"));

    let listed = run(home.path(), &["list"], "");
    assert!(stdout(&listed).contains("alice"));
    assert!(stdout(&listed).contains("local"));

    let signed = run(home.path(), &["sign", "alice", "--message", "hello"], "pw1\n");
    assert!(signed.status.success());
    let signature = stdout(&signed).trim().to_string();

    let verified = run(
        home.path(),
        &["verify", "alice", "--signature", &signature, "--message", "hello"],
        "",
    );
    assert!(verified.status.success());

    let tampered = run(
        home.path(),
        &["verify", "alice", "--signature", &signature, "--message", "hellO"],
        "",
    );
    assert!(!tampered.status.success());

    let wrong = run(home.path(), &["sign", "alice", "--message", "hello"], "bad\n");
    assert!(!wrong.status.success());

    let refused = run(home.path(), &["delete", "alice"], "bad\n");
    assert!(!refused.status.success());
    assert!(stdout(&run(home.path(), &["list"], "")).contains("alice"));

    let deleted = run(home.path(), &["delete", "alice"], "pw1\n");
    assert!(deleted.status.success());
    assert!(stdout(&run(home.path(), &["list"], "")).contains("No keys found."));
}

#[test]
fn cli_sign_reads_message_from_stdin() {
    let home = fast_home();
    let added = run(
        home.path(),
        &["add", "alice", "--recover"],
        &format!("{WORDS}\npw1\npw1\n"),
    );
    assert!(added.status.success());

    // passphrase line first, then the message up to EOF
    let signed = run(home.path(), &["sign", "alice"], "pw1\nhello");
    assert!(
        signed.status.success(),
        "sign failed: {}",
        String::from_utf8_lossy(&signed.stderr)
    );
    let signature = stdout(&signed).trim().to_string();

    let verified = run(
        home.path(),
        &["verify", "alice", "--signature", &signature, "--message", "hello"],
        "",
    );
    assert!(verified.status.success());
}

#[test]
fn cli_watch_only_sign_needs_explicit_message() {
    let home = fast_home();
    let added = run(
        home.path(),
        &["add", "alice", "--recover"],
        &format!("{WORDS}\npw1\npw1\n"),
    );
    assert!(added.status.success());
    let public = run(home.path(), &["show", "alice", "--pubkey"], "");
    assert!(public.status.success());
    let pubkey = stdout(&public).trim().to_string();

    let watched = run(home.path(), &["add", "bob", "--pubkey", &pubkey], "");
    assert!(watched.status.success());

    let signed = run(home.path(), &["sign", "bob"], "hello");
    assert!(!signed.status.success());
    assert!(String::from_utf8_lossy(&signed.stderr).contains("--message or --file"));
}

#[test]
fn cli_public_key_roundtrip_between_homes() {
    let source = fast_home();
    let target = fast_home();

    let added = run(
        source.path(),
        &["add", "alice", "--recover"],
        &format!("{WORDS}\npw1\npw1\n"),
    );
    assert!(added.status.success());

    let armor_path = source.path().join("alice.pub.asc");
    let exported = run(
        source.path(),
        &["export-pub", "alice", "-o", armor_path.to_str().unwrap()],
        "",
    );
    assert!(exported.status.success());
    let armor = std::fs::read_to_string(&armor_path).unwrap();
    assert!(armor.starts_with("-----BEGIN KEYRING PUBLIC KEY-----"));

    let imported = run(
        target.path(),
        &["import-pub", "bob", armor_path.to_str().unwrap()],
        "",
    );
    assert!(imported.status.success());

    let source_key = stdout(&run(source.path(), &["show", "alice", "--pubkey"], ""));
    let target_key = stdout(&run(target.path(), &["show", "bob", "--pubkey"], ""));
    assert_eq!(source_key, target_key);

    // Watch-only needs the literal confirmation.
    let refused = run(target.path(), &["delete", "bob"], "no\n");
    assert!(!refused.status.success());
    let deleted = run(target.path(), &["delete", "bob", "--yes"], "");
    assert!(deleted.status.success());
}

#[test]
fn cli_update_changes_passphrase() {
    let home = fast_home();
    run(
        home.path(),
        &["add", "carol", "--recover", "--fundraiser"],
        &format!("{WORDS}\nold\nold\n"),
    );

    let updated = run(home.path(), &["update", "carol"], "old\nnew\nnew\n");
    assert!(
        updated.status.success(),
        "update failed: {}",
        String::from_utf8_lossy(&updated.stderr)
    );

    assert!(!run(home.path(), &["sign", "carol", "--message", "m"], "old\n").status.success());
    assert!(run(home.path(), &["sign", "carol", "--message", "m"], "new\n").status.success());
}
