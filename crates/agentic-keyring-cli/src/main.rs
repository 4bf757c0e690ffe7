//! AgenticKeyring CLI: the `akr` command.
//!
//! Provides a command-line interface for creating and recovering keys,
//! signing with local, hardware or offline keys, and moving keys between
//! keyrings as armored text.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use agentic_keyring::{
    signature_from_base64, signature_to_base64, verify, Bip44Params, ConsoleSigner, HdPath,
    IdentityKind, KeyType, Keybase, KeybaseConfig, KeyringError, KeyringSettings, Language,
    PublicKey, SigningAlgo, DELETE_CONFIRMATION,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

/// `--home`, else `$AKR_HOME`, else `~/.agentic/keyring`.
fn keyring_home(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = flag {
        return Ok(home);
    }
    if let Some(home) = std::env::var_os("AKR_HOME") {
        return Ok(PathBuf::from(home));
    }
    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME not set; pass --home"))?;
    Ok(PathBuf::from(home).join(".agentic").join("keyring"))
}

fn open_keybase(home: &Path) -> Result<Keybase> {
    let settings_path = home.join("config.json");
    let settings = KeyringSettings::load(&settings_path)
        .with_context(|| format!("failed to load {}", settings_path.display()))?;
    log::debug!("keyring home {}", home.display());

    let config = KeybaseConfig::from_settings(&settings)
        .with_offline_signer(Arc::new(ConsoleSigner::new(settings.offline_timeout())));
    Keybase::open(home.join("keys"), config).context("failed to open keyring")
}

// ── Input helpers ─────────────────────────────────────────────────────────────

fn read_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Ask twice; an empty answer is allowed only when `allow_empty`.
fn read_new_passphrase(allow_empty: bool) -> Result<String> {
    let passphrase = read_line("Enter passphrase to encrypt the key: ")?;
    if passphrase.is_empty() {
        if allow_empty {
            return Ok(passphrase);
        }
        return Err(anyhow!("passphrase cannot be empty"));
    }
    let confirm = read_line("Repeat the passphrase: ")?;
    if passphrase != confirm {
        return Err(anyhow!("passphrases do not match"));
    }
    Ok(passphrase)
}

fn read_message(message: Option<String>, file: Option<PathBuf>) -> Result<Vec<u8>> {
    match (message, file) {
        (Some(text), None) => Ok(text.into_bytes()),
        (None, Some(path)) => {
            std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))
        }
        (None, None) => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("failed to read message from stdin")?;
            Ok(bytes)
        }
        (Some(_), Some(_)) => Err(anyhow!("pass either --message or --file, not both")),
    }
}

fn read_armor(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read armor from stdin")?;
            Ok(text)
        }
    }
}

fn write_output(text: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// AgenticKeyring CLI: manage passphrase-protected signing keys.
#[derive(Parser, Debug)]
#[command(
    name = "akr",
    about = "AgenticKeyring CLI",
    version,
    long_about = "akr — AgenticKeyring CLI\n\nCreate and recover secp256k1 keys from BIP39 mnemonics, sign with local,\nhardware or offline keys, and move keys between keyrings as armored text."
)]
struct Cli {
    /// Keyring directory (default: $AKR_HOME or ~/.agentic/keyring)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, recover or register a key
    Add {
        /// Name for the new key
        name: String,

        /// Recover from a mnemonic read from stdin
        #[arg(long)]
        recover: bool,

        /// With --recover: require a 12-word fundraiser mnemonic
        #[arg(long, requires = "recover")]
        fundraiser: bool,

        /// With --recover: derive at this HD path (e.g. m/44'/118'/0'/0/0)
        #[arg(long, requires = "recover", conflicts_with_all = ["account", "index"])]
        path: Option<String>,

        /// BIP44 account number, for --recover or --hardware
        #[arg(long)]
        account: Option<u32>,

        /// BIP44 address index, for --recover or --hardware
        #[arg(long)]
        index: Option<u32>,

        /// BIP44 coin type used with --account/--index or --hardware
        #[arg(long, default_value_t = 118)]
        coin_type: u32,

        /// Register a key held on a hardware device
        #[arg(long, conflicts_with_all = ["recover", "pubkey"])]
        hardware: bool,

        /// Register a watch-only key from a hex-encoded public key
        #[arg(long, conflicts_with = "recover")]
        pubkey: Option<String>,

        /// Mnemonic language
        #[arg(long, default_value = "english")]
        language: String,

        /// Signing algorithm
        #[arg(long, default_value = "secp256k1")]
        algo: String,
    },

    /// List all keys
    List,

    /// Display key information
    Show {
        name: String,

        /// Print only the hex public key
        #[arg(long)]
        pubkey: bool,
    },

    /// Sign a message and print the base64 signature
    Sign {
        name: String,

        /// Message text (default: rest of stdin after the passphrase line)
        #[arg(long)]
        message: Option<String>,

        /// Read the message from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Verify a base64 signature against a stored key
    Verify {
        name: String,

        /// Base64-encoded signature
        #[arg(long)]
        signature: String,

        #[arg(long)]
        message: Option<String>,

        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a key
    Delete {
        name: String,

        /// Skip the confirmation prompt for keys without a passphrase
        #[arg(long, short)]
        yes: bool,
    },

    /// Export a key record as armor
    Export {
        name: String,

        /// Output file path (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import an armored key record
    Import {
        name: String,

        /// Armor file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Export a public key as armor
    ExportPub {
        name: String,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import an armored public key as a watch-only key
    ImportPub {
        name: String,

        file: Option<PathBuf>,
    },

    /// Change the passphrase of a local key
    Update { name: String },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = keyring_home(cli.home).and_then(|home| {
        let keybase = open_keybase(&home)?;
        match cli.command {
            Commands::Add {
                name,
                recover,
                fundraiser,
                path,
                account,
                index,
                coin_type,
                hardware,
                pubkey,
                language,
                algo,
            } => {
                let source = if let Some(hex) = pubkey {
                    KeySource::WatchOnly(hex)
                } else if hardware {
                    KeySource::Hardware(bip44_path(coin_type, account, index)?)
                } else if recover {
                    KeySource::Recover {
                        fundraiser,
                        path: match path {
                            Some(p) => Some(p.parse().context("invalid --path")?),
                            None if account.is_some() || index.is_some() => {
                                Some(bip44_path(coin_type, account, index)?)
                            }
                            None => None,
                        },
                    }
                } else {
                    KeySource::Fresh
                };
                cmd_add(&keybase, &name, source, &language, &algo, verbose)
            }
            Commands::List => cmd_list(&keybase, verbose),
            Commands::Show { name, pubkey } => cmd_show(&keybase, &name, pubkey),
            Commands::Sign {
                name,
                message,
                file,
            } => cmd_sign(&keybase, &name, message, file, verbose),
            Commands::Verify {
                name,
                signature,
                message,
                file,
            } => cmd_verify(&keybase, &name, &signature, read_message(message, file)?),
            Commands::Delete { name, yes } => cmd_delete(&keybase, &name, yes),
            Commands::Export { name, output } => {
                write_output(&keybase.export(&name).context("export failed")?, output)
            }
            Commands::Import { name, file } => {
                let identity = keybase
                    .import(&name, &read_armor(file)?)
                    .context("import failed")?;
                println!("Imported {} key '{}'", identity.key_type(), identity.name);
                Ok(())
            }
            Commands::ExportPub { name, output } => write_output(
                &keybase.export_public(&name).context("export failed")?,
                output,
            ),
            Commands::ImportPub { name, file } => {
                let identity = keybase
                    .import_public(&name, &read_armor(file)?)
                    .context("import failed")?;
                println!("Imported public key '{}'", identity.name);
                Ok(())
            }
            Commands::Update { name } => cmd_update(&keybase, &name),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn bip44_path(coin_type: u32, account: Option<u32>, index: Option<u32>) -> Result<HdPath> {
    let params = Bip44Params::new(coin_type, account.unwrap_or(0), false, index.unwrap_or(0));
    params.to_path().context("invalid BIP44 parameters")
}

// ── Command implementations ───────────────────────────────────────────────────

enum KeySource {
    Fresh,
    Recover {
        fundraiser: bool,
        path: Option<HdPath>,
    },
    Hardware(HdPath),
    WatchOnly(String),
}

/// `akr add NAME [--recover [--fundraiser | --path P]] [--hardware] [--pubkey HEX]`
fn cmd_add(
    keybase: &Keybase,
    name: &str,
    source: KeySource,
    language: &str,
    algo: &str,
    verbose: bool,
) -> Result<()> {
    let algo: SigningAlgo = algo.parse()?;

    let identity = match source {
        KeySource::Fresh => {
            let language: Language = language.parse()?;
            let passphrase = read_new_passphrase(true)?;
            let (identity, mnemonic) = keybase
                .create_mnemonic(name, language, &passphrase, algo)
                .context("failed to create key")?;
            eprintln!();
            eprintln!("**Write this mnemonic phrase in a safe place.**");
            eprintln!("It is the only way to recover the key.");
            eprintln!();
            eprintln!("{}", mnemonic.as_str());
            eprintln!();
            identity
        }
        KeySource::Recover { fundraiser, path } => {
            algo.ensure_supported()?;
            let words = read_line("Enter your mnemonic: ")?;
            let passphrase = read_new_passphrase(true)?;
            let result = match (fundraiser, path) {
                (true, _) => keybase.restore_fundraiser(name, &words, &passphrase),
                (false, Some(path)) => keybase.derive_at_path(name, &words, &passphrase, &path),
                (false, None) => keybase.restore_from_mnemonic(name, &words, &passphrase),
            };
            result.context("failed to recover key")?
        }
        KeySource::Hardware(path) => keybase
            .register_hardware(name, &path, algo)
            .context("failed to register hardware key")?,
        KeySource::WatchOnly(hex) => {
            let public_key = PublicKey::from_hex(&hex).context("invalid --pubkey")?;
            keybase
                .register_watch_only(name, public_key)
                .context("failed to register key")?
        }
    };

    println!("Stored {} key '{}'", identity.key_type(), identity.name);
    println!("  Public Key: {}", identity.public_key);
    if verbose && identity.key_type() == KeyType::WatchOnly {
        println!("  No private key is stored; signing requires an offline signature.");
    }
    Ok(())
}

/// `akr list`
fn cmd_list(keybase: &Keybase, verbose: bool) -> Result<()> {
    let identities = keybase.list().context("failed to list keys")?;
    if identities.is_empty() {
        println!("No keys found.");
        return Ok(());
    }

    println!("{:<24} {:<11} PUBLIC KEY", "NAME", "TYPE");
    for identity in &identities {
        println!(
            "{:<24} {:<11} {}",
            identity.name,
            identity.key_type(),
            identity.public_key
        );
        if verbose {
            if let IdentityKind::Hardware { path, device } = &identity.kind {
                println!("{:<24} path {path} on {device}", "");
            }
        }
    }
    Ok(())
}

/// `akr show NAME [--pubkey]`
fn cmd_show(keybase: &Keybase, name: &str, pubkey_only: bool) -> Result<()> {
    let identity = keybase.lookup(name)?;
    if pubkey_only {
        println!("{}", identity.public_key);
        return Ok(());
    }

    println!("Key: {}", identity.name);
    println!("  Type:       {}", identity.key_type());
    println!("  Public Key: {}", identity.public_key);
    match &identity.kind {
        IdentityKind::Local { private_key_armor } => {
            let state = if private_key_armor.is_some() {
                "encrypted"
            } else {
                "missing"
            };
            println!("  Private:    {state}");
        }
        IdentityKind::Hardware { path, device } => {
            println!("  Path:       {path}");
            println!("  Device:     {device}");
        }
        IdentityKind::WatchOnly => {}
    }
    Ok(())
}

/// `akr sign NAME [--message TEXT | --file PATH]`
///
/// The passphrase line is read before the message, so both can arrive on
/// stdin: `printf 'pw\nmessage' | akr sign NAME`.
fn cmd_sign(
    keybase: &Keybase,
    name: &str,
    message: Option<String>,
    file: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let identity = keybase.lookup(name)?;
    let passphrase = match identity.kind {
        IdentityKind::Local { .. } => read_line("Enter passphrase: ")?,
        IdentityKind::WatchOnly if message.is_none() && file.is_none() => {
            return Err(anyhow!(
                "pass --message or --file: stdin carries the offline signature"
            ));
        }
        IdentityKind::Hardware { .. } | IdentityKind::WatchOnly => String::new(),
    };
    let message = read_message(message, file)?;

    let (signature, public_key) = keybase
        .sign(name, &passphrase, &message)
        .context("signing failed")?;
    println!("{}", signature_to_base64(&signature));
    if verbose {
        eprintln!("Public Key: {public_key}");
    }
    Ok(())
}

/// `akr verify NAME --signature B64 [--message TEXT | --file PATH]`
fn cmd_verify(keybase: &Keybase, name: &str, signature: &str, message: Vec<u8>) -> Result<()> {
    let identity = keybase.lookup(name)?;
    let signature = signature_from_base64(signature)?;
    verify(&identity.public_key, &message, &signature).context("signature is NOT valid")?;
    println!("Signature is valid for '{name}'");
    Ok(())
}

/// `akr delete NAME [--yes]`
fn cmd_delete(keybase: &Keybase, name: &str, skip_confirmation: bool) -> Result<()> {
    let identity = keybase.lookup(name)?;
    let answer = match identity.kind {
        IdentityKind::Local {
            private_key_armor: Some(_),
        } => read_line("Enter passphrase to delete the key: ")?,
        _ if skip_confirmation => DELETE_CONFIRMATION.to_string(),
        _ => read_line("Key reference will be deleted. Continue? [yes/no]: ")?,
    };

    match keybase.delete(name, &answer) {
        Ok(()) => {
            println!("Key '{name}' deleted");
            Ok(())
        }
        Err(KeyringError::ConfirmationRequired) => Err(anyhow!("aborted; key not deleted")),
        Err(e) => Err(e).context("failed to delete key"),
    }
}

/// `akr update NAME`
fn cmd_update(keybase: &Keybase, name: &str) -> Result<()> {
    let old = read_line("Enter the current passphrase: ")?;
    keybase
        .rotate_passphrase(name, &old, || {
            read_new_passphrase(false).map_err(|e| {
                eprintln!("error: {e:#}");
                KeyringError::Cancelled
            })
        })
        .context("failed to change passphrase")?;
    println!("Passphrase changed for '{name}'");
    Ok(())
}
