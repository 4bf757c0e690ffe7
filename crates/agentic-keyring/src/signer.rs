//! Offline signing for watch-only identities.
//!
//! The keybase has no private key for a watch-only record, so it hands the
//! message to an [`OfflineSigner`] and waits for an operator to paste back a
//! base64 signature produced elsewhere. Two signers are provided:
//!
//! - [`ChannelSigner`] delivers requests to an in-process [`OperatorInbox`];
//!   the operator answers through [`PendingSignature`].
//! - [`ConsoleSigner`] prints the request to stderr and reads the reply from
//!   stdin.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use log::warn;

use crate::crypto::keys::PublicKey;
use crate::error::{KeyringError, Result};

/// What the operator is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub name: String,
    pub public_key: PublicKey,
    pub message: Vec<u8>,
}

/// Source of externally produced signatures.
pub trait OfflineSigner: Send + Sync {
    /// Block until the operator replies. Returns the raw reply text, which
    /// the caller decodes as a base64 signature.
    ///
    /// Fails with [`KeyringError::Cancelled`] when the operator declines and
    /// [`KeyringError::Timeout`] when nobody answers in time.
    fn request_signature(&self, request: SignRequest) -> Result<String>;
}

// ── Channel signer ────────────────────────────────────────────────────────────

enum Reply {
    Signature(String),
    Cancelled,
}

/// A request waiting for the operator.
///
/// Dropping it without answering cancels the request.
pub struct PendingSignature {
    request: SignRequest,
    reply: SyncSender<Reply>,
}

impl PendingSignature {
    pub fn request(&self) -> &SignRequest {
        &self.request
    }

    /// Answer with a base64-encoded signature.
    pub fn respond(self, encoded_signature: impl Into<String>) {
        // requester may already have timed out
        let _ = self.reply.send(Reply::Signature(encoded_signature.into()));
    }

    pub fn cancel(self) {
        let _ = self.reply.send(Reply::Cancelled);
    }
}

/// Operator side of a [`ChannelSigner`].
pub struct OperatorInbox {
    requests: Receiver<PendingSignature>,
}

impl OperatorInbox {
    /// Wait for the next request. `None` once the signer is gone.
    pub fn next(&self) -> Option<PendingSignature> {
        self.requests.recv().ok()
    }

    /// Wait at most `limit` for the next request.
    pub fn next_timeout(&self, limit: Duration) -> Option<PendingSignature> {
        self.requests.recv_timeout(limit).ok()
    }
}

/// Offline signer backed by an in-process channel.
pub struct ChannelSigner {
    requests: Mutex<mpsc::Sender<PendingSignature>>,
    timeout: Duration,
}

impl ChannelSigner {
    /// Create a signer and the inbox its requests arrive at. Each request
    /// waits at most `timeout` for an answer.
    pub fn new(timeout: Duration) -> (Self, OperatorInbox) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                requests: Mutex::new(tx),
                timeout,
            },
            OperatorInbox { requests: rx },
        )
    }
}

impl OfflineSigner for ChannelSigner {
    fn request_signature(&self, request: SignRequest) -> Result<String> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let pending = PendingSignature {
            request,
            reply: reply_tx,
        };
        {
            let sender = self.requests.lock().unwrap_or_else(|e| e.into_inner());
            // no inbox means nobody can answer
            sender.send(pending).map_err(|_| KeyringError::Cancelled)?;
        }

        match reply_rx.recv_timeout(self.timeout) {
            Ok(Reply::Signature(signature)) => Ok(signature),
            Ok(Reply::Cancelled) | Err(RecvTimeoutError::Disconnected) => {
                Err(KeyringError::Cancelled)
            }
            Err(RecvTimeoutError::Timeout) => Err(KeyringError::Timeout(self.timeout)),
        }
    }
}

// ── Console signer ────────────────────────────────────────────────────────────

type LineReply = io::Result<String>;

/// One thread owning a line source, serving reads to whoever is waiting.
///
/// A read that times out leaves the thread blocked on the source. The line
/// it eventually gets goes to the next request already waiting, or is
/// dropped when there is none, so no later request misses its own input.
pub(crate) struct LineReader {
    requests: Mutex<mpsc::Sender<SyncSender<LineReply>>>,
}

impl LineReader {
    pub(crate) fn spawn<F>(mut read: F) -> Self
    where
        F: FnMut(&mut String) -> io::Result<usize> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<SyncSender<LineReply>>();
        let spawned = thread::Builder::new()
            .name("keyring-stdin".into())
            .spawn(move || {
                while let Ok(mut waiter) = rx.recv() {
                    let mut line = String::new();
                    let mut reply = read(&mut line).map(|_| line);
                    while let Err(mpsc::SendError(unsent)) = waiter.send(reply) {
                        match rx.try_recv() {
                            Ok(next) => {
                                waiter = next;
                                reply = unsent;
                            }
                            Err(_) => break,
                        }
                    }
                }
            });
        if let Err(e) = spawned {
            // requests fail as cancelled once the receiver is gone
            warn!("failed to start stdin reader: {e}");
        }
        Self {
            requests: Mutex::new(tx),
        }
    }

    /// Queue a read; the line arrives on the returned receiver.
    fn submit(&self) -> Result<Receiver<LineReply>> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        requests.send(reply_tx).map_err(|_| KeyringError::Cancelled)?;
        Ok(reply_rx)
    }

    /// Next line including its terminator; empty at end of input.
    pub(crate) fn read_line(&self, limit: Duration) -> Result<String> {
        await_line(&self.submit()?, limit)
    }
}

fn await_line(reply: &Receiver<LineReply>, limit: Duration) -> Result<String> {
    match reply.recv_timeout(limit) {
        Ok(line) => Ok(line?),
        Err(RecvTimeoutError::Timeout) => Err(KeyringError::Timeout(limit)),
        Err(RecvTimeoutError::Disconnected) => Err(KeyringError::Cancelled),
    }
}

static STDIN_LINES: OnceLock<LineReader> = OnceLock::new();

/// Offline signer that talks to the terminal.
///
/// An empty reply line or end of input cancels. All console signers in a
/// process share one stdin reader thread; a reply typed after a request
/// timed out is handed to the next request that is waiting.
pub struct ConsoleSigner {
    timeout: Duration,
}

impl ConsoleSigner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl OfflineSigner for ConsoleSigner {
    fn request_signature(&self, request: SignRequest) -> Result<String> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "Offline signature requested for '{}'", request.name)?;
        writeln!(stderr, "Public key: {}", request.public_key)?;
        writeln!(stderr, "Bytes to sign (hex): {}", hex::encode(&request.message))?;
        if let Ok(text) = std::str::from_utf8(&request.message) {
            writeln!(stderr, "Bytes to sign (text): {text}")?;
        }
        write!(stderr, "Enter base64-encoded signature: ")?;
        stderr.flush()?;
        drop(stderr);

        let stdin =
            STDIN_LINES.get_or_init(|| LineReader::spawn(|line| io::stdin().read_line(line)));
        let line = stdin.read_line(self.timeout)?;

        let reply = line.trim();
        if reply.is_empty() {
            return Err(KeyringError::Cancelled);
        }
        Ok(reply.to_string())
    }
}
