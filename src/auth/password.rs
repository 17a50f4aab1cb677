//! Password verification against the scheme strings stored in the mailbox
//! directory. iRedMail predates this service and stores whatever scheme the
//! mail server chose, so verification is format-polymorphic: the stored
//! value is classified by prefix and each scheme has its own pure check.
//!
//! Comparison is byte-exact; constant-time comparison is an open hardening
//! item.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha512};

/// Stored-value formats, tested as ordered prefix matches. Anything that is
/// not a recognized prefix (bcrypt-family `$2a$`/`$2b$` included) goes to
/// the external checker.
#[derive(Debug, PartialEq, Eq)]
pub enum Scheme<'a> {
    Ssha512(&'a str),
    Ssha(&'a str),
    Plain(&'a str),
    Md5(&'a str),
    External(&'a str),
}

pub fn classify(stored: &str) -> Scheme<'_> {
    if let Some(rest) = stored.strip_prefix("{SSHA512}") {
        Scheme::Ssha512(rest)
    } else if let Some(rest) = stored.strip_prefix("{SSHA}") {
        Scheme::Ssha(rest)
    } else if let Some(rest) = stored.strip_prefix("{PLAIN}") {
        Scheme::Plain(rest)
    } else if let Some(rest) = stored.strip_prefix("{MD5}") {
        Scheme::Md5(rest)
    } else {
        Scheme::External(stored)
    }
}

/// Port for the system password tool used for bcrypt-family and unknown
/// schemes. `None` means the tool is unavailable, in which case the caller
/// falls back to direct equality against the stored value.
#[async_trait]
pub trait ExternalChecker: Send + Sync {
    async fn check(&self, plaintext: &str, stored: &str) -> Option<bool>;
}

/// Shells out to `doveadm pw -t`. Bounded by a fixed timeout; a timeout or
/// any abnormal exit fails closed.
pub struct DoveadmChecker {
    path: String,
    timeout: Duration,
}

impl DoveadmChecker {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        DoveadmChecker {
            path: path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ExternalChecker for DoveadmChecker {
    async fn check(&self, plaintext: &str, stored: &str) -> Option<bool> {
        let mut cmd = tokio::process::Command::new(&self.path);
        cmd.arg("pw")
            .arg("-t")
            .arg(stored)
            .arg("-p")
            .arg(plaintext)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, "doveadm spawn failed");
                return None;
            }
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(out)) => Some(out.status.success()),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "doveadm wait failed");
                Some(false)
            }
            Err(_) => {
                tracing::warn!("doveadm timed out, failing closed");
                Some(false)
            }
        }
    }
}

pub struct PasswordVerifier {
    checker: Box<dyn ExternalChecker>,
}

impl PasswordVerifier {
    pub fn new(checker: Box<dyn ExternalChecker>) -> Self {
        PasswordVerifier { checker }
    }

    /// Never fails: malformed or unsupported stored values verify as false.
    pub async fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let stored = stored.trim();
        match classify(stored) {
            Scheme::Ssha512(rest) => verify_ssha512(plaintext, rest),
            Scheme::Ssha(rest) => verify_ssha(plaintext, rest),
            Scheme::Plain(rest) => plaintext == rest,
            Scheme::Md5(rest) => verify_md5(plaintext, rest),
            Scheme::External(raw) => match self.checker.check(plaintext, raw).await {
                Some(ok) => ok,
                None => plaintext == raw,
            },
        }
    }
}

fn verify_ssha512(plaintext: &str, encoded: &str) -> bool {
    salted_digest_matches::<Sha512>(plaintext, encoded, 64)
}

fn verify_ssha(plaintext: &str, encoded: &str) -> bool {
    salted_digest_matches::<Sha1>(plaintext, encoded, 20)
}

/// Decoded layout: first `n` bytes are the digest, last `n` bytes the salt.
/// Anything shorter than digest + salt is treated as corrupt.
fn salted_digest_matches<D: Digest>(plaintext: &str, encoded: &str, n: usize) -> bool {
    let decoded = match BASE64.decode(encoded) {
        Ok(d) => d,
        Err(_) => return false,
    };
    if decoded.len() < n * 2 {
        return false;
    }
    let digest = &decoded[..n];
    let salt = &decoded[decoded.len() - n..];

    let mut hasher = D::new();
    hasher.update(plaintext.as_bytes());
    hasher.update(salt);
    hasher.finalize().as_slice() == digest
}

fn verify_md5(plaintext: &str, remainder: &str) -> bool {
    let digest = hex::encode(Md5::digest(plaintext.as_bytes()));
    digest.eq_ignore_ascii_case(remainder)
}
