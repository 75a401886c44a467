//! Symmetric key derivation for a chat session.
//!
//! Two modes, chosen by the operators and never negotiated over the wire:
//! a rotating key derived from a shared seed plus the local calendar day,
//! and a fixed key derived from a passphrase alone. Both are pure functions
//! of their inputs, so independent machines derive identical keys.

use std::fmt;

use chrono::Local;
use md5::Md5;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

/// Length of a derived key in characters.
pub const KEY_LEN: usize = 32;

/// Primary-digest characters kept before padding kicks in.
const PAD_KEEP: usize = 24;

/// Errors that can occur during key derivation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    /// The seed was empty or whitespace-only.
    #[error("Seed must not be empty")]
    EmptySeed,

    /// The passphrase was empty or whitespace-only.
    #[error("Passphrase must not be empty")]
    EmptyPassphrase,
}

/// A derived 32-character symmetric session key.
///
/// Immutable once derived; lives for the whole chat session. Key material
/// is wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    fn from_key_text(text: &str) -> Self {
        debug_assert_eq!(text.len(), KEY_LEN);
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(text.as_bytes());
        Self(key)
    }

    /// Raw key bytes fed to the cipher.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// The key as printable text (always lowercase hex characters).
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("key text is ASCII")
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never expose key material in debug output
        f.debug_tuple("SessionKey").field(&"[REDACTED]").finish()
    }
}

/// Derives today's rotating key from a shared seed.
///
/// Every machine with a synchronized clock derives the same key for the
/// same seed until local midnight, when the key rolls over.
pub fn daily_key(seed: &str) -> Result<SessionKey, KeyError> {
    let today = Local::now().format("%Y%m%d").to_string();
    daily_key_for_date(seed, &today)
}

/// Derives the rotating key for an explicit 8-digit calendar day.
pub fn daily_key_for_date(seed: &str, date: &str) -> Result<SessionKey, KeyError> {
    if seed.trim().is_empty() {
        return Err(KeyError::EmptySeed);
    }
    let digest = Sha256::digest(format!("{seed}{date}").as_bytes());
    Ok(SessionKey::from_key_text(&widen_digest(&hex::encode(
        digest,
    ))))
}

/// Derives a fixed key from a passphrase alone.
pub fn passphrase_key(passphrase: &str) -> Result<SessionKey, KeyError> {
    if passphrase.trim().is_empty() {
        return Err(KeyError::EmptyPassphrase);
    }
    let digest = Sha256::digest(passphrase.as_bytes());
    Ok(SessionKey::from_key_text(&widen_digest(&hex::encode(
        digest,
    ))))
}

/// Widens a hex digest to exactly [`KEY_LEN`] characters.
///
/// SHA-256 always yields 64 hex characters, so only the truncation branch
/// is reachable in practice. A shorter digest is padded with a second,
/// different hash over the hex text.
fn widen_digest(digest_hex: &str) -> String {
    if digest_hex.len() >= KEY_LEN {
        return digest_hex[..KEY_LEN].to_string();
    }
    let keep = digest_hex.len().min(PAD_KEEP);
    let fill = hex::encode(Md5::digest(digest_hex.as_bytes()));
    format!("{}{}", &digest_hex[..keep], &fill[..KEY_LEN - keep])
}
