//! Cryptographic operations for blindrelay.
//!
//! This module provides:
//! - Symmetric key derivation (rotating daily seed or passphrase)
//! - AES-256-CBC message encryption with random IVs

pub mod cipher;
pub mod keys;

pub use cipher::{decrypt, encrypt, CipherError, IV_SIZE};
pub use keys::{daily_key, daily_key_for_date, passphrase_key, KeyError, SessionKey, KEY_LEN};
