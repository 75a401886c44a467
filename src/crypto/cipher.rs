//! AES-256-CBC message encryption.
//!
//! Wraps the block cipher behind a pair of text-oriented helpers. The wire
//! format is `base64(iv || ciphertext)` with a fresh random IV per message,
//! so the same plaintext never seals to the same wire text twice.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::crypto::keys::SessionKey;

/// IV size for AES-CBC.
pub const IV_SIZE: usize = 16;

/// AES block size in bytes.
const BLOCK_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Errors that can occur during message encryption.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed, likely key mismatch")]
    DecryptionFailed,

    #[error("Invalid ciphertext: too short")]
    CiphertextTooShort,
}

/// Encrypts a plaintext into wire text.
pub fn encrypt(plaintext: &[u8], key: &SessionKey) -> Result<String, CipherError> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|_| CipherError::EncryptionFailed)?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    // Prepend the IV so decryption is self-contained
    let mut sealed = Vec::with_capacity(IV_SIZE + ciphertext.len());
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(&sealed))
}

/// Decrypts wire text produced by [`encrypt`].
pub fn decrypt(encoded: &str, key: &SessionKey) -> Result<Vec<u8>, CipherError> {
    let sealed = BASE64
        .decode(encoded.trim())
        .map_err(|_| CipherError::DecryptionFailed)?;

    // Minimum: IV plus one cipher block
    if sealed.len() < IV_SIZE + BLOCK_SIZE {
        return Err(CipherError::CiphertextTooShort);
    }
    let (iv, ciphertext) = sealed.split_at(IV_SIZE);
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::DecryptionFailed);
    }

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| CipherError::DecryptionFailed)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::DecryptionFailed)
}
