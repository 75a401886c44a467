//! Wire framing and the sealed-message pipeline.
//!
//! One frame is the textual unit `"<sender>:<ciphertext>"`. Peers write the
//! bare ciphertext; the relay prepends the sender tag without ever parsing
//! the payload. Parsing splits on the FIRST `:` only, so ciphertext that
//! itself contains `:` is safe. Frames carry no length prefix and no
//! delimiter; one socket read is treated as one frame.

use thiserror::Error;

use crate::crypto::cipher::{self, CipherError};
use crate::crypto::keys::SessionKey;

/// Separator between the sender tag and the ciphertext.
pub const FRAME_SEPARATOR: u8 = b':';

/// Errors that can occur while framing or unsealing a message.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The frame has no separator; dropped silently by receivers.
    #[error("Malformed frame: no separator")]
    MissingSeparator,

    /// The sender tag is not a decimal integer.
    #[error("Malformed frame: sender tag is not numeric")]
    InvalidSender,

    /// The ciphertext could not be decrypted.
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Decryption produced bytes that are not displayable text.
    #[error("Message is not displayable text, key mismatch suspected")]
    KeyMismatchSuspected,
}

/// Encrypts a chat message into the text a peer writes to the relay.
///
/// Rejecting empty input is the caller's job: an empty-after-trim message
/// is a no-op at the send site, not an error here.
pub fn seal_message(plaintext: &str, key: &SessionKey) -> Result<String, FrameError> {
    Ok(cipher::encrypt(plaintext.as_bytes(), key)?)
}

/// Tags a raw payload with its sender identity.
///
/// Used by the relay, which treats the payload as opaque bytes.
pub fn compose_frame(sender: u64, payload: &[u8]) -> Vec<u8> {
    let tag = format!("{sender}:");
    let mut frame = Vec::with_capacity(tag.len() + payload.len());
    frame.extend_from_slice(tag.as_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Splits a frame into sender identity and payload at the first separator.
pub fn split_frame(raw: &[u8]) -> Result<(u64, &[u8]), FrameError> {
    let at = raw
        .iter()
        .position(|&b| b == FRAME_SEPARATOR)
        .ok_or(FrameError::MissingSeparator)?;
    let sender = std::str::from_utf8(&raw[..at])
        .ok()
        .and_then(|tag| tag.parse::<u64>().ok())
        .ok_or(FrameError::InvalidSender)?;
    Ok((sender, &raw[at + 1..]))
}

/// Decrypts a received frame into its sender and plaintext.
///
/// A decryption failure or an undisplayable result is surfaced as a warning
/// condition, never as chat content.
pub fn open_frame(raw: &[u8], key: &SessionKey) -> Result<(u64, String), FrameError> {
    let (sender, payload) = split_frame(raw)?;
    let ciphertext = String::from_utf8_lossy(payload);
    let plaintext = cipher::decrypt(&ciphertext, key)?;

    let text = String::from_utf8(plaintext).map_err(|_| FrameError::KeyMismatchSuspected)?;
    if !is_displayable(&text) {
        return Err(FrameError::KeyMismatchSuspected);
    }
    Ok((sender, text))
}

/// Checks that every character can be rendered as chat text.
///
/// Control characters other than newline, carriage return, and tab are
/// taken as a sign the ciphertext was decrypted with the wrong key.
pub fn is_displayable(text: &str) -> bool {
    text.chars()
        .all(|c| matches!(c, '\n' | '\r' | '\t') || !c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::passphrase_key;

    #[test]
    fn test_compose_split_roundtrip() {
        let frame = compose_frame(7, b"payload");
        assert_eq!(frame, b"7:payload");

        let (sender, payload) = split_frame(&frame).unwrap();
        assert_eq!(sender, 7);
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn test_split_uses_first_separator_only() {
        let (sender, payload) = split_frame(b"12:cipher:with:colons").unwrap();
        assert_eq!(sender, 12);
        assert_eq!(payload, b"cipher:with:colons");
    }

    #[test]
    fn test_missing_separator_is_framing_error() {
        assert!(matches!(
            split_frame(b"no separator here"),
            Err(FrameError::MissingSeparator)
        ));
    }

    #[test]
    fn test_non_numeric_sender_is_rejected() {
        assert!(matches!(
            split_frame(b"abc:payload"),
            Err(FrameError::InvalidSender)
        ));
        assert!(matches!(
            split_frame(b":payload"),
            Err(FrameError::InvalidSender)
        ));
    }

    #[test]
    fn test_seal_then_open_roundtrip() {
        let key = passphrase_key("shared").unwrap();

        let wire = seal_message("hello", &key).unwrap();
        let frame = compose_frame(1, wire.as_bytes());

        let (sender, text) = open_frame(&frame, &key).unwrap();
        assert_eq!(sender, 1);
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_open_with_wrong_key_is_flagged() {
        let correct = passphrase_key("correct").unwrap();
        let wrong = passphrase_key("wrong").unwrap();

        let wire = seal_message("hello", &correct).unwrap();
        let frame = compose_frame(1, wire.as_bytes());

        match open_frame(&frame, &wrong) {
            Err(FrameError::Cipher(_)) | Err(FrameError::KeyMismatchSuspected) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok((_, text)) => assert_ne!(text, "hello"),
        }
    }

    #[test]
    fn test_multiline_text_is_displayable() {
        assert!(is_displayable("first line\nsecond\tindented\r\n"));
    }

    #[test]
    fn test_unicode_text_is_displayable() {
        assert!(is_displayable("héllo wörld ✓ 你好"));
    }

    #[test]
    fn test_control_bytes_are_not_displayable() {
        assert!(!is_displayable("null\0byte"));
        assert!(!is_displayable("\x1b[31mansi"));
        assert!(!is_displayable("bell\x07"));
    }
}
