//! # Blindrelay - encrypted group chat through a blind relay
//!
//! A central relay accepts TCP connections, tags every inbound payload with
//! the sender's identity, and rebroadcasts it to all connected peers - the
//! sender included. The relay never holds key material and never decrypts
//! traffic; peers seal and open messages themselves with a shared symmetric
//! key derived out-of-band.
//!
//! ## Key derivation
//!
//! Two modes, chosen by the operators and never negotiated over the wire:
//! - Rotating daily: first 32 hex characters of `sha256(seed || YYYYMMDD)`.
//!   Same seed and same local calendar day give the same key everywhere.
//! - Passphrase: first 32 hex characters of `sha256(passphrase)`.
//!
//! ## Wire format
//!
//! One frame is the text `"<sender>:<ciphertext>"` where the ciphertext is
//! `base64(iv || aes-256-cbc(plaintext))`. Parsing splits on the first `:`
//! only. There is no handshake and there are no control frames.
//!
//! ## Modules
//!
//! - [`crypto`]: key derivation and the AES-CBC message cipher
//! - [`protocol`]: frame compose/parse and the sealed-message pipeline
//! - [`relay`]: connection registry, broadcast dispatcher, relay server
//! - [`client`]: peer-side connection to a relay
//! - [`tui`]: terminal chat interface
//! - [`commands`]: CLI commands

pub mod client;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod protocol;
pub mod relay;
pub mod tui;

// Re-export commonly used types at the crate root
pub use client::{ClientError, RelayConnection, CONNECT_TIMEOUT, READ_BUFFER_SIZE};
pub use config::AppConfig;
pub use crypto::{
    daily_key, daily_key_for_date, passphrase_key, CipherError, KeyError, SessionKey, KEY_LEN,
};
pub use protocol::{
    compose_frame, is_displayable, open_frame, seal_message, split_frame, FrameError,
};
pub use relay::{
    BroadcastDispatcher, ConnectionRegistry, InboundMessage, PeerHandle, RelayConfig, RelayError,
    RelayServer, DEFAULT_QUEUE_CAPACITY,
};
