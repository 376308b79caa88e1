//! Core message layer for AlgoChat: end-to-end encrypted messaging over
//! Algorand transaction notes.
//!
//! Two wire-compatible protocols share the note field: the base protocol
//! (X25519 + ChaCha20-Poly1305, forward secret through per-message
//! ephemeral keys) and the PSK protocol (the same hybridised with a
//! ratcheted pre-shared key and a replay-protected counter). Every
//! serialised envelope fits in a single 1024-byte note.
//!
//! The crate is a pure library: deterministic given its inputs, no I/O,
//! and no state beyond the per-peer [`CounterState`] records owned by the
//! caller.

mod announce;
mod cipher;
mod content;
mod counters;
mod dispatch;
mod envelope;
mod error;
mod exchange;
mod identity;
mod kdf;
mod psk_cipher;
mod ratchet;

pub use announce::*;
pub use cipher::{decrypt_base, encrypt_base};
pub use content::*;
pub use counters::*;
pub use dispatch::*;
pub use envelope::*;
pub use error::*;
pub use exchange::*;
pub use identity::{derive_identity_keys, KeyPair, PUBLIC_KEY_LEN, SEED_LEN};
pub use psk_cipher::{decrypt_psk, encrypt_psk};
pub use ratchet::*;
