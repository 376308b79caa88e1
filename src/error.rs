//! Error taxonomy for the AlgoChat core.

use thiserror::Error;

/// Errors returned by the AlgoChat core.
///
/// Decryption failures are deliberately collapsed into the single opaque
/// [`ChatError::DecryptFailed`] kind: a wrong key, a tampered ciphertext, a
/// mismatched PSK, and a garbled payload are indistinguishable to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Decoded bytes fall below the header-plus-tag minimum.
    #[error("envelope too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    /// First byte is not the supported protocol version.
    #[error("unsupported protocol version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// Second byte is not a known protocol id.
    #[error("unsupported protocol id: {0:#04x}")]
    UnsupportedProtocol(u8),

    /// Plaintext exceeds the per-protocol cap, or an envelope exceeds the
    /// note-field limit.
    #[error("payload too large: {len} bytes (maximum {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// Seed or PSK with the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// X25519 produced the all-zero shared secret.
    #[error("Diffie-Hellman produced an all-zero shared secret")]
    BadDhOutput,

    /// AEAD authentication failed.
    #[error("decryption failed")]
    DecryptFailed,

    /// The send counter has reached its maximum value.
    #[error("send counter exhausted")]
    CounterOverflow,

    /// Incoming counter was already accepted.
    #[error("counter {0} already seen")]
    CounterReplay(u32),

    /// Incoming counter falls outside the sliding window.
    #[error("counter {0} outside the replay window")]
    CounterOutOfWindow(u32),

    /// PSK envelope received for a peer without an initialised session.
    #[error("no PSK session for this peer")]
    NoSessionKey,

    /// Exchange URI with a bad scheme, missing fields, or malformed base64.
    #[error("invalid exchange URI: {0}")]
    InvalidUri(String),

    /// Counter-state blob rejected by the deserialiser.
    #[error("corrupt counter state: {0}")]
    StateCorrupt(String),

    /// Ed25519 key-attestation signature with the wrong length or encoding.
    #[error("invalid signature")]
    InvalidSignature,
}

pub type Result<T> = std::result::Result<T, ChatError>;
