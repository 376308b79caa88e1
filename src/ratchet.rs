//! Two-level key ratchet for the PSK protocol.
//!
//! A counter maps to a `(session, position)` pair:
//! - session key: `HKDF(ikm=initial_psk, salt="AlgoChat-PSK-Session", info=be32(counter / 100))`
//! - message key: `HKDF(ikm=session_key, salt="AlgoChat-PSK-Position", info=be32(counter % 100))`
//!
//! Leaking one message key reveals no other message; leaking a session key
//! bounds the damage to one hundred consecutive counters. The 4-byte
//! big-endian `info` encoding is a wire constant.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{ChatError, Result};

/// Counters per session before the session key rotates.
pub const SESSION_SIZE: u32 = 100;

/// Required length of the initial pre-shared key.
pub const PSK_LEN: usize = 32;

const SESSION_SALT: &[u8] = b"AlgoChat-PSK-Session";
const POSITION_SALT: &[u8] = b"AlgoChat-PSK-Position";

fn expand_indexed(salt: &[u8], ikm: &[u8], index: u32) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; 32];
    hk.expand(&index.to_be_bytes(), &mut okm)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    okm
}

fn check_psk_len(initial_psk: &[u8]) -> Result<()> {
    if initial_psk.len() != PSK_LEN {
        return Err(ChatError::InvalidKeyLength {
            expected: PSK_LEN,
            actual: initial_psk.len(),
        });
    }
    Ok(())
}

/// Derives the session key for a session index.
pub fn derive_session_key(initial_psk: &[u8], session_index: u32) -> Result<[u8; 32]> {
    check_psk_len(initial_psk)?;
    Ok(expand_indexed(SESSION_SALT, initial_psk, session_index))
}

/// Derives the key at a position within a session.
pub fn derive_position_key(session_key: &[u8; 32], position: u32) -> [u8; 32] {
    expand_indexed(POSITION_SALT, session_key, position)
}

/// Derives the per-message key for a ratchet counter.
///
/// Deterministic in its inputs; both peers derive the same key for the
/// same `(initial_psk, counter)`.
pub fn derive_message_key(initial_psk: &[u8], counter: u32) -> Result<[u8; 32]> {
    let session_index = counter / SESSION_SIZE;
    let position = counter % SESSION_SIZE;

    let session_key = Zeroizing::new(derive_session_key(initial_psk, session_index)?);
    Ok(derive_position_key(&session_key, position))
}
