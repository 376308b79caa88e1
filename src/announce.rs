//! Key-publish attestations.
//!
//! An encryption key becomes discoverable by publishing it in a
//! self-transfer note: the 32-byte X25519 key, optionally followed by an
//! Ed25519 signature from the account key. The signature proves the
//! encryption key belongs to the address and blocks key substitution.
//! Fetching announcement transactions is the indexer layer's job; this
//! module only builds, parses, and verifies the note bytes.

use data_encoding::BASE32_NOPAD;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::{ChatError, Result};
use crate::identity::PUBLIC_KEY_LEN;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Decoded Algorand address: 32-byte Ed25519 key plus 4-byte checksum.
const ADDRESS_DECODED_LEN: usize = 36;

/// An encryption key recovered from an announcement note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedKey {
    /// The announced X25519 public key.
    pub public_key: [u8; 32],
    /// Whether the attached signature verified against the address.
    pub verified: bool,
}

/// Signs an encryption public key with the account's Ed25519 key.
pub fn sign_encryption_key(public_key: &[u8; 32], signing_key: &SigningKey) -> [u8; 64] {
    signing_key.sign(public_key).to_bytes()
}

/// Verifies an encryption-key signature.
pub fn verify_encryption_key(
    public_key: &[u8; 32],
    verifying_key: &VerifyingKey,
    signature: &[u8],
) -> Result<bool> {
    let signature_bytes: [u8; SIGNATURE_LEN] = signature
        .try_into()
        .map_err(|_| ChatError::InvalidSignature)?;
    let signature = Signature::from_bytes(&signature_bytes);
    Ok(verifying_key.verify(public_key, &signature).is_ok())
}

/// Builds an announcement note: `key` or `key || signature`.
pub fn encode_announcement(public_key: &[u8; 32], signature: Option<&[u8; 64]>) -> Vec<u8> {
    let mut note = Vec::with_capacity(PUBLIC_KEY_LEN + SIGNATURE_LEN);
    note.extend_from_slice(public_key);
    if let Some(signature) = signature {
        note.extend_from_slice(signature);
    }
    note
}

/// Parses an announcement note and verifies its signature against the
/// announcing address. Returns `None` for notes that do not carry a key;
/// an unsigned or unverifiable note yields `verified: false`.
pub fn decode_announcement(note: &[u8], address: &str) -> Option<AnnouncedKey> {
    if note.len() < PUBLIC_KEY_LEN {
        return None;
    }

    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(&note[..PUBLIC_KEY_LEN]);

    let verified = if note.len() >= PUBLIC_KEY_LEN + SIGNATURE_LEN {
        let signature = &note[PUBLIC_KEY_LEN..PUBLIC_KEY_LEN + SIGNATURE_LEN];
        match decode_address(address) {
            Some(account_key) => VerifyingKey::from_bytes(&account_key)
                .ok()
                .and_then(|key| verify_encryption_key(&public_key, &key, signature).ok())
                .unwrap_or(false),
            None => false,
        }
    } else {
        false
    };

    Some(AnnouncedKey {
        public_key,
        verified,
    })
}

/// Extracts the Ed25519 public key from a base32 Algorand address.
pub fn decode_address(address: &str) -> Option<[u8; 32]> {
    let decoded = BASE32_NOPAD.decode(address.as_bytes()).ok()?;
    if decoded.len() != ADDRESS_DECODED_LEN {
        return None;
    }
    let mut account_key = [0u8; 32];
    account_key.copy_from_slice(&decoded[..32]);
    Some(account_key)
}

/// Human-readable fingerprint of an encryption key: the first eight bytes
/// of its SHA-256 hash in spaced groups, e.g. `"A7B3 C9D1 E5F2 8A4B"`.
pub fn fingerprint(public_key: &[u8; 32]) -> String {
    let hash = Sha256::digest(public_key);
    hash.iter()
        .take(8)
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|chunk| chunk.join(""))
        .collect::<Vec<_>>()
        .join(" ")
}
