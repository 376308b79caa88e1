//! Wire-format envelopes for both protocols.
//!
//! Base layout (126-byte header + ciphertext):
//! - \[0\]:        version (0x01)
//! - \[1\]:        protocolId (0x01)
//! - \[2..34\]:    senderPublicKey (32 bytes)
//! - \[34..66\]:   ephemeralPublicKey (32 bytes)
//! - \[66..78\]:   nonce (12 bytes)
//! - \[78..126\]:  encryptedSenderKey (48 bytes)
//! - \[126..\]:    ciphertext + 16-byte authentication tag
//!
//! PSK layout (130-byte header + ciphertext): identical except
//! protocolId is 0x02 and a big-endian u32 counter sits at \[2..6\],
//! shifting every later field by 4 bytes.
//!
//! Both serialised forms must fit in a 1024-byte transaction note.

use crate::error::{ChatError, Result};
use crate::identity::PUBLIC_KEY_LEN;

/// Protocol version byte shared by both envelope kinds.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Protocol id of the base envelope.
pub const BASE_PROTOCOL_ID: u8 = 0x01;

/// Protocol id of the PSK envelope.
pub const PSK_PROTOCOL_ID: u8 = 0x02;

/// Nonce length for ChaCha20-Poly1305.
pub const NONCE_LEN: usize = 12;

/// Poly1305 authentication tag length.
pub const TAG_LEN: usize = 16;

/// Encrypted sender key slot: 32-byte key plus tag.
pub const SENDER_KEY_LEN: usize = 48;

/// Base envelope header length.
pub const BASE_HEADER_LEN: usize = 126;

/// PSK envelope header length (base plus the 4-byte counter).
pub const PSK_HEADER_LEN: usize = 130;

/// Hard cap on a serialised envelope: one transaction note.
pub const MAX_NOTE_LEN: usize = 1024;

/// Maximum plaintext for the base protocol.
pub const BASE_MAX_PLAINTEXT: usize = MAX_NOTE_LEN - BASE_HEADER_LEN - TAG_LEN;

/// Maximum plaintext for the PSK protocol.
pub const PSK_MAX_PLAINTEXT: usize = MAX_NOTE_LEN - PSK_HEADER_LEN - TAG_LEN;

/// A base-protocol envelope.
///
/// Version and protocol id are fixed by the wire format and not stored;
/// [`BaseEnvelope::decode`] verifies them and [`BaseEnvelope::encode`]
/// emits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEnvelope {
    /// Sender's long-term X25519 public key.
    pub sender_public_key: [u8; 32],
    /// One-use X25519 public key for this message.
    pub ephemeral_public_key: [u8; 32],
    /// Random AEAD nonce, shared by both ciphertext slots.
    pub nonce: [u8; 12],
    /// Symmetric key encrypted for the sender-recovery path (48 bytes).
    pub encrypted_sender_key: Vec<u8>,
    /// Message ciphertext with trailing tag.
    pub ciphertext: Vec<u8>,
}

impl BaseEnvelope {
    /// Serialises the envelope.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(BASE_HEADER_LEN + self.ciphertext.len());
        data.push(PROTOCOL_VERSION);
        data.push(BASE_PROTOCOL_ID);
        data.extend_from_slice(&self.sender_public_key);
        data.extend_from_slice(&self.ephemeral_public_key);
        data.extend_from_slice(&self.nonce);
        data.extend_from_slice(&self.encrypted_sender_key);
        data.extend_from_slice(&self.ciphertext);
        data
    }

    /// Parses a base envelope from raw bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        check_note_len(data, BASE_HEADER_LEN)?;
        check_discriminator(data, BASE_PROTOCOL_ID)?;

        let mut offset = 2;
        let sender_public_key = read_key(data, &mut offset);
        let ephemeral_public_key = read_key(data, &mut offset);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[offset..offset + NONCE_LEN]);
        offset += NONCE_LEN;

        let encrypted_sender_key = data[offset..offset + SENDER_KEY_LEN].to_vec();
        offset += SENDER_KEY_LEN;

        Ok(Self {
            sender_public_key,
            ephemeral_public_key,
            nonce,
            encrypted_sender_key,
            ciphertext: data[offset..].to_vec(),
        })
    }
}

/// A PSK-protocol envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskEnvelope {
    /// Ratchet counter used to derive the per-message key.
    pub counter: u32,
    /// Sender's long-term X25519 public key.
    pub sender_public_key: [u8; 32],
    /// One-use X25519 public key for this message.
    pub ephemeral_public_key: [u8; 32],
    /// Random AEAD nonce, shared by both ciphertext slots.
    pub nonce: [u8; 12],
    /// Symmetric key encrypted for the sender-recovery path (48 bytes).
    pub encrypted_sender_key: Vec<u8>,
    /// Message ciphertext with trailing tag.
    pub ciphertext: Vec<u8>,
}

impl PskEnvelope {
    /// Serialises the envelope.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(PSK_HEADER_LEN + self.ciphertext.len());
        data.push(PROTOCOL_VERSION);
        data.push(PSK_PROTOCOL_ID);
        data.extend_from_slice(&self.counter.to_be_bytes());
        data.extend_from_slice(&self.sender_public_key);
        data.extend_from_slice(&self.ephemeral_public_key);
        data.extend_from_slice(&self.nonce);
        data.extend_from_slice(&self.encrypted_sender_key);
        data.extend_from_slice(&self.ciphertext);
        data
    }

    /// Parses a PSK envelope from raw bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        check_note_len(data, PSK_HEADER_LEN)?;
        check_discriminator(data, PSK_PROTOCOL_ID)?;

        let counter = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
        let mut offset = 6;

        let sender_public_key = read_key(data, &mut offset);
        let ephemeral_public_key = read_key(data, &mut offset);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[offset..offset + NONCE_LEN]);
        offset += NONCE_LEN;

        let encrypted_sender_key = data[offset..offset + SENDER_KEY_LEN].to_vec();
        offset += SENDER_KEY_LEN;

        Ok(Self {
            counter,
            sender_public_key,
            ephemeral_public_key,
            nonce,
            encrypted_sender_key,
            ciphertext: data[offset..].to_vec(),
        })
    }
}

/// Whether the bytes carry the base-envelope discriminator and at least a
/// header plus tag.
pub fn is_base_envelope(data: &[u8]) -> bool {
    data.len() >= BASE_HEADER_LEN + TAG_LEN
        && data[0] == PROTOCOL_VERSION
        && data[1] == BASE_PROTOCOL_ID
}

/// Whether the bytes carry the PSK-envelope discriminator and at least a
/// header plus tag.
pub fn is_psk_envelope(data: &[u8]) -> bool {
    data.len() >= PSK_HEADER_LEN + TAG_LEN
        && data[0] == PROTOCOL_VERSION
        && data[1] == PSK_PROTOCOL_ID
}

fn check_note_len(data: &[u8], header_len: usize) -> Result<()> {
    let min = header_len + TAG_LEN;
    if data.len() < min {
        return Err(ChatError::TooShort {
            len: data.len(),
            min,
        });
    }
    if data.len() > MAX_NOTE_LEN {
        return Err(ChatError::PayloadTooLarge {
            len: data.len(),
            max: MAX_NOTE_LEN,
        });
    }
    Ok(())
}

fn check_discriminator(data: &[u8], protocol_id: u8) -> Result<()> {
    if data[0] != PROTOCOL_VERSION {
        return Err(ChatError::UnsupportedVersion(data[0]));
    }
    if data[1] != protocol_id {
        return Err(ChatError::UnsupportedProtocol(data[1]));
    }
    Ok(())
}

fn read_key(data: &[u8], offset: &mut usize) -> [u8; 32] {
    let mut key = [0u8; PUBLIC_KEY_LEN];
    key.copy_from_slice(&data[*offset..*offset + PUBLIC_KEY_LEN]);
    *offset += PUBLIC_KEY_LEN;
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_fixture() -> BaseEnvelope {
        BaseEnvelope {
            sender_public_key: [1u8; 32],
            ephemeral_public_key: [2u8; 32],
            nonce: [3u8; 12],
            encrypted_sender_key: vec![4u8; 48],
            ciphertext: vec![5u8; 32],
        }
    }

    fn psk_fixture(counter: u32) -> PskEnvelope {
        PskEnvelope {
            counter,
            sender_public_key: [1u8; 32],
            ephemeral_public_key: [2u8; 32],
            nonce: [3u8; 12],
            encrypted_sender_key: vec![4u8; 48],
            ciphertext: vec![5u8; 16],
        }
    }

    #[test]
    fn base_roundtrip() {
        let envelope = base_fixture();
        let encoded = envelope.encode();
        assert_eq!(encoded.len(), BASE_HEADER_LEN + 32);
        assert_eq!(BaseEnvelope::decode(&encoded).unwrap(), envelope);
    }

    #[test]
    fn psk_roundtrip() {
        let envelope = psk_fixture(42);
        let encoded = envelope.encode();
        assert_eq!(encoded.len(), PSK_HEADER_LEN + 16);
        assert_eq!(PskEnvelope::decode(&encoded).unwrap(), envelope);
    }

    #[test]
    fn counter_is_big_endian() {
        let encoded = psk_fixture(0x01020304).encode();
        assert_eq!(&encoded[2..6], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn counter_extremes_roundtrip() {
        for counter in [0, u32::MAX] {
            let encoded = psk_fixture(counter).encode();
            assert_eq!(PskEnvelope::decode(&encoded).unwrap().counter, counter);
        }
    }

    #[test]
    fn decode_requires_header_plus_tag() {
        // A bare header without the minimum tag is still too short.
        let truncated = vec![0x01; BASE_HEADER_LEN];
        assert_eq!(
            BaseEnvelope::decode(&truncated).unwrap_err(),
            ChatError::TooShort {
                len: BASE_HEADER_LEN,
                min: BASE_HEADER_LEN + TAG_LEN,
            }
        );

        let truncated = vec![0u8; PSK_HEADER_LEN + TAG_LEN - 1];
        assert!(matches!(
            PskEnvelope::decode(&truncated).unwrap_err(),
            ChatError::TooShort { .. }
        ));
    }

    #[test]
    fn decode_rejects_oversized_notes() {
        let mut envelope = base_fixture();
        envelope.ciphertext = vec![0u8; MAX_NOTE_LEN];
        let encoded = envelope.encode();
        assert!(matches!(
            BaseEnvelope::decode(&encoded).unwrap_err(),
            ChatError::PayloadTooLarge { .. }
        ));
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let mut encoded = base_fixture().encode();
        encoded[0] = 0x02;
        assert_eq!(
            BaseEnvelope::decode(&encoded).unwrap_err(),
            ChatError::UnsupportedVersion(0x02)
        );
    }

    #[test]
    fn decode_rejects_crossed_protocol_ids() {
        let base = base_fixture().encode();
        assert_eq!(
            PskEnvelope::decode(&base).unwrap_err(),
            ChatError::UnsupportedProtocol(BASE_PROTOCOL_ID)
        );

        let psk = psk_fixture(7).encode();
        assert_eq!(
            BaseEnvelope::decode(&psk).unwrap_err(),
            ChatError::UnsupportedProtocol(PSK_PROTOCOL_ID)
        );
    }

    #[test]
    fn classifiers_check_discriminator_and_length() {
        assert!(is_base_envelope(&base_fixture().encode()));
        assert!(is_psk_envelope(&psk_fixture(0).encode()));

        // Right magic, too short.
        assert!(!is_base_envelope(&[0x01, 0x01]));
        assert!(!is_psk_envelope(&vec![0u8; PSK_HEADER_LEN]));

        // Wrong magic, right length.
        let mut data = base_fixture().encode();
        data[1] = 0x03;
        assert!(!is_base_envelope(&data));
        assert!(!is_psk_envelope(&[]));
    }

    #[test]
    fn plaintext_caps_fill_the_note() {
        assert_eq!(BASE_HEADER_LEN + TAG_LEN + BASE_MAX_PLAINTEXT, MAX_NOTE_LEN);
        assert_eq!(PSK_HEADER_LEN + TAG_LEN + PSK_MAX_PLAINTEXT, MAX_NOTE_LEN);
        assert_eq!(BASE_MAX_PLAINTEXT, 882);
        assert_eq!(PSK_MAX_PLAINTEXT, 878);
    }
}
