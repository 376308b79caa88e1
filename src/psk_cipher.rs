//! Encryption and decryption for PSK-protocol messages.
//!
//! The symmetric key hybridises the ephemeral ECDH output with the
//! ratcheted per-counter key: an attacker must break both layers. Callers
//! derive the message key with [`crate::ratchet::derive_message_key`]
//! before encrypting or decrypting; counter bookkeeping lives in
//! [`crate::counters`].

use chacha20poly1305::{aead::Aead, Nonce};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::cipher::{aead, random_nonce};
use crate::content::{parse_content, MessageContent};
use crate::envelope::{PskEnvelope, PSK_MAX_PLAINTEXT};
use crate::error::{ChatError, Result};
use crate::identity::{generate_ephemeral, shared_secret};
use crate::kdf;

/// Encrypts a message under the PSK protocol.
///
/// `message_key` is the ratchet output for `counter`; the counter is
/// recorded in the envelope so the receiver can re-derive the same key.
pub fn encrypt_psk(
    plaintext: &str,
    sender_public: &PublicKey,
    recipient_public: &PublicKey,
    message_key: &[u8; 32],
    counter: u32,
) -> Result<PskEnvelope> {
    let message = plaintext.as_bytes();
    if message.len() > PSK_MAX_PLAINTEXT {
        return Err(ChatError::PayloadTooLarge {
            len: message.len(),
            max: PSK_MAX_PLAINTEXT,
        });
    }

    let (ephemeral_secret, ephemeral_public) = generate_ephemeral();

    let shared = shared_secret(&ephemeral_secret, recipient_public)?;
    let symmetric_key = kdf::psk_message_key(
        shared.as_ref(),
        message_key,
        ephemeral_public.as_bytes(),
        sender_public.as_bytes(),
        recipient_public.as_bytes(),
    );

    let nonce_bytes = random_nonce();
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = aead(symmetric_key.as_ref())
        .encrypt(nonce, message)
        .map_err(|_| ChatError::PayloadTooLarge {
            len: message.len(),
            max: PSK_MAX_PLAINTEXT,
        })?;

    let shared_self = shared_secret(&ephemeral_secret, sender_public)?;
    let sender_key = kdf::psk_sender_key(
        shared_self.as_ref(),
        message_key,
        ephemeral_public.as_bytes(),
        sender_public.as_bytes(),
    );
    let encrypted_sender_key = aead(sender_key.as_ref())
        .encrypt(nonce, symmetric_key.as_slice())
        .expect("sealing a 32-byte key cannot exceed AEAD limits");

    Ok(PskEnvelope {
        counter,
        sender_public_key: *sender_public.as_bytes(),
        ephemeral_public_key: *ephemeral_public.as_bytes(),
        nonce: nonce_bytes,
        encrypted_sender_key,
        ciphertext,
    })
}

/// Decrypts a PSK envelope with our long-term key pair and the message key
/// derived for the envelope's counter.
pub fn decrypt_psk(
    envelope: &PskEnvelope,
    my_secret: &StaticSecret,
    my_public: &PublicKey,
    message_key: &[u8; 32],
) -> Result<MessageContent> {
    let plaintext = if my_public.as_bytes() == &envelope.sender_public_key {
        open_as_sender(envelope, my_secret, message_key)?
    } else {
        open_as_recipient(envelope, my_secret, my_public, message_key)?
    };
    parse_content(&plaintext)
}

fn open_as_recipient(
    envelope: &PskEnvelope,
    my_secret: &StaticSecret,
    my_public: &PublicKey,
    message_key: &[u8; 32],
) -> Result<Vec<u8>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared = shared_secret(my_secret, &ephemeral_public)?;

    let symmetric_key = kdf::psk_message_key(
        shared.as_ref(),
        message_key,
        &envelope.ephemeral_public_key,
        &envelope.sender_public_key,
        my_public.as_bytes(),
    );

    aead(symmetric_key.as_ref())
        .decrypt(
            Nonce::from_slice(&envelope.nonce),
            envelope.ciphertext.as_slice(),
        )
        .map_err(|_| ChatError::DecryptFailed)
}

fn open_as_sender(
    envelope: &PskEnvelope,
    my_secret: &StaticSecret,
    message_key: &[u8; 32],
) -> Result<Vec<u8>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared_self = shared_secret(my_secret, &ephemeral_public)?;

    let sender_key = kdf::psk_sender_key(
        shared_self.as_ref(),
        message_key,
        &envelope.ephemeral_public_key,
        &envelope.sender_public_key,
    );

    let nonce = Nonce::from_slice(&envelope.nonce);
    let symmetric_key = Zeroizing::new(
        aead(sender_key.as_ref())
            .decrypt(nonce, envelope.encrypted_sender_key.as_slice())
            .map_err(|_| ChatError::DecryptFailed)?,
    );

    aead(symmetric_key.as_ref())
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map_err(|_| ChatError::DecryptFailed)
}
