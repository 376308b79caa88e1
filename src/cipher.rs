//! Encryption and decryption for base-protocol messages.
//!
//! Forward secrecy comes from the per-message ephemeral key alone. The
//! symmetric key is additionally sealed under a sender-derived key so the
//! sender can read their own messages back off the ledger.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::content::{parse_content, MessageContent};
use crate::envelope::{BaseEnvelope, BASE_MAX_PLAINTEXT, NONCE_LEN};
use crate::error::{ChatError, Result};
use crate::identity::{generate_ephemeral, shared_secret};
use crate::kdf;

pub(crate) fn aead(key: &[u8]) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new_from_slice(key).expect("ChaCha20-Poly1305 accepts 32-byte keys")
}

pub(crate) fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypts a message for a recipient under the base protocol.
///
/// The ephemeral secret and every derived key are zeroised before return.
pub fn encrypt_base(
    plaintext: &str,
    sender_public: &PublicKey,
    recipient_public: &PublicKey,
) -> Result<BaseEnvelope> {
    let message = plaintext.as_bytes();
    if message.len() > BASE_MAX_PLAINTEXT {
        return Err(ChatError::PayloadTooLarge {
            len: message.len(),
            max: BASE_MAX_PLAINTEXT,
        });
    }

    let (ephemeral_secret, ephemeral_public) = generate_ephemeral();

    let shared = shared_secret(&ephemeral_secret, recipient_public)?;
    let message_key = kdf::base_message_key(
        shared.as_ref(),
        ephemeral_public.as_bytes(),
        sender_public.as_bytes(),
        recipient_public.as_bytes(),
    );

    let nonce_bytes = random_nonce();
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = aead(message_key.as_ref())
        .encrypt(nonce, message)
        .map_err(|_| ChatError::PayloadTooLarge {
            len: message.len(),
            max: BASE_MAX_PLAINTEXT,
        })?;

    // Seal the symmetric key for the sender-recovery path. Reusing the
    // nonce is safe: the key differs.
    let shared_self = shared_secret(&ephemeral_secret, sender_public)?;
    let sender_key = kdf::base_sender_key(
        shared_self.as_ref(),
        ephemeral_public.as_bytes(),
        sender_public.as_bytes(),
    );
    let encrypted_sender_key = aead(sender_key.as_ref())
        .encrypt(nonce, message_key.as_slice())
        .expect("sealing a 32-byte key cannot exceed AEAD limits");

    Ok(BaseEnvelope {
        sender_public_key: *sender_public.as_bytes(),
        ephemeral_public_key: *ephemeral_public.as_bytes(),
        nonce: nonce_bytes,
        encrypted_sender_key,
        ciphertext,
    })
}

/// Decrypts a base envelope with our long-term key pair.
///
/// Picks the recipient or sender-recovery path by comparing the envelope's
/// sender key against our own public key. Any tampering or key mismatch
/// yields the opaque [`ChatError::DecryptFailed`].
pub fn decrypt_base(
    envelope: &BaseEnvelope,
    my_secret: &StaticSecret,
    my_public: &PublicKey,
) -> Result<MessageContent> {
    let plaintext = if my_public.as_bytes() == &envelope.sender_public_key {
        open_as_sender(envelope, my_secret)?
    } else {
        open_as_recipient(envelope, my_secret, my_public)?
    };
    parse_content(&plaintext)
}

fn open_as_recipient(
    envelope: &BaseEnvelope,
    my_secret: &StaticSecret,
    my_public: &PublicKey,
) -> Result<Vec<u8>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared = shared_secret(my_secret, &ephemeral_public)?;

    let message_key = kdf::base_message_key(
        shared.as_ref(),
        &envelope.ephemeral_public_key,
        &envelope.sender_public_key,
        my_public.as_bytes(),
    );

    aead(message_key.as_ref())
        .decrypt(
            Nonce::from_slice(&envelope.nonce),
            envelope.ciphertext.as_slice(),
        )
        .map_err(|_| ChatError::DecryptFailed)
}

fn open_as_sender(envelope: &BaseEnvelope, my_secret: &StaticSecret) -> Result<Vec<u8>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared_self = shared_secret(my_secret, &ephemeral_public)?;

    let sender_key = kdf::base_sender_key(
        shared_self.as_ref(),
        &envelope.ephemeral_public_key,
        &envelope.sender_public_key,
    );

    let nonce = Nonce::from_slice(&envelope.nonce);
    let message_key = Zeroizing::new(
        aead(sender_key.as_ref())
            .decrypt(nonce, envelope.encrypted_sender_key.as_slice())
            .map_err(|_| ChatError::DecryptFailed)?,
    );

    aead(message_key.as_ref())
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map_err(|_| ChatError::DecryptFailed)
}
