//! HKDF-SHA256 derivations for the hybrid message keys.
//!
//! Every derivation site uses a distinct `(salt, info)` pair for domain
//! separation. The info-prefix labels are byte-exact wire constants:
//! independent implementations must produce identical keys.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Info prefix for the base-protocol message key.
const BASE_MESSAGE_INFO: &[u8] = b"AlgoChatV1";

/// Info prefix for the base-protocol sender key.
const BASE_SENDER_INFO: &[u8] = b"AlgoChatV1-SenderKey";

/// Info prefix for the PSK-protocol message key.
const PSK_MESSAGE_INFO: &[u8] = b"AlgoChatV1-PSK";

/// Info prefix for the PSK-protocol sender key.
const PSK_SENDER_INFO: &[u8] = b"AlgoChatV1-PSK-SenderKey";

fn expand32(salt: &[u8], ikm: &[u8], info: &[u8]) -> Zeroizing<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(info, okm.as_mut())
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    okm
}

/// Symmetric key for the base protocol:
/// `HKDF(ikm=shared, salt=ephemeral_pub, info="AlgoChatV1" || sender || recipient)`.
pub(crate) fn base_message_key(
    shared: &[u8],
    ephemeral_pub: &[u8; 32],
    sender_pub: &[u8; 32],
    recipient_pub: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut info = Vec::with_capacity(BASE_MESSAGE_INFO.len() + 64);
    info.extend_from_slice(BASE_MESSAGE_INFO);
    info.extend_from_slice(sender_pub);
    info.extend_from_slice(recipient_pub);
    expand32(ephemeral_pub, shared, &info)
}

/// Key-encrypting key for the base sender-recovery slot:
/// `HKDF(ikm=shared_self, salt=ephemeral_pub, info="AlgoChatV1-SenderKey" || sender)`.
pub(crate) fn base_sender_key(
    shared_self: &[u8],
    ephemeral_pub: &[u8; 32],
    sender_pub: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut info = Vec::with_capacity(BASE_SENDER_INFO.len() + 32);
    info.extend_from_slice(BASE_SENDER_INFO);
    info.extend_from_slice(sender_pub);
    expand32(ephemeral_pub, shared_self, &info)
}

/// Hybrid symmetric key for the PSK protocol. The IKM concatenates the
/// ECDH shared secret with the ratcheted per-counter key, so both layers
/// must be correct to derive the message key.
pub(crate) fn psk_message_key(
    shared: &[u8],
    message_psk: &[u8; 32],
    ephemeral_pub: &[u8; 32],
    sender_pub: &[u8; 32],
    recipient_pub: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut ikm = Zeroizing::new(Vec::with_capacity(shared.len() + message_psk.len()));
    ikm.extend_from_slice(shared);
    ikm.extend_from_slice(message_psk);

    let mut info = Vec::with_capacity(PSK_MESSAGE_INFO.len() + 64);
    info.extend_from_slice(PSK_MESSAGE_INFO);
    info.extend_from_slice(sender_pub);
    info.extend_from_slice(recipient_pub);
    expand32(ephemeral_pub, &ikm, &info)
}

/// Key-encrypting key for the PSK sender-recovery slot.
pub(crate) fn psk_sender_key(
    shared_self: &[u8],
    message_psk: &[u8; 32],
    ephemeral_pub: &[u8; 32],
    sender_pub: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut ikm = Zeroizing::new(Vec::with_capacity(shared_self.len() + message_psk.len()));
    ikm.extend_from_slice(shared_self);
    ikm.extend_from_slice(message_psk);

    let mut info = Vec::with_capacity(PSK_SENDER_INFO.len() + 32);
    info.extend_from_slice(PSK_SENDER_INFO);
    info.extend_from_slice(sender_pub);
    expand32(ephemeral_pub, &ikm, &info)
}
