//! Negative properties: every forgery, key mismatch, and replay must be
//! rejected, and decryption failures must stay opaque.

use algochat_core::{
    decrypt_base, decrypt_psk, derive_identity_keys, derive_message_key, encrypt_base,
    encrypt_psk, BaseEnvelope, ChatError, KeyPair, PskEnvelope, BASE_HEADER_LEN, PSK_HEADER_LEN,
};

const ALICE_SEED_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const BOB_SEED_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000002";

fn alice() -> KeyPair {
    derive_identity_keys(&hex::decode(ALICE_SEED_HEX).unwrap()).unwrap()
}

fn bob() -> KeyPair {
    derive_identity_keys(&hex::decode(BOB_SEED_HEX).unwrap()).unwrap()
}

fn test_psk() -> [u8; 32] {
    [0xAA; 32]
}

fn fails_opaquely(result: Result<algochat_core::MessageContent, ChatError>) -> bool {
    matches!(
        result,
        Err(ChatError::DecryptFailed) | Err(ChatError::BadDhOutput)
    )
}

/// Flipping any single byte past the discriminator must break decryption
/// for whoever reads the flipped field. The encrypted-sender-key slot is
/// only consulted on the sender-recovery path, so that region is asserted
/// against the sender; everything else against the recipient.
#[test]
fn base_envelope_bitflips_fail() {
    let alice = alice();
    let bob = bob();

    let encoded = encrypt_base("bit by bit", alice.public(), bob.public())
        .unwrap()
        .encode();
    let sender_slot = 78..126;

    for index in 2..encoded.len() {
        let mut tampered = encoded.clone();
        tampered[index] ^= 0x01;
        let envelope = BaseEnvelope::decode(&tampered).unwrap();

        let result = if sender_slot.contains(&index) {
            decrypt_base(&envelope, alice.secret(), alice.public())
        } else {
            decrypt_base(&envelope, bob.secret(), bob.public())
        };
        assert!(fails_opaquely(result), "byte {} flip was accepted", index);
    }
}

#[test]
fn psk_envelope_bitflips_fail() {
    let alice = alice();
    let bob = bob();
    let key = derive_message_key(&test_psk(), 9).unwrap();

    let encoded = encrypt_psk("bit by bit", alice.public(), bob.public(), &key, 9)
        .unwrap()
        .encode();
    let sender_slot = 82..130;

    for index in 2..encoded.len() {
        let mut tampered = encoded.clone();
        tampered[index] ^= 0x01;
        let envelope = PskEnvelope::decode(&tampered).unwrap();

        // A flipped counter byte changes which key the reader derives,
        // exactly as it would in the real receive flow.
        let message_key = derive_message_key(&test_psk(), envelope.counter).unwrap();
        let result = if sender_slot.contains(&index) {
            decrypt_psk(&envelope, alice.secret(), alice.public(), &message_key)
        } else {
            decrypt_psk(&envelope, bob.secret(), bob.public(), &message_key)
        };
        assert!(fails_opaquely(result), "byte {} flip was accepted", index);
    }
}

#[test]
fn wrong_peer_secret_fails() {
    let alice = alice();
    let bob = bob();
    let eve = KeyPair::from_secret_bytes([0x5Eu8; 32]);

    let base = encrypt_base("for bob", alice.public(), bob.public()).unwrap();
    assert_eq!(
        decrypt_base(&base, eve.secret(), eve.public()).unwrap_err(),
        ChatError::DecryptFailed
    );

    let key = derive_message_key(&test_psk(), 0).unwrap();
    let psk = encrypt_psk("for bob", alice.public(), bob.public(), &key, 0).unwrap();
    assert_eq!(
        decrypt_psk(&psk, eve.secret(), eve.public(), &key).unwrap_err(),
        ChatError::DecryptFailed
    );
}

/// Distinct failure causes must not produce distinguishable errors.
#[test]
fn decrypt_failures_are_opaque() {
    let alice = alice();
    let bob = bob();
    let key = derive_message_key(&test_psk(), 0).unwrap();
    let wrong_key = derive_message_key(&[0xBB; 32], 0).unwrap();

    let envelope = encrypt_psk("opaque", alice.public(), bob.public(), &key, 0).unwrap();

    // Wrong PSK layer.
    let wrong_psk = decrypt_psk(&envelope, bob.secret(), bob.public(), &wrong_key).unwrap_err();
    // Tampered tag.
    let mut tampered = envelope.clone();
    let last = tampered.ciphertext.len() - 1;
    tampered.ciphertext[last] ^= 0xFF;
    let bad_tag = decrypt_psk(&tampered, bob.secret(), bob.public(), &key).unwrap_err();

    assert_eq!(wrong_psk, ChatError::DecryptFailed);
    assert_eq!(bad_tag, ChatError::DecryptFailed);
}

#[test]
fn truncation_is_caught_at_decode() {
    let alice = alice();
    let bob = bob();

    let base = encrypt_base("short", alice.public(), bob.public())
        .unwrap()
        .encode();
    assert!(matches!(
        BaseEnvelope::decode(&base[..BASE_HEADER_LEN + 10]).unwrap_err(),
        ChatError::TooShort { .. }
    ));

    let key = derive_message_key(&test_psk(), 0).unwrap();
    let psk = encrypt_psk("short", alice.public(), bob.public(), &key, 0)
        .unwrap()
        .encode();
    assert!(matches!(
        PskEnvelope::decode(&psk[..PSK_HEADER_LEN]).unwrap_err(),
        ChatError::TooShort { .. }
    ));
}
