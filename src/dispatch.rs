//! Classification and routing of raw transaction notes.
//!
//! The dispatcher looks at the two magic bytes, hands the note to the
//! matching codec and decrypt path, and does the counter bookkeeping for
//! PSK sessions. Notes that are not chat traffic classify as
//! [`Incoming::NotAChatMessage`] rather than an error, so callers can
//! skip unrelated transactions cheaply.

use x25519_dalek::{PublicKey, StaticSecret};

use crate::cipher::decrypt_base;
use crate::content::MessageContent;
use crate::counters::{CounterState, CounterVerdict};
use crate::envelope::{is_base_envelope, is_psk_envelope, BaseEnvelope, PskEnvelope};
use crate::error::{ChatError, Result};
use crate::psk_cipher::{decrypt_psk, encrypt_psk};
use crate::ratchet::derive_message_key;

/// Protocol a raw note belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    /// Base envelope (0x01 / 0x01).
    Base,
    /// PSK envelope (0x01 / 0x02).
    Psk,
    /// Not chat traffic.
    Unknown,
}

/// Classifies a note by its discriminator bytes. Base wins a (by
/// construction impossible) tie.
pub fn classify(note: &[u8]) -> NoteKind {
    if is_base_envelope(note) {
        NoteKind::Base
    } else if is_psk_envelope(note) {
        NoteKind::Psk
    } else {
        NoteKind::Unknown
    }
}

/// A caller-owned PSK session for one peer: the long-lived key plus the
/// mutable counter state. The library holds no peer map; callers keep one
/// of these per address and borrow it into each operation.
#[derive(Debug)]
pub struct PskSession<'a> {
    pub initial_psk: &'a [u8; 32],
    pub counters: &'a mut CounterState,
}

/// Result of processing one raw note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// The note is not chat traffic. Not an error.
    NotAChatMessage,
    /// A base-protocol message.
    Base(MessageContent),
    /// A PSK-protocol message, with the counter it was sent under.
    Psk { content: MessageContent, counter: u32 },
}

/// Classifies, decodes, and decrypts one incoming note.
///
/// For PSK notes the counter is validated before decryption and recorded
/// only after the AEAD tag verifies. Envelopes we authored ourselves take
/// the sender-recovery path and leave the receive window untouched: the
/// window tracks the peer's counters, not ours. A PSK note without a
/// session fails with [`ChatError::NoSessionKey`].
pub fn process_note(
    note: &[u8],
    my_secret: &StaticSecret,
    my_public: &PublicKey,
    session: Option<PskSession<'_>>,
) -> Result<Incoming> {
    match classify(note) {
        NoteKind::Unknown => Ok(Incoming::NotAChatMessage),
        NoteKind::Base => {
            let envelope = BaseEnvelope::decode(note)?;
            let content = decrypt_base(&envelope, my_secret, my_public)?;
            Ok(Incoming::Base(content))
        }
        NoteKind::Psk => {
            let Some(session) = session else {
                return Err(ChatError::NoSessionKey);
            };

            let envelope = PskEnvelope::decode(note)?;
            let from_self = my_public.as_bytes() == &envelope.sender_public_key;

            if !from_self {
                match session.counters.validate_receive(envelope.counter) {
                    CounterVerdict::Accept => {}
                    CounterVerdict::Replay => {
                        return Err(ChatError::CounterReplay(envelope.counter))
                    }
                    CounterVerdict::OutOfWindow => {
                        return Err(ChatError::CounterOutOfWindow(envelope.counter))
                    }
                }
            }

            let message_key = derive_message_key(session.initial_psk, envelope.counter)?;
            let content = decrypt_psk(&envelope, my_secret, my_public, &message_key)?;

            if !from_self {
                session.counters.record_receive(envelope.counter);
            }

            Ok(Incoming::Psk {
                content,
                counter: envelope.counter,
            })
        }
    }
}

/// Seals one outgoing PSK message: advances the send counter, derives the
/// per-counter key, encrypts, and serialises the envelope.
///
/// The counter is consumed even if the caller never publishes the note;
/// persist the session state before publishing.
pub fn seal_psk_note(
    plaintext: &str,
    sender_public: &PublicKey,
    recipient_public: &PublicKey,
    session: &mut PskSession<'_>,
) -> Result<Vec<u8>> {
    let counter = session.counters.advance_send()?;
    let message_key = derive_message_key(session.initial_psk, counter)?;
    let envelope = encrypt_psk(
        plaintext,
        sender_public,
        recipient_public,
        &message_key,
        counter,
    )?;
    Ok(envelope.encode())
}
