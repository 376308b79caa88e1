//! Long-term and ephemeral X25519 keys.
//!
//! The long-term encryption key pair is derived deterministically from the
//! 32-byte account seed, binding the encryption identity to the signing
//! identity without reusing the Ed25519 key for Diffie-Hellman.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{ChatError, Result};

/// Required length of an account seed.
pub const SEED_LEN: usize = 32;

/// Length of an X25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

const IDENTITY_SALT: &[u8] = b"AlgoChat-v1-encryption";
const IDENTITY_INFO: &[u8] = b"x25519-key";

/// A long-term X25519 key pair derived from an account seed.
#[derive(Clone)]
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Derives the encryption key pair from a 32-byte account seed using
    /// HKDF-SHA256. Any other seed length fails with
    /// [`ChatError::InvalidKeyLength`].
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        if seed.len() != SEED_LEN {
            return Err(ChatError::InvalidKeyLength {
                expected: SEED_LEN,
                actual: seed.len(),
            });
        }

        let hk = Hkdf::<Sha256>::new(Some(IDENTITY_SALT), seed);
        let mut derived = Zeroizing::new([0u8; 32]);
        hk.expand(IDENTITY_INFO, derived.as_mut())
            .expect("32 bytes is a valid HKDF-SHA256 output length");

        let secret = StaticSecret::from(*derived);
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Rebuilds a key pair from a stored 32-byte secret.
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// The secret as raw bytes, for secure storage only.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public.as_bytes())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Derives the long-term encryption key pair from a 32-byte account seed.
pub fn derive_identity_keys(seed: &[u8]) -> Result<KeyPair> {
    KeyPair::from_seed(seed)
}

/// Generates a fresh ephemeral key pair for a single message.
///
/// The secret is zeroised when dropped.
pub(crate) fn generate_ephemeral() -> (StaticSecret, PublicKey) {
    let secret = StaticSecret::random_from_rng(rand::thread_rng());
    let public = PublicKey::from(&secret);
    (secret, public)
}

/// X25519 with a contributory-behaviour check: the all-zero output produced
/// by low-order peer points is rejected.
pub(crate) fn shared_secret(
    secret: &StaticSecret,
    public: &PublicKey,
) -> Result<Zeroizing<[u8; 32]>> {
    let shared = Zeroizing::new(secret.diffie_hellman(public).to_bytes());
    if shared.iter().all(|&b| b == 0) {
        return Err(ChatError::BadDhOutput);
    }
    Ok(shared)
}
