//! Out-of-band PSK exchange URIs.
//!
//! Format: `algochat-psk://v1?addr=<address>&psk=<base64url>&label=<label>`.
//! The URI announces that the bearer holds a 32-byte PSK for messaging the
//! named address; it travels over QR codes or paste, never over the chain.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use crate::error::{ChatError, Result};
use crate::ratchet::PSK_LEN;

const URI_PREFIX: &str = "algochat-psk://v1?";

/// A parsed PSK exchange URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeUri {
    /// The peer's Algorand address.
    pub address: String,
    /// The shared pre-shared key.
    pub psk: [u8; 32],
    /// Human-readable conversation label; empty when absent.
    pub label: String,
}

impl ExchangeUri {
    pub fn new(address: impl Into<String>, psk: [u8; 32], label: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            psk,
            label: label.into(),
        }
    }

    /// Renders the URI. The label is percent-encoded; an empty label is
    /// omitted entirely.
    pub fn encode(&self) -> String {
        let mut uri = format!(
            "{}addr={}&psk={}",
            URI_PREFIX,
            self.address,
            URL_SAFE_NO_PAD.encode(self.psk)
        );
        if !self.label.is_empty() {
            uri.push_str("&label=");
            uri.push_str(&percent_encode(&self.label));
        }
        uri
    }

    /// Parses an exchange URI.
    ///
    /// Rejects foreign schemes, missing `addr`/`psk` parameters, and
    /// malformed base64url with [`ChatError::InvalidUri`]; a decoded PSK
    /// that is not exactly 32 bytes fails with
    /// [`ChatError::InvalidKeyLength`].
    pub fn parse(uri: &str) -> Result<Self> {
        let query = uri
            .strip_prefix(URI_PREFIX)
            .ok_or_else(|| ChatError::InvalidUri("unknown scheme or version".into()))?;

        let mut address = None;
        let mut psk_encoded = None;
        let mut label = None;
        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "addr" => address = Some(value),
                "psk" => psk_encoded = Some(value),
                "label" => label = Some(value),
                _ => {}
            }
        }

        let address = address
            .ok_or_else(|| ChatError::InvalidUri("missing 'addr' parameter".into()))?
            .to_string();
        let psk_encoded =
            psk_encoded.ok_or_else(|| ChatError::InvalidUri("missing 'psk' parameter".into()))?;

        let psk_bytes = URL_SAFE_NO_PAD
            .decode(psk_encoded)
            .map_err(|e| ChatError::InvalidUri(format!("malformed base64url PSK: {}", e)))?;
        let psk: [u8; 32] =
            psk_bytes
                .try_into()
                .map_err(|rejected: Vec<u8>| ChatError::InvalidKeyLength {
                    expected: PSK_LEN,
                    actual: rejected.len(),
                })?;

        let label = match label {
            Some(encoded) => percent_decode(encoded)?,
            None => String::new(),
        };

        Ok(Self {
            address,
            psk,
            label,
        })
    }
}

/// Generates a fresh random 32-byte PSK.
pub fn generate_psk() -> [u8; 32] {
    let mut psk = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut psk);
    psk
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.as_bytes() {
        match *byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(*byte as char);
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

fn percent_decode(value: &str) -> Result<String> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&hex, 16)
                    .map_err(|_| ChatError::InvalidUri("bad percent-encoding".into()))?;
                bytes.push(byte);
            }
            '+' => bytes.push(b' '),
            _ => bytes.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes()),
        }
    }
    String::from_utf8(bytes)
        .map_err(|_| ChatError::InvalidUri("label is not valid UTF-8".into()))
}
