//! Plaintext content sub-format.
//!
//! A decrypted payload is one of three things: raw UTF-8 text, a
//! `{"type":"key-publish"}` control record, or a `{"text":…,"replyTo":…}`
//! object carrying reply context. The core parses the shape; it does not
//! interpret the text.

use crate::error::{ChatError, Result};

/// Parsed form of a decrypted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// A key-publish control record. Callers filter these out of
    /// conversation views.
    KeyPublish,
    /// A chat message.
    Text(TextContent),
}

impl MessageContent {
    /// The message text, if this is a chat message.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(content) => Some(&content.text),
            MessageContent::KeyPublish => None,
        }
    }
}

/// A chat message with optional reply context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    /// The message text.
    pub text: String,
    /// Transaction id of the message this replies to.
    pub reply_to_id: Option<String>,
    /// Truncated preview of the replied-to message.
    pub reply_to_preview: Option<String>,
}

impl TextContent {
    /// Plain message without reply context.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_to_id: None,
            reply_to_preview: None,
        }
    }

    /// Message replying to an earlier transaction.
    pub fn reply(
        text: impl Into<String>,
        reply_to_id: impl Into<String>,
        reply_to_preview: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            reply_to_id: Some(reply_to_id.into()),
            reply_to_preview: Some(reply_to_preview.into()),
        }
    }

    /// Serialises to the on-wire payload form: raw text for plain
    /// messages, the `{text, replyTo}` JSON object when reply context is
    /// attached.
    pub fn to_payload(&self) -> String {
        match &self.reply_to_id {
            None => self.text.clone(),
            Some(id) => serde_json::json!({
                "text": self.text,
                "replyTo": {
                    "txid": id,
                    "preview": self.reply_to_preview.as_deref().unwrap_or(""),
                },
            })
            .to_string(),
        }
    }
}

/// The key-publish sentinel payload.
pub fn key_publish_payload() -> &'static str {
    r#"{"type":"key-publish"}"#
}

/// Parses a decrypted payload into its content form.
///
/// Only payloads opening with `{` are sniffed as JSON; anything else, and
/// any JSON without a recognised shape, is returned as verbatim text.
/// Payloads that are not valid UTF-8 fail opaquely.
pub fn parse_content(data: &[u8]) -> Result<MessageContent> {
    let text = std::str::from_utf8(data).map_err(|_| ChatError::DecryptFailed)?;

    if text.starts_with('{') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
            if json.get("type").and_then(|v| v.as_str()) == Some("key-publish") {
                return Ok(MessageContent::KeyPublish);
            }

            if let Some(message_text) = json.get("text").and_then(|v| v.as_str()) {
                let reply_to = json.get("replyTo");
                return Ok(MessageContent::Text(TextContent {
                    text: message_text.to_string(),
                    reply_to_id: reply_to
                        .and_then(|r| r.get("txid"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                    reply_to_preview: reply_to
                        .and_then(|r| r.get("preview"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                }));
            }
        }
    }

    Ok(MessageContent::Text(TextContent::new(text)))
}
