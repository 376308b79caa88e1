//! Cross-implementation tests.
//!
//! Sibling implementations export hex-encoded envelopes (see
//! `demos/export_envelopes.rs`); this suite decrypts whatever exports it
//! finds on disk and skips implementations that are not checked out.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use algochat_core::{
    decrypt_base, decrypt_psk, derive_identity_keys, derive_message_key, is_psk_envelope,
    BaseEnvelope, KeyPair, PskEnvelope,
};

const BOB_SEED_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000002";

fn bob() -> KeyPair {
    derive_identity_keys(&hex::decode(BOB_SEED_HEX).unwrap()).unwrap()
}

fn test_psk() -> [u8; 32] {
    [0xAA; 32]
}

fn test_messages() -> HashMap<&'static str, String> {
    let mut messages: HashMap<&'static str, String> = HashMap::new();
    messages.insert("empty", String::new());
    messages.insert("single_char", "X".to_string());
    messages.insert("whitespace", "   \t\n   ".to_string());
    messages.insert("numbers", "1234567890".to_string());
    messages.insert(
        "punctuation",
        "!@#$%^&*()_+-=[]{}\\|;':\",./<>?".to_string(),
    );
    messages.insert("newlines", "Line 1\nLine 2\nLine 3".to_string());
    messages.insert("emoji_simple", "Hello 👋 World 🌍".to_string());
    messages.insert("chinese", "你好世界 - Hello World".to_string());
    messages.insert("arabic", "مرحبا بالعالم".to_string());
    messages.insert("japanese", "こんにちは世界 カタカナ 漢字".to_string());
    messages.insert("korean", "안녕하세요 세계".to_string());
    messages.insert("accents", "Café résumé naïve".to_string());
    messages.insert("cyrillic", "Привет мир".to_string());
    messages.insert("json", r#"{"key": "value", "num": 42}"#.to_string());
    messages.insert("url", "https://example.com/path?q=test&lang=en".to_string());
    messages.insert(
        "long_text",
        "The quick brown fox jumps over the lazy dog. ".repeat(11),
    );
    messages.insert("max_payload", "A".repeat(882));
    messages.insert("psk_hello", "Hello PSK!".to_string());
    messages.insert("psk_session_end", "last of session zero".to_string());
    messages.insert("psk_session_start", "first of session one".to_string());
    messages
}

fn find_envelope_dir(impl_name: &str) -> Option<PathBuf> {
    // CI checks the exports out next to this repo; local dev nests them
    // under the conformance harness.
    for candidate in [
        format!("../test-envelopes-{}", impl_name),
        format!("../test-algochat/test-envelopes-{}", impl_name),
    ] {
        let path = Path::new(&candidate);
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }
    None
}

fn decrypt_envelope_file(path: &Path, keys: &KeyPair) -> Option<String> {
    let hex_content = fs::read_to_string(path).ok()?.trim().to_string();
    let note = hex::decode(&hex_content).ok()?;

    let content = if is_psk_envelope(&note) {
        let envelope = PskEnvelope::decode(&note).ok()?;
        let key = derive_message_key(&test_psk(), envelope.counter).ok()?;
        decrypt_psk(&envelope, keys.secret(), keys.public(), &key).ok()?
    } else {
        let envelope = BaseEnvelope::decode(&note).ok()?;
        decrypt_base(&envelope, keys.secret(), keys.public()).ok()?
    };

    content.text().map(|s| s.to_string())
}

fn run_suite(impl_name: &str) {
    let Some(dir) = find_envelope_dir(impl_name) else {
        println!("skipping {} envelopes - directory not found", impl_name);
        return;
    };

    let bob = bob();
    let messages = test_messages();
    let mut passed = 0;
    let mut failed = 0;

    for (case, expected) in &messages {
        let path = dir.join(format!("{}.hex", case));
        if !path.exists() {
            continue;
        }

        match decrypt_envelope_file(&path, &bob) {
            Some(text) if text == *expected => passed += 1,
            Some(text) => {
                failed += 1;
                println!("✗ {} - mismatch: got {:?}", case, text);
            }
            None => {
                failed += 1;
                println!("✗ {} - failed to decrypt", case);
            }
        }
    }

    println!("{} cross-impl: {}/{} passed", impl_name, passed, passed + failed);
    assert_eq!(failed, 0, "some {} envelopes failed to decrypt", impl_name);
}

#[test]
fn decrypt_swift_envelopes() {
    run_suite("swift");
}

#[test]
fn decrypt_typescript_envelopes() {
    run_suite("ts");
}

#[test]
fn decrypt_python_envelopes() {
    run_suite("python");
}

#[test]
fn decrypt_kotlin_envelopes() {
    run_suite("kotlin");
}

#[test]
fn decrypt_rust_envelopes() {
    run_suite("rust");
}
