//! Export test envelopes for cross-implementation verification.
//!
//! Writes one hex file per test case: base-protocol envelopes for the
//! shared message corpus, plus PSK envelopes at the counters the other
//! implementations pin their vectors to.

use std::fs;
use std::path::Path;

use algochat_core::{
    derive_identity_keys, derive_message_key, encrypt_base, encrypt_psk, KeyPair,
};

const ALICE_SEED_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const BOB_SEED_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000002";

fn base_cases() -> Vec<(&'static str, String)> {
    vec![
        ("empty", String::new()),
        ("single_char", "X".to_string()),
        ("whitespace", "   \t\n   ".to_string()),
        ("numbers", "1234567890".to_string()),
        ("punctuation", "!@#$%^&*()_+-=[]{}\\|;':\",./<>?".to_string()),
        ("newlines", "Line 1\nLine 2\nLine 3".to_string()),
        ("emoji_simple", "Hello 👋 World 🌍".to_string()),
        ("chinese", "你好世界 - Hello World".to_string()),
        ("arabic", "مرحبا بالعالم".to_string()),
        ("japanese", "こんにちは世界 カタカナ 漢字".to_string()),
        ("korean", "안녕하세요 세계".to_string()),
        ("accents", "Café résumé naïve".to_string()),
        ("cyrillic", "Привет мир".to_string()),
        ("json", r#"{"key": "value", "num": 42}"#.to_string()),
        ("url", "https://example.com/path?q=test&lang=en".to_string()),
        (
            "long_text",
            "The quick brown fox jumps over the lazy dog. ".repeat(11),
        ),
        ("max_payload", "A".repeat(882)),
    ]
}

fn psk_cases() -> Vec<(&'static str, u32, String)> {
    vec![
        ("psk_hello", 0, "Hello PSK!".to_string()),
        ("psk_session_end", 99, "last of session zero".to_string()),
        ("psk_session_start", 100, "first of session one".to_string()),
    ]
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let output_dir = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("test-envelopes-rust");

    let alice: KeyPair =
        derive_identity_keys(&hex::decode(ALICE_SEED_HEX).unwrap()).unwrap();
    let bob: KeyPair = derive_identity_keys(&hex::decode(BOB_SEED_HEX).unwrap()).unwrap();
    let psk = [0xAAu8; 32];

    let output_path = Path::new(output_dir);
    fs::create_dir_all(output_path).unwrap();
    let mut count = 0;

    for (case, message) in base_cases() {
        let envelope = encrypt_base(&message, alice.public(), bob.public()).unwrap();
        let file_path = output_path.join(format!("{}.hex", case));
        fs::write(&file_path, hex::encode(envelope.encode())).unwrap();
        println!("✓ {}", case);
        count += 1;
    }

    for (case, counter, message) in psk_cases() {
        let key = derive_message_key(&psk, counter).unwrap();
        let envelope =
            encrypt_psk(&message, alice.public(), bob.public(), &key, counter).unwrap();
        let file_path = output_path.join(format!("{}.hex", case));
        fs::write(&file_path, hex::encode(envelope.encode())).unwrap();
        println!("✓ {} (counter {})", case, counter);
        count += 1;
    }

    println!("rust: exported {} envelopes to {}", count, output_dir);
}
