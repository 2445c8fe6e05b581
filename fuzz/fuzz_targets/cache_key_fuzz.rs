//! Fuzz test for cache key derivation
//!
//! Keys are derived by canonicalizing the JSON form of an operation's
//! arguments and hashing it, so the derivation has to hold up against any
//! JSON a serializer can produce. This target parses arbitrary bytes as
//! JSON and checks:
//! - Derivation never panics
//! - The same value always derives the same key
//! - Keys keep the "op:<64 hex chars>" shape
//!
//! Run with: cargo +nightly fuzz run cache_key_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use promptforge_cache::key_from_value;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let key = key_from_value("fuzz.op", &value);
    assert_eq!(
        key,
        key_from_value("fuzz.op", &value),
        "derivation should be deterministic"
    );

    let digest = key
        .strip_prefix("fuzz.op:")
        .expect("key should start with the operation name");
    assert_eq!(digest.len(), 64, "digest should be sha-256 hex");
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

    // Printing and reparsing the value must not change its key.
    let reparsed: Value =
        serde_json::from_str(&value.to_string()).expect("serde_json output should reparse");
    assert_eq!(
        key,
        key_from_value("fuzz.op", &reparsed),
        "key should be stable across a JSON round trip"
    );
});
