//! Fuzz test for cache entry decoding
//!
//! The durable tiers read entry bytes back from storage, and a corrupt or
//! truncated record must never take the process down; it is deleted and
//! served as a miss. This target pushes arbitrary bytes through the same
//! decode path to find:
//! - Panics or crashes
//! - Infinite loops
//! - Memory safety issues
//!
//! Run with: cargo +nightly fuzz run entry_decode_fuzz -- -max_total_time=60

#![no_main]

use chrono::Utc;
use libfuzzer_sys::fuzz_target;
use promptforge_cache::CacheEntry;

fuzz_target!(|data: &[u8]| {
    // Decoding must return Ok or Err, never panic.
    if let Ok(entry) = serde_json::from_slice::<CacheEntry>(data) {
        // Anything that decodes must survive the read-path checks.
        let now = Utc::now();
        let _ = entry.is_expired(now);
        let _ = entry.has_tag("prompts");

        // An accepted entry must be writable again, and the rewritten
        // bytes must decode to the same entry.
        let bytes = serde_json::to_vec(&entry).expect("accepted entry should re-encode");
        let again: CacheEntry =
            serde_json::from_slice(&bytes).expect("re-encoded entry should decode");
        assert_eq!(entry, again, "entry should round-trip unchanged");
    }
});
