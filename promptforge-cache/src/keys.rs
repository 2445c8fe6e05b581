//! Deterministic cache key derivation.

use promptforge_core::{CacheError, ForgeResult};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Custom key generator attached to a read-through wrapper.
///
/// Receives the operation's arguments converted to JSON and returns the
/// complete cache key. Use one when the default derivation is unsuitable,
/// e.g. when only a subset of the arguments should affect the key or an
/// argument is too large to be worth hashing.
pub type KeyFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Derive the default cache key for one operation invocation:
/// `"{op}:{hex(sha256(canonical_json(args)))}"`.
///
/// Two value-equal argument sets derive the same key regardless of map key
/// order; any differing argument value changes the digest.
pub fn derive_key<A: Serialize + ?Sized>(op: &str, args: &A) -> ForgeResult<String> {
    let value = serde_json::to_value(args).map_err(|e| CacheError::Serialization {
        reason: e.to_string(),
    })?;
    Ok(key_from_value(op, &value))
}

/// Key for arguments already converted to JSON; infallible.
pub fn key_from_value(op: &str, args: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(args, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    format!("{}:{}", op, hex::encode(digest))
}

/// Write `value` as compact JSON with object keys recursively sorted.
///
/// Sorting here rather than trusting the map backing keeps keys stable even
/// if a dependency enables serde_json's insertion-ordered maps.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<(&String, &Value)> = map.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
