//! Content-addressed cache keys for trend summaries.
//!
//! The whole [`TrendRequest`] participates in the key. It is rendered as
//! canonical JSON (object keys sorted, no whitespace, UTF-8 emitted verbatim)
//! and hashed with SHA-256. Key order is enforced here rather than relying on
//! the map type `serde_json` happens to be built with.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::TrendRequest;

/// Prefix separating trend summaries from other values in a shared store.
pub const CACHE_KEY_NAMESPACE: &str = "llm:trend:";

/// Render `request` as canonical JSON.
///
/// # Errors
///
/// Returns `serde_json::Error` if the request cannot be converted to a JSON
/// value (not expected for well-formed requests).
pub fn canonical_json(request: &TrendRequest) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(request)?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

/// Build the namespaced cache key for `request`.
///
/// # Errors
///
/// Propagates any error from [`canonical_json`].
pub fn cache_key(request: &TrendRequest) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(request)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{CACHE_KEY_NAMESPACE}{digest:x}"))
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, child)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(child, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, child) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(child, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}
