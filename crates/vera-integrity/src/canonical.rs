//! Canonical JSON and content hashing
//!
//! Every content hash Vera produces goes through one pipeline:
//!
//! ```text
//!   value ──serde──▶ serde_json::Value ──sort keys──▶ compact text ──sha256──▶ 64 lowercase hex
//! ```
//!
//! Canonical form:
//! - object keys are sorted by code point at every depth
//! - arrays keep their order
//! - absent fields are dropped (serde `skip_serializing_if`), explicit `null` is kept
//! - no whitespace between tokens
//! - numbers print the way ECMAScript `JSON.stringify` prints them, so `1.0`
//!   canonicalizes to `1` and `1e-7` stays exponential
//!
//! Any store or service that re-derives a hash must use the same form.

use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of a hex-encoded SHA-256 digest.
pub const CONTENT_HASH_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("value cannot be canonicalized: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// Canonicalization
// ============================================================================

/// Serialize `value` into its canonical JSON text.
pub fn canonicalize<T>(value: &T) -> Result<String, IntegrityError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value)?;
    canonicalize_value(&value)
}

/// Canonical JSON text of an already-built `serde_json::Value`.
pub fn canonicalize_value(value: &Value) -> Result<String, IntegrityError> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> Result<(), IntegrityError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(number) => write_number(out, number),
        Value::String(text) => out.push_str(&serde_json::to_string(text)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_value(out, item)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_number(out: &mut String, number: &Number) {
    if let Some(n) = number.as_u64() {
        out.push_str(&n.to_string());
    } else if let Some(n) = number.as_i64() {
        out.push_str(&n.to_string());
    } else if let Some(f) = number.as_f64() {
        write_float(out, f);
    }
}

/// ECMAScript number-to-string for finite values.
///
/// Rust's `Display` already yields the shortest round-trip digits and drops a
/// zero fraction; only the exponential range and negative zero differ.
fn write_float(out: &mut String, value: f64) {
    if value == 0.0 {
        out.push('0');
        return;
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        out.push_str(&value.to_string());
        return;
    }

    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            out.push_str(mantissa);
            out.push_str("e+");
            out.push_str(exponent);
        }
        _ => out.push_str(&text),
    }
}

// ============================================================================
// Hashing
// ============================================================================

/// `sha256(canonicalize(value))` as lowercase hex.
pub fn hash<T>(value: &T) -> Result<String, IntegrityError>
where
    T: Serialize + ?Sized,
{
    Ok(hash_bytes(canonicalize(value)?.as_bytes()))
}

/// SHA-256 of raw bytes as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Recompute the hash of `value` and compare it with `expected`.
///
/// The comparison ignores hex case.
pub fn verify_hash<T>(value: &T, expected: &str) -> Result<bool, IntegrityError>
where
    T: Serialize + ?Sized,
{
    Ok(hash(value)?.eq_ignore_ascii_case(expected))
}

/// True if `candidate` is exactly 64 lowercase hex characters.
pub fn is_content_hash(candidate: &str) -> bool {
    candidate.len() == CONTENT_HASH_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
