//! # Vera Integrity
//!
//! The hashing and ordering layer underneath every sealed audit trace:
//!
//! - `canonical`: canonical JSON text and SHA-256 content hashes
//! - `ordering`: stable sort / group / unique helpers
//!
//! Two values that are logically equal always hash equal, regardless of the
//! order their fields were built in.

pub mod canonical;
pub mod ordering;

pub use canonical::{
    canonicalize, canonicalize_value, hash, hash_bytes, is_content_hash, verify_hash,
    IntegrityError, CONTENT_HASH_LEN,
};
pub use ordering::{group_by, sorted_by_key, sorted_unique, stable_sort_by, unique_by};
