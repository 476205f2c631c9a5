//! Storage name generation.
//!
//! A storage name has the form `{millis}-{random}.{original}`. Uniqueness is
//! probabilistic; the store commits with a no-clobber rename and regenerates
//! on the rare collision.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// Exclusive upper bound of the random component.
pub const RANDOM_RANGE: u32 = 1_000_000_000;

/// Longest original name kept, in bytes. Leaves room for the prefix within
/// the common 255-byte file name limit.
pub const MAX_ORIGINAL_NAME_LEN: usize = 200;

/// Substituted when nothing usable is left of the original name.
const FALLBACK_NAME: &str = "file";

/// A generated name under which a payload is stored and later retrieved.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StorageName(String);

impl StorageName {
    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the name, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for StorageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageName({})", self.0)
    }
}

impl AsRef<str> for StorageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Produces storage names from client-supplied original names.
///
/// Stateless: the only inputs are the clock and the thread-local RNG, so one
/// generator can be shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameGenerator;

impl NameGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a name stamped with the current time.
    pub fn generate(&self, original_name: &str) -> StorageName {
        self.generate_at(Utc::now(), original_name)
    }

    /// Generate a name stamped with `now`.
    pub fn generate_at(&self, now: DateTime<Utc>, original_name: &str) -> StorageName {
        let random = rand::rng().random_range(0..RANDOM_RANGE);
        StorageName(format!(
            "{}-{}.{}",
            now.timestamp_millis(),
            random,
            sanitize_original_name(original_name)
        ))
    }
}

/// Reduce a client-supplied name to a single safe path component.
///
/// Keeps the final component (either separator style), replaces control
/// characters, and trims long names from the front so the extension survives.
pub fn sanitize_original_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return FALLBACK_NAME.to_string();
    }

    if cleaned.len() <= MAX_ORIGINAL_NAME_LEN {
        return cleaned;
    }

    let mut start = cleaned.len() - MAX_ORIGINAL_NAME_LEN;
    while !cleaned.is_char_boundary(start) {
        start += 1;
    }
    cleaned[start..].to_string()
}
