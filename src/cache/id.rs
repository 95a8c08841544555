//! Cache identifiers and cache names
//!
//! A cache id looks like `1700000000-4242-0001-8311`:
//! unix seconds, process id, a per-process counter and a random suffix.
//! A cache name pairs it with the original filename: `<cache_id>/<filename>`.

use crate::error::{OffshootError, OffshootResult};
use crate::file::is_safe_filename_char;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Identifier of one staged upload in the local cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheId(String);

impl CacheId {
    /// Generate a fresh cache id
    pub fn generate() -> Self {
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % 10_000;
        let random = Uuid::new_v4().as_u128() % 10_000;
        Self(format!(
            "{}-{}-{:04}-{:04}",
            Utc::now().timestamp(),
            std::process::id(),
            counter,
            random
        ))
    }

    /// Parse and validate a cache id
    pub fn parse(s: &str) -> OffshootResult<Self> {
        if is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(OffshootError::InvalidCacheId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// When this id was generated, from its leading timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let (negative, rest) = match self.0.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, self.0.as_str()),
        };
        let secs: i64 = rest.split('-').next()?.parse().ok()?;
        DateTime::from_timestamp(if negative { -secs } else { secs }, 0)
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CacheId {
    type Err = OffshootError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `-?\d+-\d+(-\d{4})?-\d{4}`
fn is_valid(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let parts: Vec<&str> = body.split('-').collect();

    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    let four_digits = |p: &str| p.len() == 4 && all_digits(p);

    match parts.as_slice() {
        [secs, pid, random] => all_digits(secs) && all_digits(pid) && four_digits(random),
        [secs, pid, counter, random] => {
            all_digits(secs) && all_digits(pid) && four_digits(counter) && four_digits(random)
        }
        _ => false,
    }
}

/// Split a cache name into its cache id and original filename
pub fn split_cache_name(cache_name: &str) -> OffshootResult<(CacheId, String)> {
    let (id, filename) = cache_name
        .split_once('/')
        .ok_or_else(|| OffshootError::InvalidCacheId(cache_name.to_string()))?;

    let id = CacheId::parse(id)?;

    if filename.chars().all(|c| c == '.') || !filename.chars().all(is_safe_filename_char) {
        return Err(OffshootError::InvalidOriginalFilename(filename.to_string()));
    }

    Ok((id, filename.to_string()))
}

/// Join a cache id and filename into a cache name
pub fn cache_name(id: &CacheId, filename: &str) -> String {
    format!("{}/{}", id, filename)
}
