//! Idempotency key generation for order submission
//!
//! Keys come from the OS entropy source as random (v4) UUIDs. When the OS
//! source is unavailable the generator falls back to a timestamp plus a
//! pseudo-random suffix, prefixed with `idem-` so the two forms stay
//! distinguishable on the server side.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix used by keys minted on the fallback path
pub const FALLBACK_KEY_PREFIX: &str = "idem-";

/// Opaque token attached to one order submission attempt
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Wrap a caller-supplied key (for example one typed by the user)
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key came from the fallback path
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.0.starts_with(FALLBACK_KEY_PREFIX)
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of randomness and time for key generation
///
/// Abstracted so tests can force the fallback path.
pub trait EntropySource: Send + Sync {
    /// A cryptographically strong random UUID, or `None` when the strong
    /// source is unavailable
    fn random_uuid(&self) -> Option<Uuid>;

    /// High-resolution timestamp in microseconds
    fn timestamp_micros(&self) -> i64;

    /// Pseudo-random value for the fallback suffix
    fn random_u64(&self) -> u64;
}

/// Entropy backed by the operating system
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn random_uuid(&self) -> Option<Uuid> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes).ok()?;
        Some(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    fn timestamp_micros(&self) -> i64 {
        Utc::now().timestamp_micros()
    }

    fn random_u64(&self) -> u64 {
        rand::thread_rng().r#gen()
    }
}

/// Mints idempotency keys
///
/// # Examples
///
/// ```
/// use storefront_client::KeyGenerator;
///
/// let generator = KeyGenerator::new();
/// let first = generator.generate();
/// let second = generator.generate();
/// assert_ne!(first, second);
/// ```
#[derive(Clone, Debug, Default)]
pub struct KeyGenerator<E = OsEntropy> {
    entropy: E,
}

impl KeyGenerator {
    /// Generator backed by the OS entropy source
    #[must_use]
    pub const fn new() -> Self {
        Self { entropy: OsEntropy }
    }
}

impl<E: EntropySource> KeyGenerator<E> {
    /// Generator backed by a custom entropy source
    #[must_use]
    pub const fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }

    /// Mint a fresh key. Never fails.
    #[must_use]
    pub fn generate(&self) -> IdempotencyKey {
        if let Some(uuid) = self.entropy.random_uuid() {
            return IdempotencyKey(uuid.to_string());
        }

        tracing::debug!("strong entropy unavailable, using fallback idempotency key");
        IdempotencyKey(format!(
            "{FALLBACK_KEY_PREFIX}{}-{:016x}",
            self.entropy.timestamp_micros(),
            self.entropy.random_u64()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Entropy with no strong source, forcing the fallback path
    struct WeakEntropy;

    impl EntropySource for WeakEntropy {
        fn random_uuid(&self) -> Option<Uuid> {
            None
        }

        fn timestamp_micros(&self) -> i64 {
            OsEntropy.timestamp_micros()
        }

        fn random_u64(&self) -> u64 {
            OsEntropy.random_u64()
        }
    }

    #[test]
    fn test_strong_keys_are_unique() {
        let generator = KeyGenerator::new();
        let keys: HashSet<_> = (0..10_000).map(|_| generator.generate()).collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn test_fallback_keys_are_unique() {
        let generator = KeyGenerator::with_entropy(WeakEntropy);
        let keys: HashSet<_> = (0..10_000).map(|_| generator.generate()).collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Test code
    fn test_strong_key_is_v4_uuid() {
        let key = KeyGenerator::new().generate();
        let parsed = Uuid::parse_str(key.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert!(!key.is_fallback());
    }

    #[test]
    fn test_fallback_key_format() {
        let key = KeyGenerator::with_entropy(WeakEntropy).generate();
        assert!(key.is_fallback());

        let rest = key.as_str().trim_start_matches(FALLBACK_KEY_PREFIX);
        let (timestamp, suffix) = rest.split_once('-').unwrap_or_default();
        assert!(timestamp.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Test code
    fn test_key_serializes_as_plain_string() {
        let key = IdempotencyKey::new("abc-123");
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""abc-123""#);
        assert_eq!(key.to_string(), "abc-123");
    }
}
