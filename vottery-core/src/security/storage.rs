//! Ephemeral per-tab storage abstraction.
//!
//! The key names are interop-critical: a companion backend and the Wasm
//! layer both expect them verbatim. Writes are best-effort and not
//! transactional; concurrent writers in the same tick are last-write-wins,
//! which is acceptable in the single-threaded host runtime.

use dashmap::DashMap;

/// Encrypted session blob.
pub const SESSION_KEY: &str = "vottery_session";
/// Biometric registration payload cached during signup.
pub const BIOMETRIC_KEY: &str = "vottery_biometric";
/// Bearer token issued after authentication.
pub const AUTH_TOKEN_KEY: &str = "vottery_auth_token";
/// Cached referrer validation result.
pub const REFERRER_VALIDATION_KEY: &str = "vottery_referrer_validation";
/// Mirrored device detection result.
pub const DEVICE_INFO_KEY: &str = "vottery_device_info";
/// Per-instance envelope nonce material.
pub const ENCRYPTION_KEY_KEY: &str = "vottery_encryption_key";
/// Cross-session developer opt-in flag. Lives in persistent (not per-tab)
/// storage and is deliberately excluded from session clears.
pub const DEV_MODE_KEY: &str = "vottery_dev_mode";

/// Keys removed by a session clear, in removal order.
pub const SESSION_SCOPED_KEYS: [&str; 6] = [
    SESSION_KEY,
    BIOMETRIC_KEY,
    AUTH_TOKEN_KEY,
    REFERRER_VALIDATION_KEY,
    DEVICE_INFO_KEY,
    ENCRYPTION_KEY_KEY,
];

/// String key-value storage scoped to the lifetime of a tab.
///
/// The Wasm layer backs this with `sessionStorage`; native code and tests
/// use [`MemoryStorage`].
pub trait EphemeralStorage {
    fn get(&self, key: &str) -> Option<String>;
    /// Best-effort write; implementations swallow quota or access errors.
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory storage backend for native callers and tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EphemeralStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        storage.set(SESSION_KEY, "blob");
        assert_eq!(storage.get(SESSION_KEY).as_deref(), Some("blob"));
        assert!(storage.contains(SESSION_KEY));

        storage.remove(SESSION_KEY);
        assert!(storage.get(SESSION_KEY).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let storage = MemoryStorage::new();
        storage.set(AUTH_TOKEN_KEY, "first");
        storage.set(AUTH_TOKEN_KEY, "second");
        assert_eq!(storage.get(AUTH_TOKEN_KEY).as_deref(), Some("second"));
    }

    #[test]
    fn test_session_scoped_keys_exclude_dev_mode() {
        assert_eq!(SESSION_SCOPED_KEYS.len(), 6);
        assert!(!SESSION_SCOPED_KEYS.contains(&DEV_MODE_KEY));
    }
}
