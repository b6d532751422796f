//! Session lifecycle over ephemeral per-tab storage.
//!
//! [`SecuritySession`] owns the per-instance caches (referrer validation,
//! fingerprint, envelope nonce) that the original client kept as free
//! module-level state. Scoping them to the instance keeps their lifetime
//! explicit and testable: they live exactly as long as the provider that
//! created them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::device::{
    detect, DeviceInfo, DeviceSignals, Fingerprint, FingerprintOptions,
};
use crate::error::{Result, VotteryError};
use crate::security::envelope::{self, ENVELOPE_MAX_AGE_MS};
use crate::security::referrer::{
    check_referrer, ReferrerEnvironment, ReferrerValidation, SecurityConfig,
};
use crate::security::storage::{
    EphemeralStorage, DEVICE_INFO_KEY, ENCRYPTION_KEY_KEY, REFERRER_VALIDATION_KEY, SESSION_KEY,
    SESSION_SCOPED_KEYS,
};

/// Session time-to-live enforced in production (24 hours).
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Bytes of randomness behind session identifiers and the envelope nonce.
const TOKEN_ENTROPY_BYTES: usize = 32;

/// A decoded session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub device_id: String,
    pub referrer: String,
    /// Unix timestamp in milliseconds at creation time
    pub timestamp: i64,
    /// Caller-supplied payload, merged flat into the record
    #[serde(flatten)]
    pub data: serde_json::Map<String, Value>,
}

/// Why a session failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    NotFound,
    Expired,
    DeviceMismatch,
    Corrupt,
}

impl std::fmt::Display for SessionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::NotFound => "No session found",
            Self::Expired => "Session expired",
            Self::DeviceMismatch => "Device mismatch",
            Self::Corrupt => "Invalid session data",
        };
        f.write_str(reason)
    }
}

/// Discriminated validation outcome. Never an error: every failure mode is
/// a reported reason the UI can route on.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Valid(SessionRecord),
    Invalid(SessionRejection),
}

impl SessionStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn session(&self) -> Option<&SessionRecord> {
        match self {
            Self::Valid(record) => Some(record),
            Self::Invalid(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<SessionRejection> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(reason) => Some(*reason),
        }
    }
}

/// A session record encoded and ready to commit. Splitting preparation from
/// the commit lets the host defer the storage write off the critical path;
/// the identifier is available immediately, durability is not.
#[derive(Debug, Clone)]
pub struct PreparedSession {
    pub session_id: String,
    blob: String,
}

/// The client security context: referrer trust, fingerprinting, envelope
/// encoding and session lifecycle, over an injected storage backend.
pub struct SecuritySession<S: EphemeralStorage> {
    config: SecurityConfig,
    storage: S,
    signals: DeviceSignals,
    device: DeviceInfo,
    env: ReferrerEnvironment,
    /// Envelope nonce, generated once per instance
    nonce: String,
    referrer_cache: Option<ReferrerValidation>,
    fingerprint_cache: Option<Fingerprint>,
}

impl<S: EphemeralStorage> SecuritySession<S> {
    /// Build a security session from ambient inputs collected by the host.
    ///
    /// Runs device detection once, generates the envelope nonce, and mirrors
    /// the detection result to storage for collaborating components.
    pub fn new(
        config: SecurityConfig,
        storage: S,
        signals: DeviceSignals,
        env: ReferrerEnvironment,
    ) -> Result<Self> {
        let device = detect(&signals);
        let nonce = random_token()?;

        if let Ok(mirrored) = serde_json::to_string(&device) {
            storage.set(DEVICE_INFO_KEY, &mirrored);
        }
        storage.set(ENCRYPTION_KEY_KEY, &nonce);

        debug!(device_id = %device.device_id, production = config.production, "Security session created");

        Ok(Self {
            config,
            storage,
            signals,
            device,
            env,
            nonce,
            referrer_cache: None,
            fingerprint_cache: None,
        })
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Validate the referrer. Computed once per instance; the cached result
    /// is also mirrored to storage.
    pub fn check_referrer(&mut self) -> ReferrerValidation {
        if let Some(cached) = self.referrer_cache {
            return cached;
        }
        let validation = check_referrer(&self.config, &self.env);
        if let Ok(mirrored) = serde_json::to_string(&validation) {
            self.storage.set(REFERRER_VALIDATION_KEY, &mirrored);
        }
        self.referrer_cache = Some(validation);
        validation
    }

    /// Build the structured device fingerprint. Cached after the first call;
    /// infallible. The canvas snapshot is only included in production
    /// configuration regardless of `options`.
    pub fn generate_fingerprint(&mut self, options: &FingerprintOptions) -> &Fingerprint {
        if self.fingerprint_cache.is_none() {
            let effective = FingerprintOptions {
                include_canvas: options.include_canvas && self.config.production,
                ..*options
            };
            self.fingerprint_cache = Some(Fingerprint::assemble(
                &self.signals,
                &self.device.device_id,
                &self.env.referrer,
                &effective,
            ));
        }
        self.fingerprint_cache
            .as_ref()
            .unwrap_or_else(|| unreachable!("fingerprint cache populated above"))
    }

    /// Encode a payload with the instance nonce and device identifier.
    pub fn encrypt_data<T: Serialize>(&self, data: &T) -> Result<String> {
        let value =
            serde_json::to_value(data).map_err(|e| VotteryError::SerializationError(e.to_string()))?;
        envelope::encode(&value, self.config.production, &self.nonce, &self.device.device_id)
    }

    /// Decode a payload, enforcing the envelope freshness window in
    /// production.
    pub fn decrypt_data(&self, blob: &str) -> Result<Value> {
        envelope::decode(
            blob,
            self.config.production,
            &self.device.device_id,
            Some(ENVELOPE_MAX_AGE_MS),
        )
    }

    /// Encode a session record without committing it.
    ///
    /// A non-object payload is stored under a `data` key; object payloads
    /// merge flat into the record.
    pub fn prepare_session(&self, user_data: Value) -> Result<PreparedSession> {
        let session_id = random_token()?;

        let data = match user_data {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        let record = SessionRecord {
            session_id: session_id.clone(),
            device_id: self.device.device_id.clone(),
            referrer: self.env.referrer.clone(),
            timestamp: Utc::now().timestamp_millis(),
            data,
        };

        let value = serde_json::to_value(&record)
            .map_err(|e| VotteryError::SerializationError(e.to_string()))?;
        // Session blobs rely on the session TTL, not the envelope window
        let blob = envelope::encode(
            &value,
            self.config.production,
            &self.nonce,
            &self.device.device_id,
        )?;

        Ok(PreparedSession { session_id, blob })
    }

    /// Write a prepared session to storage. Last-write-wins.
    pub fn commit_session(&self, prepared: &PreparedSession) {
        self.storage.set(SESSION_KEY, &prepared.blob);
    }

    /// Create and commit a session, returning its identifier.
    pub fn create_session(&self, user_data: Value) -> Result<String> {
        let prepared = self.prepare_session(user_data)?;
        self.commit_session(&prepared);
        Ok(prepared.session_id)
    }

    /// Validate the stored session.
    ///
    /// Development configuration accepts any session that decodes; production
    /// additionally enforces the 24-hour TTL and device binding.
    pub fn validate_session(&self) -> SessionStatus {
        let Some(blob) = self.storage.get(SESSION_KEY) else {
            return SessionStatus::Invalid(SessionRejection::NotFound);
        };

        let value = match envelope::decode(
            &blob,
            self.config.production,
            &self.device.device_id,
            None,
        ) {
            Ok(value) => value,
            Err(_) => return SessionStatus::Invalid(SessionRejection::Corrupt),
        };

        let record: SessionRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(_) => return SessionStatus::Invalid(SessionRejection::Corrupt),
        };

        if self.config.production {
            if Utc::now().timestamp_millis() - record.timestamp > SESSION_TTL_MS {
                return SessionStatus::Invalid(SessionRejection::Expired);
            }
            if record.device_id != self.device.device_id {
                return SessionStatus::Invalid(SessionRejection::DeviceMismatch);
            }
        }

        SessionStatus::Valid(record)
    }

    /// Remove every session-scoped key. Idempotent; unrelated keys and the
    /// persisted developer flag are untouched.
    pub fn clear_session(&self) {
        for key in SESSION_SCOPED_KEYS {
            self.storage.remove(key);
        }
    }

    /// Access the underlying storage (tests and the host layer).
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Generate a random token from 32 bytes of OS entropy, hex-encoded.
fn random_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| VotteryError::EntropyError(e.to_string()))?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::storage::{
        MemoryStorage, AUTH_TOKEN_KEY, BIOMETRIC_KEY, DEV_MODE_KEY,
    };
    use serde_json::json;

    fn signals() -> DeviceSignals {
        DeviceSignals {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1"
                .to_string(),
            platform: "iPhone".to_string(),
            language: "en-US".to_string(),
            screen_width: 390,
            screen_height: 844,
            timezone: "America/New_York".to_string(),
            timezone_offset_minutes: 300,
            hardware_concurrency: Some(6),
            device_memory_gb: None,
            canvas_data_url: Some("data:image/png;base64,AAAA".to_string()),
            connection: None,
            webauthn_available: true,
        }
    }

    fn dev_session() -> SecuritySession<MemoryStorage> {
        SecuritySession::new(
            SecurityConfig::default(),
            MemoryStorage::new(),
            signals(),
            ReferrerEnvironment {
                hostname: "localhost".to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn prod_session() -> SecuritySession<MemoryStorage> {
        SecuritySession::new(
            SecurityConfig {
                production: true,
                ..Default::default()
            },
            MemoryStorage::new(),
            signals(),
            ReferrerEnvironment {
                hostname: "app.vottery.com".to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_mirrors_device_info_and_nonce() {
        let session = dev_session();
        assert!(session.storage().contains(DEVICE_INFO_KEY));
        assert!(session.storage().contains(ENCRYPTION_KEY_KEY));
    }

    #[test]
    fn test_validate_without_session() {
        let session = dev_session();
        let status = session.validate_session();
        assert_eq!(status.rejection(), Some(SessionRejection::NotFound));
        assert_eq!(status.rejection().unwrap().to_string(), "No session found");
    }

    #[test]
    fn test_create_then_validate_development() {
        let session = dev_session();
        let id = session.create_session(json!({"role": "voter"})).unwrap();
        assert_eq!(id.len(), 64); // 32 bytes hex

        let status = session.validate_session();
        let record = status.session().expect("session should validate");
        assert_eq!(record.session_id, id);
        assert_eq!(record.data.get("role"), Some(&json!("voter")));
    }

    #[test]
    fn test_create_then_validate_production() {
        let session = prod_session();
        let id = session.create_session(json!({"role": "admin"})).unwrap();
        let status = session.validate_session();
        assert_eq!(status.session().unwrap().session_id, id);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let session = dev_session();
        let a = session.create_session(Value::Null).unwrap();
        let b = session.create_session(Value::Null).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_session_rejected_in_production_only() {
        let old_record = |session: &SecuritySession<MemoryStorage>| {
            let record = SessionRecord {
                session_id: "abc".to_string(),
                device_id: session.device().device_id.clone(),
                referrer: String::new(),
                timestamp: Utc::now().timestamp_millis() - SESSION_TTL_MS - 60_000,
                data: serde_json::Map::new(),
            };
            session.encrypt_data(&record).unwrap()
        };

        let prod = prod_session();
        prod.storage().set(SESSION_KEY, &old_record(&prod));
        assert_eq!(
            prod.validate_session().rejection(),
            Some(SessionRejection::Expired)
        );

        let dev = dev_session();
        dev.storage().set(SESSION_KEY, &old_record(&dev));
        assert!(dev.validate_session().is_valid());
    }

    #[test]
    fn test_device_mismatch_rejected_in_production() {
        let prod = prod_session();
        let record = SessionRecord {
            session_id: "abc".to_string(),
            device_id: "notTheCurrentDeviceIdAtAll00000".to_string(),
            referrer: String::new(),
            timestamp: Utc::now().timestamp_millis(),
            data: serde_json::Map::new(),
        };
        let blob = prod.encrypt_data(&record).unwrap();
        prod.storage().set(SESSION_KEY, &blob);

        let status = prod.validate_session();
        assert_eq!(status.rejection(), Some(SessionRejection::DeviceMismatch));
        assert_eq!(status.rejection().unwrap().to_string(), "Device mismatch");
    }

    #[test]
    fn test_corrupt_session_rejected() {
        let session = prod_session();
        session.storage().set(SESSION_KEY, "definitely not a session");
        assert_eq!(
            session.validate_session().rejection(),
            Some(SessionRejection::Corrupt)
        );
    }

    #[test]
    fn test_clear_session_removes_exactly_the_scoped_keys() {
        let session = dev_session();
        session.create_session(json!({"role": "voter"})).unwrap();
        session.storage().set(BIOMETRIC_KEY, "payload");
        session.storage().set(AUTH_TOKEN_KEY, "token");
        session.storage().set(DEV_MODE_KEY, "true");
        session.storage().set("unrelated_key", "kept");

        session.clear_session();

        for key in SESSION_SCOPED_KEYS {
            assert!(!session.storage().contains(key), "{key} should be cleared");
        }
        assert_eq!(session.storage().get(DEV_MODE_KEY).as_deref(), Some("true"));
        assert_eq!(session.storage().get("unrelated_key").as_deref(), Some("kept"));

        // Idempotent
        session.clear_session();
    }

    #[test]
    fn test_referrer_check_cached_and_mirrored() {
        let mut session = dev_session();
        let first = session.check_referrer();
        let second = session.check_referrer();
        assert_eq!(first, second);
        assert!(session.storage().contains(REFERRER_VALIDATION_KEY));
    }

    #[test]
    fn test_fingerprint_cached_and_canvas_skipped_in_development() {
        let mut session = dev_session();
        let options = FingerprintOptions::default();
        let first = session.generate_fingerprint(&options).clone();
        assert!(first.canvas.is_none(), "canvas skipped outside production");
        let second = session.generate_fingerprint(&options);
        assert_eq!(&first, second);
    }

    #[test]
    fn test_fingerprint_includes_canvas_in_production() {
        let mut session = prod_session();
        let fp = session.generate_fingerprint(&FingerprintOptions::default()).clone();
        assert!(fp.canvas.is_some());
        assert_eq!(fp.device_id, session.device.device_id);
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        for session in [dev_session(), prod_session()] {
            let payload = json!({"wallet": {"balance": 1250}, "plan": "premium"});
            let blob = session.encrypt_data(&payload).unwrap();
            assert_eq!(session.decrypt_data(&blob).unwrap(), payload);
        }
    }

    #[test]
    fn test_prepare_commit_split() {
        let session = dev_session();
        let prepared = session.prepare_session(json!({"role": "voter"})).unwrap();
        // Identifier available before the write lands
        assert!(!session.storage().contains(SESSION_KEY));
        session.commit_session(&prepared);
        assert_eq!(
            session.validate_session().session().unwrap().session_id,
            prepared.session_id
        );
    }

    #[test]
    fn test_non_object_payload_nested_under_data() {
        let session = dev_session();
        session.create_session(json!("just a string")).unwrap();
        let record = session.validate_session();
        assert_eq!(
            record.session().unwrap().data.get("data"),
            Some(&json!("just a string"))
        );
    }
}
