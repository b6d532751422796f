//! Client security context: referrer trust, envelope encoding, and session
//! lifecycle.
//!
//! ## Architecture
//!
//! - `referrer`: referrer validation with explicit development bypasses
//! - `envelope`: reversible session packaging (not a security boundary)
//! - `session`: the [`SecuritySession`] provider and session records
//! - `storage`: ephemeral per-tab storage trait and key names

pub mod envelope;
mod referrer;
mod session;
pub mod storage;

pub use referrer::{
    check_referrer, is_dev_hostname, ReferrerEnvironment, ReferrerSource, ReferrerValidation,
    SecurityConfig,
};
pub use session::{
    PreparedSession, SecuritySession, SessionRecord, SessionRejection, SessionStatus,
    SESSION_TTL_MS,
};
pub use storage::{
    EphemeralStorage, MemoryStorage, AUTH_TOKEN_KEY, BIOMETRIC_KEY, DEVICE_INFO_KEY,
    DEV_MODE_KEY, ENCRYPTION_KEY_KEY, REFERRER_VALIDATION_KEY, SESSION_KEY, SESSION_SCOPED_KEYS,
};
