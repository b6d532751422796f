//! Vottery Core - client security and election-authoring library
//!
//! This crate provides the host-independent logic behind the Vottery
//! browser client: device detection and fingerprinting, referrer trust
//! validation, session lifecycle over ephemeral per-tab storage, the
//! election draft store, and typed clients for the backend collaborators.
//!
//! # Features
//!
//! - Best-effort device classification from ambient browser signals
//! - Referrer validation with explicit development bypass toggles
//! - Reversible session envelope encoding (packaging, not encryption)
//! - 24-hour session TTL with device binding in production configuration
//! - Reducer-style election draft authoring
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vottery_core::{
//!     DeviceSignals, MemoryStorage, ReferrerEnvironment, SecurityConfig, SecuritySession,
//! };
//!
//! # fn example() -> vottery_core::Result<()> {
//! let session = SecuritySession::new(
//!     SecurityConfig::default(),
//!     MemoryStorage::new(),
//!     DeviceSignals::default(),
//!     ReferrerEnvironment::default(),
//! )?;
//!
//! let id = session.create_session(json!({"role": "voter"}))?;
//! assert!(session.validate_session().is_valid());
//! assert_eq!(id.len(), 64);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod device;
pub mod election;
pub mod error;
pub mod security;

#[cfg(feature = "network")]
pub mod api;

// Re-export main types for convenience
pub use device::{
    detect, derive_device_id, BiometricCapability, Browser, ConnectionInfo, DeviceClass,
    DeviceInfo, DeviceSignals, Fingerprint, FingerprintOptions, HardwareMetrics, Os,
    ScreenMetrics, DEVICE_ID_LEN, UNKNOWN_SIGNAL,
};
pub use election::{Choice, DraftAction, ElectionDraft, MediaKind, MediaRef, Question, VotingMethod};
pub use error::{Result, VotteryError};
pub use security::{
    check_referrer, is_dev_hostname, EphemeralStorage, MemoryStorage, PreparedSession,
    ReferrerEnvironment,
    ReferrerSource, ReferrerValidation, SecurityConfig, SecuritySession, SessionRecord,
    SessionRejection, SessionStatus, SESSION_SCOPED_KEYS, SESSION_TTL_MS,
};

#[cfg(feature = "network")]
pub use api::{ApiClientConfig, ElectionsClient, PaymentsClient, WalletGateway};
