//! Device detection for the Vottery client.
//!
//! ## Architecture
//!
//! - `signals`: raw ambient inputs collected at the host boundary
//! - `detect`: user-agent classification and biometric capability hints
//! - `fingerprint`: device identifier derivation and the session fingerprint

mod detect;
mod fingerprint;
mod signals;

pub use detect::{detect, BiometricCapability, Browser, DeviceClass, DeviceInfo, Os};
pub use fingerprint::{
    derive_device_id, Fingerprint, FingerprintOptions, HardwareMetrics, ScreenMetrics,
    DEVICE_ID_LEN,
};
pub use signals::{ConnectionInfo, DeviceSignals, UNKNOWN_SIGNAL};
