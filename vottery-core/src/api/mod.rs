//! Typed HTTP clients for the backend collaborators.
//!
//! The backends themselves live outside this repository; only their consumed
//! contracts are modeled here.

mod elections;
mod http;
mod payments;

pub use elections::{ElectionSummary, ElectionsClient};
pub use http::ApiClientConfig;
pub use payments::{
    PaymentsClient, PlanInterval, Subscription, SubscriptionPlan, SubscriptionStatus,
    TransactionKind, WalletBalance, WalletGateway, WalletTransaction,
};
