//! Client for the payments backend: wallet and subscription endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::http::{ApiClientConfig, HttpClient};
use crate::error::Result;

/// Current wallet balance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletBalance {
    pub balance_cents: i64,
    pub currency: String,
}

/// Direction of a wallet movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Payment,
}

/// An entry in the wallet transaction history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletTransaction {
    pub id: String,
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Billing interval of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanInterval {
    Monthly,
    Yearly,
}

/// A purchasable subscription plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub interval: PlanInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
}

/// The caller's current subscription.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct AmountRequest {
    amount_cents: i64,
}

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    plan_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    transaction: WalletTransaction,
}

#[derive(Debug, Deserialize)]
struct TransactionListResponse {
    transactions: Vec<WalletTransaction>,
}

#[derive(Debug, Deserialize)]
struct PlanListResponse {
    plans: Vec<SubscriptionPlan>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    subscription: Subscription,
}

/// Wallet operations consumed by the client flows.
///
/// The seam exists so flows can be exercised against a mock backend in
/// tests; [`PaymentsClient`] is the HTTP implementation.
#[async_trait]
pub trait WalletGateway {
    async fn balance(&self) -> Result<WalletBalance>;
    async fn deposit(&self, amount_cents: i64) -> Result<WalletTransaction>;
    async fn withdraw(&self, amount_cents: i64) -> Result<WalletTransaction>;
    async fn transactions(&self) -> Result<Vec<WalletTransaction>>;
}

/// Typed client for the payments API.
pub struct PaymentsClient {
    http: HttpClient,
}

impl PaymentsClient {
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn plans(&self) -> Result<Vec<SubscriptionPlan>> {
        let response: PlanListResponse =
            self.http.get_json("/payments/subscriptions/plans").await?;
        Ok(response.plans)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn subscribe(&self, plan_id: &str) -> Result<Subscription> {
        let response: SubscriptionResponse = self
            .http
            .post_json("/payments/subscriptions/subscribe", &SubscribeRequest { plan_id })
            .await?;
        Ok(response.subscription)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn cancel_subscription(&self) -> Result<Subscription> {
        let response: SubscriptionResponse = self
            .http
            .post_json("/payments/subscriptions/cancel", &serde_json::json!({}))
            .await?;
        Ok(response.subscription)
    }
}

#[async_trait]
impl WalletGateway for PaymentsClient {
    #[instrument(level = "debug", skip(self))]
    async fn balance(&self) -> Result<WalletBalance> {
        self.http.get_json("/payments/wallet/balance").await
    }

    #[instrument(level = "debug", skip(self))]
    async fn deposit(&self, amount_cents: i64) -> Result<WalletTransaction> {
        let response: TransactionResponse = self
            .http
            .post_json("/payments/wallet/deposit", &AmountRequest { amount_cents })
            .await?;
        Ok(response.transaction)
    }

    #[instrument(level = "debug", skip(self))]
    async fn withdraw(&self, amount_cents: i64) -> Result<WalletTransaction> {
        let response: TransactionResponse = self
            .http
            .post_json("/payments/wallet/withdraw", &AmountRequest { amount_cents })
            .await?;
        Ok(response.transaction)
    }

    #[instrument(level = "debug", skip(self))]
    async fn transactions(&self) -> Result<Vec<WalletTransaction>> {
        let response: TransactionListResponse =
            self.http.get_json("/payments/wallet/transactions").await?;
        Ok(response.transactions)
    }
}
