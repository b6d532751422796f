//! Client for the election-management backend.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use super::http::{ApiClientConfig, HttpClient};
use crate::election::{ElectionDraft, VotingMethod};
use crate::error::Result;

/// A created or listed election as the backend reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElectionSummary {
    pub id: String,
    pub title: String,
    pub voting_method: VotingMethod,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub question_count: u32,
}

#[derive(Debug, Deserialize)]
struct ElectionResponse {
    election: ElectionSummary,
}

#[derive(Debug, Deserialize)]
struct ElectionListResponse {
    elections: Vec<ElectionSummary>,
}

/// Typed client for the election-management API.
pub struct ElectionsClient {
    http: HttpClient,
}

impl ElectionsClient {
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    /// Submit a finished draft for creation.
    #[instrument(level = "debug", skip_all, fields(title = %draft.title))]
    pub async fn create_election(&self, draft: &ElectionDraft) -> Result<ElectionSummary> {
        let response: ElectionResponse = self.http.post_json("/elections", draft).await?;
        Ok(response.election)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn list_elections(&self) -> Result<Vec<ElectionSummary>> {
        let response: ElectionListResponse = self.http.get_json("/elections").await?;
        Ok(response.elections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_deserializes_from_envelope_body() {
        let response: ElectionListResponse = serde_json::from_value(json!({
            "success": true,
            "elections": [{
                "id": "el_1",
                "title": "Board election",
                "voting_method": "approval",
                "starts_at": "2026-09-01T00:00:00Z",
                "ends_at": null,
                "question_count": 2
            }]
        }))
        .unwrap();
        assert_eq!(response.elections[0].voting_method, VotingMethod::Approval);
        assert_eq!(response.elections[0].question_count, 2);
    }

    #[test]
    fn test_create_client() {
        assert!(ElectionsClient::new(ApiClientConfig::default()).is_ok());
    }
}
