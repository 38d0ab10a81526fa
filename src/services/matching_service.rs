use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Thin client for the external matching service. The core only triggers a
/// scoring run and later reads `matching_score` back off the application; it
/// never computes scores itself.
#[derive(Clone)]
pub struct MatchingService {
    base_url: String,
    http: Client,
}

impl MatchingService {
    pub fn new(base_url: String, http: Client) -> Self {
        Self { base_url, http }
    }

    pub async fn trigger(&self, position_id: Uuid, threshold_score: Decimal) -> Result<()> {
        let url = format!("{}/api/matching/score", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "position_id": position_id,
            "threshold_score": threshold_score,
        });

        let response = self.http.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            tracing::warn!(
                position_id = %position_id,
                status = %response.status(),
                "matching service rejected the trigger"
            );
            return Err(Error::Internal(format!(
                "matching service returned {}",
                response.status()
            )));
        }

        tracing::info!(position_id = %position_id, "matching run triggered");
        Ok(())
    }
}
