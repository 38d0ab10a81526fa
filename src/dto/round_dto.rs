use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::interview_dto::InterviewDetailResponse;
use crate::models::round::{Round, RoundResult, RoundType};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddRoundPayload {
    pub round_type: RoundType,
    /// Must equal the current round count plus one; gaps are rejected.
    #[validate(range(min = 1))]
    pub round_sequence: i32,
    pub scheduled_date: NaiveDate,
    pub expected_start_time: NaiveTime,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i32,
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EditRoundPayload {
    pub round_type: Option<RoundType>,
    pub scheduled_date: Option<NaiveDate>,
    pub expected_start_time: Option<NaiveTime>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordResultPayload {
    pub result: RoundResult,
    #[validate(range(min = 0, max = 5))]
    pub rating: i16,
    #[validate(length(max = 4000))]
    pub feedback: Option<String>,
    pub version: i64,
}

/// Version token for body-less mutations (deletes).
#[derive(Debug, Clone, Deserialize)]
pub struct VersionQuery {
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoundResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub round_sequence: i32,
    pub round_type: RoundType,
    pub scheduled_date: NaiveDate,
    pub expected_start_time: NaiveTime,
    pub duration_minutes: i32,
    pub result: RoundResult,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    /// Derived at read time from the supplied clock, never persisted.
    pub is_completed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RoundResponse {
    pub fn from_round(round: Round, now: DateTime<Utc>) -> Self {
        let is_completed = round.is_completed(now);
        Self {
            id: round.id,
            application_id: round.application_id,
            round_sequence: round.round_sequence,
            round_type: round.round_type,
            scheduled_date: round.scheduled_date,
            expected_start_time: round.expected_start_time,
            duration_minutes: round.duration_minutes,
            result: round.result,
            rating: round.rating,
            feedback: round.feedback,
            is_completed,
            created_at: round.created_at,
            updated_at: round.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoundDetailResponse {
    #[serde(flatten)]
    pub round: RoundResponse,
    pub interviews: Vec<InterviewDetailResponse>,
}
