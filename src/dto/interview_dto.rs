use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::interview::{Interview, InterviewFeedback, InterviewStatus, SkillRating};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ScheduleInterviewPayload {
    #[validate(url)]
    pub meeting_link: String,
    pub interview_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(min = 1, max = 4))]
    pub interviewer_ids: Vec<Uuid>,
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EditInterviewPayload {
    #[validate(url)]
    pub meeting_link: Option<String>,
    pub interview_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[validate(length(min = 1, max = 4))]
    pub interviewer_ids: Option<Vec<Uuid>>,
    /// May move between scheduled and cancelled; the completed transition is
    /// owned by the finalize operation.
    pub status: Option<InterviewStatus>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitFeedbackPayload {
    pub interviewer_id: Uuid,
    #[validate(length(min = 1, max = 8000))]
    pub feedback: String,
    #[serde(default)]
    pub skill_ratings: Vec<SkillRating>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterviewResponse {
    pub id: Uuid,
    pub round_id: Uuid,
    pub meeting_link: String,
    pub status: InterviewStatus,
    pub interview_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interviewer_ids: Vec<Uuid>,
    pub is_completed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl InterviewResponse {
    pub fn from_interview(interview: Interview, now: DateTime<Utc>) -> Self {
        let is_completed = interview.is_completed(now);
        Self {
            id: interview.id,
            round_id: interview.round_id,
            meeting_link: interview.meeting_link,
            status: interview.status,
            interview_date: interview.interview_date,
            start_time: interview.start_time,
            end_time: interview.end_time,
            interviewer_ids: interview.interviewer_ids,
            is_completed,
            created_at: interview.created_at,
            updated_at: interview.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackResponse {
    pub interviewer_id: Uuid,
    pub feedback: String,
    pub skill_ratings: Vec<SkillRating>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<InterviewFeedback> for FeedbackResponse {
    type Error = serde_json::Error;

    fn try_from(row: InterviewFeedback) -> Result<Self, Self::Error> {
        Ok(Self {
            interviewer_id: row.interviewer_id,
            feedback: row.feedback,
            skill_ratings: serde_json::from_value(row.skill_ratings)?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterviewDetailResponse {
    #[serde(flatten)]
    pub interview: InterviewResponse,
    pub feedback: Vec<FeedbackResponse>,
}
