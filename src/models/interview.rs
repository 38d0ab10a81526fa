use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_INTERVIEWERS: usize = 4;

/// A scheduled session within a technical or HR round.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub round_id: Uuid,
    pub meeting_link: String,
    pub status: InterviewStatus,
    pub interview_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interviewer_ids: Vec<Uuid>,
    pub idempotency_key: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Interview {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.interview_date.and_time(self.end_time).and_utc()
    }

    /// Pure completion predicate. The persisted COMPLETED transition happens
    /// only in `finalize_completion`, never as a side effect of reads.
    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        self.status == InterviewStatus::Completed || now > self.ends_at()
    }

    pub fn has_interviewer(&self, interviewer_id: Uuid) -> bool {
        self.interviewer_ids.contains(&interviewer_id)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "interview_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// One feedback record per interviewer per interview. Skill ratings are kept
/// as jsonb since their shape is owned by this service, not the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewFeedback {
    pub interview_id: Uuid,
    pub interviewer_id: Uuid,
    pub feedback: String,
    pub skill_ratings: JsonValue,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkillRating {
    pub skill_id: Uuid,
    /// 1 to 5 inclusive.
    pub rating: i16,
    pub feedback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn interview(status: InterviewStatus) -> Interview {
        Interview {
            id: Uuid::new_v4(),
            round_id: Uuid::new_v4(),
            meeting_link: "https://meet.example.com/abc".to_string(),
            status,
            interview_date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            interviewer_ids: vec![Uuid::new_v4()],
            idempotency_key: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn scheduled_interview_completes_once_end_time_passes() {
        let i = interview(InterviewStatus::Scheduled);
        let during = Utc.with_ymd_and_hms(2026, 4, 2, 14, 30, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 4, 2, 15, 0, 1).unwrap();
        assert!(!i.is_completed(during));
        assert!(i.is_completed(after));
    }

    #[test]
    fn completed_status_dominates_the_clock() {
        let i = interview(InterviewStatus::Completed);
        let long_before = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        assert!(i.is_completed(long_before));
    }

    #[test]
    fn interviewer_membership_check() {
        let mut i = interview(InterviewStatus::Scheduled);
        let known = Uuid::new_v4();
        i.interviewer_ids = vec![known];
        assert!(i.has_interviewer(known));
        assert!(!i.has_interviewer(Uuid::new_v4()));
    }
}
