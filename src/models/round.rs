use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One stage of the evaluation pipeline. Sequence numbers are dense 1..N
/// within an application and carry no meaning across applications.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Round {
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
    pub idempotency_key: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Round {
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.scheduled_date
            .and_time(self.expected_start_time)
            .and_utc()
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at() + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Pure completion predicate: a round is over once a result has been
    /// recorded or its scheduled window has elapsed. No write happens here;
    /// callers supply `now` so the answer is deterministic.
    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        self.result != RoundResult::Pending || now > self.ends_at()
    }

    /// Interviews may only hang off technical and HR rounds.
    pub fn supports_interviews(&self) -> bool {
        matches!(self.round_type, RoundType::Technical | RoundType::Hr)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "round_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    Aptitude,
    GroupDiscussion,
    Coding,
    Technical,
    Hr,
    Ceo,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "round_result", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoundResult {
    Pending,
    Pass,
    Fail,
    Undervaluation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn round(date: NaiveDate, start: NaiveTime, duration: i32) -> Round {
        Round {
            id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            round_sequence: 1,
            round_type: RoundType::Technical,
            scheduled_date: date,
            expected_start_time: start,
            duration_minutes: duration,
            result: RoundResult::Pending,
            rating: None,
            feedback: None,
            idempotency_key: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn completion_flips_purely_as_time_passes() {
        let r = round(
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            30,
        );
        let before = Utc.with_ymd_and_hms(2026, 3, 10, 10, 15, 0).unwrap();
        let at_end = Utc.with_ymd_and_hms(2026, 3, 10, 10, 30, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 10, 10, 30, 1).unwrap();

        assert!(!r.is_completed(before));
        assert!(!r.is_completed(at_end));
        assert!(r.is_completed(after));
    }

    #[test]
    fn recorded_result_completes_regardless_of_time() {
        let mut r = round(
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            60,
        );
        r.result = RoundResult::Fail;
        let mid_window = Utc.with_ymd_and_hms(2026, 3, 10, 10, 5, 0).unwrap();
        assert!(r.is_completed(mid_window));
    }

    #[test]
    fn only_technical_and_hr_rounds_carry_interviews() {
        let mut r = round(
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            45,
        );
        for (ty, expected) in [
            (RoundType::Aptitude, false),
            (RoundType::GroupDiscussion, false),
            (RoundType::Coding, false),
            (RoundType::Technical, true),
            (RoundType::Hr, true),
            (RoundType::Ceo, false),
        ] {
            r.round_type = ty;
            assert_eq!(r.supports_interviews(), expected);
        }
    }
}
