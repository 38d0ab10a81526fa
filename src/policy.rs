//! Gating policy: every role and state precondition in the pipeline, as pure
//! functions of (snapshot, role). Nothing here reads the clock, the database
//! or the request; services evaluate these before performing any write.

use serde::{Deserialize, Serialize};

use crate::models::application::{Application, ApplicationStatus};
use crate::models::round::{Round, RoundResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hr,
    Recruiter,
    Interviewer,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "hr" => Some(Role::Hr),
            "recruiter" => Some(Role::Recruiter),
            "interviewer" => Some(Role::Interviewer),
            _ => None,
        }
    }
}

/// Status transitions (including hold and document verification) belong to
/// the pipeline owners.
pub fn can_manage_status(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Hr)
}

/// Round structure (add/edit/delete) is an admin/HR concern and is frozen
/// once the application has been rejected, sent to document verification or
/// hired.
pub fn can_modify_rounds(application: &Application, role: Role) -> bool {
    let role_ok = matches!(role, Role::Admin | Role::Hr);
    let status_ok = !matches!(
        application.status,
        ApplicationStatus::Rejected
            | ApplicationStatus::DocumentVerification
            | ApplicationStatus::Hired
    );
    role_ok && status_ok
}

/// Interviews are scheduled by admins and recruiters, only while the owning
/// round is still undecided and the application itself is not terminal.
pub fn can_schedule_interview(application: &Application, round: &Round, role: Role) -> bool {
    let role_ok = matches!(role, Role::Admin | Role::Recruiter);
    role_ok && round.result == RoundResult::Pending && !application.status.is_terminal()
}

/// Document verification requires every owned round to have passed.
pub fn can_move_to_document_verification(rounds: &[Round]) -> bool {
    rounds.iter().all(|r| r.result == RoundResult::Pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    use crate::models::round::RoundType;

    fn application(status: ApplicationStatus) -> Application {
        Application {
            id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            position_id: Uuid::new_v4(),
            status,
            status_feedback: None,
            hold_reason: None,
            matching_score: None,
            version: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn round(result: RoundResult) -> Round {
        Round {
            id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            round_sequence: 1,
            round_type: RoundType::Hr,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            expected_start_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            duration_minutes: 30,
            result,
            rating: None,
            feedback: None,
            idempotency_key: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn round_modification_is_gated_by_role_and_status() {
        let open = application(ApplicationStatus::Accepted);
        assert!(can_modify_rounds(&open, Role::Admin));
        assert!(can_modify_rounds(&open, Role::Hr));
        assert!(!can_modify_rounds(&open, Role::Recruiter));
        assert!(!can_modify_rounds(&open, Role::Interviewer));

        for frozen in [
            ApplicationStatus::Rejected,
            ApplicationStatus::DocumentVerification,
            ApplicationStatus::Hired,
        ] {
            assert!(!can_modify_rounds(&application(frozen), Role::Admin));
        }
    }

    #[test]
    fn interview_scheduling_requires_pending_round_and_live_application() {
        let app = application(ApplicationStatus::Accepted);
        let pending = round(RoundResult::Pending);
        assert!(can_schedule_interview(&app, &pending, Role::Admin));
        assert!(can_schedule_interview(&app, &pending, Role::Recruiter));
        assert!(!can_schedule_interview(&app, &pending, Role::Hr));

        let decided = round(RoundResult::Pass);
        assert!(!can_schedule_interview(&app, &decided, Role::Recruiter));

        let rejected = application(ApplicationStatus::Rejected);
        assert!(!can_schedule_interview(&rejected, &pending, Role::Admin));
    }

    #[test]
    fn document_verification_needs_every_round_passed() {
        assert!(can_move_to_document_verification(&[
            round(RoundResult::Pass),
            round(RoundResult::Pass),
        ]));
        assert!(!can_move_to_document_verification(&[
            round(RoundResult::Pass),
            round(RoundResult::Pending),
        ]));
        assert!(!can_move_to_document_verification(&[round(
            RoundResult::Fail
        )]));
    }

    #[test]
    fn status_management_is_limited_to_pipeline_owners() {
        assert!(can_manage_status(Role::Admin));
        assert!(can_manage_status(Role::Hr));
        assert!(!can_manage_status(Role::Recruiter));
        assert!(!can_manage_status(Role::Interviewer));
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("HR"), Some(Role::Hr));
        assert_eq!(Role::parse("recruiter"), Some(Role::Recruiter));
        assert_eq!(Role::parse("candidate"), None);
    }
}
