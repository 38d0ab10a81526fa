use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A candidate's submission against a position. Owns its rounds exclusively;
/// `version` is the optimistic token bumped on every successful write to the
/// application or anything it owns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub position_id: Uuid,
    pub status: ApplicationStatus,
    pub status_feedback: Option<String>,
    pub hold_reason: Option<String>,
    pub matching_score: Option<Decimal>,
    pub version: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Shortlisting is derived, never stored: the application has moved past
    /// PENDING and has not been rejected.
    pub fn is_shortlisted(&self) -> bool {
        !matches!(
            self.status,
            ApplicationStatus::Pending | ApplicationStatus::Rejected
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderProcess,
    Accepted,
    Rejected,
    OnHold,
    DocumentVerification,
    Hired,
}

impl ApplicationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }

    /// The full transition table. Every status change anywhere in the engine
    /// goes through this edge list; the match is exhaustive so a new status
    /// cannot be added without declaring its edges.
    pub fn allowed_targets(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[UnderProcess, Accepted, Rejected],
            UnderProcess => &[Accepted, Rejected],
            Accepted => &[OnHold, DocumentVerification, Rejected],
            OnHold => &[Accepted, Rejected],
            DocumentVerification => &[Hired, Rejected],
            Rejected => &[],
            Hired => &[],
        }
    }

    pub fn can_transition_to(self, target: ApplicationStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderProcess => "under_process",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::OnHold => "on_hold",
            ApplicationStatus::DocumentVerification => "document_verification",
            ApplicationStatus::Hired => "hired",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ApplicationStatus::*;
    use super::*;

    const ALL: [ApplicationStatus; 7] = [
        Pending,
        UnderProcess,
        Accepted,
        Rejected,
        OnHold,
        DocumentVerification,
        Hired,
    ];

    #[test]
    fn pending_cannot_jump_to_hired() {
        assert!(!Pending.can_transition_to(Hired));
        assert!(!Pending.can_transition_to(DocumentVerification));
        assert!(!Pending.can_transition_to(OnHold));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for target in ALL {
            assert!(!Rejected.can_transition_to(target));
            assert!(!Hired.can_transition_to(target));
        }
    }

    #[test]
    fn every_non_terminal_state_can_reject() {
        for status in ALL {
            if !status.is_terminal() {
                assert!(
                    status.can_transition_to(Rejected),
                    "{status} should allow rejection"
                );
            }
        }
    }

    #[test]
    fn hold_is_a_two_way_toggle_with_accepted() {
        assert!(Accepted.can_transition_to(OnHold));
        assert!(OnHold.can_transition_to(Accepted));
        assert!(!Pending.can_transition_to(OnHold));
        assert!(!UnderProcess.can_transition_to(OnHold));
        assert!(!OnHold.can_transition_to(DocumentVerification));
    }

    #[test]
    fn hiring_path_goes_through_document_verification() {
        assert!(Accepted.can_transition_to(DocumentVerification));
        assert!(DocumentVerification.can_transition_to(Hired));
        assert!(!Accepted.can_transition_to(Hired));
        assert!(!UnderProcess.can_transition_to(DocumentVerification));
    }

    #[test]
    fn shortlisting_is_derived_from_status() {
        let mut app = Application {
            id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            position_id: Uuid::new_v4(),
            status: Pending,
            status_feedback: None,
            hold_reason: None,
            matching_score: None,
            version: 0,
            created_at: None,
            updated_at: None,
        };
        assert!(!app.is_shortlisted());
        app.status = Accepted;
        assert!(app.is_shortlisted());
        app.status = Rejected;
        assert!(!app.is_shortlisted());
        app.status = Hired;
        assert!(app.is_shortlisted());
    }
}
