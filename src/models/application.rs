use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    UnderReview,
    InterviewScheduled,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::UnderReview,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Human readable form used in notification text.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid application status '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub job_listing_id: Uuid,
    pub status: ApplicationStatus,
    pub score_at_application: Decimal,
    pub cover_letter: Option<String>,
    pub notes: Option<String>,
    pub hr_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application joined with the job and company it was submitted to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub job_type: String,
    pub company_id: Uuid,
    pub company_name: String,
    pub company_logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Insert command for a fresh application. The store writes the `applied`
/// history row for `student_id` in the same transaction.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub student_id: Uuid,
    pub job_listing_id: Uuid,
    pub score_at_application: Decimal,
    pub cover_letter: Option<String>,
    pub notes: Option<String>,
}

/// A status mutation plus its history row, applied atomically by the store.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub changed_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    /// Appended to `hr_notes` (blank-line separated), never overwriting.
    pub hr_note: Option<String>,
    pub history_notes: Option<String>,
}
