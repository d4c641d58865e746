use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::application::{ApplicationStatus, StatusChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hr_request_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HrRequestType {
    StatusUpdate,
    InterviewSchedule,
    Assignment,
    Other,
}

impl HrRequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HrRequestType::StatusUpdate => "status_update",
            HrRequestType::InterviewSchedule => "interview_schedule",
            HrRequestType::Assignment => "assignment",
            HrRequestType::Other => "other",
        }
    }
}

impl fmt::Display for HrRequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HrRequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status_update" => Ok(HrRequestType::StatusUpdate),
            "interview_schedule" => Ok(HrRequestType::InterviewSchedule),
            "assignment" => Ok(HrRequestType::Assignment),
            "other" => Ok(HrRequestType::Other),
            other => Err(format!("Invalid request type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hr_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HrRequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl HrRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HrRequestStatus::Pending => "pending",
            HrRequestStatus::Approved => "approved",
            HrRequestStatus::Rejected => "rejected",
            HrRequestStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for HrRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HrRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(HrRequestStatus::Pending),
            "approved" => Ok(HrRequestStatus::Approved),
            "rejected" => Ok(HrRequestStatus::Rejected),
            "completed" => Ok(HrRequestStatus::Completed),
            other => Err(format!("Invalid request status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HrRequest {
    pub id: Uuid,
    pub application_id: Uuid,
    pub hr_user_id: Uuid,
    pub request_type: HrRequestType,
    pub requested_status: Option<ApplicationStatus>,
    pub message: String,
    pub admin_notes: Option<String>,
    pub status: HrRequestStatus,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// HR request joined with the application's job and company.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HrRequestDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: HrRequest,
    pub student_id: Uuid,
    pub job_listing_id: Uuid,
    pub job_title: String,
    pub company_id: Uuid,
    pub company_name: String,
}

#[derive(Debug, Clone)]
pub struct NewHrRequest {
    pub application_id: Uuid,
    pub hr_user_id: Uuid,
    pub request_type: HrRequestType,
    pub requested_status: Option<ApplicationStatus>,
    pub message: String,
}

/// An administrator's decision on a pending request.
///
/// The store applies it with a conditional update on `status = 'pending'`;
/// when `cascade` is present the application mutation, its history row and
/// the final `completed` transition commit in the same transaction.
#[derive(Debug, Clone)]
pub struct HrDecision {
    pub request_id: Uuid,
    pub outcome: HrRequestStatus,
    pub admin_id: Uuid,
    pub admin_notes: Option<String>,
    pub cascade: Option<StatusChange>,
}
