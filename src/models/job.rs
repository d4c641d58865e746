use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const JOB_TYPES: [&str; 4] = ["full-time", "part-time", "internship", "contract"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(JobStatus::Draft),
            "active" => Ok(JobStatus::Active),
            "closed" => Ok(JobStatus::Closed),
            other => Err(format!("Invalid job status '{}'", other)),
        }
    }
}

/// A job listing joined with the summary of the company that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub job_type: String,
    pub location: Option<String>,
    pub status: JobStatus,
    pub min_score: Decimal,
    pub max_score: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
    pub company_name: String,
    pub company_logo_url: Option<String>,
}

impl Job {
    pub fn accepts_applications(&self) -> bool {
        self.status == JobStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub company_id: Uuid,
    pub posted_by: Uuid,
    pub title: String,
    pub description: String,
    pub job_type: String,
    pub location: Option<String>,
    pub min_score: Decimal,
    pub max_score: Option<Decimal>,
    pub status: JobStatus,
}

/// Partial update of a listing. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub min_score: Option<Decimal>,
    pub max_score: Option<Decimal>,
    pub status: Option<JobStatus>,
}

/// A company's own listing with its application tally.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub application_count: i64,
}
