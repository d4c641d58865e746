use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::job::Job;
use crate::utils::pagination::Page;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QualifiedJobsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub job_type: Option<String>,
    pub location: Option<String>,
}

impl QualifiedJobsQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationStatus {
    Qualified,
    NotQualified,
}

/// A job annotated with the caller's standing against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifiedJobResponse {
    #[serde(flatten)]
    pub job: Job,
    pub qualification_status: QualificationStatus,
    pub student_score: Decimal,
    pub has_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 255, message = "Job title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Job description is required"))]
    pub description: String,
    pub job_type: String,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
    pub min_score: Decimal,
    pub max_score: Option<Decimal>,
    /// `draft` or `active`; defaults to `draft`.
    pub status: Option<String>,
}

/// Every field is optional; absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 255, message = "Job title is required"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Job description is required"))]
    pub description: Option<String>,
    pub job_type: Option<String>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
    pub min_score: Option<Decimal>,
    pub max_score: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompanyJobsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

impl CompanyJobsQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}
