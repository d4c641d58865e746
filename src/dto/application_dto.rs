use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{ApplicationDetail, StatusHistoryEntry};
use crate::utils::pagination::Page;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyPayload {
    pub job_listing_id: Uuid,
    #[validate(length(max = 5000, message = "Cover letter must be at most 5000 characters"))]
    pub cover_letter: Option<String>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatusPayload {
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    #[validate(length(max = 2000, message = "Admin notes must be at most 2000 characters"))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub job_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub min_score: Option<Decimal>,
    pub max_score: Option<Decimal>,
}

impl ApplicationListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

/// An application with its job summary and, on detail reads, its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    #[serde(flatten)]
    pub application: ApplicationDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_history: Option<Vec<StatusHistoryEntry>>,
}

impl From<ApplicationDetail> for ApplicationResponse {
    fn from(application: ApplicationDetail) -> Self {
        Self {
            application,
            status_history: None,
        }
    }
}
