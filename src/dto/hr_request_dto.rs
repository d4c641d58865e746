use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::Page;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateHrRequestPayload {
    pub application_id: Uuid,
    #[validate(length(min = 1, message = "request_type is required"))]
    pub request_type: String,
    pub requested_status: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProcessHrRequestPayload {
    #[validate(length(min = 1, message = "action is required"))]
    pub action: String,
    #[validate(length(max = 2000, message = "Admin notes must be at most 2000 characters"))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HrRequestListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub request_type: Option<String>,
    pub company_id: Option<Uuid>,
}

impl HrRequestListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}
