use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::pagination::Page;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompanyListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

impl CompanyListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct RejectCompanyPayload {
    #[validate(length(max = 2000, message = "Rejection reason must be at most 2000 characters"))]
    pub rejection_reason: Option<String>,
}
