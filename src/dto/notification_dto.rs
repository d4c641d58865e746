use serde::{Deserialize, Serialize};

use crate::utils::pagination::Page;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub is_read: Option<bool>,
}

impl NotificationListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}
