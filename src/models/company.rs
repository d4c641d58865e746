use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "company_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Pending,
    Active,
    Suspended,
    Rejected,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Pending => "pending",
            CompanyStatus::Active => "active",
            CompanyStatus::Suspended => "suspended",
            CompanyStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CompanyStatus::Pending),
            "active" => Ok(CompanyStatus::Active),
            "suspended" => Ok(CompanyStatus::Suspended),
            "rejected" => Ok(CompanyStatus::Rejected),
            other => Err(format!("Invalid company status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub company_name: String,
    pub email: String,
    pub logo_url: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub status: CompanyStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// An admin's verdict on a company registration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDecision {
    pub company_id: Uuid,
    pub status: CompanyStatus,
    pub decided_by: Uuid,
    /// Cleared on approval.
    pub rejection_reason: Option<String>,
}
