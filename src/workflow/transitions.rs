//! Transition tables for the application lifecycle and the HR request workflow.
//!
//! Applications:
//!
//! | actor   | current      | transition     | verdict          |
//! |---------|--------------|----------------|------------------|
//! | student | none         | submit         | allowed          |
//! | admin   | any          | set(any)       | allowed          |
//! | hr      | any          | set(any)       | via HR request   |
//! | *       | *            | *              | denied           |
//!
//! HR requests (only status_update with a requested status cascades):
//!
//! | actor | current     | action  | outcome                     |
//! |-------|-------------|---------|-----------------------------|
//! | admin | pending     | approve | approved, maybe → completed |
//! | admin | pending     | reject  | rejected                    |
//! | admin | processed   | *       | already processed           |
//! | *     | *           | *       | forbidden                   |

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use crate::models::hr_request::{HrRequestStatus, HrRequestType};
use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationTransition {
    Submit,
    SetStatus(ApplicationStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    /// The actor may only propose this change through an HR request.
    ViaHrRequest,
    Denied,
}

pub fn application_rule(
    role: Role,
    current: Option<ApplicationStatus>,
    transition: ApplicationTransition,
) -> Verdict {
    use ApplicationTransition::{SetStatus, Submit};

    match (role, current, transition) {
        (Role::Student, None, Submit) => Verdict::Allowed,
        (Role::Admin, _, SetStatus(_)) => Verdict::Allowed,
        (Role::Hr, _, SetStatus(_)) => Verdict::ViaHrRequest,
        _ => Verdict::Denied,
    }
}

pub fn authorize_application(
    role: Role,
    current: Option<ApplicationStatus>,
    transition: ApplicationTransition,
) -> Result<()> {
    match application_rule(role, current, transition) {
        Verdict::Allowed => Ok(()),
        Verdict::ViaHrRequest => Err(Error::Forbidden(
            "HR users cannot directly update application status. Please create a request to admin."
                .to_string(),
        )),
        Verdict::Denied => Err(Error::Forbidden(match transition {
            ApplicationTransition::Submit => "Only students can apply to jobs".to_string(),
            ApplicationTransition::SetStatus(_) => {
                "Only admin can directly update application status".to_string()
            }
        })),
    }
}

/// HR users and administrators may propose changes; admins act for any company.
pub fn may_propose(role: Role) -> bool {
    matches!(role, Role::Hr | Role::Admin)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessAction {
    Approve,
    Reject,
}

impl ProcessAction {
    pub fn past_tense(&self) -> &'static str {
        match self {
            ProcessAction::Approve => "approved",
            ProcessAction::Reject => "rejected",
        }
    }
}

impl FromStr for ProcessAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "approve" => Ok(ProcessAction::Approve),
            "reject" => Ok(ProcessAction::Reject),
            _ => Err("action must be either \"approve\" or \"reject\"".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestEffect {
    pub outcome: HrRequestStatus,
    /// Apply `requested_status` to the application and finish as `completed`.
    pub cascades: bool,
}

pub fn request_rule(
    role: Role,
    current: HrRequestStatus,
    action: ProcessAction,
    request_type: HrRequestType,
    requested_status: Option<ApplicationStatus>,
) -> Result<RequestEffect> {
    match (role, current, action) {
        (Role::Admin, HrRequestStatus::Pending, ProcessAction::Approve) => Ok(RequestEffect {
            outcome: HrRequestStatus::Approved,
            cascades: request_type == HrRequestType::StatusUpdate && requested_status.is_some(),
        }),
        (Role::Admin, HrRequestStatus::Pending, ProcessAction::Reject) => Ok(RequestEffect {
            outcome: HrRequestStatus::Rejected,
            cascades: false,
        }),
        (Role::Admin, _, _) => Err(already_processed()),
        _ => Err(Error::Forbidden(
            "Only admin can process HR requests".to_string(),
        )),
    }
}

pub fn already_processed() -> Error {
    Error::BusinessRule("Request has already been processed".to_string())
}
