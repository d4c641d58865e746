use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    Application, ApplicationDetail, ApplicationStatus, NewApplication, StatusChange,
    StatusHistoryEntry,
};
use crate::models::company::{Company, CompanyDecision, CompanyStatus};
use crate::models::hr_request::{
    HrDecision, HrRequest, HrRequestDetail, HrRequestStatus, HrRequestType, NewHrRequest,
};
use crate::models::job::{CompanyJob, Job, JobChanges, JobStatus, NewJob};
use crate::models::notification::{NewNotification, Notification};
use crate::models::student_score::StudentScore;
use crate::models::user::{HrMembership, User};
use crate::utils::pagination::Page;

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub job_type: Option<String>,
    /// Case-insensitive substring match.
    pub location: Option<String>,
    pub company_id: Option<Uuid>,
    /// Only jobs whose minimum score does not exceed this value.
    pub max_min_score: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub student_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
    pub min_score: Option<Decimal>,
    pub max_score: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct HrRequestFilter {
    pub hr_user_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub status: Option<HrRequestStatus>,
    pub request_type: Option<HrRequestType>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub user_id: Uuid,
    pub is_read: Option<bool>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// The user's active HR membership, if any.
    async fn find_hr_membership(&self, user_id: Uuid) -> Result<Option<HrMembership>>;

    /// User ids of active HR members of the company.
    async fn active_hr_user_ids(&self, company_id: Uuid) -> Result<Vec<Uuid>>;

    async fn active_admin_ids(&self) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>>;

    /// Active jobs matching the filter, newest first.
    async fn list_active_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;

    async fn insert_job(&self, new: NewJob) -> Result<Job>;

    /// Returns `None` when the job does not exist.
    async fn update_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<Job>>;

    /// All of a company's listings, any status unless filtered, newest first.
    async fn list_company_jobs(
        &self,
        company_id: Uuid,
        status: Option<JobStatus>,
        page: Page,
    ) -> Result<(Vec<CompanyJob>, i64)>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>>;

    /// Newest first.
    async fn list_companies(
        &self,
        status: Option<CompanyStatus>,
        page: Page,
    ) -> Result<(Vec<Company>, i64)>;

    /// Records the verdict. Returns `None` when the company does not exist.
    async fn decide_company(&self, decision: CompanyDecision) -> Result<Option<Company>>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn find_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>>;

    async fn find_application_for(
        &self,
        student_id: Uuid,
        job_listing_id: Uuid,
    ) -> Result<Option<Application>>;

    async fn applied_job_ids(&self, student_id: Uuid) -> Result<Vec<Uuid>>;

    /// Inserts the application and its `applied` history row atomically.
    /// A duplicate (student, job) pair yields `Error::Conflict`.
    async fn insert_application(&self, new: NewApplication) -> Result<Application>;

    /// Updates status, `reviewed_at`, notes and appends one history row atomically.
    async fn apply_status_change(&self, change: StatusChange) -> Result<Application>;

    /// History rows, newest first.
    async fn status_history(&self, application_id: Uuid) -> Result<Vec<StatusHistoryEntry>>;

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        page: Page,
    ) -> Result<(Vec<ApplicationDetail>, i64)>;
}

#[async_trait]
pub trait HrRequestRepository: Send + Sync {
    async fn insert_hr_request(&self, new: NewHrRequest) -> Result<HrRequest>;

    async fn find_hr_request(&self, id: Uuid) -> Result<Option<HrRequestDetail>>;

    async fn list_hr_requests(
        &self,
        filter: &HrRequestFilter,
        page: Page,
    ) -> Result<(Vec<HrRequestDetail>, i64)>;

    /// Applies the decision only if the request is still pending.
    /// Returns `None` when another decision got there first.
    async fn apply_hr_decision(&self, decision: HrDecision) -> Result<Option<HrRequest>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
        page: Page,
    ) -> Result<(Vec<Notification>, i64)>;

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;

    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;
}

/// Sink for lifecycle notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: NewNotification) -> Result<()>;
}

/// Read side of the external scoring system.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    async fn latest_score(&self, student_id: Uuid) -> Result<Option<StudentScore>>;

    /// Legacy recomputation from raw LMS activity. Not authoritative.
    async fn recalculate_score(&self, student_id: Uuid) -> Result<StudentScore>;
}

/// Everything the services need from persistence.
pub trait Store:
    UserRepository
    + JobRepository
    + CompanyRepository
    + ApplicationRepository
    + HrRequestRepository
    + NotificationRepository
    + Notifier
    + ScoreRepository
{
}

impl<T> Store for T where
    T: UserRepository
        + JobRepository
        + CompanyRepository
        + ApplicationRepository
        + HrRequestRepository
        + NotificationRepository
        + Notifier
        + ScoreRepository
{
}
