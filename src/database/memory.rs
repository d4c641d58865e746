use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::store::{
    ApplicationFilter, ApplicationRepository, CompanyRepository, HrRequestFilter,
    HrRequestRepository, JobFilter, JobRepository, NotificationFilter, NotificationRepository,
    Notifier, ScoreRepository, UserRepository,
};
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationDetail, ApplicationStatus, NewApplication, StatusChange,
    StatusHistoryEntry,
};
use crate::models::company::{Company, CompanyDecision, CompanyStatus};
use crate::models::hr_request::{
    HrDecision, HrRequest, HrRequestDetail, HrRequestStatus, NewHrRequest,
};
use crate::models::job::{CompanyJob, Job, JobChanges, JobStatus, NewJob};
use crate::models::notification::{NewNotification, Notification};
use crate::models::student_score::{LmsAverages, StudentScore};
use crate::models::user::{HrMembership, Role, User};
use crate::utils::pagination::Page;
use crate::utils::time::now;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    memberships: Vec<HrMembership>,
    companies: HashMap<Uuid, Company>,
    jobs: HashMap<Uuid, Job>,
    // Vectors keep insertion order, which doubles as creation order.
    applications: Vec<Application>,
    history: Vec<StatusHistoryEntry>,
    requests: Vec<HrRequest>,
    notifications: Vec<Notification>,
    scores: HashMap<Uuid, StudentScore>,
    lms: HashMap<Uuid, LmsAverages>,
}

impl State {
    fn detail(&self, application: &Application) -> Option<ApplicationDetail> {
        let job = self.jobs.get(&application.job_listing_id)?;
        Some(ApplicationDetail {
            application: application.clone(),
            job_title: job.title.clone(),
            job_type: job.job_type.clone(),
            company_id: job.company_id,
            company_name: job.company_name.clone(),
            company_logo_url: job.company_logo_url.clone(),
        })
    }

    fn request_detail(&self, request: &HrRequest) -> Option<HrRequestDetail> {
        let application = self
            .applications
            .iter()
            .find(|a| a.id == request.application_id)?;
        let job = self.jobs.get(&application.job_listing_id)?;
        Some(HrRequestDetail {
            request: request.clone(),
            student_id: application.student_id,
            job_listing_id: application.job_listing_id,
            job_title: job.title.clone(),
            company_id: job.company_id,
            company_name: job.company_name.clone(),
        })
    }

    fn write_status_change(&mut self, change: &StatusChange) -> Result<Application> {
        let application = self
            .applications
            .iter_mut()
            .find(|a| a.id == change.application_id)
            .ok_or_else(|| Error::not_found("Application"))?;

        let at = now();
        application.status = change.status;
        application.reviewed_at = Some(at);
        application.updated_at = at;
        if let Some(reviewer) = change.reviewed_by {
            application.reviewed_by = Some(reviewer);
        }
        if let Some(note) = &change.hr_note {
            application.hr_notes = Some(match application.hr_notes.take() {
                Some(existing) => format!("{}\n\n{}", existing, note),
                None => note.clone(),
            });
        }
        let updated = application.clone();

        self.history.push(StatusHistoryEntry {
            id: Uuid::new_v4(),
            application_id: change.application_id,
            status: change.status,
            changed_by: Some(change.changed_by),
            notes: change.history_notes.clone(),
            changed_at: at,
        });

        Ok(updated)
    }
}

/// Repository implementation backed by process memory.
///
/// Used by the test suites and for running the API without PostgreSQL. All
/// multi-step writes happen under one lock, which gives them the same
/// all-or-nothing behaviour as the transactional store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    pub fn add_user(&self, name: &str, role: Role) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            role,
            is_active: true,
            created_at: Some(now()),
        };
        self.state()?.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn deactivate_user(&self, user_id: Uuid) -> Result<()> {
        let mut state = self.state()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Error::not_found("User"))?;
        user.is_active = false;
        Ok(())
    }

    /// Seeds an approved company.
    pub fn add_company(&self, name: &str) -> Result<Uuid> {
        self.add_company_with_status(name, CompanyStatus::Active)
    }

    pub fn add_company_with_status(&self, name: &str, status: CompanyStatus) -> Result<Uuid> {
        let company = Company {
            id: Uuid::new_v4(),
            company_name: name.to_string(),
            email: format!("jobs@{}.example.com", name.to_lowercase().replace(' ', "-")),
            logo_url: None,
            industry: None,
            location: None,
            status,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Some(now()),
        };
        let id = company.id;
        self.state()?.companies.insert(id, company);
        Ok(id)
    }

    pub fn add_hr_member(&self, user_id: Uuid, company_id: Uuid) -> Result<HrMembership> {
        let membership = HrMembership {
            id: Uuid::new_v4(),
            user_id,
            company_id,
            is_active: true,
        };
        self.state()?.memberships.push(membership.clone());
        Ok(membership)
    }

    pub fn add_job(
        &self,
        company_id: Uuid,
        title: &str,
        status: JobStatus,
        min_score: Decimal,
    ) -> Result<Job> {
        let mut state = self.state()?;
        let company = state
            .companies
            .get(&company_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Company"))?;
        let job = Job {
            id: Uuid::new_v4(),
            company_id,
            title: title.to_string(),
            description: String::new(),
            job_type: "full-time".to_string(),
            location: None,
            status,
            min_score,
            max_score: None,
            created_at: Some(now()),
            company_name: company.company_name,
            company_logo_url: company.logo_url,
        };
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    /// Overwrites the job's type and location.
    pub fn set_job_details(&self, job_id: Uuid, job_type: &str, location: Option<&str>) -> Result<()> {
        let mut state = self.state()?;
        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| Error::not_found("Job"))?;
        job.job_type = job_type.to_string();
        job.location = location.map(str::to_string);
        Ok(())
    }

    pub fn set_score(&self, score: StudentScore) -> Result<()> {
        self.state()?.scores.insert(score.student_id, score);
        Ok(())
    }

    pub fn set_lms_averages(&self, student_id: Uuid, averages: LmsAverages) -> Result<()> {
        self.state()?.lms.insert(student_id, averages);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state()?.users.get(&id).cloned())
    }

    async fn find_hr_membership(&self, user_id: Uuid) -> Result<Option<HrMembership>> {
        Ok(self
            .state()?
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.is_active)
            .cloned())
    }

    async fn active_hr_user_ids(&self, company_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state()?;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.company_id == company_id && m.is_active)
            .filter(|m| state.users.get(&m.user_id).is_some_and(|u| u.is_active))
            .map(|m| m.user_id)
            .collect())
    }

    async fn active_admin_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self
            .state()?
            .users
            .values()
            .filter(|u| u.role == Role::Admin && u.is_active)
            .map(|u| u.id)
            .collect())
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.state()?.jobs.get(&id).cloned())
    }

    async fn list_active_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let location = filter.location.as_ref().map(|l| l.to_lowercase());
        let mut jobs: Vec<Job> = self
            .state()?
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Active)
            .filter(|j| filter.job_type.as_ref().map_or(true, |t| &j.job_type == t))
            .filter(|j| {
                location.as_ref().map_or(true, |needle| {
                    j.location
                        .as_ref()
                        .is_some_and(|l| l.to_lowercase().contains(needle))
                })
            })
            .filter(|j| filter.company_id.map_or(true, |c| j.company_id == c))
            .filter(|j| filter.max_min_score.map_or(true, |max| j.min_score <= max))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn insert_job(&self, new: NewJob) -> Result<Job> {
        let mut state = self.state()?;
        let company = state
            .companies
            .get(&new.company_id)
            .ok_or_else(|| Error::not_found("Company"))?;
        let job = Job {
            id: Uuid::new_v4(),
            company_id: new.company_id,
            title: new.title,
            description: new.description,
            job_type: new.job_type,
            location: new.location,
            status: new.status,
            min_score: new.min_score,
            max_score: new.max_score,
            created_at: Some(now()),
            company_name: company.company_name.clone(),
            company_logo_url: company.logo_url.clone(),
        };
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<Job>> {
        let mut state = self.state()?;
        let Some(job) = state.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            job.title = title;
        }
        if let Some(description) = changes.description {
            job.description = description;
        }
        if let Some(job_type) = changes.job_type {
            job.job_type = job_type;
        }
        if changes.location.is_some() {
            job.location = changes.location;
        }
        if let Some(min_score) = changes.min_score {
            job.min_score = min_score;
        }
        if changes.max_score.is_some() {
            job.max_score = changes.max_score;
        }
        if let Some(status) = changes.status {
            job.status = status;
        }
        Ok(Some(job.clone()))
    }

    async fn list_company_jobs(
        &self,
        company_id: Uuid,
        status: Option<JobStatus>,
        page: Page,
    ) -> Result<(Vec<CompanyJob>, i64)> {
        let state = self.state()?;
        let mut matching: Vec<CompanyJob> = state
            .jobs
            .values()
            .filter(|j| j.company_id == company_id)
            .filter(|j| status.map_or(true, |s| j.status == s))
            .map(|j| CompanyJob {
                job: j.clone(),
                application_count: state
                    .applications
                    .iter()
                    .filter(|a| a.job_listing_id == j.id)
                    .count() as i64,
            })
            .collect();
        matching.sort_by(|a, b| b.job.created_at.cmp(&a.job.created_at));
        let total = matching.len() as i64;
        Ok((page.slice(matching), total))
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>> {
        Ok(self.state()?.companies.get(&id).cloned())
    }

    async fn list_companies(
        &self,
        status: Option<CompanyStatus>,
        page: Page,
    ) -> Result<(Vec<Company>, i64)> {
        let mut matching: Vec<Company> = self
            .state()?
            .companies
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        Ok((page.slice(matching), total))
    }

    async fn decide_company(&self, decision: CompanyDecision) -> Result<Option<Company>> {
        let mut state = self.state()?;
        let Some(company) = state.companies.get_mut(&decision.company_id) else {
            return Ok(None);
        };
        company.status = decision.status;
        company.approved_by = Some(decision.decided_by);
        company.approved_at = Some(now());
        company.rejection_reason = decision.rejection_reason;
        Ok(Some(company.clone()))
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn find_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
        let state = self.state()?;
        Ok(state
            .applications
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| state.detail(a)))
    }

    async fn find_application_for(
        &self,
        student_id: Uuid,
        job_listing_id: Uuid,
    ) -> Result<Option<Application>> {
        Ok(self
            .state()?
            .applications
            .iter()
            .find(|a| a.student_id == student_id && a.job_listing_id == job_listing_id)
            .cloned())
    }

    async fn applied_job_ids(&self, student_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .state()?
            .applications
            .iter()
            .filter(|a| a.student_id == student_id)
            .map(|a| a.job_listing_id)
            .collect())
    }

    async fn insert_application(&self, new: NewApplication) -> Result<Application> {
        let mut state = self.state()?;
        if state
            .applications
            .iter()
            .any(|a| a.student_id == new.student_id && a.job_listing_id == new.job_listing_id)
        {
            return Err(Error::Conflict(
                "You have already applied to this job".to_string(),
            ));
        }

        let at = now();
        let application = Application {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            job_listing_id: new.job_listing_id,
            status: ApplicationStatus::Applied,
            score_at_application: new.score_at_application,
            cover_letter: new.cover_letter,
            notes: new.notes,
            hr_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            applied_at: at,
            updated_at: at,
        };
        state.applications.push(application.clone());
        state.history.push(StatusHistoryEntry {
            id: Uuid::new_v4(),
            application_id: application.id,
            status: ApplicationStatus::Applied,
            changed_by: Some(new.student_id),
            notes: Some("Application submitted".to_string()),
            changed_at: at,
        });
        Ok(application)
    }

    async fn apply_status_change(&self, change: StatusChange) -> Result<Application> {
        self.state()?.write_status_change(&change)
    }

    async fn status_history(&self, application_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        Ok(self
            .state()?
            .history
            .iter()
            .rev()
            .filter(|h| h.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        page: Page,
    ) -> Result<(Vec<ApplicationDetail>, i64)> {
        let state = self.state()?;
        let matching: Vec<ApplicationDetail> = state
            .applications
            .iter()
            .rev()
            .filter_map(|a| state.detail(a))
            .filter(|d| filter.student_id.map_or(true, |s| d.application.student_id == s))
            .filter(|d| filter.company_id.map_or(true, |c| d.company_id == c))
            .filter(|d| filter.job_id.map_or(true, |j| d.application.job_listing_id == j))
            .filter(|d| filter.status.map_or(true, |s| d.application.status == s))
            .filter(|d| {
                filter
                    .min_score
                    .map_or(true, |min| d.application.score_at_application >= min)
            })
            .filter(|d| {
                filter
                    .max_score
                    .map_or(true, |max| d.application.score_at_application <= max)
            })
            .collect();
        let total = matching.len() as i64;
        Ok((page.slice(matching), total))
    }
}

#[async_trait]
impl HrRequestRepository for MemoryStore {
    async fn insert_hr_request(&self, new: NewHrRequest) -> Result<HrRequest> {
        let mut state = self.state()?;
        if !state.applications.iter().any(|a| a.id == new.application_id) {
            return Err(Error::not_found("Application"));
        }
        let at = now();
        let request = HrRequest {
            id: Uuid::new_v4(),
            application_id: new.application_id,
            hr_user_id: new.hr_user_id,
            request_type: new.request_type,
            requested_status: new.requested_status,
            message: new.message,
            admin_notes: None,
            status: HrRequestStatus::Pending,
            processed_by: None,
            processed_at: None,
            created_at: at,
            updated_at: at,
        };
        state.requests.push(request.clone());
        Ok(request)
    }

    async fn find_hr_request(&self, id: Uuid) -> Result<Option<HrRequestDetail>> {
        let state = self.state()?;
        Ok(state
            .requests
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| state.request_detail(r)))
    }

    async fn list_hr_requests(
        &self,
        filter: &HrRequestFilter,
        page: Page,
    ) -> Result<(Vec<HrRequestDetail>, i64)> {
        let state = self.state()?;
        let matching: Vec<HrRequestDetail> = state
            .requests
            .iter()
            .rev()
            .filter_map(|r| state.request_detail(r))
            .filter(|d| filter.hr_user_id.map_or(true, |u| d.request.hr_user_id == u))
            .filter(|d| filter.company_id.map_or(true, |c| d.company_id == c))
            .filter(|d| filter.status.map_or(true, |s| d.request.status == s))
            .filter(|d| filter.request_type.map_or(true, |t| d.request.request_type == t))
            .collect();
        let total = matching.len() as i64;
        Ok((page.slice(matching), total))
    }

    async fn apply_hr_decision(&self, decision: HrDecision) -> Result<Option<HrRequest>> {
        let mut state = self.state()?;
        let index = state
            .requests
            .iter()
            .position(|r| r.id == decision.request_id)
            .ok_or_else(|| Error::not_found("HR request"))?;
        if state.requests[index].status != HrRequestStatus::Pending {
            return Ok(None);
        }

        if let Some(change) = &decision.cascade {
            state.write_status_change(change)?;
        }

        let at = now();
        let request = &mut state.requests[index];
        request.status = if decision.cascade.is_some() {
            HrRequestStatus::Completed
        } else {
            decision.outcome
        };
        request.processed_by = Some(decision.admin_id);
        request.processed_at = Some(at);
        if decision.admin_notes.is_some() {
            request.admin_notes = decision.admin_notes.clone();
        }
        request.updated_at = at;
        Ok(Some(request.clone()))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
        page: Page,
    ) -> Result<(Vec<Notification>, i64)> {
        let matching: Vec<Notification> = self
            .state()?
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == filter.user_id)
            .filter(|n| filter.is_read.map_or(true, |r| n.is_read == r))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        Ok((page.slice(matching), total))
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let mut state = self.state()?;
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut state = self.state()?;
        let mut updated = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .state()?
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }
}

#[async_trait]
impl Notifier for MemoryStore {
    async fn notify(&self, notification: NewNotification) -> Result<()> {
        self.state()?.notifications.push(Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            link: notification.link,
            is_read: false,
            created_at: now(),
        });
        Ok(())
    }
}

#[async_trait]
impl ScoreRepository for MemoryStore {
    async fn latest_score(&self, student_id: Uuid) -> Result<Option<StudentScore>> {
        Ok(self.state()?.scores.get(&student_id).cloned())
    }

    async fn recalculate_score(&self, student_id: Uuid) -> Result<StudentScore> {
        let mut state = self.state()?;
        let averages = state
            .lms
            .get(&student_id)
            .copied()
            .ok_or_else(|| Error::Internal("no LMS activity recorded".to_string()))?;
        let score = StudentScore::legacy(student_id, averages);
        state.scores.insert(student_id, score.clone());
        Ok(score)
    }
}
