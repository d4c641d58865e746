use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::database::store::{ApplicationRepository, CompanyRepository, JobFilter, JobRepository};
use crate::dto::job_dto::{QualificationStatus, QualifiedJobResponse};
use crate::error::{Error, Result};
use crate::models::company::CompanyStatus;
use crate::models::job::{CompanyJob, Job, JobChanges, JobStatus, NewJob, JOB_TYPES};
use crate::models::user::{AuthUser, Role};
use crate::services::application_service::hr_company;
use crate::services::qualification;
use crate::services::score_service::ScoreService;
use crate::utils::pagination::{Page, PageMeta};
use crate::utils::validation::{field_error, non_blank, require_text};

#[derive(Debug, Clone)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub job_type: String,
    pub location: Option<String>,
    pub min_score: Decimal,
    pub max_score: Option<Decimal>,
    /// Defaults to draft.
    pub status: Option<JobStatus>,
}

#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
    companies: Arc<dyn CompanyRepository>,
    scores: ScoreService,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        companies: Arc<dyn CompanyRepository>,
        scores: ScoreService,
    ) -> Self {
        Self {
            jobs,
            applications,
            companies,
            scores,
        }
    }

    /// Active jobs the student's current score qualifies for.
    pub async fn qualified_jobs(
        &self,
        student_id: Uuid,
        job_type: Option<String>,
        location: Option<String>,
        page: Page,
    ) -> Result<(Vec<QualifiedJobResponse>, PageMeta)> {
        let score = self.scores.get_score(student_id).await;
        let filter = JobFilter {
            job_type,
            location,
            company_id: None,
            max_min_score: Some(score.overall_score),
        };
        let jobs = self.jobs.list_active_jobs(&filter).await?;
        let applied: HashSet<Uuid> = self
            .applications
            .applied_job_ids(student_id)
            .await?
            .into_iter()
            .collect();

        let annotated: Vec<QualifiedJobResponse> = jobs
            .into_iter()
            .map(|job| {
                let verdict = qualification::evaluate(score.overall_score, job.min_score);
                QualifiedJobResponse {
                    qualification_status: if verdict.qualified {
                        QualificationStatus::Qualified
                    } else {
                        QualificationStatus::NotQualified
                    },
                    student_score: score.overall_score,
                    has_applied: applied.contains(&job.id),
                    job,
                }
            })
            .collect();

        let meta = page.meta(annotated.len() as i64);
        Ok((page.slice(annotated), meta))
    }

    /// Posts a listing for the HR user's own company, which must be approved.
    pub async fn create_job(&self, actor: &AuthUser, draft: JobDraft) -> Result<Job> {
        let company_id = hr_company(actor)?;
        let company = self
            .companies
            .find_company(company_id)
            .await?
            .ok_or_else(|| Error::not_found("Company"))?;
        if company.status != CompanyStatus::Active {
            return Err(Error::Forbidden(
                "Company must be active to post jobs".to_string(),
            ));
        }

        require_text("title", &draft.title)?;
        require_text("description", &draft.description)?;
        check_job_type(&draft.job_type)?;
        check_score_range(draft.min_score, draft.max_score)?;
        if draft.status == Some(JobStatus::Closed) {
            return Err(field_error("status", "New jobs must be draft or active"));
        }

        let job = self
            .jobs
            .insert_job(NewJob {
                company_id,
                posted_by: actor.id,
                title: draft.title.trim().to_string(),
                description: draft.description.trim().to_string(),
                job_type: draft.job_type,
                location: non_blank(draft.location),
                min_score: draft.min_score,
                max_score: draft.max_score,
                status: draft.status.unwrap_or(JobStatus::Draft),
            })
            .await?;

        tracing::info!(
            job_id = %job.id,
            company_id = %company_id,
            posted_by = %actor.id,
            status = %job.status,
            "job created"
        );
        Ok(job)
    }

    pub async fn update_job(&self, actor: &AuthUser, id: Uuid, changes: JobChanges) -> Result<Job> {
        let job = self.owned_job(actor, id, "update").await?;

        if let Some(title) = &changes.title {
            require_text("title", title)?;
        }
        if let Some(description) = &changes.description {
            require_text("description", description)?;
        }
        if let Some(job_type) = &changes.job_type {
            check_job_type(job_type)?;
        }
        check_score_range(
            changes.min_score.unwrap_or(job.min_score),
            changes.max_score.or(job.max_score),
        )?;

        let updated = self
            .jobs
            .update_job(id, changes)
            .await?
            .ok_or_else(|| Error::not_found("Job"))?;
        tracing::info!(job_id = %id, updated_by = %actor.id, "job updated");
        Ok(updated)
    }

    /// Takes the listing off the board. Applications and their history stay.
    pub async fn close_job(&self, actor: &AuthUser, id: Uuid) -> Result<Job> {
        self.owned_job(actor, id, "close").await?;
        let closed = self
            .jobs
            .update_job(
                id,
                JobChanges {
                    status: Some(JobStatus::Closed),
                    ..JobChanges::default()
                },
            )
            .await?
            .ok_or_else(|| Error::not_found("Job"))?;
        tracing::info!(job_id = %id, closed_by = %actor.id, "job closed");
        Ok(closed)
    }

    /// The HR user's company listings, each with its application count.
    pub async fn company_jobs(
        &self,
        actor: &AuthUser,
        status: Option<JobStatus>,
        page: Page,
    ) -> Result<(Vec<CompanyJob>, PageMeta)> {
        let company_id = hr_company(actor)?;
        let (items, total) = self.jobs.list_company_jobs(company_id, status, page).await?;
        Ok((items, page.meta(total)))
    }

    async fn owned_job(&self, actor: &AuthUser, id: Uuid, verb: &str) -> Result<Job> {
        let job = self
            .jobs
            .find_job(id)
            .await?
            .ok_or_else(|| Error::not_found("Job"))?;
        if actor.role != Role::Admin && actor.company_id != Some(job.company_id) {
            return Err(Error::Forbidden(format!(
                "Not authorized to {} this job",
                verb
            )));
        }
        Ok(job)
    }
}

fn check_job_type(job_type: &str) -> Result<()> {
    if !JOB_TYPES.contains(&job_type) {
        return Err(field_error("job_type", "Invalid job type"));
    }
    Ok(())
}

fn check_score_range(min: Decimal, max: Option<Decimal>) -> Result<()> {
    let hundred = Decimal::ONE_HUNDRED;
    if min < Decimal::ZERO || min > hundred {
        return Err(field_error(
            "min_score",
            "Minimum score must be between 0 and 100",
        ));
    }
    if let Some(max) = max {
        if max < Decimal::ZERO || max > hundred {
            return Err(field_error(
                "max_score",
                "Maximum score must be between 0 and 100",
            ));
        }
        if max < min {
            return Err(field_error(
                "max_score",
                "Maximum score cannot be below the minimum score",
            ));
        }
    }
    Ok(())
}
