use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::store::{
    ApplicationFilter, ApplicationRepository, CompanyRepository, HrRequestFilter,
    HrRequestRepository, JobFilter, JobRepository, NotificationFilter, NotificationRepository,
    Notifier, ScoreRepository, UserRepository,
};
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationDetail, NewApplication, StatusChange, StatusHistoryEntry,
};
use crate::models::company::{Company, CompanyDecision, CompanyStatus};
use crate::models::hr_request::{HrDecision, HrRequest, HrRequestDetail, NewHrRequest};
use crate::models::job::{CompanyJob, Job, JobChanges, JobStatus, NewJob};
use crate::models::notification::{NewNotification, Notification};
use crate::models::student_score::{LmsAverages, StudentScore};
use crate::models::user::{HrMembership, User};
use crate::utils::pagination::Page;

const APPLICATION_COLUMNS: &str = "a.id, a.student_id, a.job_listing_id, a.status, \
    a.score_at_application, a.cover_letter, a.notes, a.hr_notes, a.reviewed_by, \
    a.reviewed_at, a.applied_at, a.updated_at";

const APPLICATION_RETURNING: &str = "id, student_id, job_listing_id, status, \
    score_at_application, cover_letter, notes, hr_notes, reviewed_by, reviewed_at, \
    applied_at, updated_at";

const HR_REQUEST_RETURNING: &str = "id, application_id, hr_user_id, request_type, \
    requested_status, message, admin_notes, status, processed_by, processed_at, \
    created_at, updated_at";

const JOB_COLUMNS: &str = "j.id, j.company_id, j.title, j.description, j.job_type, j.location, \
    j.status, j.min_score, j.max_score, j.created_at, \
    c.company_name, c.logo_url AS company_logo_url";

const COMPANY_COLUMNS: &str = "id, company_name, email, logo_url, industry, location, status, \
    approved_by, approved_at, rejection_reason, created_at";

const APPLICATION_WHERE: &str = "($1::uuid IS NULL OR a.student_id = $1)
    AND ($2::uuid IS NULL OR j.company_id = $2)
    AND ($3::uuid IS NULL OR a.job_listing_id = $3)
    AND ($4::application_status IS NULL OR a.status = $4)
    AND ($5::numeric IS NULL OR a.score_at_application >= $5)
    AND ($6::numeric IS NULL OR a.score_at_application <= $6)";

const HR_REQUEST_WHERE: &str = "($1::uuid IS NULL OR r.hr_user_id = $1)
    AND ($2::uuid IS NULL OR j.company_id = $2)
    AND ($3::hr_request_status IS NULL OR r.status = $3)
    AND ($4::hr_request_type IS NULL OR r.request_type = $4)";

/// PostgreSQL implementation of every repository.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn application_detail_query() -> String {
        format!(
            "SELECT {}, j.title AS job_title, j.job_type, j.company_id,
                    c.company_name, c.logo_url AS company_logo_url
             FROM applications a
             JOIN job_listings j ON j.id = a.job_listing_id
             JOIN companies c ON c.id = j.company_id",
            APPLICATION_COLUMNS
        )
    }

    fn hr_request_detail_query() -> &'static str {
        "SELECT r.id, r.application_id, r.hr_user_id, r.request_type, r.requested_status,
                r.message, r.admin_notes, r.status, r.processed_by, r.processed_at,
                r.created_at, r.updated_at,
                a.student_id, a.job_listing_id, j.title AS job_title, j.company_id,
                c.company_name
         FROM hr_requests r
         JOIN applications a ON a.id = r.application_id
         JOIN job_listings j ON j.id = a.job_listing_id
         JOIN companies c ON c.id = j.company_id"
    }
}

/// Status update plus history row on an open connection or transaction.
async fn write_status_change(conn: &mut PgConnection, change: &StatusChange) -> Result<Application> {
    let application = sqlx::query_as::<_, Application>(&format!(
        r#"
        UPDATE applications
        SET status = $2,
            reviewed_by = COALESCE($3, reviewed_by),
            reviewed_at = NOW(),
            hr_notes = CASE
                WHEN $4::text IS NULL THEN hr_notes
                ELSE concat_ws(E'\n\n', hr_notes, $4::text)
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        APPLICATION_RETURNING
    ))
    .bind(change.application_id)
    .bind(change.status)
    .bind(change.reviewed_by)
    .bind(change.hr_note.as_deref())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::not_found("Application"))?;

    sqlx::query(
        r#"
        INSERT INTO application_status_history (application_id, status, changed_by, notes)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(change.application_id)
    .bind(change.status)
    .bind(change.changed_by)
    .bind(change.history_notes.as_deref())
    .execute(&mut *conn)
    .await?;

    Ok(application)
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_hr_membership(&self, user_id: Uuid) -> Result<Option<HrMembership>> {
        let membership = sqlx::query_as::<_, HrMembership>(
            r#"
            SELECT id, user_id, company_id, is_active
            FROM hr_users
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn active_hr_user_ids(&self, company_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT h.user_id
            FROM hr_users h
            JOIN users u ON u.id = h.user_id
            WHERE h.company_id = $1 AND h.is_active = TRUE AND u.is_active = TRUE
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn active_admin_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE role = 'admin' AND is_active = TRUE",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[async_trait]
impl JobRepository for PgStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {}
            FROM job_listings j
            JOIN companies c ON c.id = j.company_id
            WHERE j.id = $1
            "#,
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn list_active_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let location = filter.location.as_ref().map(|l| format!("%{}%", l));
        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {}
            FROM job_listings j
            JOIN companies c ON c.id = j.company_id
            WHERE j.status = 'active'
              AND ($1::text IS NULL OR j.job_type = $1)
              AND ($2::text IS NULL OR j.location ILIKE $2)
              AND ($3::uuid IS NULL OR j.company_id = $3)
              AND ($4::numeric IS NULL OR j.min_score <= $4)
            ORDER BY j.created_at DESC
            "#,
            JOB_COLUMNS
        ))
        .bind(filter.job_type.as_deref())
        .bind(location)
        .bind(filter.company_id)
        .bind(filter.max_min_score)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn insert_job(&self, new: NewJob) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            WITH j AS (
                INSERT INTO job_listings (
                    company_id, posted_by, title, description, job_type, location,
                    min_score, max_score, status
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT {}
            FROM j
            JOIN companies c ON c.id = j.company_id
            "#,
            JOB_COLUMNS
        ))
        .bind(new.company_id)
        .bind(new.posted_by)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.job_type)
        .bind(new.location.as_deref())
        .bind(new.min_score)
        .bind(new.max_score)
        .bind(new.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    async fn update_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            WITH j AS (
                UPDATE job_listings
                SET title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    job_type = COALESCE($4, job_type),
                    location = COALESCE($5, location),
                    min_score = COALESCE($6, min_score),
                    max_score = COALESCE($7, max_score),
                    status = COALESCE($8, status),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {}
            FROM j
            JOIN companies c ON c.id = j.company_id
            "#,
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.job_type.as_deref())
        .bind(changes.location.as_deref())
        .bind(changes.min_score)
        .bind(changes.max_score)
        .bind(changes.status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn list_company_jobs(
        &self,
        company_id: Uuid,
        status: Option<JobStatus>,
        page: Page,
    ) -> Result<(Vec<CompanyJob>, i64)> {
        let items = sqlx::query_as::<_, CompanyJob>(&format!(
            r#"
            SELECT {},
                   (SELECT COUNT(*) FROM applications a WHERE a.job_listing_id = j.id)
                       AS application_count
            FROM job_listings j
            JOIN companies c ON c.id = j.company_id
            WHERE j.company_id = $1 AND ($2::job_status IS NULL OR j.status = $2)
            ORDER BY j.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            JOB_COLUMNS
        ))
        .bind(company_id)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM job_listings
            WHERE company_id = $1 AND ($2::job_status IS NULL OR status = $2)
            "#,
        )
        .bind(company_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }
}

#[async_trait]
impl CompanyRepository for PgStore {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = $1",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    async fn list_companies(
        &self,
        status: Option<CompanyStatus>,
        page: Page,
    ) -> Result<(Vec<Company>, i64)> {
        let items = sqlx::query_as::<_, Company>(&format!(
            r#"
            SELECT {}
            FROM companies
            WHERE ($1::company_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            COMPANY_COLUMNS
        ))
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM companies WHERE ($1::company_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    async fn decide_company(&self, decision: CompanyDecision) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET status = $2,
                approved_by = $3,
                approved_at = NOW(),
                rejection_reason = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(decision.company_id)
        .bind(decision.status)
        .bind(decision.decided_by)
        .bind(decision.rejection_reason.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }
}

#[async_trait]
impl ApplicationRepository for PgStore {
    async fn find_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
        let query = format!("{} WHERE a.id = $1", Self::application_detail_query());
        let detail = sqlx::query_as::<_, ApplicationDetail>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(detail)
    }

    async fn find_application_for(
        &self,
        student_id: Uuid,
        job_listing_id: Uuid,
    ) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications a WHERE a.student_id = $1 AND a.job_listing_id = $2",
            APPLICATION_COLUMNS
        ))
        .bind(student_id)
        .bind(job_listing_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn applied_job_ids(&self, student_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT job_listing_id FROM applications WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn insert_application(&self, new: NewApplication) -> Result<Application> {
        let mut tx = self.pool.begin().await?;

        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (
                student_id, job_listing_id, status, score_at_application, cover_letter, notes
            ) VALUES ($1, $2, 'applied', $3, $4, $5)
            RETURNING {}
            "#,
            APPLICATION_RETURNING
        ))
        .bind(new.student_id)
        .bind(new.job_listing_id)
        .bind(new.score_at_application)
        .bind(new.cover_letter.as_deref())
        .bind(new.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => {
                Error::Conflict("You have already applied to this job".to_string())
            }
            other => other,
        })?;

        sqlx::query(
            r#"
            INSERT INTO application_status_history (application_id, status, changed_by, notes)
            VALUES ($1, 'applied', $2, 'Application submitted')
            "#,
        )
        .bind(application.id)
        .bind(new.student_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(application)
    }

    async fn apply_status_change(&self, change: StatusChange) -> Result<Application> {
        let mut tx = self.pool.begin().await?;
        let application = write_status_change(&mut tx, &change).await?;
        tx.commit().await?;
        Ok(application)
    }

    async fn status_history(&self, application_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        let rows = sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            SELECT id, application_id, status, changed_by, notes, changed_at
            FROM application_status_history
            WHERE application_id = $1
            ORDER BY changed_at DESC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        page: Page,
    ) -> Result<(Vec<ApplicationDetail>, i64)> {
        let items_query = format!(
            "{} WHERE {} ORDER BY a.applied_at DESC LIMIT $7 OFFSET $8",
            Self::application_detail_query(),
            APPLICATION_WHERE
        );
        let items = sqlx::query_as::<_, ApplicationDetail>(&items_query)
            .bind(filter.student_id)
            .bind(filter.company_id)
            .bind(filter.job_id)
            .bind(filter.status)
            .bind(filter.min_score)
            .bind(filter.max_score)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total_query = format!(
            "SELECT COUNT(*) FROM applications a
             JOIN job_listings j ON j.id = a.job_listing_id
             WHERE {}",
            APPLICATION_WHERE
        );
        let total = sqlx::query_scalar::<_, i64>(&total_query)
            .bind(filter.student_id)
            .bind(filter.company_id)
            .bind(filter.job_id)
            .bind(filter.status)
            .bind(filter.min_score)
            .bind(filter.max_score)
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }
}

#[async_trait]
impl HrRequestRepository for PgStore {
    async fn insert_hr_request(&self, new: NewHrRequest) -> Result<HrRequest> {
        let request = sqlx::query_as::<_, HrRequest>(&format!(
            r#"
            INSERT INTO hr_requests (
                application_id, hr_user_id, request_type, requested_status, message, status
            ) VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING {}
            "#,
            HR_REQUEST_RETURNING
        ))
        .bind(new.application_id)
        .bind(new.hr_user_id)
        .bind(new.request_type)
        .bind(new.requested_status)
        .bind(&new.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    async fn find_hr_request(&self, id: Uuid) -> Result<Option<HrRequestDetail>> {
        let query = format!("{} WHERE r.id = $1", Self::hr_request_detail_query());
        let detail = sqlx::query_as::<_, HrRequestDetail>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(detail)
    }

    async fn list_hr_requests(
        &self,
        filter: &HrRequestFilter,
        page: Page,
    ) -> Result<(Vec<HrRequestDetail>, i64)> {
        let items_query = format!(
            "{} WHERE {} ORDER BY r.created_at DESC LIMIT $5 OFFSET $6",
            Self::hr_request_detail_query(),
            HR_REQUEST_WHERE
        );
        let items = sqlx::query_as::<_, HrRequestDetail>(&items_query)
            .bind(filter.hr_user_id)
            .bind(filter.company_id)
            .bind(filter.status)
            .bind(filter.request_type)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total_query = format!(
            "SELECT COUNT(*) FROM hr_requests r
             JOIN applications a ON a.id = r.application_id
             JOIN job_listings j ON j.id = a.job_listing_id
             WHERE {}",
            HR_REQUEST_WHERE
        );
        let total = sqlx::query_scalar::<_, i64>(&total_query)
            .bind(filter.hr_user_id)
            .bind(filter.company_id)
            .bind(filter.status)
            .bind(filter.request_type)
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }

    async fn apply_hr_decision(&self, decision: HrDecision) -> Result<Option<HrRequest>> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes racing deciders; the loser re-reads a non-pending status.
        let claimed = sqlx::query_as::<_, HrRequest>(&format!(
            r#"
            UPDATE hr_requests
            SET status = $2,
                processed_by = $3,
                processed_at = NOW(),
                admin_notes = COALESCE($4, admin_notes),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            HR_REQUEST_RETURNING
        ))
        .bind(decision.request_id)
        .bind(decision.outcome)
        .bind(decision.admin_id)
        .bind(decision.admin_notes.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut request) = claimed else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(change) = &decision.cascade {
            write_status_change(&mut tx, change).await?;

            request = sqlx::query_as::<_, HrRequest>(&format!(
                r#"
                UPDATE hr_requests
                SET status = 'completed', updated_at = NOW()
                WHERE id = $1
                RETURNING {}
                "#,
                HR_REQUEST_RETURNING
            ))
            .bind(decision.request_id)
            .fetch_one(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(request))
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
        page: Page,
    ) -> Result<(Vec<Notification>, i64)> {
        let items = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, message, link, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND ($2::boolean IS NULL OR is_read = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.is_read)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE user_id = $1 AND ($2::boolean IS NULL OR is_read = $2)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.is_read)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, kind, title, message, link, is_read, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl Notifier for PgStore {
    async fn notify(&self, notification: NewNotification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, link)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.link.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ScoreRepository for PgStore {
    async fn latest_score(&self, student_id: Uuid) -> Result<Option<StudentScore>> {
        let score = sqlx::query_as::<_, StudentScore>(
            r#"
            SELECT student_id, overall_score, course_average, test_average,
                   project_average, hackathon_average, last_calculated_at
            FROM student_scores
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }

    async fn recalculate_score(&self, student_id: Uuid) -> Result<StudentScore> {
        let averages = sqlx::query_as::<_, LmsAverages>(
            r#"
            SELECT
                (SELECT COALESCE(AVG(score), 0)::numeric FROM test_attempts
                 WHERE student_id = $1 AND score IS NOT NULL) AS test_average,
                (SELECT COALESCE(AVG(progress), 0)::numeric FROM enrollments
                 WHERE student_id = $1) AS course_average,
                (SELECT COALESCE(AVG(score), 0)::numeric FROM hackathon_participants
                 WHERE student_id = $1 AND score IS NOT NULL) AS hackathon_average
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;

        let computed = StudentScore::legacy(student_id, averages);

        let saved = sqlx::query_as::<_, StudentScore>(
            r#"
            INSERT INTO student_scores (
                student_id, overall_score, course_average, test_average,
                project_average, hackathon_average, last_calculated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (student_id) DO UPDATE SET
                overall_score = EXCLUDED.overall_score,
                course_average = EXCLUDED.course_average,
                test_average = EXCLUDED.test_average,
                project_average = EXCLUDED.project_average,
                hackathon_average = EXCLUDED.hackathon_average,
                last_calculated_at = EXCLUDED.last_calculated_at,
                updated_at = NOW()
            RETURNING student_id, overall_score, course_average, test_average,
                      project_average, hackathon_average, last_calculated_at
            "#,
        )
        .bind(student_id)
        .bind(computed.overall_score)
        .bind(computed.course_average)
        .bind(computed.test_average)
        .bind(computed.project_average.unwrap_or(Decimal::ZERO))
        .bind(computed.hackathon_average)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
