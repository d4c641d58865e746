use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::database::store::{
    ApplicationFilter, ApplicationRepository, JobRepository, UserRepository,
};
use crate::dto::application_dto::ApplicationResponse;
use crate::error::{Error, Result};
use crate::models::application::{ApplicationDetail, ApplicationStatus, NewApplication, StatusChange};
use crate::models::user::{AuthUser, Role};
use crate::services::notification_service::{self, NotificationService};
use crate::services::qualification;
use crate::services::score_service::ScoreService;
use crate::utils::pagination::{Page, PageMeta};
use crate::utils::validation::non_blank;
use crate::workflow::{authorize_application, ApplicationTransition};

#[derive(Debug, Clone, Default)]
pub struct CompanyApplicationsQuery {
    pub status: Option<ApplicationStatus>,
    pub job_id: Option<Uuid>,
    /// Admin only; HR users are always scoped to their own company.
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct JobApplicationsQuery {
    pub status: Option<ApplicationStatus>,
    pub min_score: Option<Decimal>,
    pub max_score: Option<Decimal>,
}

#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserRepository>,
    scores: ScoreService,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        users: Arc<dyn UserRepository>,
        scores: ScoreService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            applications,
            jobs,
            users,
            scores,
            notifications,
        }
    }

    /// Submits a student's application. Checks run in a fixed order: job
    /// exists, job is active, no prior application, score qualifies.
    pub async fn create(
        &self,
        student: &AuthUser,
        job_listing_id: Uuid,
        cover_letter: Option<String>,
        notes: Option<String>,
    ) -> Result<ApplicationDetail> {
        authorize_application(student.role, None, ApplicationTransition::Submit)?;

        let job = self
            .jobs
            .find_job(job_listing_id)
            .await?
            .ok_or_else(|| Error::not_found("Job"))?;

        if !job.accepts_applications() {
            return Err(Error::BusinessRule(
                "Job is not accepting applications".to_string(),
            ));
        }

        if self
            .applications
            .find_application_for(student.id, job.id)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(
                "You have already applied to this job".to_string(),
            ));
        }

        let score = self.scores.get_score(student.id).await;
        let verdict = qualification::evaluate(score.overall_score, job.min_score);
        if !verdict.qualified {
            return Err(Error::BusinessRule(format!(
                "You do not meet the minimum score requirement. {}",
                verdict.reason
            )));
        }

        let application = self
            .applications
            .insert_application(NewApplication {
                student_id: student.id,
                job_listing_id: job.id,
                score_at_application: score.overall_score,
                cover_letter: non_blank(cover_letter),
                notes: non_blank(notes),
            })
            .await?;

        tracing::info!(
            application_id = %application.id,
            student_id = %student.id,
            job_id = %job.id,
            score = %application.score_at_application,
            "application submitted"
        );

        match self.users.active_hr_user_ids(job.company_id).await {
            Ok(recipients) => {
                self.notifications
                    .emit_all(&recipients, |hr_id| {
                        notification_service::new_application(hr_id, application.id, &job.title)
                    })
                    .await
            }
            Err(err) => tracing::warn!(
                company_id = %job.company_id,
                error = %err,
                "could not resolve HR recipients for new application"
            ),
        }

        Ok(ApplicationDetail {
            application,
            job_title: job.title,
            job_type: job.job_type,
            company_id: job.company_id,
            company_name: job.company_name,
            company_logo_url: job.company_logo_url,
        })
    }

    /// Direct status change. Administrators only; HR users are pointed at HR requests.
    pub async fn update_status(
        &self,
        actor: &AuthUser,
        application_id: Uuid,
        status: ApplicationStatus,
        admin_notes: Option<String>,
    ) -> Result<ApplicationDetail> {
        authorize_application(actor.role, None, ApplicationTransition::SetStatus(status))?;

        let detail = self
            .applications
            .find_application(application_id)
            .await?
            .ok_or_else(|| Error::not_found("Application"))?;

        let notes = non_blank(admin_notes);
        let updated = self
            .applications
            .apply_status_change(StatusChange {
                application_id,
                status,
                changed_by: actor.id,
                reviewed_by: Some(actor.id),
                hr_note: notes.as_ref().map(|n| format!("Admin Notes: {}", n)),
                history_notes: notes,
            })
            .await?;

        tracing::info!(
            %application_id,
            from = %detail.application.status,
            to = %status,
            actor = %actor.id,
            "application status updated"
        );

        self.notifications
            .emit(notification_service::status_updated(
                updated.student_id,
                updated.id,
                &detail.job_title,
                status,
            ))
            .await;

        Ok(ApplicationDetail {
            application: updated,
            ..detail
        })
    }

    /// One application with its status history, newest first.
    pub async fn get(&self, actor: &AuthUser, application_id: Uuid) -> Result<ApplicationResponse> {
        let detail = self
            .applications
            .find_application(application_id)
            .await?
            .ok_or_else(|| Error::not_found("Application"))?;

        match actor.role {
            Role::Student if detail.application.student_id != actor.id => {
                return Err(Error::Forbidden(
                    "You can only view your own applications".to_string(),
                ))
            }
            Role::Hr if actor.company_id != Some(detail.company_id) => {
                return Err(Error::Forbidden(
                    "You can only view applications for your company's jobs".to_string(),
                ))
            }
            _ => {}
        }

        let history = self.applications.status_history(application_id).await?;
        Ok(ApplicationResponse {
            application: detail,
            status_history: Some(history),
        })
    }

    pub async fn list_for_student(
        &self,
        student: &AuthUser,
        status: Option<ApplicationStatus>,
        page: Page,
    ) -> Result<(Vec<ApplicationDetail>, PageMeta)> {
        let filter = ApplicationFilter {
            student_id: Some(student.id),
            status,
            ..Default::default()
        };
        let (items, total) = self.applications.list_applications(&filter, page).await?;
        Ok((items, page.meta(total)))
    }

    pub async fn list_for_company(
        &self,
        actor: &AuthUser,
        query: CompanyApplicationsQuery,
        page: Page,
    ) -> Result<(Vec<ApplicationDetail>, PageMeta)> {
        let company_id = match actor.role {
            Role::Admin => query.company_id,
            Role::Hr => Some(hr_company(actor)?),
            Role::Student => {
                return Err(Error::Forbidden(
                    "Only HR and admin users can list company applications".to_string(),
                ))
            }
        };

        let filter = ApplicationFilter {
            company_id,
            job_id: query.job_id,
            status: query.status,
            ..Default::default()
        };
        let (items, total) = self.applications.list_applications(&filter, page).await?;
        Ok((items, page.meta(total)))
    }

    pub async fn list_for_job(
        &self,
        actor: &AuthUser,
        job_id: Uuid,
        query: JobApplicationsQuery,
        page: Page,
    ) -> Result<(Vec<ApplicationDetail>, PageMeta)> {
        let job = self
            .jobs
            .find_job(job_id)
            .await?
            .ok_or_else(|| Error::not_found("Job"))?;

        match actor.role {
            Role::Admin => {}
            Role::Hr if hr_company(actor)? == job.company_id => {}
            _ => {
                return Err(Error::Forbidden(
                    "You can only view applications for your company's jobs".to_string(),
                ))
            }
        }

        let filter = ApplicationFilter {
            job_id: Some(job.id),
            status: query.status,
            min_score: query.min_score,
            max_score: query.max_score,
            ..Default::default()
        };
        let (items, total) = self.applications.list_applications(&filter, page).await?;
        Ok((items, page.meta(total)))
    }
}

pub(crate) fn hr_company(actor: &AuthUser) -> Result<Uuid> {
    actor.company_id.ok_or_else(|| {
        Error::Forbidden("HR user is not associated with a company".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::{MockNotifier, NotificationRepository};
    use crate::database::MemoryStore;
    use crate::models::job::{Job, JobStatus};
    use crate::models::notification::NotificationKind;
    use crate::models::student_score::StudentScore;
    use crate::utils::time::now;
    use chrono::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: ApplicationService,
        student: AuthUser,
        hr: AuthUser,
        admin: AuthUser,
        job: Job,
    }

    fn auth(user: &crate::models::user::User, company_id: Option<Uuid>) -> AuthUser {
        AuthUser {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            company_id,
        }
    }

    fn build(store: Arc<MemoryStore>, notifications: NotificationService) -> ApplicationService {
        ApplicationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ScoreService::new(store.clone(), Duration::hours(24)),
            notifications,
        )
    }

    fn fixture_with_score(score: i64, min_score: i64) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let student = store.add_user("Asha", Role::Student).unwrap();
        let hr = store.add_user("Ravi", Role::Hr).unwrap();
        let admin = store.add_user("Root", Role::Admin).unwrap();
        let company = store.add_company("Acme").unwrap();
        store.add_hr_member(hr.id, company).unwrap();
        let job = store
            .add_job(company, "Backend Intern", JobStatus::Active, Decimal::new(min_score, 0))
            .unwrap();
        store
            .set_score(StudentScore {
                student_id: student.id,
                overall_score: Some(Decimal::new(score, 0)),
                course_average: None,
                test_average: None,
                project_average: None,
                hackathon_average: None,
                last_calculated_at: Some(now()),
            })
            .unwrap();

        let notifications = NotificationService::new(store.clone(), store.clone());
        Fixture {
            service: build(store.clone(), notifications),
            student: auth(&student, None),
            hr: auth(&hr, Some(company)),
            admin: auth(&admin, None),
            job,
            store,
        }
    }

    #[tokio::test]
    async fn create_freezes_score_and_notifies_hr() {
        let f = fixture_with_score(82, 70);
        let detail = f
            .service
            .create(&f.student, f.job.id, Some("Hello".into()), Some("  ".into()))
            .await
            .unwrap();

        assert_eq!(detail.application.status, ApplicationStatus::Applied);
        assert_eq!(detail.application.score_at_application, Decimal::new(82, 0));
        assert_eq!(detail.application.notes, None);
        assert_eq!(detail.company_name, "Acme");

        let history = f.store.status_history(detail.application.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].changed_by, Some(f.student.id));

        let (inbox, _) = f
            .store
            .list_notifications(
                &crate::database::store::NotificationFilter {
                    user_id: f.hr.id,
                    is_read: None,
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::NewApplication);

        // A later score change does not touch the frozen value.
        f.store
            .set_score(StudentScore {
                student_id: f.student.id,
                overall_score: Some(Decimal::new(10, 0)),
                course_average: None,
                test_average: None,
                project_average: None,
                hackathon_average: None,
                last_calculated_at: Some(now()),
            })
            .unwrap();
        let reread = f.service.get(&f.student, detail.application.id).await.unwrap();
        assert_eq!(
            reread.application.application.score_at_application,
            Decimal::new(82, 0)
        );
    }

    #[tokio::test]
    async fn second_application_conflicts() {
        let f = fixture_with_score(82, 70);
        f.service.create(&f.student, f.job.id, None, None).await.unwrap();
        let err = f
            .service
            .create(&f.student, f.job.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn inactive_jobs_reject_even_qualified_students() {
        let f = fixture_with_score(95, 10);
        let company = f.job.company_id;
        for status in [JobStatus::Draft, JobStatus::Closed] {
            let job = f
                .store
                .add_job(company, "Hidden", status, Decimal::ZERO)
                .unwrap();
            let err = f
                .service
                .create(&f.student, job.id, None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::BusinessRule(ref m) if m.contains("not accepting")));
        }
    }

    #[tokio::test]
    async fn missing_job_is_not_found() {
        let f = fixture_with_score(95, 10);
        let err = f
            .service
            .create(&f.student, Uuid::new_v4(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn unqualified_student_gets_both_scores() {
        let f = fixture_with_score(65, 70);
        let err = f
            .service
            .create(&f.student, f.job.id, None, None)
            .await
            .unwrap_err();
        match err {
            Error::BusinessRule(msg) => {
                assert!(msg.contains("65"));
                assert!(msg.contains("70"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_score_only_qualifies_for_zero_requirement() {
        let f = fixture_with_score(0, 0);
        let fresh = f.store.add_user("New", Role::Student).unwrap();
        let student = auth(&fresh, None);
        f.service.create(&student, f.job.id, None, None).await.unwrap();

        let strict = f
            .store
            .add_job(f.job.company_id, "Strict", JobStatus::Active, Decimal::new(1, 0))
            .unwrap();
        let err = f
            .service
            .create(&student, strict.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BusinessRule(_)));
    }

    #[tokio::test]
    async fn each_mutation_appends_one_history_row_in_order() {
        let f = fixture_with_score(82, 70);
        let app = f.service.create(&f.student, f.job.id, None, None).await.unwrap();
        let id = app.application.id;

        let sequence = [
            ApplicationStatus::UnderReview,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Rejected,
            ApplicationStatus::Accepted,
        ];
        for status in sequence {
            f.service
                .update_status(&f.admin, id, status, Some("checked".into()))
                .await
                .unwrap();
        }

        let history = f.store.status_history(id).await.unwrap();
        assert_eq!(history.len(), sequence.len() + 1);
        let newest_first: Vec<_> = history.iter().map(|h| h.status).collect();
        assert_eq!(
            newest_first,
            vec![
                ApplicationStatus::Accepted,
                ApplicationStatus::Rejected,
                ApplicationStatus::UnderReview,
                ApplicationStatus::UnderReview,
                ApplicationStatus::Applied,
            ]
        );
        assert!(history[..4].iter().all(|h| h.changed_by == Some(f.admin.id)));

        let view = f.service.get(&f.admin, id).await.unwrap();
        let hr_notes = view.application.application.hr_notes.unwrap();
        assert_eq!(hr_notes.matches("Admin Notes: checked").count(), 4);
        assert_eq!(view.application.application.reviewed_by, Some(f.admin.id));
    }

    #[tokio::test]
    async fn hr_cannot_update_any_status() {
        let f = fixture_with_score(82, 70);
        let app = f.service.create(&f.student, f.job.id, None, None).await.unwrap();

        for target in ApplicationStatus::ALL {
            for id in [app.application.id, Uuid::new_v4()] {
                let err = f
                    .service
                    .update_status(&f.hr, id, target, None)
                    .await
                    .unwrap_err();
                assert!(matches!(err, Error::Forbidden(ref m) if m.contains("request to admin")));
            }
        }
        assert_eq!(
            f.store.status_history(app.application.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn status_update_survives_notifier_failure() {
        let store = Arc::new(MemoryStore::new());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .returning(|_| Err(Error::Internal("smtp down".into())));
        let notifications = NotificationService::new(Arc::new(notifier), store.clone());
        let service = build(store.clone(), notifications);

        let student = store.add_user("Asha", Role::Student).unwrap();
        let hr = store.add_user("Ravi", Role::Hr).unwrap();
        let admin = store.add_user("Root", Role::Admin).unwrap();
        let company = store.add_company("Acme").unwrap();
        store.add_hr_member(hr.id, company).unwrap();
        let job = store
            .add_job(company, "Intern", JobStatus::Active, Decimal::ZERO)
            .unwrap();

        let app = service
            .create(&auth(&student, None), job.id, None, None)
            .await
            .unwrap();
        let updated = service
            .update_status(
                &auth(&admin, None),
                app.application.id,
                ApplicationStatus::InterviewScheduled,
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            updated.application.status,
            ApplicationStatus::InterviewScheduled
        );
        assert_eq!(updated.application.hr_notes, None);
    }

    #[tokio::test]
    async fn reads_are_scoped_by_role() {
        let f = fixture_with_score(82, 70);
        let app = f.service.create(&f.student, f.job.id, None, None).await.unwrap();
        let id = app.application.id;

        let other_student = f.store.add_user("Other", Role::Student).unwrap();
        let err = f
            .service
            .get(&auth(&other_student, None), id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let outsider = AuthUser {
            company_id: Some(Uuid::new_v4()),
            ..f.hr.clone()
        };
        assert!(matches!(
            f.service.get(&outsider, id).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(f.service.get(&f.hr, id).await.is_ok());

        let (mine, meta) = f
            .service
            .list_for_student(&f.student, None, Page::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(meta.total, 1);

        let (company_apps, _) = f
            .service
            .list_for_company(&outsider, CompanyApplicationsQuery::default(), Page::default())
            .await
            .unwrap();
        assert!(company_apps.is_empty());

        let err = f
            .service
            .list_for_job(&outsider, f.job.id, JobApplicationsQuery::default(), Page::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let unassigned = AuthUser {
            company_id: None,
            ..f.hr.clone()
        };
        assert!(matches!(
            f.service
                .list_for_company(&unassigned, CompanyApplicationsQuery::default(), Page::default())
                .await
                .unwrap_err(),
            Error::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn job_listing_filters_by_frozen_score() {
        let f = fixture_with_score(82, 70);
        f.service.create(&f.student, f.job.id, None, None).await.unwrap();

        let query = JobApplicationsQuery {
            min_score: Some(Decimal::new(90, 0)),
            ..Default::default()
        };
        let (items, meta) = f
            .service
            .list_for_job(&f.hr, f.job.id, query, Page::default())
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(meta.total, 0);

        let query = JobApplicationsQuery {
            max_score: Some(Decimal::new(90, 0)),
            ..Default::default()
        };
        let (items, _) = f
            .service
            .list_for_job(&f.admin, f.job.id, query, Page::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }
}
