use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::{
    ApplicationRepository, HrRequestFilter, HrRequestRepository, UserRepository,
};
use crate::error::{Error, Result};
use crate::models::application::{ApplicationStatus, StatusChange};
use crate::models::hr_request::{
    HrDecision, HrRequestDetail, HrRequestStatus, HrRequestType, NewHrRequest,
};
use crate::models::user::{AuthUser, Role};
use crate::services::application_service::hr_company;
use crate::services::notification_service::{self, NotificationService};
use crate::utils::pagination::{Page, PageMeta};
use crate::utils::validation::non_blank;
use crate::workflow::{already_processed, may_propose, request_rule, ProcessAction};

#[derive(Debug, Clone)]
pub struct HrRequestDraft {
    pub application_id: Uuid,
    pub request_type: HrRequestType,
    pub requested_status: Option<ApplicationStatus>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct HrRequestQuery {
    pub status: Option<HrRequestStatus>,
    /// Admin only.
    pub request_type: Option<HrRequestType>,
    /// Admin only.
    pub company_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct HrRequestService {
    requests: Arc<dyn HrRequestRepository>,
    applications: Arc<dyn ApplicationRepository>,
    users: Arc<dyn UserRepository>,
    notifications: NotificationService,
}

impl HrRequestService {
    pub fn new(
        requests: Arc<dyn HrRequestRepository>,
        applications: Arc<dyn ApplicationRepository>,
        users: Arc<dyn UserRepository>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            requests,
            applications,
            users,
            notifications,
        }
    }

    /// Files a pending request against an application. HR users may only
    /// target applications for their own company's jobs.
    pub async fn create(&self, actor: &AuthUser, draft: HrRequestDraft) -> Result<HrRequestDetail> {
        if !may_propose(actor.role) {
            return Err(Error::Forbidden(
                "Only HR and admin users can create requests".to_string(),
            ));
        }

        let application = self
            .applications
            .find_application(draft.application_id)
            .await?
            .ok_or_else(|| Error::not_found("Application"))?;

        if actor.role == Role::Hr && hr_company(actor)? != application.company_id {
            return Err(Error::Forbidden(
                "You can only create requests for applications to your company's jobs"
                    .to_string(),
            ));
        }

        let requested_status = match draft.request_type {
            HrRequestType::StatusUpdate => draft.requested_status,
            _ => None,
        };

        let request = self
            .requests
            .insert_hr_request(NewHrRequest {
                application_id: application.application.id,
                hr_user_id: actor.id,
                request_type: draft.request_type,
                requested_status,
                message: draft.message.trim().to_string(),
            })
            .await?;

        tracing::info!(
            request_id = %request.id,
            application_id = %request.application_id,
            request_type = %request.request_type,
            requested_by = %actor.id,
            "hr request created"
        );

        match self.users.active_admin_ids().await {
            Ok(admins) => {
                self.notifications
                    .emit_all(&admins, |admin_id| {
                        notification_service::hr_request_created(
                            admin_id,
                            request.id,
                            request.application_id,
                            &application.company_name,
                        )
                    })
                    .await
            }
            Err(err) => tracing::warn!(error = %err, "could not resolve admin recipients"),
        }

        Ok(HrRequestDetail {
            request,
            student_id: application.application.student_id,
            job_listing_id: application.application.job_listing_id,
            job_title: application.job_title,
            company_id: application.company_id,
            company_name: application.company_name,
        })
    }

    /// Approves or rejects a pending request. Exactly one of any number of
    /// concurrent decisions on the same request succeeds.
    pub async fn process(
        &self,
        actor: &AuthUser,
        request_id: Uuid,
        action: ProcessAction,
        admin_notes: Option<String>,
    ) -> Result<HrRequestDetail> {
        let current = self
            .requests
            .find_hr_request(request_id)
            .await?
            .ok_or_else(|| Error::not_found("HR request"))?;

        let effect = request_rule(
            actor.role,
            current.request.status,
            action,
            current.request.request_type,
            current.request.requested_status,
        )?;

        let admin_notes = non_blank(admin_notes);
        let cascade = match (effect.cascades, current.request.requested_status) {
            (true, Some(status)) => Some(StatusChange {
                application_id: current.request.application_id,
                status,
                changed_by: actor.id,
                reviewed_by: Some(current.request.hr_user_id),
                hr_note: None,
                history_notes: Some(format!(
                    "Status updated via HR request. Admin notes: {}",
                    admin_notes.as_deref().unwrap_or("N/A")
                )),
            }),
            _ => None,
        };
        let cascaded_status = cascade.as_ref().map(|c| c.status);

        let request = self
            .requests
            .apply_hr_decision(HrDecision {
                request_id,
                outcome: effect.outcome,
                admin_id: actor.id,
                admin_notes,
                cascade,
            })
            .await?
            .ok_or_else(already_processed)?;

        tracing::info!(
            %request_id,
            action = action.past_tense(),
            status = %request.status,
            admin = %actor.id,
            "hr request processed"
        );

        if let Some(status) = cascaded_status {
            self.notifications
                .emit(notification_service::status_updated(
                    current.student_id,
                    current.request.application_id,
                    &current.job_title,
                    status,
                ))
                .await;
        }

        self.notifications
            .emit(notification_service::hr_request_processed(
                request.hr_user_id,
                request.id,
                request.application_id,
                action.past_tense(),
            ))
            .await;

        Ok(HrRequestDetail { request, ..current })
    }

    pub async fn get(&self, actor: &AuthUser, request_id: Uuid) -> Result<HrRequestDetail> {
        let detail = self
            .requests
            .find_hr_request(request_id)
            .await?
            .ok_or_else(|| Error::not_found("HR request"))?;

        match actor.role {
            Role::Admin => Ok(detail),
            Role::Hr if detail.request.hr_user_id == actor.id => Ok(detail),
            _ => Err(Error::Forbidden(
                "You can only view your own requests".to_string(),
            )),
        }
    }

    pub async fn list(
        &self,
        actor: &AuthUser,
        query: HrRequestQuery,
        page: Page,
    ) -> Result<(Vec<HrRequestDetail>, PageMeta)> {
        let filter = match actor.role {
            Role::Admin => HrRequestFilter {
                hr_user_id: None,
                company_id: query.company_id,
                status: query.status,
                request_type: query.request_type,
            },
            Role::Hr => HrRequestFilter {
                hr_user_id: Some(actor.id),
                status: query.status,
                ..Default::default()
            },
            Role::Student => {
                return Err(Error::Forbidden(
                    "Only HR and admin users can view requests".to_string(),
                ))
            }
        };

        let (items, total) = self.requests.list_hr_requests(&filter, page).await?;
        Ok((items, page.meta(total)))
    }
}
