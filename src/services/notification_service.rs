use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::{NotificationFilter, NotificationRepository, Notifier};
use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use crate::models::notification::{NewNotification, Notification, NotificationKind};
use crate::utils::pagination::{Page, PageMeta};

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, repo: Arc<dyn NotificationRepository>) -> Self {
        Self { notifier, repo }
    }

    /// Fire-and-forget: failures are logged and swallowed.
    pub async fn emit(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        let kind = notification.kind;
        if let Err(err) = self.notifier.notify(notification).await {
            tracing::warn!(%user_id, ?kind, error = %err, "failed to record notification");
        }
    }

    pub async fn emit_all<F>(&self, recipients: &[Uuid], build: F)
    where
        F: Fn(Uuid) -> NewNotification,
    {
        for user_id in recipients {
            self.emit(build(*user_id)).await;
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        is_read: Option<bool>,
        page: Page,
    ) -> Result<(Vec<Notification>, PageMeta)> {
        let filter = NotificationFilter { user_id, is_read };
        let (items, total) = self.repo.list_notifications(&filter, page).await?;
        Ok((items, page.meta(total)))
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Notification> {
        self.repo
            .mark_read(id, user_id)
            .await?
            .ok_or_else(|| Error::not_found("Notification"))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        self.repo.mark_all_read(user_id).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        self.repo.unread_count(user_id).await
    }
}

pub fn new_application(hr_user_id: Uuid, application_id: Uuid, job_title: &str) -> NewNotification {
    NewNotification {
        user_id: hr_user_id,
        kind: NotificationKind::NewApplication,
        title: "New Application Received".to_string(),
        message: format!("A new application has been received for {}", job_title),
        link: Some(format!("/hr/applications/{}", application_id)),
    }
}

pub fn status_updated(
    student_id: Uuid,
    application_id: Uuid,
    job_title: &str,
    status: ApplicationStatus,
) -> NewNotification {
    NewNotification {
        user_id: student_id,
        kind: NotificationKind::ApplicationStatusUpdate,
        title: "Application Status Updated".to_string(),
        message: format!(
            "Your application for {} has been updated to {}",
            job_title,
            status.label()
        ),
        link: Some(format!("/applications/{}", application_id)),
    }
}

pub fn hr_request_created(
    admin_id: Uuid,
    request_id: Uuid,
    application_id: Uuid,
    company_name: &str,
) -> NewNotification {
    NewNotification {
        user_id: admin_id,
        kind: NotificationKind::HrRequest,
        title: "New HR Request".to_string(),
        message: format!(
            "HR from {} has created a request for application #{}",
            company_name, application_id
        ),
        link: Some(format!("/admin/requests/{}", request_id)),
    }
}

pub fn hr_request_processed(
    hr_user_id: Uuid,
    request_id: Uuid,
    application_id: Uuid,
    outcome: &str,
) -> NewNotification {
    NewNotification {
        user_id: hr_user_id,
        kind: NotificationKind::HrRequestProcessed,
        title: "HR Request Processed".to_string(),
        message: format!(
            "Your request for application #{} has been {}",
            application_id, outcome
        ),
        link: Some(format!("/hr/requests/{}", request_id)),
    }
}

pub fn company_approved(hr_user_id: Uuid, company_name: &str) -> NewNotification {
    NewNotification {
        user_id: hr_user_id,
        kind: NotificationKind::CompanyApproved,
        title: "Company Approved".to_string(),
        message: format!(
            "Your company {} has been approved. You can now post jobs.",
            company_name
        ),
        link: Some("/hr/dashboard".to_string()),
    }
}

pub fn company_rejected(hr_user_id: Uuid, company_name: &str, reason: &str) -> NewNotification {
    NewNotification {
        user_id: hr_user_id,
        kind: NotificationKind::CompanyRejected,
        title: "Company Rejected".to_string(),
        message: format!(
            "Your company {} has been rejected. Reason: {}",
            company_name, reason
        ),
        link: Some("/hr/dashboard".to_string()),
    }
}
