use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::{CompanyRepository, UserRepository};
use crate::error::{Error, Result};
use crate::models::company::{Company, CompanyDecision, CompanyStatus};
use crate::models::notification::NewNotification;
use crate::models::user::{AuthUser, Role};
use crate::services::notification_service::{self, NotificationService};
use crate::utils::pagination::{Page, PageMeta};
use crate::utils::validation::{field_error, non_blank};

/// Admin review of company registrations.
#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompanyRepository>,
    users: Arc<dyn UserRepository>,
    notifications: NotificationService,
}

impl CompanyService {
    pub fn new(
        companies: Arc<dyn CompanyRepository>,
        users: Arc<dyn UserRepository>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            companies,
            users,
            notifications,
        }
    }

    pub async fn list(
        &self,
        status: Option<CompanyStatus>,
        page: Page,
    ) -> Result<(Vec<Company>, PageMeta)> {
        let (items, total) = self.companies.list_companies(status, page).await?;
        Ok((items, page.meta(total)))
    }

    pub async fn get(&self, id: Uuid) -> Result<Company> {
        self.companies
            .find_company(id)
            .await?
            .ok_or_else(|| Error::not_found("Company"))
    }

    pub async fn approve(&self, actor: &AuthUser, id: Uuid) -> Result<Company> {
        let company = self
            .decide(
                actor,
                CompanyDecision {
                    company_id: id,
                    status: CompanyStatus::Active,
                    decided_by: actor.id,
                    rejection_reason: None,
                },
            )
            .await?;

        self.notify_hr(&company, |user_id| {
            notification_service::company_approved(user_id, &company.company_name)
        })
        .await;
        Ok(company)
    }

    pub async fn reject(&self, actor: &AuthUser, id: Uuid, reason: Option<String>) -> Result<Company> {
        let reason = non_blank(reason)
            .ok_or_else(|| field_error("rejection_reason", "Rejection reason is required"))?;
        let company = self
            .decide(
                actor,
                CompanyDecision {
                    company_id: id,
                    status: CompanyStatus::Rejected,
                    decided_by: actor.id,
                    rejection_reason: Some(reason.clone()),
                },
            )
            .await?;

        self.notify_hr(&company, |user_id| {
            notification_service::company_rejected(user_id, &company.company_name, &reason)
        })
        .await;
        Ok(company)
    }

    async fn decide(&self, actor: &AuthUser, decision: CompanyDecision) -> Result<Company> {
        if actor.role != Role::Admin {
            return Err(Error::Forbidden(
                "Only admins can review companies".to_string(),
            ));
        }
        let company = self
            .companies
            .decide_company(decision)
            .await?
            .ok_or_else(|| Error::not_found("Company"))?;

        tracing::info!(
            company_id = %company.id,
            status = %company.status,
            decided_by = %actor.id,
            "company reviewed"
        );
        Ok(company)
    }

    async fn notify_hr<F>(&self, company: &Company, build: F)
    where
        F: Fn(Uuid) -> NewNotification,
    {
        match self.users.active_hr_user_ids(company.id).await {
            Ok(recipients) => self.notifications.emit_all(&recipients, build).await,
            Err(err) => {
                tracing::warn!(company_id = %company.id, error = %err, "could not resolve HR recipients")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::{NotificationFilter, NotificationRepository};
    use crate::database::MemoryStore;
    use crate::models::notification::NotificationKind;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: CompanyService,
        admin: AuthUser,
        hr_user: Uuid,
        company: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let admin = store.add_user("Root", Role::Admin).unwrap();
        let hr = store.add_user("Ravi", Role::Hr).unwrap();
        let company = store
            .add_company_with_status("Newco", CompanyStatus::Pending)
            .unwrap();
        store.add_hr_member(hr.id, company).unwrap();
        let notifications = NotificationService::new(store.clone(), store.clone());
        Fixture {
            service: CompanyService::new(store.clone(), store.clone(), notifications),
            admin: AuthUser {
                id: admin.id,
                name: admin.name,
                role: Role::Admin,
                company_id: None,
            },
            hr_user: hr.id,
            company,
            store,
        }
    }

    #[tokio::test]
    async fn approval_activates_and_notifies_hr() {
        let f = fixture();
        let company = f.service.approve(&f.admin, f.company).await.unwrap();
        assert_eq!(company.status, CompanyStatus::Active);
        assert_eq!(company.approved_by, Some(f.admin.id));
        assert!(company.approved_at.is_some());

        let (inbox, _) = f
            .store
            .list_notifications(
                &NotificationFilter {
                    user_id: f.hr_user,
                    is_read: None,
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::CompanyApproved);
        assert_eq!(
            inbox[0].message,
            "Your company Newco has been approved. You can now post jobs."
        );
    }

    #[tokio::test]
    async fn rejection_needs_a_reason() {
        let f = fixture();
        let err = f
            .service
            .reject(&f.admin, f.company, Some("   ".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(f.service.get(f.company).await.unwrap().status, CompanyStatus::Pending);

        let company = f
            .service
            .reject(&f.admin, f.company, Some("Incomplete documents".to_string()))
            .await
            .unwrap();
        assert_eq!(company.status, CompanyStatus::Rejected);
        assert_eq!(company.rejection_reason.as_deref(), Some("Incomplete documents"));
        assert_eq!(f.store.unread_count(f.hr_user).await.unwrap(), 1);

        // A later approval clears the old reason.
        let company = f.service.approve(&f.admin, f.company).await.unwrap();
        assert_eq!(company.rejection_reason, None);
    }

    #[tokio::test]
    async fn only_admins_review_and_unknown_ids_are_not_found() {
        let f = fixture();
        let hr = AuthUser {
            id: f.hr_user,
            name: "Ravi".to_string(),
            role: Role::Hr,
            company_id: Some(f.company),
        };
        let err = f.service.approve(&hr, f.company).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let err = f.service.approve(&f.admin, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(m) if m == "Company not found"));
    }

    #[tokio::test]
    async fn listing_filters_by_status() {
        let f = fixture();
        f.store.add_company("Acme").unwrap();

        let (all, meta) = f.service.list(None, Page::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(meta.total, 2);

        let (pending, _) = f
            .service
            .list(Some(CompanyStatus::Pending), Page::default())
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, f.company);
    }
}
