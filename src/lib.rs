pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod workflow;

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use crate::database::store::{Store, UserRepository};
use crate::database::PgStore;
use crate::services::{
    application_service::ApplicationService, company_service::CompanyService,
    hr_request_service::HrRequestService, job_service::JobService,
    notification_service::NotificationService, score_service::ScoreService,
};

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub users: Arc<dyn UserRepository>,
    pub application_service: ApplicationService,
    pub company_service: CompanyService,
    pub hr_request_service: HrRequestService,
    pub job_service: JobService,
    pub notification_service: NotificationService,
    pub score_service: ScoreService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        Self::from_store(
            Arc::new(PgStore::new(pool)),
            &config.jwt_secret,
            Duration::hours(config.score_stale_hours),
        )
    }

    /// Wires every service against one store implementation.
    pub fn from_store<S>(store: Arc<S>, jwt_secret: &str, score_stale_after: Duration) -> Self
    where
        S: Store + 'static,
    {
        let score_service = ScoreService::new(store.clone(), score_stale_after);
        let notification_service = NotificationService::new(store.clone(), store.clone());
        let application_service = ApplicationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            score_service.clone(),
            notification_service.clone(),
        );
        let hr_request_service = HrRequestService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            notification_service.clone(),
        );
        let job_service = JobService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            score_service.clone(),
        );
        let company_service =
            CompanyService::new(store.clone(), store.clone(), notification_service.clone());

        Self {
            jwt_secret: Arc::from(jwt_secret),
            users: store,
            application_service,
            company_service,
            hr_request_service,
            job_service,
            notification_service,
            score_service,
        }
    }
}
