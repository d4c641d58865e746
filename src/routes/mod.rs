pub mod applications;
pub mod companies;
pub mod health;
pub mod hr_requests;
pub mod jobs;
pub mod notifications;
pub mod students;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::{require_admin, require_auth, require_hr, require_hr_or_admin, require_student},
    cors::cors_layer,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// Authenticated API routes. Role gates sit on each group, the token check
/// wraps them all.
pub fn api_router(state: AppState) -> Router {
    let student_api = Router::new()
        .route("/api/applications", post(applications::apply))
        .route(
            "/api/applications/student",
            get(applications::list_my_applications),
        )
        .route("/api/students/me/score", get(students::my_score))
        .route("/api/jobs/qualified", get(jobs::qualified_jobs))
        .route_layer(from_fn(require_student));

    let hr_api = Router::new()
        .route("/api/jobs", post(jobs::create_job))
        .route("/api/jobs/company", get(jobs::company_jobs))
        .route_layer(from_fn(require_hr));

    let staff_api = Router::new()
        .route(
            "/api/jobs/:id",
            put(jobs::update_job).delete(jobs::close_job),
        )
        .route(
            "/api/applications",
            get(applications::list_company_applications),
        )
        .route(
            "/api/applications/job/:job_id",
            get(applications::list_job_applications),
        )
        .route(
            "/api/hr-requests",
            get(hr_requests::list_requests).post(hr_requests::create_request),
        )
        .route("/api/hr-requests/:id", get(hr_requests::get_request))
        .route_layer(from_fn(require_hr_or_admin));

    let admin_api = Router::new()
        .route(
            "/api/hr-requests/:id/process",
            put(hr_requests::process_request),
        )
        .route("/api/admin/companies", get(companies::list_companies))
        .route("/api/admin/companies/:id", get(companies::get_company))
        .route(
            "/api/admin/companies/:id/approve",
            post(companies::approve_company),
        )
        .route(
            "/api/admin/companies/:id/reject",
            post(companies::reject_company),
        )
        .route_layer(from_fn(require_admin));

    let shared_api = Router::new()
        .route("/api/applications/:id", get(applications::get_application))
        .route(
            "/api/applications/:id/status",
            put(applications::update_status),
        )
        .route("/api/students/:id/score", get(students::student_score))
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            put(notifications::mark_all_read),
        )
        .route("/api/notifications/:id/read", put(notifications::mark_read));

    student_api
        .merge(hr_api)
        .merge(staff_api)
        .merge(admin_api)
        .merge(shared_api)
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

/// Health check plus the rate-limited API, with tracing and CORS.
pub fn router(state: AppState, api_rps: u32, cors_origin: Option<&str>) -> Router {
    let api = api_router(state).layer(from_fn_with_state(
        RateLimiter::new(api_rps),
        rps_middleware,
    ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}
