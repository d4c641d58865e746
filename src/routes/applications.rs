use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{ApplicationListQuery, ApplicationResponse, ApplyPayload, UpdateStatusPayload},
        response::ApiResponse,
    },
    error::Result,
    models::{application::ApplicationStatus, user::AuthUser},
    services::application_service::{CompanyApplicationsQuery, JobApplicationsQuery},
    utils::validation::parse_field,
    AppState,
};

fn status_filter(raw: Option<&str>) -> Result<Option<ApplicationStatus>> {
    raw.map(|s| parse_field("status", s)).transpose()
}

fn to_responses(items: Vec<crate::models::application::ApplicationDetail>) -> Vec<ApplicationResponse> {
    items.into_iter().map(ApplicationResponse::from).collect()
}

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = ApplyPayload,
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied to this job"),
        (status = 422, description = "Job inactive or score below requirement")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ApplyPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    let detail = state
        .application_service
        .create(&user, payload.job_listing_id, payload.cover_letter, payload.notes)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::ok(ApplicationResponse::from(detail))
                .with_message("Application submitted successfully"),
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status updated", body = ApplicationResponse),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Only administrators may update status directly"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<UpdateStatusPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;
    let status: ApplicationStatus = parse_field("status", &payload.status)?;
    let detail = state
        .application_service
        .update_status(&user, id, status, payload.admin_notes)
        .await?;
    Ok(Json(
        ApiResponse::ok(ApplicationResponse::from(detail))
            .with_message("Application status updated successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application with status history", body = ApplicationResponse),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let view = state.application_service.get(&user, id).await?;
    Ok(Json(ApiResponse::ok(view)))
}

#[utoipa::path(
    get,
    path = "/api/applications/student",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "The caller's applications", body = [ApplicationResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_my_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: std::result::Result<Query<ApplicationListQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let status = status_filter(query.status.as_deref())?;
    let (items, meta) = state
        .application_service
        .list_for_student(&user, status, query.page())
        .await?;
    Ok(Json(ApiResponse::paginated(to_responses(items), meta)))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("job_id" = Option<Uuid>, Query, description = "Filter by job"),
        ("company_id" = Option<Uuid>, Query, description = "Filter by company (admin only)")
    ),
    responses(
        (status = 200, description = "Applications visible to the caller", body = [ApplicationResponse]),
        (status = 403, description = "HR user without a company")
    )
)]
#[axum::debug_handler]
pub async fn list_company_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: std::result::Result<Query<ApplicationListQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let filters = CompanyApplicationsQuery {
        status: status_filter(query.status.as_deref())?,
        job_id: query.job_id,
        company_id: query.company_id,
    };
    let (items, meta) = state
        .application_service
        .list_for_company(&user, filters, query.page())
        .await?;
    Ok(Json(ApiResponse::paginated(to_responses(items), meta)))
}

#[utoipa::path(
    get,
    path = "/api/applications/job/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job listing ID"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("min_score" = Option<String>, Query, description = "Minimum score at application"),
        ("max_score" = Option<String>, Query, description = "Maximum score at application")
    ),
    responses(
        (status = 200, description = "Applications for the job", body = [ApplicationResponse]),
        (status = 403, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn list_job_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    job_id: std::result::Result<Path<Uuid>, PathRejection>,
    query: std::result::Result<Query<ApplicationListQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Path(job_id) = job_id?;
    let Query(query) = query?;
    let filters = JobApplicationsQuery {
        status: status_filter(query.status.as_deref())?,
        min_score: query.min_score,
        max_score: query.max_score,
    };
    let (items, meta) = state
        .application_service
        .list_for_job(&user, job_id, filters, query.page())
        .await?;
    Ok(Json(ApiResponse::paginated(to_responses(items), meta)))
}
