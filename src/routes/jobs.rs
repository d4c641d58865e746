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
        job_dto::{CompanyJobsQuery, CreateJobPayload, QualifiedJobsQuery, UpdateJobPayload},
        response::ApiResponse,
    },
    error::Result,
    models::{
        job::{JobChanges, JobStatus},
        user::AuthUser,
    },
    services::job_service::JobDraft,
    utils::validation::parse_field,
    AppState,
};

fn status_field(raw: Option<&str>) -> Result<Option<JobStatus>> {
    raw.map(|s| parse_field("status", s)).transpose()
}

#[utoipa::path(
    get,
    path = "/api/jobs/qualified",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("job_type" = Option<String>, Query, description = "Filter by job type"),
        ("location" = Option<String>, Query, description = "Case-insensitive location match")
    ),
    responses(
        (status = 200, description = "Active jobs the caller qualifies for")
    )
)]
#[axum::debug_handler]
pub async fn qualified_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: std::result::Result<Query<QualifiedJobsQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let page = query.page();
    let (items, meta) = state
        .job_service
        .qualified_jobs(user.id, query.job_type, query.location, page)
        .await?;
    Ok(Json(ApiResponse::paginated(items, meta)))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job created"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Company missing or not yet approved")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateJobPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;

    let job = state
        .job_service
        .create_job(
            &user,
            JobDraft {
                title: payload.title,
                description: payload.description,
                job_type: payload.job_type,
                location: payload.location,
                min_score: payload.min_score,
                max_score: payload.max_score,
                status: status_field(payload.status.as_deref())?,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(job).with_message("Job created successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<UpdateJobPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;

    let changes = JobChanges {
        status: status_field(payload.status.as_deref())?,
        title: payload.title,
        description: payload.description,
        job_type: payload.job_type,
        location: payload.location,
        min_score: payload.min_score,
        max_score: payload.max_score,
    };
    let job = state.job_service.update_job(&user, id, changes).await?;
    Ok(Json(ApiResponse::ok(job).with_message("Job updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job closed"),
        (status = 403, description = "Job belongs to another company"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn close_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let job = state.job_service.close_job(&user, id).await?;
    Ok(Json(ApiResponse::ok(job).with_message("Job closed successfully")))
}

#[utoipa::path(
    get,
    path = "/api/jobs/company",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by job status")
    ),
    responses(
        (status = 200, description = "The caller's company listings with application counts")
    )
)]
#[axum::debug_handler]
pub async fn company_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: std::result::Result<Query<CompanyJobsQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let status = status_field(query.status.as_deref())?;
    let (items, meta) = state
        .job_service
        .company_jobs(&user, status, query.page())
        .await?;
    Ok(Json(ApiResponse::paginated(items, meta)))
}
