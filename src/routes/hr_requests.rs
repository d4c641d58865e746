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
        hr_request_dto::{CreateHrRequestPayload, HrRequestListQuery, ProcessHrRequestPayload},
        response::ApiResponse,
    },
    error::Result,
    models::{
        application::ApplicationStatus,
        hr_request::{HrRequestStatus, HrRequestType},
        user::AuthUser,
    },
    services::hr_request_service::{HrRequestDraft, HrRequestQuery},
    utils::validation::{parse_field, require_text},
    workflow::ProcessAction,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/hr-requests",
    request_body = CreateHrRequestPayload,
    responses(
        (status = 201, description = "Request created"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Application belongs to another company"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateHrRequestPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    require_text("message", &payload.message)?;

    let request_type: HrRequestType = parse_field("request_type", &payload.request_type)?;
    let requested_status = match request_type {
        HrRequestType::StatusUpdate => payload
            .requested_status
            .as_deref()
            .map(|raw| parse_field::<ApplicationStatus>("requested_status", raw))
            .transpose()?,
        _ => None,
    };

    let request = state
        .hr_request_service
        .create(
            &user,
            HrRequestDraft {
                application_id: payload.application_id,
                request_type,
                requested_status,
                message: payload.message,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(request).with_message("Request created successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/api/hr-requests/{id}/process",
    params(
        ("id" = Uuid, Path, description = "HR request ID")
    ),
    request_body = ProcessHrRequestPayload,
    responses(
        (status = 200, description = "Request processed"),
        (status = 400, description = "Invalid action"),
        (status = 403, description = "Only administrators may process requests"),
        (status = 404, description = "Request not found"),
        (status = 422, description = "Request has already been processed")
    )
)]
#[axum::debug_handler]
pub async fn process_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<ProcessHrRequestPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;
    let action: ProcessAction = parse_field("action", &payload.action)?;

    let request = state
        .hr_request_service
        .process(&user, id, action, payload.admin_notes)
        .await?;
    let message = format!("Request {} successfully", action.past_tense());
    Ok(Json(ApiResponse::ok(request).with_message(message)))
}

#[utoipa::path(
    get,
    path = "/api/hr-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by request status"),
        ("request_type" = Option<String>, Query, description = "Filter by type (admin only)"),
        ("company_id" = Option<Uuid>, Query, description = "Filter by company (admin only)")
    ),
    responses(
        (status = 200, description = "Requests visible to the caller")
    )
)]
#[axum::debug_handler]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: std::result::Result<Query<HrRequestListQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let filters = HrRequestQuery {
        status: query
            .status
            .as_deref()
            .map(|s| parse_field::<HrRequestStatus>("status", s))
            .transpose()?,
        request_type: query
            .request_type
            .as_deref()
            .map(|s| parse_field::<HrRequestType>("request_type", s))
            .transpose()?,
        company_id: query.company_id,
    };
    let (items, meta) = state
        .hr_request_service
        .list(&user, filters, query.page())
        .await?;
    Ok(Json(ApiResponse::paginated(items, meta)))
}

#[utoipa::path(
    get,
    path = "/api/hr-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "HR request ID")
    ),
    responses(
        (status = 200, description = "Request found"),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Request not found")
    )
)]
#[axum::debug_handler]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let request = state.hr_request_service.get(&user, id).await?;
    Ok(Json(ApiResponse::ok(request)))
}
