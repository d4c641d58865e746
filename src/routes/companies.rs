use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        company_dto::{CompanyListQuery, RejectCompanyPayload},
        response::ApiResponse,
    },
    error::Result,
    models::{company::CompanyStatus, user::AuthUser},
    utils::validation::parse_field,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/companies",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by company status")
    ),
    responses(
        (status = 200, description = "Registered companies, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_companies(
    State(state): State<AppState>,
    query: std::result::Result<Query<CompanyListQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(|s| parse_field::<CompanyStatus>("status", s))
        .transpose()?;
    let (items, meta) = state.company_service.list(status, query.page()).await?;
    Ok(Json(ApiResponse::paginated(items, meta)))
}

#[utoipa::path(
    get,
    path = "/api/admin/companies/{id}",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company found"),
        (status = 404, description = "Company not found")
    )
)]
#[axum::debug_handler]
pub async fn get_company(
    State(state): State<AppState>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let company = state.company_service.get(id).await?;
    Ok(Json(ApiResponse::ok(company)))
}

#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company approved"),
        (status = 404, description = "Company not found")
    )
)]
#[axum::debug_handler]
pub async fn approve_company(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let company = state.company_service.approve(&user, id).await?;
    Ok(Json(
        ApiResponse::ok(company).with_message("Company approved successfully"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    request_body = RejectCompanyPayload,
    responses(
        (status = 200, description = "Company rejected"),
        (status = 400, description = "Rejection reason missing"),
        (status = 404, description = "Company not found")
    )
)]
#[axum::debug_handler]
pub async fn reject_company(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<RejectCompanyPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;
    let company = state
        .company_service
        .reject(&user, id, payload.rejection_reason)
        .await?;
    Ok(Json(ApiResponse::ok(company).with_message("Company rejected")))
}
