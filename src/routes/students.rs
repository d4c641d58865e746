use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::response::ApiResponse,
    error::{Error, Result},
    models::user::{AuthUser, Role},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/students/me/score",
    responses(
        (status = 200, description = "The caller's score snapshot")
    )
)]
#[axum::debug_handler]
pub async fn my_score(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let snapshot = state.score_service.get_score(user.id).await;
    Ok(Json(ApiResponse::ok(snapshot)))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/score",
    params(
        ("id" = Uuid, Path, description = "Student user ID")
    ),
    responses(
        (status = 200, description = "Score snapshot"),
        (status = 403, description = "Students may only read their own score")
    )
)]
#[axum::debug_handler]
pub async fn student_score(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    if user.role == Role::Student && user.id != id {
        return Err(Error::Forbidden(
            "You can only view your own score".to_string(),
        ));
    }
    let snapshot = state.score_service.get_score(id).await;
    Ok(Json(ApiResponse::ok(snapshot)))
}
