use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::{
        notification_dto::{MarkAllReadResponse, NotificationListQuery, UnreadCountResponse},
        response::ApiResponse,
    },
    error::Result,
    models::user::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("is_read" = Option<bool>, Query, description = "Filter by read flag")
    ),
    responses(
        (status = 200, description = "The caller's notifications, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: std::result::Result<Query<NotificationListQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let (items, meta) = state
        .notification_service
        .list(user.id, query.is_read, query.page())
        .await?;
    Ok(Json(ApiResponse::paginated(items, meta)))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read"),
        (status = 404, description = "Notification not found")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let notification = state.notification_service.mark_read(id, user.id).await?;
    Ok(Json(
        ApiResponse::ok(notification).with_message("Notification marked as read"),
    ))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked as read")
    )
)]
#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let updated = state.notification_service.mark_all_read(user.id).await?;
    Ok(Json(
        ApiResponse::ok(MarkAllReadResponse { updated })
            .with_message("All notifications marked as read"),
    ))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Number of unread notifications")
    )
)]
#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let unread_count = state.notification_service.unread_count(user.id).await?;
    Ok(Json(ApiResponse::ok(UnreadCountResponse { unread_count })))
}
