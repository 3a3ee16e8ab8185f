use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskboard_shared::{
    api::{CommentListResponse, CreateCommentRequest, UpdateCommentRequest},
    CommentWithAuthor,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

/// GET /api/v1/tasks/:task_id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<CommentListResponse>, AppError> {
    let comments = state.store.list(task_id).await?;
    Ok(Json(CommentListResponse { comments }))
}

/// POST /api/v1/tasks/:task_id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentWithAuthor>), AppError> {
    let comment = state.store.create(task_id, user.id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/v1/tasks/:task_id/comments/:comment_id
///
/// Author only.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentWithAuthor>, AppError> {
    let comment = state
        .store
        .update(task_id, comment_id, user.id, &req.content)
        .await?;
    Ok(Json(comment))
}

/// DELETE /api/v1/tasks/:task_id/comments/:comment_id
///
/// Author only. Sets the soft-delete marker; the row is kept.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .soft_delete(task_id, comment_id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
