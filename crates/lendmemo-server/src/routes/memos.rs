//! Memo endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::error::ApiResult;
use crate::state::AppState;
use lendmemo_core::types::{
    CreateMemoRequest, CreateMemoResponse, MemoDetail, MessageResponse, UpdateMemoRequest,
};
use lendmemo_core::UpdateOutcome;

pub const MEMO_CREATED: &str = "Memo created";
pub const MEMO_UPDATED: &str = "Memo updated";
pub const NO_CHANGES: &str = "No changes";

/// Create a memo.
/// POST /api/memo
pub async fn create_memo(
    State(state): State<AppState>,
    payload: Result<Json<CreateMemoRequest>, JsonRejection>,
) -> ApiResult<Json<CreateMemoResponse>> {
    let Json(request) = payload?;
    let memo = state.book.create(request).await?;

    Ok(Json(CreateMemoResponse {
        id: memo.id,
        message: MEMO_CREATED.to_string(),
    }))
}

/// Get a memo with its history.
/// GET /api/memo/:id
pub async fn get_memo(
    State(state): State<AppState>,
    Path(memo_id): Path<String>,
) -> ApiResult<Json<MemoDetail>> {
    let detail = state.book.get(&memo_id).await?;
    Ok(Json(detail))
}

/// Update a memo.
/// PUT /api/memo/:id
pub async fn update_memo(
    State(state): State<AppState>,
    Path(memo_id): Path<String>,
    payload: Result<Json<UpdateMemoRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;

    let message = match state.book.update(&memo_id, request).await? {
        UpdateOutcome::Unchanged => NO_CHANGES,
        UpdateOutcome::Updated { .. } => MEMO_UPDATED,
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}
