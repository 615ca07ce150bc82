use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::AppState;
use crate::board::BoardError;
use crate::models::*;
use crate::rank::RankError;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Map board errors to a status. Everything but storage failures is safe
/// to show to the client.
fn board_error(e: BoardError) -> (StatusCode, String) {
    let status = match &e {
        BoardError::CardNotFound { .. } | BoardError::NeighborNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        BoardError::NeighborInOtherBucket { .. }
        | BoardError::SelfNeighbor { .. }
        | BoardError::SameNeighbor { .. }
        | BoardError::MissingPosition { .. }
        | BoardError::StaleNeighbors { .. }
        | BoardError::Rank(RankError::PrevGreaterThanOrEquals { .. }) => StatusCode::CONFLICT,
        BoardError::Rank(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BoardError::Storage(_) => return internal_error(e),
    };

    tracing::warn!("Rejected board operation: {}", e);
    (status, e.to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Buckets
// ============================================================

pub async fn list_bucket_cards(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
) -> Result<Json<Vec<Card>>, (StatusCode, String)> {
    state
        .db
        .get_bucket_cards(&bucket)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_card(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    Json(input): Json<CreateCardInput>,
) -> Result<(StatusCode, Json<Card>), (StatusCode, String)> {
    if input.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title must not be empty".to_string()));
    }

    state
        .db
        .create_card(&state.board, &bucket, input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(board_error)
}

/// Store a card with its position verbatim. Nothing is validated; use the
/// analysis endpoint or `cardrank repair` afterwards.
pub async fn import_card(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    Json(input): Json<ImportCardInput>,
) -> Result<(StatusCode, Json<Card>), (StatusCode, String)> {
    if input.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title must not be empty".to_string()));
    }

    state
        .db
        .import_card(&bucket, input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

pub async fn rebalance_bucket(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
) -> Result<Json<Vec<Card>>, (StatusCode, String)> {
    state
        .db
        .rebalance_bucket(&state.board, &bucket)
        .map(Json)
        .map_err(board_error)
}

// ============================================================
// Cards
// ============================================================

pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Card>, (StatusCode, String)> {
    state
        .db
        .get_card(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Card not found".to_string()))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_card(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Card not found".to_string()))
    }
}

pub async fn move_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<MoveCardInput>,
) -> Result<Json<Card>, (StatusCode, String)> {
    state
        .db
        .move_card(&state.board, id, input)
        .map(Json)
        .map_err(board_error)
}

// ============================================================
// Positions
// ============================================================

pub async fn analyze_positions(
    State(state): State<AppState>,
) -> Result<Json<PositionAnalysis>, (StatusCode, String)> {
    state
        .db
        .analyze_positions(state.board.generator())
        .map(Json)
        .map_err(internal_error)
}
