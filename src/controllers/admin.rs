use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::patch,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::EngineError;
use crate::AppState;

// Административные переходы available <-> blocked. Из клиентских
// сценариев сюда попасть нельзя — маршруты включаются флагом.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/seats/block", patch(block_seat))
        .route("/admin/seats/unblock", patch(unblock_seat))
}

#[derive(Debug, Deserialize)]
struct SeatRequest {
    seat_id: i64,
}

async fn block_seat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeatRequest>,
) -> Result<impl IntoResponse, EngineError> {
    if req.seat_id <= 0 {
        return Err(EngineError::InvalidRequest(
            "seat_id должен быть > 0".to_string(),
        ));
    }
    state.store.block_seat(req.seat_id)?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Место снято с продажи"})),
    ))
}

async fn unblock_seat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeatRequest>,
) -> Result<impl IntoResponse, EngineError> {
    if req.seat_id <= 0 {
        return Err(EngineError::InvalidRequest(
            "seat_id должен быть > 0".to_string(),
        ));
    }
    state.store.unblock_seat(req.seat_id)?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Место возвращено в продажу"})),
    ))
}
