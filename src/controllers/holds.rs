use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::EngineError;
use crate::middleware::SessionId;
use crate::models::{Hold, PriceLine};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/holds", post(create_hold).get(get_hold))
        .route("/holds/extend", patch(extend_hold))
        .route("/holds/release", patch(release_hold))
        .route("/seats/suggest", get(suggest_group))
}

/* ---------- DTO ---------- */

#[derive(Debug, Serialize)]
struct HoldResponse {
    id: Uuid,
    chart_id: i64,
    seat_ids: Vec<i64>,
    status: crate::models::HoldStatus,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    /// Для обратного отсчёта в интерфейсе; авторитетны серверные часы.
    remaining_seconds: i64,
    total_cents: i64,
    lines: Vec<PriceLine>,
}

impl HoldResponse {
    fn from_hold(hold: Hold) -> Self {
        let now = Utc::now();
        HoldResponse {
            remaining_seconds: hold.remaining_seconds(now),
            id: hold.id,
            chart_id: hold.chart_id,
            seat_ids: hold.seat_ids,
            status: hold.status,
            created_at: hold.created_at,
            expires_at: hold.expires_at,
            total_cents: hold.total_cents,
            lines: hold.lines,
        }
    }
}

/* ---------- HOLDS ---------- */

// POST /api/holds
#[derive(Debug, Deserialize)]
struct CreateHoldRequest {
    seat_ids: Vec<i64>,
    ttl_seconds: Option<i64>,
}

async fn create_hold(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Json(req): Json<CreateHoldRequest>,
) -> Result<impl IntoResponse, EngineError> {
    if req.seat_ids.is_empty() {
        return Err(EngineError::InvalidRequest(
            "seat_ids не может быть пустым".to_string(),
        ));
    }
    if req.seat_ids.len() > 50 {
        return Err(EngineError::InvalidRequest(
            "слишком много мест в одной заявке".to_string(),
        ));
    }
    if req.seat_ids.iter().any(|&id| id <= 0) {
        return Err(EngineError::InvalidRequest(
            "seat_ids должны быть > 0".to_string(),
        ));
    }
    if let Some(ttl) = req.ttl_seconds {
        if ttl <= 0 {
            return Err(EngineError::InvalidRequest(
                "ttl_seconds должен быть > 0".to_string(),
            ));
        }
    }

    let hold = state
        .holds
        .request_hold(&session.0, &req.seat_ids, req.ttl_seconds)?;
    Ok((StatusCode::CREATED, Json(HoldResponse::from_hold(hold))))
}

// GET /api/holds?id=<uuid>
#[derive(Debug, Deserialize)]
struct HoldQuery {
    id: Uuid,
}

async fn get_hold(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Query(params): Query<HoldQuery>,
) -> Result<impl IntoResponse, EngineError> {
    let hold = state.holds.get_hold(params.id, &session.0)?;
    Ok((StatusCode::OK, Json(HoldResponse::from_hold(hold))))
}

// PATCH /api/holds/extend
#[derive(Debug, Deserialize)]
struct ExtendHoldRequest {
    hold_id: Uuid,
}

async fn extend_hold(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Json(req): Json<ExtendHoldRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let hold = state.holds.extend_hold(req.hold_id, &session.0)?;
    Ok((StatusCode::OK, Json(HoldResponse::from_hold(hold))))
}

// PATCH /api/holds/release
#[derive(Debug, Deserialize)]
struct ReleaseHoldRequest {
    hold_id: Uuid,
}

async fn release_hold(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Json(req): Json<ReleaseHoldRequest>,
) -> Result<impl IntoResponse, EngineError> {
    state.holds.release_hold(req.hold_id, &session.0)?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Бронь снята, места возвращены в продажу"})),
    ))
}

/* ---------- SUGGESTIONS ---------- */

// GET /api/seats/suggest — подсказка группы соседних мест.
// Только подсказка: бронировать её всё равно нужно через POST /api/holds,
// состав свободных мест мог измениться.
#[derive(Debug, Deserialize)]
struct SuggestQuery {
    chart_id: i64,
    anchor_seat_id: i64,
    size: usize,
}

#[derive(Debug, Serialize)]
struct SuggestResponse {
    seat_ids: Vec<i64>,
}

async fn suggest_group(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestQuery>,
) -> Result<impl IntoResponse, EngineError> {
    if params.chart_id <= 0 || params.anchor_seat_id <= 0 {
        return Err(EngineError::InvalidRequest(
            "chart_id и anchor_seat_id должны быть > 0".to_string(),
        ));
    }
    if params.size == 0 || params.size > 20 {
        return Err(EngineError::InvalidRequest(
            "size должен быть в диапазоне 1..20".to_string(),
        ));
    }

    let chart = state.store.chart(params.chart_id)?;
    let group = state.adjacency.find_adjacent_group(
        &state.store,
        &chart,
        params.anchor_seat_id,
        params.size,
    )?;

    Ok((
        StatusCode::OK,
        Json(SuggestResponse {
            seat_ids: group.into_iter().map(|seat| seat.id).collect(),
        }),
    ))
}
