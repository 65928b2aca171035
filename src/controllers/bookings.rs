use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::EngineError;
use crate::AppState;

// Точки входа внешней системы оформления заказа: подтверждение оплаты
// и возврат. Сессия здесь не нужна — вызывающая сторона авторизуется
// на своём слое и присылает собственную ссылку на заказ.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_booking))
        .route("/bookings/confirm", patch(confirm_booking))
        .route("/bookings/cancel", patch(cancel_booking))
}

/* ---------- BOOKINGS ---------- */

// PATCH /api/bookings/confirm
#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    hold_id: Uuid,
    order_ref: String,
}

async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfirmRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let order_ref = req.order_ref.trim();
    if order_ref.is_empty() {
        return Err(EngineError::InvalidRequest(
            "order_ref не может быть пустым".to_string(),
        ));
    }
    if order_ref.len() > 128 {
        return Err(EngineError::InvalidRequest(
            "order_ref слишком длинный".to_string(),
        ));
    }

    let booking = state.bookings.confirm(req.hold_id, order_ref)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// PATCH /api/bookings/cancel
#[derive(Debug, Deserialize)]
struct CancelRequest {
    booking_id: Uuid,
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelRequest>,
) -> Result<impl IntoResponse, EngineError> {
    state.bookings.cancel(req.booking_id)?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Бронирование отменено, места возвращены в продажу"})),
    ))
}

// GET /api/bookings?id=<uuid>
#[derive(Debug, Deserialize)]
struct BookingQuery {
    id: Uuid,
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookingQuery>,
) -> Result<impl IntoResponse, EngineError> {
    let booking = state.bookings.get_booking(params.id)?;
    Ok((StatusCode::OK, Json(booking)))
}
