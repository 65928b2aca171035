use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::SeatStatus;

/// Возвращает 419 — нестандартный код, которым API отвечает на конфликт
/// за место (занято другой сессией).
pub fn status_419() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::CONFLICT)
}

/// Ошибки движка бронирования. Конфликты за места — ожидаемый поток
/// управления; ошибки согласованности — повод для разбора инцидента.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("seats unavailable: {conflicting_seat_ids:?}")]
    SeatUnavailable { conflicting_seat_ids: Vec<i64> },

    #[error("hold not found")]
    HoldNotFound,

    #[error("hold expired")]
    HoldExpired,

    #[error("hold covers table {table_id} only partially, missing seats {missing_seat_ids:?}")]
    TableIncomplete {
        table_id: i64,
        missing_seat_ids: Vec<i64>,
    },

    #[error("illegal seat transition {from:?} -> {to:?} for seat {seat_id}")]
    InvalidTransition {
        seat_id: i64,
        from: SeatStatus,
        to: SeatStatus,
    },

    #[error("seat {seat_id} references unknown category {category_id}")]
    UnknownCategory { seat_id: i64, category_id: i64 },

    #[error("chart not found")]
    ChartNotFound,

    #[error("seat {seat_id} not found")]
    SeatNotFound { seat_id: i64 },

    #[error("booking not found")]
    BookingNotFound,

    #[error("no adjacent group of requested size")]
    GroupNotFound,

    #[error("invalid chart: {0}")]
    InvalidChart(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        // Конфликт за место — обычный ответ, подробности нужны клиенту,
        // чтобы перерисовать схему.
        let (status, body) = match &self {
            EngineError::SeatUnavailable {
                conflicting_seat_ids,
            } => (
                status_419(),
                json!({
                    "error": "SEAT_UNAVAILABLE",
                    "message": "Места уже заняты или недоступны",
                    "conflicting_seat_ids": conflicting_seat_ids,
                }),
            ),
            EngineError::HoldNotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "HOLD_NOT_FOUND",
                    "message": "Бронь не найдена или не принадлежит вам",
                }),
            ),
            EngineError::HoldExpired => (
                StatusCode::GONE,
                json!({
                    "error": "HOLD_EXPIRED",
                    "message": "Время брони истекло, выберите места заново",
                }),
            ),
            EngineError::TableIncomplete {
                table_id,
                missing_seat_ids,
            } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "TABLE_INCOMPLETE",
                    "message": "Стол бронируется только целиком",
                    "table_id": table_id,
                    "missing_seat_ids": missing_seat_ids,
                }),
            ),
            EngineError::InvalidTransition { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "INTERNAL",
                    "message": "Внутренняя ошибка, попробуйте ещё раз",
                }),
            ),
            EngineError::UnknownCategory {
                seat_id,
                category_id,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "UNKNOWN_CATEGORY",
                    "message": "Место ссылается на несуществующую категорию",
                    "seat_id": seat_id,
                    "category_id": category_id,
                }),
            ),
            EngineError::ChartNotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "CHART_NOT_FOUND",
                    "message": "Схема зала не найдена",
                }),
            ),
            EngineError::SeatNotFound { seat_id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "SEAT_NOT_FOUND",
                    "message": "Место не найдено",
                    "seat_id": seat_id,
                }),
            ),
            EngineError::BookingNotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "BOOKING_NOT_FOUND",
                    "message": "Бронирование не найдено",
                }),
            ),
            EngineError::GroupNotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "GROUP_NOT_FOUND",
                    "message": "Не удалось подобрать группу соседних мест нужного размера",
                }),
            ),
            EngineError::InvalidChart(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "INVALID_CHART",
                    "message": reason,
                }),
            ),
            EngineError::InvalidRequest(reason) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "BAD_REQUEST",
                    "message": reason,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
