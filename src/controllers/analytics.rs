//! analytics.rs
//!
//! Модуль для получения аналитики и статистики по событиям.
//!
//! Включает в себя следующую функциональность:
//! - Подсчет статистики по местам активной схемы события
//!   (проданные, забронированные, свободные, заблокированные).
//! - Расчет общей выручки и количества завершенных продаж.
//! - Счетчики фонового уборщика просроченных броней.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::error::EngineError;
use crate::models::{BookingStatus, SeatStatus};
use crate::AppState;

/// Определяет маршруты, связанные с аналитикой.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analytics", get(get_event_analytics))
}

/// GET /api/analytics
///
/// Возвращает статистику продаж активной схемы указанного события:
/// распределение мест по статусам, выручку и счетчики уборщика.
#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct AnalyticsResponse {
    pub event_id: i64,
    pub chart_id: i64,
    pub chart_version: u32,
    pub total_seats: usize,
    pub sold_seats: usize,
    pub held_seats: usize,
    pub available_seats: usize,
    pub blocked_seats: usize,
    pub bookings_count: usize,
    pub total_revenue: String,
    pub expired_holds_total: u64,
    pub swept_seats_total: u64,
}

async fn get_event_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, EngineError> {
    if params.id <= 0 {
        return Err(EngineError::InvalidRequest(
            "ID события должен быть > 0".to_string(),
        ));
    }

    let chart = state.store.active_chart_for_event(params.id)?;
    let counts = state.store.status_counts(&chart);

    // Выручка — по подтвержденным продажам этой схемы; отмененные
    // записи остаются в истории, но в выручку не входят.
    let mut revenue_cents: i64 = 0;
    let mut bookings_count = 0;
    for booking in state.store.bookings.iter() {
        if booking.chart_id == chart.id && booking.status == BookingStatus::Confirmed {
            revenue_cents += booking.total_cents;
            bookings_count += 1;
        }
    }

    let response = AnalyticsResponse {
        event_id: params.id,
        chart_id: chart.id,
        chart_version: chart.version,
        total_seats: chart.seats.len(),
        sold_seats: counts.get(&SeatStatus::Sold).copied().unwrap_or(0),
        held_seats: counts.get(&SeatStatus::Held).copied().unwrap_or(0),
        available_seats: counts.get(&SeatStatus::Available).copied().unwrap_or(0),
        blocked_seats: counts.get(&SeatStatus::Blocked).copied().unwrap_or(0),
        bookings_count,
        total_revenue: format!("{}.{:02}", revenue_cents / 100, revenue_cents % 100),
        expired_holds_total: state.store.expired_holds_total.load(Ordering::Relaxed),
        swept_seats_total: state.store.swept_seats_total.load(Ordering::Relaxed),
    };

    Ok((StatusCode::OK, Json(response)))
}
