use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::EngineError;
use crate::models::{PriceLabel, SeatStatus};
use crate::store::PublishChart;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/charts", post(publish_chart))
        .route("/seats", get(get_seats))
        .route("/pricing", patch(set_pricing))
}

/* ---------- CHART PUBLISH ---------- */

// POST /api/charts — публикация новой версии схемы зала целиком.
// Источник — внешний редактор залов; частичных публикаций не бывает.
async fn publish_chart(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PublishChart>,
) -> Result<impl IntoResponse, EngineError> {
    let summary = state.store.publish(req)?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/* ---------- SEATS ---------- */

#[derive(Debug, Deserialize)]
struct SeatsQuery {
    chart_id: i64,
    page: Option<u32>,
    #[serde(rename = "pageSize")]
    page_size: Option<u32>,
    row: Option<i32>,
    status: Option<String>, // AVAILABLE, HELD, SOLD, BLOCKED
    category_id: Option<i64>,
    accessible: Option<bool>,
}

#[derive(Debug, Serialize)]
struct SeatResponse {
    id: i64,
    row: Option<i32>,
    number: Option<i32>,
    x: f64,
    y: f64,
    table_id: Option<i64>,
    category_id: i64,
    status: SeatStatus,
    accessible: bool,
    price_cents: i64,
    price_label: PriceLabel,
}

// GET /api/seats — места схемы с актуальными статусами и ценами на сейчас.
async fn get_seats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeatsQuery>,
) -> Result<impl IntoResponse, EngineError> {
    if params.chart_id <= 0 {
        return Err(EngineError::InvalidRequest(
            "chart_id должен быть > 0".to_string(),
        ));
    }
    if let Some(r) = params.row {
        if r <= 0 {
            return Err(EngineError::InvalidRequest(
                "row должен быть > 0".to_string(),
            ));
        }
    }
    let status_filter = match &params.status {
        Some(raw) => Some(SeatStatus::parse(raw).ok_or_else(|| {
            EngineError::InvalidRequest(
                "status должен быть AVAILABLE | HELD | SOLD | BLOCKED".to_string(),
            )
        })?),
        None => None,
    };

    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(50).clamp(1, 100);
    let offset = ((page - 1) * page_size) as usize;

    let chart = state.store.chart(params.chart_id)?;
    let now = chrono::Utc::now();

    let mut payload: Vec<SeatResponse> = Vec::new();
    for seat in chart.seats.values() {
        if let Some(r) = params.row {
            if seat.row != Some(r) {
                continue;
            }
        }
        if let Some(category_id) = params.category_id {
            if seat.category_id != category_id {
                continue;
            }
        }
        if let Some(accessible) = params.accessible {
            if seat.accessible != accessible {
                continue;
            }
        }
        let view = state.store.slot(seat.id)?;
        if let Some(status) = status_filter {
            if view.status != status {
                continue;
            }
        }
        let price = state.pricing.resolve(&chart, seat, now)?;
        payload.push(SeatResponse {
            id: seat.id,
            row: seat.row,
            number: seat.number,
            x: seat.x,
            y: seat.y,
            table_id: seat.table_id,
            category_id: seat.category_id,
            status: view.status,
            accessible: seat.accessible,
            price_cents: price.cents,
            price_label: price.label,
        });
    }

    let page_items: Vec<SeatResponse> = payload
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect();

    Ok((StatusCode::OK, Json(page_items)))
}

/* ---------- PRICING CONFIG ---------- */

// PATCH /api/pricing — конфигурация ценообразования события от внешнего
// администрирования: переопределения категорий и процентная корректировка.
// На уже созданные брони и продажи не влияет: их цены зафиксированы.
#[derive(Debug, Deserialize)]
struct PricingRequest {
    event_id: i64,
    category_id: Option<i64>,
    override_cents: Option<i64>,
    adjustment_bps: Option<i32>,
    #[serde(default)]
    clear_override: bool,
    #[serde(default)]
    clear_adjustment: bool,
}

async fn set_pricing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PricingRequest>,
) -> Result<impl IntoResponse, EngineError> {
    if req.event_id <= 0 {
        return Err(EngineError::InvalidRequest(
            "event_id должен быть > 0".to_string(),
        ));
    }

    if req.clear_override {
        let category_id = req.category_id.ok_or_else(|| {
            EngineError::InvalidRequest("для сброса переопределения нужен category_id".to_string())
        })?;
        state.pricing.set_override(req.event_id, category_id, None);
    } else if let (Some(category_id), Some(cents)) = (req.category_id, req.override_cents) {
        if cents < 0 {
            return Err(EngineError::InvalidRequest(
                "override_cents не может быть отрицательным".to_string(),
            ));
        }
        state.pricing.set_override(req.event_id, category_id, Some(cents));
    }

    if req.clear_adjustment {
        state.pricing.set_adjustment(req.event_id, None);
    } else if let Some(bps) = req.adjustment_bps {
        if !(-10_000..=10_000).contains(&bps) {
            return Err(EngineError::InvalidRequest(
                "adjustment_bps должен быть в диапазоне -10000..10000".to_string(),
            ));
        }
        state.pricing.set_adjustment(req.event_id, Some(bps));
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Правила ценообразования обновлены"})),
    ))
}
