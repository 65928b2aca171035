use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// Итоговая запись продажи, создаётся один раз при подтверждении оплаты.
/// Отмена не удаляет запись, а помечает её (история продаж — аудит).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub hold_id: Uuid,
    pub chart_id: i64,
    pub seat_ids: Vec<i64>,
    pub total_cents: i64,
    /// Ссылка на заказ/платёж во внешней системе оформления.
    pub order_ref: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}
