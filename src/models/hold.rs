use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Откуда взялась цена при фиксации: ранняя продажа, переопределение
/// для события, процентная корректировка или базовая цена категории.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLabel {
    EarlyBird,
    Override,
    Adjusted,
    Base,
}

/// Зафиксированная на момент создания брони цена одного места.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLine {
    pub seat_id: i64,
    pub cents: i64,
    pub label: PriceLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldStatus {
    Active,
    Released,
    Expired,
    Converted,
}

/// Временная бронь мест за сессией. Набор мест неизменен после создания;
/// цены зафиксированы в момент создания и дальше не пересчитываются.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub id: Uuid,
    pub session_id: String,
    pub chart_id: i64,
    pub seat_ids: Vec<i64>,
    pub status: HoldStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// TTL, с которым бронь была создана; продление отсчитывает его заново.
    pub ttl_seconds: i64,
    pub lines: Vec<PriceLine>,
    pub total_cents: i64,
}

impl Hold {
    pub fn is_active(&self) -> bool {
        self.status == HoldStatus::Active
    }

    /// Просрочена ли бронь по серверным часам. Статус может ещё не быть
    /// переведён в Expired, если уборщик не успел пройти.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Остаток времени для обратного отсчёта в интерфейсе. Информационное
    /// значение: авторитетны только серверные часы.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}
