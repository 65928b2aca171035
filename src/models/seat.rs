use serde::{Deserialize, Serialize};

/// Статусы места. Единственное изменяемое состояние движка.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
    Blocked,
}

impl SeatStatus {
    /// Разрешённые переходы конечного автомата места.
    /// Всё остальное — ошибка согласованности, а не ожидаемый конфликт.
    pub fn can_transition(self, to: SeatStatus) -> bool {
        use SeatStatus::*;
        matches!(
            (self, to),
            (Available, Held)
                | (Held, Available)
                | (Held, Sold)
                | (Sold, Available)
                | (Available, Blocked)
                | (Blocked, Available)
        )
    }

    pub fn parse(value: &str) -> Option<SeatStatus> {
        match value {
            "AVAILABLE" => Some(SeatStatus::Available),
            "HELD" => Some(SeatStatus::Held),
            "SOLD" => Some(SeatStatus::Sold),
            "BLOCKED" => Some(SeatStatus::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub chart_id: i64,
    pub category_id: i64,
    pub table_id: Option<i64>,
    pub row: Option<i32>,
    pub number: Option<i32>,
    pub x: f64,
    pub y: f64,
    /// Переопределение базовой цены категории для конкретного места.
    pub price_cents: Option<i64>,
    pub accessible: bool,
}

impl Seat {
    /// Квадрат расстояния между двумя местами на схеме зала.
    pub fn distance_sq(&self, other: &Seat) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}
