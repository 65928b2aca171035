use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::seat::Seat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub capacity: u32,
    /// Размеры подложки схемы зала; координаты мест заданы в этих пикселях.
    pub map_width: u32,
    pub map_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableShape {
    Round,
    Square,
    Rectangular,
}

/// Стол — группа мест, продаваемая только целиком.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub chart_id: i64,
    pub label: String,
    pub shape: TableShape,
    /// Заявленная вместимость; при публикации должна совпадать
    /// с фактическим числом мест стола.
    pub capacity: u32,
    pub x: f64,
    pub y: f64,
}

/// Окно ранних продаж: цена действует в интервале [starts_at, ends_at).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyBird {
    pub price_cents: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl EarlyBird {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && at < self.ends_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatCategory {
    pub id: i64,
    pub chart_id: i64,
    pub name: String,
    pub base_price_cents: i64,
    pub color: String,
    pub accessible: bool,
    pub premium: bool,
    pub sort_order: i32,
    pub early_bird: Option<EarlyBird>,
}

/// Опубликованная версия схемы зала. После публикации неизменяема:
/// новая версия создаёт новые места, а не правит старые.
#[derive(Debug, Clone)]
pub struct SeatingChart {
    pub id: i64,
    pub venue_id: i64,
    pub event_id: Option<i64>,
    pub version: u32,
    pub published_at: DateTime<Utc>,
    pub categories: HashMap<i64, SeatCategory>,
    pub tables: HashMap<i64, Table>,
    pub seats: BTreeMap<i64, Seat>,
    /// Индекс стол -> его места (отсортированы по id), собирается при публикации.
    pub table_seats: HashMap<i64, Vec<i64>>,
}

impl SeatingChart {
    pub fn seat(&self, seat_id: i64) -> Option<&Seat> {
        self.seats.get(&seat_id)
    }

    pub fn category(&self, category_id: i64) -> Option<&SeatCategory> {
        self.categories.get(&category_id)
    }

    /// Полный состав стола, к которому относится место (если относится).
    pub fn table_of(&self, seat_id: i64) -> Option<&[i64]> {
        let seat = self.seats.get(&seat_id)?;
        let table_id = seat.table_id?;
        self.table_seats.get(&table_id).map(|ids| ids.as_slice())
    }
}
