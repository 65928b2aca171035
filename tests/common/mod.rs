#![allow(dead_code)]

use std::sync::Arc;

use tablebook::config::Config;
use tablebook::models::{Seat, SeatCategory, Table, TableShape, Venue};
use tablebook::store::PublishChart;
use tablebook::AppState;

pub const EVENT_ID: i64 = 77;
pub const CHART_ID: i64 = 1;
pub const VIP: i64 = 10;
pub const STANDARD: i64 = 11;
pub const TABLE_ID: i64 = 900;

pub fn app() -> Arc<AppState> {
    AppState::new(Config::default())
}

pub fn app_with(tweak: impl FnOnce(&mut Config)) -> Arc<AppState> {
    let mut config = Config::default();
    tweak(&mut config);
    AppState::new(config)
}

/// Id места в ряду: номера 1..=10 лежат на id 101..=110.
pub fn row_seat(number: i32) -> i64 {
    100 + number as i64
}

/// Id места за столом: 1..=5 лежат на id 201..=205.
pub fn table_seat(n: i32) -> i64 {
    200 + n as i64
}

fn category(id: i64, name: &str, base_price_cents: i64, premium: bool) -> SeatCategory {
    SeatCategory {
        id,
        chart_id: CHART_ID,
        name: name.to_string(),
        base_price_cents,
        color: "#336699".to_string(),
        accessible: false,
        premium,
        sort_order: 1,
        early_bird: None,
    }
}

/// Тестовая схема: ряд из 10 обычных мест и круглый стол на 5 VIP-мест.
pub fn basic_chart() -> PublishChart {
    let mut seats = Vec::new();
    for number in 1..=10 {
        seats.push(Seat {
            id: row_seat(number),
            chart_id: CHART_ID,
            category_id: STANDARD,
            table_id: None,
            row: Some(1),
            number: Some(number),
            x: 50.0 * number as f64,
            y: 100.0,
            price_cents: None,
            accessible: false,
        });
    }
    // Места стола стоят по кругу радиуса 40: соседние хорды ~47px.
    for n in 1..=5 {
        let angle = 2.0 * std::f64::consts::PI * (n as f64) / 5.0;
        seats.push(Seat {
            id: table_seat(n),
            chart_id: CHART_ID,
            category_id: VIP,
            table_id: Some(TABLE_ID),
            row: None,
            number: None,
            x: 500.0 + 40.0 * angle.cos(),
            y: 500.0 + 40.0 * angle.sin(),
            price_cents: None,
            accessible: false,
        });
    }

    PublishChart {
        venue: Venue {
            id: 1,
            name: "Main hall".to_string(),
            capacity: 200,
            map_width: 1000,
            map_height: 800,
        },
        chart_id: CHART_ID,
        event_id: Some(EVENT_ID),
        version: 1,
        categories: vec![
            category(VIP, "VIP", 10_000, true),
            category(STANDARD, "Standard", 5_000, false),
        ],
        tables: vec![Table {
            id: TABLE_ID,
            chart_id: CHART_ID,
            label: "T1".to_string(),
            shape: TableShape::Round,
            capacity: 5,
            x: 500.0,
            y: 500.0,
        }],
        seats,
    }
}

pub fn publish_basic(state: &AppState) {
    state.store.publish(basic_chart()).expect("publish fixture chart");
}
