//! Подбор соседних мест: сценарии по ряду, геометрия стола и
//! свойство "никогда не возвращать частичную или несвязную группу".

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use tablebook::config::Config;
use tablebook::error::EngineError;
use tablebook::models::{Seat, SeatCategory, Venue};
use tablebook::store::PublishChart;
use tablebook::AppState;

use common::{app, publish_basic, row_seat, table_seat, CHART_ID, STANDARD};

fn hold_seat(state: &AppState, seat_id: i64) {
    state
        .holds
        .request_hold("blocker", &[seat_id], None)
        .expect("blocker hold");
}

fn suggest(state: &AppState, anchor: i64, size: usize) -> Result<Vec<i64>, EngineError> {
    let chart = state.store.chart(CHART_ID).unwrap();
    state
        .adjacency
        .find_adjacent_group(&state.store, &chart, anchor, size)
        .map(|seats| seats.into_iter().map(|seat| seat.id).collect())
}

#[test]
fn row_group_grows_from_anchor() {
    let state = app();
    publish_basic(&state);

    // Ряд из 10, заняты четвёртое и седьмое места.
    hold_seat(&state, row_seat(4));
    hold_seat(&state, row_seat(7));

    let group = suggest(&state, row_seat(1), 3).unwrap();
    assert_eq!(group, vec![row_seat(1), row_seat(2), row_seat(3)]);
}

#[test]
fn anchor_walled_in_by_held_seats_gets_nothing() {
    let state = app();
    publish_basic(&state);

    hold_seat(&state, row_seat(4));
    hold_seat(&state, row_seat(7));

    // Вокруг пятого места доступны только {5, 6} — группы из трёх нет,
    // и частичную группу подбор не возвращает.
    let err = suggest(&state, row_seat(5), 3).unwrap_err();
    assert!(matches!(err, EngineError::GroupNotFound));
}

#[test]
fn table_seats_connect_geometrically() {
    let state = app();
    publish_basic(&state);

    // У мест стола нет рядов — соседство по расстоянию.
    let group = suggest(&state, table_seat(1), 5).unwrap();
    let unique: HashSet<i64> = group.iter().copied().collect();
    assert_eq!(unique, (1..=5).map(table_seat).collect::<HashSet<i64>>());
}

#[test]
fn held_anchor_is_not_suggestable() {
    let state = app();
    publish_basic(&state);

    hold_seat(&state, row_seat(2));
    let err = suggest(&state, row_seat(2), 2).unwrap_err();
    assert!(matches!(err, EngineError::GroupNotFound));
}

#[test]
fn row_adjacency_does_not_leak_across_gap() {
    let state = app();
    publish_basic(&state);

    hold_seat(&state, row_seat(5));
    // Доступно 6..10 — четвёрка с якорем в шестом собирается справа.
    let group = suggest(&state, row_seat(6), 4).unwrap();
    let numbers: HashSet<i64> = group.iter().copied().collect();
    assert_eq!(
        numbers,
        [6, 7, 8, 9].iter().map(|n| row_seat(*n)).collect::<HashSet<i64>>()
    );
}

/* ---------- property: группы всегда связные и точного размера ---------- */

fn row_only_chart(len: i32) -> PublishChart {
    let seats = (1..=len)
        .map(|number| Seat {
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
        })
        .collect();
    PublishChart {
        venue: Venue {
            id: 1,
            name: "Row hall".to_string(),
            capacity: 64,
            map_width: 1000,
            map_height: 200,
        },
        chart_id: CHART_ID,
        event_id: None,
        version: 1,
        categories: vec![SeatCategory {
            id: STANDARD,
            chart_id: CHART_ID,
            name: "Standard".to_string(),
            base_price_cents: 5_000,
            color: "#336699".to_string(),
            accessible: false,
            premium: false,
            sort_order: 1,
            early_bird: None,
        }],
        tables: vec![],
        seats,
    }
}

/// Длина максимального свободного отрезка ряда, содержащего якорь.
fn available_run_around(len: i32, held: &HashSet<i32>, anchor: i32) -> usize {
    if held.contains(&anchor) {
        return 0;
    }
    let mut run = 1;
    let mut left = anchor - 1;
    while left >= 1 && !held.contains(&left) {
        run += 1;
        left -= 1;
    }
    let mut right = anchor + 1;
    while right <= len && !held.contains(&right) {
        run += 1;
        right += 1;
    }
    run
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn suggested_groups_are_exact_contiguous_and_available(
        len in 3i32..12,
        held_mask in prop::collection::hash_set(1i32..12, 0..6),
        anchor in 1i32..12,
        size in 1usize..5,
    ) {
        prop_assume!(anchor <= len);
        let held: HashSet<i32> = held_mask.into_iter().filter(|n| *n <= len && *n != anchor).collect();

        let state: Arc<AppState> = AppState::new(Config::default());
        state.store.publish(row_only_chart(len)).unwrap();
        for number in &held {
            hold_seat(&state, row_seat(*number));
        }

        let run = available_run_around(len, &held, anchor);
        match suggest(&state, row_seat(anchor), size) {
            Ok(group) => {
                prop_assert!(run >= size, "нашлась группа там, где свободного отрезка не хватает");
                prop_assert_eq!(group.len(), size);
                prop_assert!(group.contains(&row_seat(anchor)));
                // Группа — непрерывный отрезок свободных мест.
                let mut numbers: Vec<i64> = group.iter().map(|id| id - 100).collect();
                numbers.sort_unstable();
                for pair in numbers.windows(2) {
                    prop_assert_eq!(pair[1] - pair[0], 1, "группа с разрывом");
                }
                for number in &numbers {
                    prop_assert!(!held.contains(&(*number as i32)), "в группе занятое место");
                }
            }
            Err(EngineError::GroupNotFound) => {
                prop_assert!(run < size, "отказ при достаточном свободном отрезке");
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }
}
