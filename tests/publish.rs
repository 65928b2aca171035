//! Публикация схем: проверки целостности, версионирование
//! и административное снятие мест с продажи.

mod common;

use tablebook::error::EngineError;
use tablebook::models::SeatStatus;

use common::{app, basic_chart, publish_basic, row_seat, table_seat, CHART_ID, EVENT_ID};

#[test]
fn unknown_category_is_fatal_at_publish() {
    let state = app();
    let mut chart = basic_chart();
    chart.seats[0].category_id = 999;

    let err = state.store.publish(chart).unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnknownCategory {
            category_id: 999,
            ..
        }
    ));
    // Атомарность: ничего из схемы не зарегистрировалось.
    assert!(state.store.chart(CHART_ID).is_err());
    assert!(state.store.slot(row_seat(1)).is_err());
}

#[test]
fn table_capacity_must_match_marked_seats() {
    let state = app();
    let mut chart = basic_chart();
    chart.tables[0].capacity = 6; // размечено пять

    let err = state.store.publish(chart).unwrap_err();
    assert!(matches!(err, EngineError::InvalidChart(_)));
}

#[test]
fn duplicate_and_foreign_ids_are_rejected() {
    let state = app();

    let mut dup = basic_chart();
    let clone = dup.seats[0].clone();
    dup.seats.push(clone);
    assert!(matches!(
        state.store.publish(dup).unwrap_err(),
        EngineError::InvalidChart(_)
    ));

    let mut foreign = basic_chart();
    foreign.seats[0].chart_id = 42;
    assert!(matches!(
        state.store.publish(foreign).unwrap_err(),
        EngineError::InvalidChart(_)
    ));

    let mut orphan_table = basic_chart();
    orphan_table.seats.last_mut().unwrap().table_id = Some(12345);
    assert!(matches!(
        state.store.publish(orphan_table).unwrap_err(),
        EngineError::InvalidChart(_)
    ));
}

#[test]
fn row_and_number_come_in_pairs() {
    let state = app();
    let mut chart = basic_chart();
    chart.seats[0].number = None;

    assert!(matches!(
        state.store.publish(chart).unwrap_err(),
        EngineError::InvalidChart(_)
    ));
}

#[test]
fn new_version_replaces_active_chart_for_event() {
    let state = app();
    publish_basic(&state);

    // Версия не выше активной — отказ.
    let mut stale = basic_chart();
    stale.chart_id = 2;
    stale.version = 1;
    for seat in &mut stale.seats {
        seat.id += 1_000;
        seat.chart_id = 2;
    }
    for category in &mut stale.categories {
        category.chart_id = 2;
    }
    for table in &mut stale.tables {
        table.chart_id = 2;
    }
    assert!(matches!(
        state.store.publish(stale).unwrap_err(),
        EngineError::InvalidChart(_)
    ));

    // Версия выше — новая схема становится активной, старая остаётся в истории.
    let mut v2 = basic_chart();
    v2.chart_id = 2;
    v2.version = 2;
    for seat in &mut v2.seats {
        seat.id += 1_000;
        seat.chart_id = 2;
    }
    for category in &mut v2.categories {
        category.chart_id = 2;
    }
    for table in &mut v2.tables {
        table.chart_id = 2;
    }
    state.store.publish(v2).unwrap();

    let active = state.store.active_chart_for_event(EVENT_ID).unwrap();
    assert_eq!(active.id, 2);
    assert_eq!(active.version, 2);
    state.store.chart(CHART_ID).unwrap(); // старая версия читается по id

    // Новая версия создала новые места, не трогая старые.
    assert_eq!(
        state.store.slot(row_seat(1) + 1_000).unwrap().status,
        SeatStatus::Available
    );
    assert_eq!(
        state.store.slot(row_seat(1)).unwrap().status,
        SeatStatus::Available
    );
}

#[test]
fn chart_id_reuse_is_rejected() {
    let state = app();
    publish_basic(&state);
    assert!(matches!(
        state.store.publish(basic_chart()).unwrap_err(),
        EngineError::InvalidChart(_)
    ));
}

/* ---------- административные переходы ---------- */

#[test]
fn blocked_seat_is_unreachable_for_holds() {
    let state = app();
    publish_basic(&state);

    state.store.block_seat(row_seat(5)).unwrap();
    assert_eq!(
        state.store.slot(row_seat(5)).unwrap().status,
        SeatStatus::Blocked
    );

    let err = state
        .holds
        .request_hold("session-a", &[row_seat(5)], None)
        .unwrap_err();
    assert!(matches!(err, EngineError::SeatUnavailable { .. }));

    state.store.unblock_seat(row_seat(5)).unwrap();
    state
        .holds
        .request_hold("session-a", &[row_seat(5)], None)
        .unwrap();
}

#[test]
fn held_seat_cannot_be_blocked() {
    let state = app();
    publish_basic(&state);

    state
        .holds
        .request_hold("session-a", &[table_seat(1)], None)
        .unwrap();
    let err = state.store.block_seat(table_seat(1)).unwrap_err();
    assert!(matches!(err, EngineError::SeatUnavailable { .. }));
}
