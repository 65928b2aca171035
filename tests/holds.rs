//! Конкурентные сценарии менеджера броней: гонки за места, столы
//! целиком, истечение и идемпотентность снятия.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration as StdDuration;

use tablebook::error::EngineError;
use tablebook::models::{HoldStatus, SeatStatus};
use tablebook::services::cleanup::ExpirySweeper;

use common::{app, app_with, publish_basic, row_seat, table_seat};

#[test]
fn race_for_single_seat_has_one_winner() {
    let state = app();
    publish_basic(&state);

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = Vec::new();
    for i in 0..threads {
        let state = state.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            state
                .holds
                .request_hold(&format!("session-{i}"), &[row_seat(1)], None)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "ровно одна сессия должна получить место");

    for result in results {
        if let Err(err) = result {
            match err {
                EngineError::SeatUnavailable {
                    conflicting_seat_ids,
                } => assert_eq!(conflicting_seat_ids, vec![row_seat(1)]),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    let view = state.store.slot(row_seat(1)).unwrap();
    assert_eq!(view.status, SeatStatus::Held);
}

#[test]
fn race_for_table_through_different_seats_has_one_winner() {
    let state = app();
    publish_basic(&state);

    let barrier = Arc::new(Barrier::new(2));
    let a = {
        let state = state.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            state.holds.request_hold("session-a", &[table_seat(1)], None)
        })
    };
    let b = {
        let state = state.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            state.holds.request_hold("session-b", &[table_seat(4)], None)
        })
    };

    let results = [a.join().unwrap(), b.join().unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    // Победителю достался весь стол, частичных состояний нет.
    let winner = results.into_iter().find_map(|r| r.ok()).unwrap();
    assert_eq!(winner.seat_ids, (1..=5).map(table_seat).collect::<Vec<_>>());
    for n in 1..=5 {
        let view = state.store.slot(table_seat(n)).unwrap();
        assert_eq!(view.status, SeatStatus::Held);
        assert_eq!(view.hold_id, Some(winner.id));
    }
}

#[test]
fn table_request_expands_and_conflicts_report_whole_table() {
    let state = app();
    publish_basic(&state);

    // Сессия A берёт одно место стола — бронь расширяется до пяти.
    let hold = state
        .holds
        .request_hold("session-a", &[table_seat(2)], None)
        .unwrap();
    assert_eq!(hold.seat_ids.len(), 5);

    // Сессия B просит другое место того же стола и получает отказ
    // со всеми пятью местами, хотя назвала одно.
    let err = state
        .holds
        .request_hold("session-b", &[table_seat(3)], None)
        .unwrap_err();
    match err {
        EngineError::SeatUnavailable {
            mut conflicting_seat_ids,
        } => {
            conflicting_seat_ids.sort_unstable();
            assert_eq!(
                conflicting_seat_ids,
                (1..=5).map(table_seat).collect::<Vec<_>>()
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn failed_request_leaves_no_partial_hold() {
    let state = app();
    publish_basic(&state);

    state
        .holds
        .request_hold("session-a", &[row_seat(5)], None)
        .unwrap();

    let err = state
        .holds
        .request_hold(
            "session-b",
            &[row_seat(3), row_seat(4), row_seat(5), row_seat(6)],
            None,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::SeatUnavailable { .. }));

    // Всё или ничего: остальные места заявки остались свободными.
    for number in [3, 4, 6] {
        let view = state.store.slot(row_seat(number)).unwrap();
        assert_eq!(view.status, SeatStatus::Available, "seat {number}");
    }
}

#[test]
fn expired_hold_is_swept_and_cannot_confirm() {
    let state = app();
    publish_basic(&state);
    let sweeper = ExpirySweeper::new(state.store.clone());

    let hold = state
        .holds
        .request_hold("session-a", &[row_seat(2)], Some(1))
        .unwrap();

    // До дедлайна место никто не отбирает.
    let stats = sweeper.run_sweep();
    assert_eq!(stats.holds_expired, 0);
    assert_eq!(
        state.store.slot(row_seat(2)).unwrap().status,
        SeatStatus::Held
    );

    thread::sleep(StdDuration::from_millis(1_200));
    let stats = sweeper.run_sweep();
    assert_eq!(stats.holds_expired, 1);
    assert_eq!(stats.seats_freed, 1);
    assert_eq!(
        state.store.slot(row_seat(2)).unwrap().status,
        SeatStatus::Available
    );
    assert_eq!(
        state.holds.get_hold(hold.id, "session-a").unwrap().status,
        HoldStatus::Expired
    );

    // Просроченной бронью оплату подтвердить нельзя.
    let err = state.bookings.confirm(hold.id, "order-1").unwrap_err();
    assert!(matches!(err, EngineError::HoldExpired));

    // Повторный проход уборщика — идемпотентный no-op.
    let stats = sweeper.run_sweep();
    assert_eq!(stats.holds_expired, 0);
}

#[test]
fn release_is_idempotent_and_safe_to_race_with_sweep() {
    let state = app();
    publish_basic(&state);
    let sweeper = ExpirySweeper::new(state.store.clone());

    let hold = state
        .holds
        .request_hold("session-a", &[row_seat(7)], Some(1))
        .unwrap();

    state.holds.release_hold(hold.id, "session-a").unwrap();
    assert_eq!(
        state.store.slot(row_seat(7)).unwrap().status,
        SeatStatus::Available
    );

    // Второй release — no-op без ошибки.
    state.holds.release_hold(hold.id, "session-a").unwrap();

    // Уборщик после release тоже ничего не делает, даже когда дедлайн прошёл.
    thread::sleep(StdDuration::from_millis(1_200));
    let stats = sweeper.run_sweep();
    assert_eq!(stats.holds_expired, 0);
    assert_eq!(
        state.holds.get_hold(hold.id, "session-a").unwrap().status,
        HoldStatus::Released
    );
}

#[test]
fn released_seat_can_be_held_by_another_session() {
    let state = app();
    publish_basic(&state);

    let hold = state
        .holds
        .request_hold("session-a", &[row_seat(9)], None)
        .unwrap();
    state.holds.release_hold(hold.id, "session-a").unwrap();

    let second = state
        .holds
        .request_hold("session-b", &[row_seat(9)], None)
        .unwrap();
    assert_eq!(
        state.store.slot(row_seat(9)).unwrap().hold_id,
        Some(second.id)
    );
}

#[test]
fn extend_resets_deadline_for_owner_only() {
    let state = app();
    publish_basic(&state);

    let hold = state
        .holds
        .request_hold("session-a", &[row_seat(1)], Some(60))
        .unwrap();

    let err = state.holds.extend_hold(hold.id, "session-b").unwrap_err();
    assert!(matches!(err, EngineError::HoldNotFound));

    thread::sleep(StdDuration::from_millis(50));
    let extended = state.holds.extend_hold(hold.id, "session-a").unwrap();
    assert!(extended.expires_at >= hold.expires_at);
}

#[test]
fn extend_cannot_outlive_max_ttl_cap() {
    let state = app_with(|config| {
        config.holds.default_ttl_seconds = 2;
        config.holds.max_ttl_seconds = 3;
    });
    publish_basic(&state);

    let hold = state
        .holds
        .request_hold("session-a", &[row_seat(1)], None)
        .unwrap();

    thread::sleep(StdDuration::from_millis(1_500));
    let extended = state.holds.extend_hold(hold.id, "session-a").unwrap();
    // Продление упёрлось в потолок created_at + max_ttl.
    assert_eq!(
        extended.expires_at,
        hold.created_at + chrono::Duration::seconds(3)
    );
}

#[test]
fn overdue_hold_cannot_be_extended() {
    let state = app();
    publish_basic(&state);

    let hold = state
        .holds
        .request_hold("session-a", &[row_seat(1)], Some(1))
        .unwrap();
    thread::sleep(StdDuration::from_millis(1_200));

    let err = state.holds.extend_hold(hold.id, "session-a").unwrap_err();
    assert!(matches!(err, EngineError::HoldExpired));
}

#[test]
fn foreign_session_cannot_release_or_read_hold() {
    let state = app();
    publish_basic(&state);

    let hold = state
        .holds
        .request_hold("session-a", &[row_seat(6)], None)
        .unwrap();

    assert!(matches!(
        state.holds.release_hold(hold.id, "session-b").unwrap_err(),
        EngineError::HoldNotFound
    ));
    assert!(matches!(
        state.holds.get_hold(hold.id, "session-b").unwrap_err(),
        EngineError::HoldNotFound
    ));
    // Бронь осталась активной.
    assert_eq!(
        state.store.slot(row_seat(6)).unwrap().status,
        SeatStatus::Held
    );
}
