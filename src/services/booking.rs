//! booking.rs
//!
//! Переход брони в продажу и обратный путь при возврате.
//!
//! Подтверждение оплаты приходит от внешней системы оформления заказа:
//! движок проверяет, что бронь ещё жива, переводит её в `converted`,
//! а места — в `sold`, и создаёт итоговую запись продажи с ценой,
//! зафиксированной ещё при создании брони. Ничего не пересчитывается.
//!
//! Гонку с уборщиком просроченных броней решает атомарная смена статуса
//! самой брони: кто первым увёл её из `active`, тот и распоряжается
//! местами.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{Booking, BookingStatus, HoldStatus, SeatStatus};
use crate::store::{CasError, Store};

#[derive(Clone)]
pub struct BookingService {
    store: Arc<Store>,
}

impl BookingService {
    pub fn new(store: Arc<Store>) -> Self {
        BookingService { store }
    }

    /// Подтверждает оплату: бронь -> `converted`, места -> `sold`,
    /// создаётся запись продажи со снимком цены из брони.
    pub fn confirm(&self, hold_id: Uuid, order_ref: &str) -> Result<Booking, EngineError> {
        let now = Utc::now();

        // Сначала атомарно забираем бронь из active: это точка
        // линеаризации, после неё уборщик бронь не тронет.
        let hold = {
            let mut entry = self
                .store
                .holds
                .get_mut(&hold_id)
                .ok_or(EngineError::HoldNotFound)?;
            match entry.status {
                HoldStatus::Active => {}
                HoldStatus::Expired => return Err(EngineError::HoldExpired),
                HoldStatus::Converted => {
                    return Err(EngineError::InvalidRequest(
                        "бронь уже подтверждена".to_string(),
                    ))
                }
                HoldStatus::Released => return Err(EngineError::HoldNotFound),
            }
            if entry.is_overdue(now) {
                // Просрочена, но уборщик ещё не прошёл: закрываем сами,
                // чтобы оформление сразу вернуло клиента к выбору мест.
                entry.status = HoldStatus::Expired;
                let seat_ids = entry.seat_ids.clone();
                drop(entry);
                for seat_id in &seat_ids {
                    self.store.free_held_seat(*seat_id, hold_id);
                }
                return Err(EngineError::HoldExpired);
            }

            // Контроль инварианта столов на границе транзакции: на
            // подтверждении набор не расширяется, а проверяется.
            let chart = self.store.chart(entry.chart_id)?;
            self.store
                .verify_table_coverage(&chart, &entry.seat_ids)?;

            entry.status = HoldStatus::Converted;
            entry.clone()
        };

        let booking_id = Uuid::new_v4();
        for &seat_id in &hold.seat_ids {
            self.mark_sold(seat_id, hold_id, booking_id)?;
        }

        let booking = Booking {
            id: booking_id,
            hold_id,
            chart_id: hold.chart_id,
            seat_ids: hold.seat_ids.clone(),
            total_cents: hold.total_cents,
            order_ref: order_ref.to_string(),
            status: BookingStatus::Confirmed,
            created_at: now,
            cancelled_at: None,
        };
        self.store.bookings.insert(booking_id, booking.clone());
        info!(
            booking_id = %booking_id,
            hold_id = %hold_id,
            seats = booking.seat_ids.len(),
            total_cents = booking.total_cents,
            "hold converted to booking"
        );
        Ok(booking)
    }

    /// Отмена/возврат от внешней системы: места возвращаются в продажу,
    /// запись продажи остаётся в истории с отметкой об отмене.
    /// Исходная бронь не воскресает. Повторная отмена — no-op.
    pub fn cancel(&self, booking_id: Uuid) -> Result<(), EngineError> {
        let seat_ids = {
            let mut entry = self
                .store
                .bookings
                .get_mut(&booking_id)
                .ok_or(EngineError::BookingNotFound)?;
            if entry.status == BookingStatus::Cancelled {
                return Ok(());
            }
            entry.status = BookingStatus::Cancelled;
            entry.cancelled_at = Some(Utc::now());
            entry.seat_ids.clone()
        };

        let mut freed = 0;
        for &seat_id in &seat_ids {
            if self.free_sold_seat(seat_id, booking_id) {
                freed += 1;
            }
        }
        info!(booking_id = %booking_id, freed, "booking cancelled, seats returned");
        Ok(())
    }

    pub fn get_booking(&self, booking_id: Uuid) -> Result<Booking, EngineError> {
        self.store
            .bookings
            .get(&booking_id)
            .map(|b| b.clone())
            .ok_or(EngineError::BookingNotFound)
    }

    /// Переводит место брони в `sold`. Место обязано быть за нашей бронью:
    /// любое другое состояние на этом пути — ошибка согласованности.
    fn mark_sold(&self, seat_id: i64, hold_id: Uuid, booking_id: Uuid) -> Result<(), EngineError> {
        loop {
            let view = self.store.slot(seat_id)?;
            if view.status != SeatStatus::Held || view.hold_id != Some(hold_id) {
                return Err(EngineError::InvalidTransition {
                    seat_id,
                    from: view.status,
                    to: SeatStatus::Sold,
                });
            }
            match self
                .store
                .compare_and_set(seat_id, view, SeatStatus::Sold, None, Some(booking_id))
            {
                Ok(_) => return Ok(()),
                Err(CasError::Conflict(_)) => continue,
                Err(CasError::Missing) => return Err(EngineError::SeatNotFound { seat_id }),
                Err(CasError::Illegal { from, to }) => {
                    return Err(EngineError::InvalidTransition { seat_id, from, to })
                }
            }
        }
    }

    fn free_sold_seat(&self, seat_id: i64, booking_id: Uuid) -> bool {
        loop {
            let view = match self.store.slot(seat_id) {
                Ok(view) => view,
                Err(_) => return false,
            };
            if view.status != SeatStatus::Sold || view.booking_id != Some(booking_id) {
                warn!(
                    seat_id,
                    booking_id = %booking_id,
                    status = ?view.status,
                    "cancelled booking no longer owns seat, skipping"
                );
                return false;
            }
            match self
                .store
                .compare_and_set(seat_id, view, SeatStatus::Available, None, None)
            {
                Ok(_) => return true,
                Err(CasError::Conflict(_)) => continue,
                Err(_) => return false,
            }
        }
    }
}
