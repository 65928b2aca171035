//! cleanup.rs
//!
//! Фоновый уборщик просроченных броней.
//!
//! Периодически находит активные брони с прошедшим дедлайном, помечает
//! их `expired` (для аналитики — в отличие от добровольного `released`)
//! и возвращает места в продажу. Молчание клиента после дедлайна —
//! достаточное основание: никакого сигнала отмены от него не требуется.
//!
//! Проход идемпотентен и безопасен при конкуренции: бронь, которую уже
//! закрыла сама сессия или параллельный проход уборщика, молча
//! пропускается.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::HoldStatus;
use crate::store::Store;

pub struct ExpirySweeper {
    store: Arc<Store>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<Store>) -> Self {
        ExpirySweeper { store }
    }

    /// Один проход уборки: все просроченные активные брони закрываются,
    /// их места освобождаются.
    pub fn run_sweep(&self) -> SweepStats {
        let now = Utc::now();
        let overdue: Vec<Uuid> = self
            .store
            .holds
            .iter()
            .filter(|entry| entry.is_active() && entry.is_overdue(now))
            .map(|entry| entry.id)
            .collect();

        if overdue.is_empty() {
            debug!("sweep pass: nothing to expire");
            return SweepStats::default();
        }

        let mut stats = SweepStats::default();
        for hold_id in overdue {
            if let Some(freed) = self.expire_one(hold_id, now) {
                stats.holds_expired += 1;
                stats.seats_freed += freed;
            }
        }

        self.store.note_sweep(stats.holds_expired, stats.seats_freed);
        info!(
            holds_expired = stats.holds_expired,
            seats_freed = stats.seats_freed,
            "sweep pass completed"
        );
        stats
    }

    /// Закрывает одну просроченную бронь. Возвращает None, если бронь
    /// успел забрать кто-то другой (release сессии, параллельный проход
    /// или подтверждение оплаты) — это не ошибка.
    fn expire_one(&self, hold_id: Uuid, now: DateTime<Utc>) -> Option<u64> {
        let seat_ids = {
            let mut entry = self.store.holds.get_mut(&hold_id)?;
            // Перепроверка под блокировкой: статус мог смениться после скана.
            if !entry.is_active() || !entry.is_overdue(now) {
                return None;
            }
            entry.status = HoldStatus::Expired;
            entry.seat_ids.clone()
        };

        let mut freed = 0;
        for seat_id in &seat_ids {
            if self.store.free_held_seat(*seat_id, hold_id) {
                freed += 1;
            }
        }
        info!(hold_id = %hold_id, freed, "expired hold swept");
        Some(freed)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    pub holds_expired: u64,
    pub seats_freed: u64,
}
