//! holds.rs
//!
//! Менеджер временных броней — сердце конкурентного доступа.
//!
//! Ключевые правила:
//! 1.  **"Выбрал одно место — бронируется весь стол"**: запрос
//!     расширяется до полного состава каждого затронутого стола.
//! 2.  **Всё или ничего**: либо захвачены все места расширенного набора,
//!     либо ни одного. Захват идёт по возрастанию id через общий
//!     compare-and-set хранилища; проигранная гонка откатывает уже
//!     захваченные места и повторяет цикл чтение-проверка-коммит
//!     ограниченное число раз.
//! 3.  **Цена фиксируется при создании**: резолвер вычисляет стоимость
//!     каждого места в момент захвата, и дальнейшие изменения правил
//!     ценообразования бронь не трогают.
//!
//! Блокировок на весь зал нет: в транзакции участвуют только места
//! запрошенного набора, чужие брони не задерживаются.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::HoldConfig;
use crate::error::EngineError;
use crate::models::{Hold, HoldStatus, PriceLine, SeatStatus, SeatingChart};
use crate::services::pricing::PricingService;
use crate::store::{CasError, SlotView, Store};

#[derive(Clone)]
pub struct HoldManager {
    store: Arc<Store>,
    pricing: Arc<PricingService>,
    config: HoldConfig,
}

impl HoldManager {
    pub fn new(store: Arc<Store>, pricing: Arc<PricingService>, config: HoldConfig) -> Self {
        HoldManager {
            store,
            pricing,
            config,
        }
    }

    /// Создаёт бронь на набор мест от имени сессии.
    ///
    /// Набор расширяется до полных столов, затем атомарно захватывается.
    /// Если хоть одно место недоступно — вся заявка отклоняется с полным
    /// списком конфликтных мест (включая дозаполненные места столов).
    pub fn request_hold(
        &self,
        session_id: &str,
        seat_ids: &[i64],
        ttl_seconds: Option<i64>,
    ) -> Result<Hold, EngineError> {
        if seat_ids.is_empty() {
            return Err(EngineError::InvalidRequest(
                "нужно выбрать хотя бы одно место".to_string(),
            ));
        }

        let chart = self.store.chart_of_seat(seat_ids[0])?;
        let expanded = self.expand_selection(&chart, seat_ids)?;

        let ttl = ttl_seconds
            .unwrap_or(self.config.default_ttl_seconds)
            .clamp(1, self.config.max_ttl_seconds);

        let mut last_conflicts: Vec<i64> = Vec::new();
        for attempt in 0..=self.config.cas_retries {
            let views = self.store.snapshot(&expanded)?;

            // Занятые места — немедленный отказ, повторять нечего.
            let occupied: Vec<i64> = views
                .iter()
                .filter(|(_, view)| view.status != SeatStatus::Available)
                .map(|(seat_id, _)| *seat_id)
                .collect();
            if !occupied.is_empty() {
                return Err(EngineError::SeatUnavailable {
                    conflicting_seat_ids: occupied,
                });
            }

            let hold_id = Uuid::new_v4();
            match self.claim_all(hold_id, &views) {
                Ok(()) => {
                    let now = Utc::now();
                    let mut lines: Vec<PriceLine> = Vec::with_capacity(expanded.len());
                    for &seat_id in &expanded {
                        let seat = match chart.seat(seat_id) {
                            Some(seat) => seat,
                            None => {
                                self.rollback(hold_id, &expanded);
                                return Err(EngineError::SeatNotFound { seat_id });
                            }
                        };
                        match self.pricing.resolve(&chart, seat, now) {
                            Ok(price) => lines.push(PriceLine {
                                seat_id,
                                cents: price.cents,
                                label: price.label,
                            }),
                            Err(err) => {
                                // Цена не разрешилась — бронь не создаём,
                                // захваченное возвращаем.
                                self.rollback(hold_id, &expanded);
                                return Err(err);
                            }
                        }
                    }
                    let total_cents = lines.iter().map(|line| line.cents).sum();

                    let hold = Hold {
                        id: hold_id,
                        session_id: session_id.to_string(),
                        chart_id: chart.id,
                        seat_ids: expanded.clone(),
                        status: HoldStatus::Active,
                        created_at: now,
                        expires_at: now + Duration::seconds(ttl),
                        ttl_seconds: ttl,
                        lines,
                        total_cents,
                    };
                    self.store.holds.insert(hold_id, hold.clone());
                    info!(
                        hold_id = %hold_id,
                        session_id,
                        seats = expanded.len(),
                        total_cents,
                        "hold created"
                    );
                    return Ok(hold);
                }
                Err(conflict_seat) => {
                    // Версия места ушла между чтением и коммитом:
                    // возможно, чья-то бронь успела освободиться. Повторяем.
                    last_conflicts = vec![conflict_seat];
                    debug!(
                        attempt,
                        seat_id = conflict_seat,
                        "hold claim lost a race, retrying"
                    );
                }
            }
        }

        Err(EngineError::SeatUnavailable {
            conflicting_seat_ids: last_conflicts,
        })
    }

    /// Продлевает активную бронь владеющей сессии: новый дедлайн
    /// `now + ttl`, но не дальше потолка `created_at + max_ttl`
    /// и никогда не раньше текущего дедлайна.
    pub fn extend_hold(&self, hold_id: Uuid, session_id: &str) -> Result<Hold, EngineError> {
        let now = Utc::now();
        let mut entry = self
            .store
            .holds
            .get_mut(&hold_id)
            .ok_or(EngineError::HoldNotFound)?;
        if entry.session_id != session_id {
            // Чужие брони не раскрываем.
            return Err(EngineError::HoldNotFound);
        }
        match entry.status {
            HoldStatus::Active => {}
            HoldStatus::Expired => return Err(EngineError::HoldExpired),
            _ => return Err(EngineError::HoldNotFound),
        }
        if entry.is_overdue(now) {
            // Дедлайн прошёл, уборщик ещё не добрался. Не воскрешаем.
            return Err(EngineError::HoldExpired);
        }

        let cap = entry.created_at + Duration::seconds(self.config.max_ttl_seconds);
        let candidate = (now + Duration::seconds(entry.ttl_seconds)).min(cap);
        if candidate <= now {
            return Err(EngineError::HoldExpired);
        }
        // Дедлайны монотонны: продление не укорачивает бронь.
        entry.expires_at = entry.expires_at.max(candidate);
        debug!(hold_id = %hold_id, expires_at = %entry.expires_at, "hold extended");
        Ok(entry.clone())
    }

    /// Снимает бронь владеющей сессии и возвращает места в продажу.
    /// Повторный вызов и гонка с уборщиком безвредны: проигравший — no-op.
    pub fn release_hold(&self, hold_id: Uuid, session_id: &str) -> Result<(), EngineError> {
        let seat_ids = {
            let mut entry = self
                .store
                .holds
                .get_mut(&hold_id)
                .ok_or(EngineError::HoldNotFound)?;
            if entry.session_id != session_id {
                return Err(EngineError::HoldNotFound);
            }
            if entry.status != HoldStatus::Active {
                return Ok(());
            }
            entry.status = HoldStatus::Released;
            entry.seat_ids.clone()
        };

        let mut freed = 0;
        for seat_id in &seat_ids {
            if self.store.free_held_seat(*seat_id, hold_id) {
                freed += 1;
            }
        }
        info!(hold_id = %hold_id, session_id, freed, "hold released");
        Ok(())
    }

    /// Текущее состояние брони владеющей сессии (для обратного отсчёта).
    pub fn get_hold(&self, hold_id: Uuid, session_id: &str) -> Result<Hold, EngineError> {
        let entry = self
            .store
            .holds
            .get(&hold_id)
            .ok_or(EngineError::HoldNotFound)?;
        if entry.session_id != session_id {
            return Err(EngineError::HoldNotFound);
        }
        Ok(entry.clone())
    }

    /// Расширяет выбор до полного состава каждого затронутого стола
    /// и отбрасывает дубликаты. Все места должны быть с одной схемы.
    fn expand_selection(
        &self,
        chart: &SeatingChart,
        seat_ids: &[i64],
    ) -> Result<Vec<i64>, EngineError> {
        let mut expanded: BTreeSet<i64> = BTreeSet::new();
        for &seat_id in seat_ids {
            let seat = match chart.seat(seat_id) {
                Some(seat) => seat,
                None => {
                    // Либо места нет вовсе, либо оно с другой схемы.
                    return if self.store.slot(seat_id).is_ok() {
                        Err(EngineError::InvalidRequest(
                            "все места должны принадлежать одной схеме".to_string(),
                        ))
                    } else {
                        Err(EngineError::SeatNotFound { seat_id })
                    };
                }
            };
            match seat.table_id {
                Some(table_id) => {
                    if let Some(members) = chart.table_seats.get(&table_id) {
                        expanded.extend(members.iter().copied());
                    }
                }
                None => {
                    expanded.insert(seat_id);
                }
            }
        }
        Ok(expanded.into_iter().collect())
    }

    /// Захватывает все места по возрастанию id. При первом конфликте
    /// откатывает уже захваченные и возвращает id конфликтного места.
    fn claim_all(&self, hold_id: Uuid, views: &[(i64, SlotView)]) -> Result<(), i64> {
        let mut claimed: Vec<i64> = Vec::with_capacity(views.len());
        for (seat_id, view) in views {
            match self
                .store
                .compare_and_set(*seat_id, *view, SeatStatus::Held, Some(hold_id), None)
            {
                Ok(_) => claimed.push(*seat_id),
                Err(CasError::Conflict(_)) | Err(CasError::Missing) | Err(CasError::Illegal { .. }) => {
                    self.rollback(hold_id, &claimed);
                    return Err(*seat_id);
                }
            }
        }
        Ok(())
    }

    fn rollback(&self, hold_id: Uuid, claimed: &[i64]) {
        for &seat_id in claimed {
            self.store.free_held_seat(seat_id, hold_id);
        }
    }
}
