//! store/mod.rs
//!
//! Единственный авторитетный источник состояния движка.
//!
//! Две половины:
//! 1.  **Слой схем** (venues/charts): публикуемые версии схем залов.
//!     После публикации схема неизменяема, читается без блокировок.
//! 2.  **Слой состояния мест** (slots): статус каждого места плюс счётчик
//!     версии. Любая мутация статуса проходит через `compare_and_set` —
//!     другие пути изменения не существуют, менеджер броней и сервис
//!     продаж пользуются одним и тем же примитивом.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{Booking, Hold, Seat, SeatCategory, SeatStatus, SeatingChart, Table, Venue};

/// Снимок динамического состояния места. Версия растёт на каждой
/// успешной мутации; коммит сверяет её со снимком читателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotView {
    pub status: SeatStatus,
    pub version: u64,
    pub hold_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
}

#[derive(Debug)]
struct Slot {
    status: SeatStatus,
    version: u64,
    hold_id: Option<Uuid>,
    booking_id: Option<Uuid>,
}

impl Slot {
    fn view(&self) -> SlotView {
        SlotView {
            status: self.status,
            version: self.version,
            hold_id: self.hold_id,
            booking_id: self.booking_id,
        }
    }
}

/// Исход неудачного compare-and-set.
#[derive(Debug)]
pub enum CasError {
    /// Версия места изменилась с момента чтения; внутри — актуальный снимок.
    Conflict(SlotView),
    /// Место не зарегистрировано в хранилище.
    Missing,
    /// Запрошенный переход запрещён конечным автоматом — баг согласованности.
    Illegal { from: SeatStatus, to: SeatStatus },
}

/// Пакет публикации схемы: атомарная замена, частичных схем не бывает.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishChart {
    pub venue: Venue,
    pub chart_id: i64,
    pub event_id: Option<i64>,
    pub version: u32,
    pub categories: Vec<SeatCategory>,
    pub tables: Vec<Table>,
    pub seats: Vec<Seat>,
}

#[derive(Debug, Serialize)]
pub struct PublishSummary {
    pub chart_id: i64,
    pub version: u32,
    pub seats: usize,
    pub tables: usize,
    pub categories: usize,
}

pub struct Store {
    venues: DashMap<i64, Venue>,
    charts: DashMap<i64, std::sync::Arc<SeatingChart>>,
    /// Событие -> id активной версии схемы (не более одной).
    active_by_event: DashMap<i64, i64>,
    /// Обратный индекс место -> схема, собирается при публикации.
    seat_chart: DashMap<i64, i64>,
    slots: DashMap<i64, Slot>,
    pub holds: DashMap<Uuid, Hold>,
    pub bookings: DashMap<Uuid, Booking>,
    /// Счётчики уборщика для аналитики.
    pub expired_holds_total: AtomicU64,
    pub swept_seats_total: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Store {
            venues: DashMap::new(),
            charts: DashMap::new(),
            active_by_event: DashMap::new(),
            seat_chart: DashMap::new(),
            slots: DashMap::new(),
            holds: DashMap::new(),
            bookings: DashMap::new(),
            expired_holds_total: AtomicU64::new(0),
            swept_seats_total: AtomicU64::new(0),
        }
    }

    // === Слой схем ===

    /// Публикует новую версию схемы зала целиком. Все проверки целостности
    /// происходят здесь: после публикации движок считает схему корректной.
    pub fn publish(&self, req: PublishChart) -> Result<PublishSummary, EngineError> {
        if req.chart_id <= 0 {
            return Err(EngineError::InvalidChart(
                "id схемы должен быть > 0".to_string(),
            ));
        }
        if self.charts.contains_key(&req.chart_id) {
            return Err(EngineError::InvalidChart(format!(
                "схема {} уже опубликована",
                req.chart_id
            )));
        }

        // Версии схем одного события строго растут.
        if let Some(event_id) = req.event_id {
            if let Some(active_id) = self.active_by_event.get(&event_id) {
                if let Some(active) = self.charts.get(&*active_id) {
                    if req.version <= active.version {
                        return Err(EngineError::InvalidChart(format!(
                            "версия {} не выше активной версии {} события {}",
                            req.version, active.version, event_id
                        )));
                    }
                }
            }
        }

        let mut categories: HashMap<i64, SeatCategory> = HashMap::new();
        for category in req.categories {
            if category.chart_id != req.chart_id {
                return Err(EngineError::InvalidChart(format!(
                    "категория {} ссылается на чужую схему",
                    category.id
                )));
            }
            if categories.insert(category.id, category).is_some() {
                return Err(EngineError::InvalidChart(
                    "дубликат id категории".to_string(),
                ));
            }
        }

        let mut tables: HashMap<i64, Table> = HashMap::new();
        for table in req.tables {
            if table.chart_id != req.chart_id {
                return Err(EngineError::InvalidChart(format!(
                    "стол {} ссылается на чужую схему",
                    table.id
                )));
            }
            if tables.insert(table.id, table).is_some() {
                return Err(EngineError::InvalidChart("дубликат id стола".to_string()));
            }
        }

        let mut seats: BTreeMap<i64, Seat> = BTreeMap::new();
        let mut table_seats: HashMap<i64, Vec<i64>> = HashMap::new();
        for seat in req.seats {
            if seat.chart_id != req.chart_id {
                return Err(EngineError::InvalidChart(format!(
                    "место {} ссылается на чужую схему",
                    seat.id
                )));
            }
            if !categories.contains_key(&seat.category_id) {
                // Фатально на публикации: дальше движок исходит из того,
                // что категория каждого места существует.
                error!(
                    seat_id = seat.id,
                    category_id = seat.category_id,
                    "publish rejected: seat references unknown category"
                );
                return Err(EngineError::UnknownCategory {
                    seat_id: seat.id,
                    category_id: seat.category_id,
                });
            }
            if let Some(table_id) = seat.table_id {
                if !tables.contains_key(&table_id) {
                    return Err(EngineError::InvalidChart(format!(
                        "место {} ссылается на несуществующий стол {}",
                        seat.id, table_id
                    )));
                }
                table_seats.entry(table_id).or_default().push(seat.id);
            }
            if seat.row.is_some() != seat.number.is_some() {
                return Err(EngineError::InvalidChart(format!(
                    "у места {} ряд и номер задаются только парой",
                    seat.id
                )));
            }
            if self.slots.contains_key(&seat.id) {
                return Err(EngineError::InvalidChart(format!(
                    "id места {} уже занят другой схемой",
                    seat.id
                )));
            }
            if seats.insert(seat.id, seat).is_some() {
                return Err(EngineError::InvalidChart("дубликат id места".to_string()));
            }
        }

        // Стол можно бронировать, только если заявленная вместимость
        // совпадает с фактическим числом мест.
        for (table_id, table) in &tables {
            let actual = table_seats.get(table_id).map_or(0, |ids| ids.len());
            if actual != table.capacity as usize {
                return Err(EngineError::InvalidChart(format!(
                    "стол {}: заявлено {} мест, размечено {}",
                    table_id, table.capacity, actual
                )));
            }
        }
        for ids in table_seats.values_mut() {
            ids.sort_unstable();
        }

        let summary = PublishSummary {
            chart_id: req.chart_id,
            version: req.version,
            seats: seats.len(),
            tables: tables.len(),
            categories: categories.len(),
        };

        let chart = SeatingChart {
            id: req.chart_id,
            venue_id: req.venue.id,
            event_id: req.event_id,
            version: req.version,
            published_at: Utc::now(),
            categories,
            tables,
            seats,
            table_seats,
        };

        // Новая версия создаёт новые места; слоты старой версии остаются
        // до естественного завершения своих броней.
        for seat_id in chart.seats.keys() {
            self.slots.insert(
                *seat_id,
                Slot {
                    status: SeatStatus::Available,
                    version: 0,
                    hold_id: None,
                    booking_id: None,
                },
            );
            self.seat_chart.insert(*seat_id, chart.id);
        }

        self.venues.insert(req.venue.id, req.venue);
        if let Some(event_id) = chart.event_id {
            self.active_by_event.insert(event_id, chart.id);
        }
        self.charts.insert(chart.id, std::sync::Arc::new(chart));

        info!(
            chart_id = summary.chart_id,
            version = summary.version,
            seats = summary.seats,
            tables = summary.tables,
            "seating chart published"
        );
        Ok(summary)
    }

    pub fn chart(&self, chart_id: i64) -> Result<std::sync::Arc<SeatingChart>, EngineError> {
        self.charts
            .get(&chart_id)
            .map(|c| c.clone())
            .ok_or(EngineError::ChartNotFound)
    }

    pub fn active_chart_for_event(
        &self,
        event_id: i64,
    ) -> Result<std::sync::Arc<SeatingChart>, EngineError> {
        let chart_id = self
            .active_by_event
            .get(&event_id)
            .map(|id| *id)
            .ok_or(EngineError::ChartNotFound)?;
        self.chart(chart_id)
    }

    pub fn venue(&self, venue_id: i64) -> Option<Venue> {
        self.venues.get(&venue_id).map(|v| v.clone())
    }

    /// Схема, которой принадлежит место.
    pub fn chart_of_seat(&self, seat_id: i64) -> Result<std::sync::Arc<SeatingChart>, EngineError> {
        let chart_id = self
            .seat_chart
            .get(&seat_id)
            .map(|id| *id)
            .ok_or(EngineError::SeatNotFound { seat_id })?;
        self.chart(chart_id)
    }

    // === Слой состояния мест ===

    /// Текущий снимок места. Чтение не берёт пишущих блокировок.
    pub fn slot(&self, seat_id: i64) -> Result<SlotView, EngineError> {
        self.slots
            .get(&seat_id)
            .map(|s| s.view())
            .ok_or(EngineError::SeatNotFound { seat_id })
    }

    /// Снимки набора мест одним проходом, в порядке возрастания id.
    pub fn snapshot(&self, seat_ids: &[i64]) -> Result<Vec<(i64, SlotView)>, EngineError> {
        let mut views = Vec::with_capacity(seat_ids.len());
        for &seat_id in seat_ids {
            views.push((seat_id, self.slot(seat_id)?));
        }
        Ok(views)
    }

    /// Единственный примитив мутации статуса места: коммит проходит, только
    /// если версия не изменилась со снимка читателя и переход разрешён
    /// конечным автоматом. Держит блокировку одного места, не всего зала.
    pub fn compare_and_set(
        &self,
        seat_id: i64,
        expected: SlotView,
        status: SeatStatus,
        hold_id: Option<Uuid>,
        booking_id: Option<Uuid>,
    ) -> Result<SlotView, CasError> {
        let mut slot = self.slots.get_mut(&seat_id).ok_or(CasError::Missing)?;
        if slot.version != expected.version {
            return Err(CasError::Conflict(slot.view()));
        }
        if !slot.status.can_transition(status) {
            // Конфликт версий — нормальная гонка; запрещённый переход при
            // совпавшей версии — баг, который обязан попасть в лог.
            error!(
                seat_id,
                from = ?slot.status,
                to = ?status,
                hold_id = ?hold_id,
                "illegal seat transition attempted"
            );
            return Err(CasError::Illegal {
                from: slot.status,
                to: status,
            });
        }
        slot.status = status;
        slot.hold_id = hold_id;
        slot.booking_id = booking_id;
        slot.version += 1;
        Ok(slot.view())
    }

    /// Возвращает место из Held в Available, если им всё ещё владеет
    /// указанная бронь. Чужое или уже освобождённое место — no-op:
    /// этим пользуются и клиентский release, и уборщик, их гонка безвредна.
    pub fn free_held_seat(&self, seat_id: i64, hold_id: Uuid) -> bool {
        loop {
            let view = match self.slot(seat_id) {
                Ok(view) => view,
                Err(_) => return false,
            };
            if view.status != SeatStatus::Held || view.hold_id != Some(hold_id) {
                return false;
            }
            match self.compare_and_set(seat_id, view, SeatStatus::Available, None, None) {
                Ok(_) => return true,
                Err(CasError::Conflict(_)) => continue,
                Err(_) => return false,
            }
        }
    }

    /// Набор текущих статусов мест схемы для отчётов и листинга.
    pub fn status_counts(&self, chart: &SeatingChart) -> HashMap<SeatStatus, usize> {
        let mut counts = HashMap::new();
        for seat_id in chart.seats.keys() {
            if let Ok(view) = self.slot(*seat_id) {
                *counts.entry(view.status).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Проверяет, что набор мест закрывает каждый затронутый стол целиком.
    /// Используется на границах транзакций (создание брони уже расширяет
    /// выбор, здесь — контроль инварианта перед продажей).
    pub fn verify_table_coverage(
        &self,
        chart: &SeatingChart,
        seat_ids: &[i64],
    ) -> Result<(), EngineError> {
        let covered: HashSet<i64> = seat_ids.iter().copied().collect();
        for &seat_id in seat_ids {
            let seat = chart
                .seat(seat_id)
                .ok_or(EngineError::SeatNotFound { seat_id })?;
            if let Some(table_id) = seat.table_id {
                if let Some(members) = chart.table_seats.get(&table_id) {
                    let missing: Vec<i64> = members
                        .iter()
                        .copied()
                        .filter(|id| !covered.contains(id))
                        .collect();
                    if !missing.is_empty() {
                        return Err(EngineError::TableIncomplete {
                            table_id,
                            missing_seat_ids: missing,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Административное снятие места с продажи (ремонт, плохой обзор).
    /// Допустимо только из Available: занятые и проданные места не трогаем.
    pub fn block_seat(&self, seat_id: i64) -> Result<(), EngineError> {
        loop {
            let view = self.slot(seat_id)?;
            if view.status != SeatStatus::Available {
                return Err(EngineError::SeatUnavailable {
                    conflicting_seat_ids: vec![seat_id],
                });
            }
            match self.compare_and_set(seat_id, view, SeatStatus::Blocked, None, None) {
                Ok(_) => {
                    info!(seat_id, "seat blocked");
                    return Ok(());
                }
                Err(CasError::Conflict(_)) => continue,
                Err(CasError::Missing) => return Err(EngineError::SeatNotFound { seat_id }),
                Err(CasError::Illegal { from, to }) => {
                    return Err(EngineError::InvalidTransition { seat_id, from, to })
                }
            }
        }
    }

    /// Возврат заблокированного места в продажу.
    pub fn unblock_seat(&self, seat_id: i64) -> Result<(), EngineError> {
        loop {
            let view = self.slot(seat_id)?;
            if view.status != SeatStatus::Blocked {
                return Err(EngineError::InvalidRequest(
                    "место не заблокировано".to_string(),
                ));
            }
            match self.compare_and_set(seat_id, view, SeatStatus::Available, None, None) {
                Ok(_) => {
                    info!(seat_id, "seat unblocked");
                    return Ok(());
                }
                Err(CasError::Conflict(_)) => continue,
                Err(CasError::Missing) => return Err(EngineError::SeatNotFound { seat_id }),
                Err(CasError::Illegal { from, to }) => {
                    return Err(EngineError::InvalidTransition { seat_id, from, to })
                }
            }
        }
    }

    pub fn note_sweep(&self, holds_expired: u64, seats_freed: u64) {
        self.expired_holds_total
            .fetch_add(holds_expired, Ordering::Relaxed);
        self.swept_seats_total
            .fetch_add(seats_freed, Ordering::Relaxed);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
