//! pricing.rs
//!
//! Вычисление действующей цены места на момент времени.
//!
//! Порядок разрешения:
//! 1.  Окно ранних продаж категории, если `as_of` попадает в него.
//! 2.  Переопределение цены категории на уровне события.
//! 3.  Процентная корректировка (базисные пункты) к базовой цене.
//! 4.  Базовая цена категории (или цена конкретного места, если задана).
//!
//! Резолвер нигде не пишет состояние мест: менеджер броней фиксирует
//! вычисленную цену на брони в момент создания, и дальнейшие изменения
//! правил уже созданные брони и продажи не трогают.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::info;

use crate::error::EngineError;
use crate::models::{PriceLabel, Seat, SeatingChart};

/// Результат разрешения цены: сумма в минорных единицах и источник.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub cents: i64,
    pub label: PriceLabel,
}

/// Правила ценообразования, которые поставляет внешняя конфигурация
/// события: переопределения по категориям и процентная корректировка.
pub struct PricingService {
    /// (событие, категория) -> цена, замещающая базовую.
    overrides: DashMap<(i64, i64), i64>,
    /// Событие -> корректировка в базисных пунктах (может быть отрицательной).
    adjustments: DashMap<i64, i32>,
}

impl PricingService {
    pub fn new() -> Self {
        PricingService {
            overrides: DashMap::new(),
            adjustments: DashMap::new(),
        }
    }

    /// Устанавливает или снимает (None) переопределение цены категории.
    pub fn set_override(&self, event_id: i64, category_id: i64, cents: Option<i64>) {
        match cents {
            Some(cents) => {
                self.overrides.insert((event_id, category_id), cents);
                info!(event_id, category_id, cents, "price override set");
            }
            None => {
                self.overrides.remove(&(event_id, category_id));
                info!(event_id, category_id, "price override cleared");
            }
        }
    }

    /// Устанавливает или снимает процентную корректировку события.
    pub fn set_adjustment(&self, event_id: i64, bps: Option<i32>) {
        match bps {
            Some(bps) => {
                self.adjustments.insert(event_id, bps);
                info!(event_id, bps, "price adjustment set");
            }
            None => {
                self.adjustments.remove(&event_id);
                info!(event_id, "price adjustment cleared");
            }
        }
    }

    /// Действующая цена места на момент `as_of`.
    ///
    /// `UnknownCategory` здесь означает нарушение целостности данных:
    /// публикация схемы такие места отклоняет, поэтому на работающей
    /// схеме эта ошибка всплыть не должна.
    pub fn resolve(
        &self,
        chart: &SeatingChart,
        seat: &Seat,
        as_of: DateTime<Utc>,
    ) -> Result<ResolvedPrice, EngineError> {
        let category = chart
            .category(seat.category_id)
            .ok_or(EngineError::UnknownCategory {
                seat_id: seat.id,
                category_id: seat.category_id,
            })?;

        if let Some(early_bird) = &category.early_bird {
            if early_bird.contains(as_of) {
                return Ok(ResolvedPrice {
                    cents: early_bird.price_cents,
                    label: PriceLabel::EarlyBird,
                });
            }
        }

        if let Some(event_id) = chart.event_id {
            if let Some(cents) = self.overrides.get(&(event_id, seat.category_id)) {
                return Ok(ResolvedPrice {
                    cents: *cents,
                    label: PriceLabel::Override,
                });
            }
        }

        let base = seat.price_cents.unwrap_or(category.base_price_cents);

        if let Some(event_id) = chart.event_id {
            if let Some(bps) = self.adjustments.get(&event_id) {
                return Ok(ResolvedPrice {
                    cents: apply_bps(base, *bps),
                    label: PriceLabel::Adjusted,
                });
            }
        }

        Ok(ResolvedPrice {
            cents: base,
            label: PriceLabel::Base,
        })
    }
}

impl Default for PricingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Корректировка в базисных пунктах с округлением половины вверх.
/// Считаем в i128, чтобы не переполниться на больших суммах.
fn apply_bps(cents: i64, bps: i32) -> i64 {
    let scaled = cents as i128 * (10_000 + bps as i128);
    ((scaled + 5_000) / 10_000) as i64
}
