//! adjacency.rs
//!
//! Подбор группы соседних свободных мест для компании.
//!
//! Два места считаются соседними, если они в одном ряду и их номера
//! отличаются на единицу; для мест без разметки рядов (например, вокруг
//! столов) — если геометрическое расстояние не превышает настроенный
//! порог. Поиск — ограниченный обход в ширину от якорного места по
//! графу соседства, суженному до свободных мест. Префикс порядка обхода
//! всегда связен, поэтому первые `size` посещённых мест и есть ответ.
//!
//! Результат — только подсказка: к моменту запроса брони состав
//! свободных мест может измениться, бронь всё равно идёт через общий
//! транзакционный путь.

use std::collections::{HashSet, VecDeque};

use crate::config::AdjacencyConfig;
use crate::error::EngineError;
use crate::models::{Seat, SeatStatus, SeatingChart};
use crate::store::Store;

pub struct AdjacencyFinder {
    config: AdjacencyConfig,
}

impl AdjacencyFinder {
    pub fn new(config: AdjacencyConfig) -> Self {
        AdjacencyFinder { config }
    }

    /// Ищет связную группу из `size` свободных мест вокруг якоря.
    /// Частичную или несвязную группу не возвращает никогда:
    /// лучше честный отказ, чем рассадка компании врозь.
    pub fn find_adjacent_group(
        &self,
        store: &Store,
        chart: &SeatingChart,
        anchor_id: i64,
        size: usize,
    ) -> Result<Vec<Seat>, EngineError> {
        if size == 0 {
            return Err(EngineError::InvalidRequest(
                "размер группы должен быть > 0".to_string(),
            ));
        }
        let anchor = chart
            .seat(anchor_id)
            .ok_or(EngineError::SeatNotFound { seat_id: anchor_id })?;
        if !self.is_available(store, anchor_id) {
            return Err(EngineError::GroupNotFound);
        }

        let mut visited: Vec<i64> = Vec::with_capacity(size);
        let mut seen: HashSet<i64> = HashSet::new();
        let mut queue: VecDeque<i64> = VecDeque::new();

        seen.insert(anchor_id);
        queue.push_back(anchor_id);

        while let Some(current_id) = queue.pop_front() {
            visited.push(current_id);
            if visited.len() == size {
                return Ok(visited
                    .into_iter()
                    .filter_map(|id| chart.seat(id).cloned())
                    .collect());
            }
            if seen.len() >= self.config.max_visited {
                continue;
            }

            let current = match chart.seat(current_id) {
                Some(seat) => seat,
                None => continue,
            };

            // Соседи текущего места, ближние к якорю раньше дальних.
            let mut neighbors: Vec<&Seat> = chart
                .seats
                .values()
                .filter(|candidate| {
                    candidate.id != current_id
                        && !seen.contains(&candidate.id)
                        && self.adjacent(current, candidate)
                        && self.is_available(store, candidate.id)
                })
                .collect();
            neighbors.sort_by(|a, b| {
                anchor
                    .distance_sq(a)
                    .partial_cmp(&anchor.distance_sq(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            for neighbor in neighbors {
                if seen.len() >= self.config.max_visited {
                    break;
                }
                seen.insert(neighbor.id);
                queue.push_back(neighbor.id);
            }
        }

        Err(EngineError::GroupNotFound)
    }

    fn is_available(&self, store: &Store, seat_id: i64) -> bool {
        store
            .slot(seat_id)
            .map(|view| view.status == SeatStatus::Available)
            .unwrap_or(false)
    }

    /// Соседство: по ряду, если размечены оба места, иначе по расстоянию.
    fn adjacent(&self, a: &Seat, b: &Seat) -> bool {
        match (a.row, a.number, b.row, b.number) {
            (Some(row_a), Some(num_a), Some(row_b), Some(num_b)) => {
                row_a == row_b && (num_a - num_b).abs() == 1
            }
            _ => {
                let threshold = self.config.distance_threshold;
                a.distance_sq(b) <= threshold * threshold
            }
        }
    }
}
