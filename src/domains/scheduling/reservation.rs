use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domains::cell::{Point3, PointKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub start_ms: u64,
    pub end_ms: u64,
    pub robot_id: usize,
    pub operation_id: usize,
}

/// Serializes access to pick coordinates shared by several operations.
///
/// Only coordinates registered with [`track`](Self::track) are managed.
/// Intervals for one coordinate are granted in request order and never
/// overlap: each new one starts no earlier than the end of all previous ones.
#[derive(Debug, Clone, Default)]
pub struct PickupReservationTable {
    slots: HashMap<PointKey, Vec<Reservation>>,
}

impl PickupReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, point: &Point3) {
        self.slots.entry(point.key()).or_default();
    }

    pub fn is_contended(&self, point: &Point3) -> bool {
        self.slots.contains_key(&point.key())
    }

    /// Earliest time every existing reservation of `point` has ended.
    pub fn earliest_free(&self, point: &Point3) -> u64 {
        self.slots
            .get(&point.key())
            .and_then(|r| r.iter().map(|res| res.end_ms).max())
            .unwrap_or(0)
    }

    /// Grants `point` for `dwell_ms` starting at `requested_start_ms` or, if
    /// the coordinate is still held, at the moment it frees up. Untracked
    /// coordinates are granted as requested without being recorded.
    pub fn acquire(
        &mut self,
        point: &Point3,
        requested_start_ms: u64,
        dwell_ms: u64,
        robot_id: usize,
        operation_id: usize,
    ) -> Reservation {
        let start_ms = requested_start_ms.max(self.earliest_free(point));
        let reservation = Reservation {
            start_ms,
            end_ms: start_ms.saturating_add(dwell_ms),
            robot_id,
            operation_id,
        };
        if let Some(list) = self.slots.get_mut(&point.key()) {
            list.push(reservation);
        }
        reservation
    }

    pub fn reservations(&self, point: &Point3) -> &[Reservation] {
        self.slots.get(&point.key()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contended_count(&self) -> usize {
        self.slots.len()
    }
}
