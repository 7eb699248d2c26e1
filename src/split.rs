//! Equal-split cost sharing
//!
//! An event's total is divided among its confirmed attendances in whole cents.
//! The remainder of the integer division goes one cent at a time to the earliest
//! attendances (lowest id), so the shares always add up to the total.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub attendance_id: i64,
    pub share_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualSplit {
    pub total_cents: i64,
    pub attendee_count: usize,
    pub per_person_cents: i64,
    pub remainder_cents: i64,
    /// Ordered by attendance id
    pub shares: Vec<Share>,
}

impl EqualSplit {
    pub fn share_of(&self, attendance_id: i64) -> Option<i64> {
        self.shares
            .iter()
            .find(|s| s.attendance_id == attendance_id)
            .map(|s| s.share_cents)
    }

    /// Percentage of the total each attendee carries
    pub fn share_percent(&self) -> f64 {
        if self.attendee_count == 0 {
            0.0
        } else {
            100.0 / self.attendee_count as f64
        }
    }

    pub fn as_map(&self) -> HashMap<i64, i64> {
        self.shares
            .iter()
            .map(|s| (s.attendance_id, s.share_cents))
            .collect()
    }
}

/// Splits `total_cents` equally among `attendance_ids`.
pub fn equal_split(total_cents: i64, attendance_ids: &[i64]) -> EqualSplit {
    let mut ids = attendance_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let count = ids.len();
    if count == 0 {
        return EqualSplit {
            total_cents,
            attendee_count: 0,
            per_person_cents: 0,
            remainder_cents: 0,
            shares: Vec::new(),
        };
    }

    let divisor = count as i64;
    let per_person_cents = total_cents.div_euclid(divisor);
    let remainder_cents = total_cents.rem_euclid(divisor);

    let shares = ids
        .into_iter()
        .enumerate()
        .map(|(position, attendance_id)| Share {
            attendance_id,
            share_cents: per_person_cents + i64::from((position as i64) < remainder_cents),
        })
        .collect();

    EqualSplit {
        total_cents,
        attendee_count: count,
        per_person_cents,
        remainder_cents,
        shares,
    }
}
