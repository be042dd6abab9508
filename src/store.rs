use crate::data::{Adjustment, DayState, LeaveMap};
use chrono::NaiveDate;
use log::trace;
use std::collections::HashMap;

/// Where committed day state goes. Writes are fire-and-forget from the
/// desk's point of view.
pub trait DayStore {
    fn load_day(&self, date: NaiveDate) -> DayState;
    fn persist_adjustments(&mut self, date: NaiveDate, adjustments: &[Adjustment]);
    fn persist_leave_details(&mut self, date: NaiveDate, details: &LeaveMap);
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    days: HashMap<NaiveDate, DayState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DayStore for MemoryStore {
    fn load_day(&self, date: NaiveDate) -> DayState {
        self.days.get(&date).cloned().unwrap_or_default()
    }

    fn persist_adjustments(&mut self, date: NaiveDate, adjustments: &[Adjustment]) {
        trace!("Storing {} adjustments for {}.", adjustments.len(), date);
        let day = self.days.entry(date).or_default();
        day.adjustments = adjustments.to_vec();
        if *day == DayState::default() {
            self.days.remove(&date);
        }
    }

    fn persist_leave_details(&mut self, date: NaiveDate, details: &LeaveMap) {
        trace!("Storing leave for {} teachers on {}.", details.len(), date);
        let day = self.days.entry(date).or_default();
        day.leave_details = details.clone();
        if *day == DayState::default() {
            self.days.remove(&date);
        }
    }
}
