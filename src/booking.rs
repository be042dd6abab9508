use crate::data::{ClassId, Day, PeriodIndex, SchoolData, TeacherId};
use log::debug;
use std::collections::HashMap;

/// Who teaches where: (day, period index, teacher) -> classes in that slot.
///
/// Derived from a timetable snapshot and must be rebuilt whenever the
/// classes change. A joint period books its teacher into every class that
/// shares it.
#[derive(Debug, Clone, Default)]
pub struct BookingIndex {
    slots: HashMap<(Day, PeriodIndex, TeacherId), Vec<ClassId>>,
}

impl BookingIndex {
    pub fn build(school: &SchoolData) -> Self {
        let mut slots: HashMap<(Day, PeriodIndex, TeacherId), Vec<ClassId>> = HashMap::new();
        for class in &school.classes {
            for (day, periods) in &class.timetable {
                for (period_index, entries) in periods.iter().enumerate() {
                    for entry in entries {
                        let booked = slots
                            .entry((*day, period_index, entry.teacher_id.clone()))
                            .or_default();
                        if !booked.contains(&class.id) {
                            booked.push(class.id.clone());
                        }
                    }
                }
            }
        }
        debug!("Booking index built with {} teacher slots.", slots.len());
        Self { slots }
    }

    pub fn classes_for(&self, day: Day, period_index: PeriodIndex, teacher_id: &str) -> &[ClassId] {
        self.slots
            .get(&(day, period_index, teacher_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
