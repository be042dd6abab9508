use crate::availability::classify;
use crate::booking::BookingIndex;
use crate::data::{
    Adjustment, Availability, Conflict, PeriodIndex, SchoolData, SubstitutionGroup,
    UnavailableReason,
};
use chrono::NaiveDate;
use log::{debug, warn};

/// Records `substitute_id` for every class of `group`, replacing whatever
/// was chosen for those classes before. An empty id unassigns.
///
/// A substitute with their own lesson at that time is still recorded, with
/// the clashing classes attached as a conflict.
pub fn assign_substitute(
    school: &SchoolData,
    bookings: &BookingIndex,
    date: NaiveDate,
    adjustments: &[Adjustment],
    group: &SubstitutionGroup,
    substitute_id: &str,
) -> Vec<Adjustment> {
    let mut updated: Vec<Adjustment> = adjustments
        .iter()
        .filter(|a| !group.covers(a))
        .cloned()
        .collect();

    if substitute_id.is_empty() {
        debug!(
            "Unassigned substitute for {} at period index {}.",
            group.absent_teacher_id, group.period_index
        );
        return updated;
    }

    let conflict = match classify(school, bookings, adjustments, group, substitute_id) {
        Availability::Unavailable(UnavailableReason::DoubleBook { class_names }) => {
            warn!(
                "Substitute {} is double booked with {} at period index {}.",
                substitute_id, class_names, group.period_index
            );
            Some(Conflict { class_names })
        }
        _ => None,
    };

    for class_id in &group.class_ids {
        let subject_id =
            own_subject(school, group, class_id).unwrap_or_else(|| group.subject_id.clone());
        updated.push(Adjustment {
            id: Adjustment::key(
                date,
                group.day,
                group.period_index,
                class_id,
                &group.absent_teacher_id,
            ),
            date,
            day: group.day,
            period_index: group.period_index,
            class_id: class_id.clone(),
            subject_id,
            original_teacher_id: group.absent_teacher_id.clone(),
            substitute_teacher_id: substitute_id.to_string(),
            conflict: conflict.clone(),
        });
    }
    debug!(
        "Assigned {} for {} at period index {} in {} classes.",
        substitute_id,
        group.absent_teacher_id,
        group.period_index,
        group.class_ids.len()
    );
    updated
}

// Subject the absent teacher teaches this class in the group's slot.
fn own_subject(school: &SchoolData, group: &SubstitutionGroup, class_id: &str) -> Option<String> {
    school
        .class(class_id)?
        .periods(group.day)
        .get(group.period_index)?
        .iter()
        .find(|e| e.teacher_id == group.absent_teacher_id)
        .map(|e| e.subject_id.clone())
}

/// Drops every adjustment covering `teacher_id`.
pub fn remove_for_teacher(adjustments: &mut Vec<Adjustment>, teacher_id: &str) {
    adjustments.retain(|a| a.original_teacher_id != teacher_id);
}

/// Drops adjustments covering `teacher_id` before `start` once their leave
/// window has shrunk.
pub fn remove_before(adjustments: &mut Vec<Adjustment>, teacher_id: &str, start: PeriodIndex) {
    adjustments.retain(|a| a.original_teacher_id != teacher_id || a.period_index >= start);
}

/// Drops the substitutions `teacher_id` was booked for from `start` on,
/// once they are absent themselves.
pub fn release_substitute(adjustments: &mut Vec<Adjustment>, teacher_id: &str, start: PeriodIndex) {
    adjustments.retain(|a| a.substitute_teacher_id != teacher_id || a.period_index < start);
}

/// Current substitute for a group, if any.
pub fn current_substitute<'a>(
    adjustments: &'a [Adjustment],
    group: &SubstitutionGroup,
) -> Option<&'a str> {
    adjustments
        .iter()
        .find(|a| group.covers(a))
        .map(|a| a.substitute_teacher_id.as_str())
}
