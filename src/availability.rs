use crate::booking::BookingIndex;
use crate::data::{
    Adjustment, Availability, Candidate, ClassId, SchoolData, SubstitutionGroup, Teacher,
    TeacherId, UnavailableReason,
};
use log::trace;
use std::collections::BTreeSet;

/// Classifies one teacher for one vacancy.
///
/// Unavailability wins over any relation to the class, and an existing
/// substitution this period is reported ahead of a timetable clash. Covering
/// this very group does not count as substituting elsewhere.
/// Bookings inside the group's own classes are ignored: a co-teacher of a
/// joint lesson is already in the room.
pub fn classify(
    school: &SchoolData,
    bookings: &BookingIndex,
    adjustments: &[Adjustment],
    group: &SubstitutionGroup,
    teacher_id: &str,
) -> Availability {
    let substituting_elsewhere = adjustments.iter().any(|a| {
        a.substitute_teacher_id == teacher_id
            && a.period_index == group.period_index
            && !group.covers(a)
    });
    if substituting_elsewhere {
        return Availability::Unavailable(UnavailableReason::Substitution);
    }

    let clashes: Vec<&ClassId> = bookings
        .classes_for(group.day, group.period_index, teacher_id)
        .iter()
        .filter(|c| !group.class_ids.contains(*c))
        .collect();
    if !clashes.is_empty() {
        return Availability::Unavailable(UnavailableReason::DoubleBook {
            class_names: school.class_names(clashes),
        });
    }

    let group_classes = || group.class_ids.iter().filter_map(|id| school.class(id));
    if group_classes().any(|c| c.in_charge.as_deref() == Some(teacher_id)) {
        Availability::InCharge
    } else if group_classes().any(|c| c.teaches(teacher_id)) {
        Availability::TeachesClass
    } else {
        Availability::Available
    }
}

/// Every teacher who is not absent, best substitutes first.
///
/// Unavailable teachers stay in the list so they can still be chosen
/// deliberately. Ties keep catalog order.
pub fn rank_candidates(
    school: &SchoolData,
    bookings: &BookingIndex,
    adjustments: &[Adjustment],
    absent: &BTreeSet<TeacherId>,
    group: &SubstitutionGroup,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = school
        .teachers
        .iter()
        .filter(|t| !absent.contains(&t.id))
        .map(|t: &Teacher| Candidate {
            teacher_id: t.id.clone(),
            display_name: t.display_name(),
            availability: classify(school, bookings, adjustments, group, &t.id),
        })
        .collect();
    candidates.sort_by_key(|c| c.availability.rank());
    trace!(
        "Ranked {} candidates for {} at period index {}.",
        candidates.len(),
        group.absent_teacher_id,
        group.period_index
    );
    candidates
}
