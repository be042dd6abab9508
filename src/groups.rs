use crate::data::{
    ClassId, Day, GroupKey, LeaveMap, PeriodIndex, SchoolData, SubjectId, SubstitutionGroup,
    TeacherId,
};
use crate::error::DeskError;
use chrono::NaiveDate;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

/// Enumerates every lesson left without a teacher on `date`.
///
/// Weekends yield nothing. Each absent teacher is vacant from the start of
/// their leave window to the end of the day; joint periods collapse into a
/// single group covering all participating classes. Output is ordered by
/// absent teacher, then period index.
pub fn extract_groups(
    school: &SchoolData,
    date: NaiveDate,
    absent: &BTreeSet<TeacherId>,
    leave: &LeaveMap,
) -> Vec<SubstitutionGroup> {
    let Some(day) = Day::from_date(date) else {
        debug!("{} is not a school day, no substitution groups.", date);
        return Vec::new();
    };

    let mut pending: BTreeMap<(TeacherId, PeriodIndex, GroupKey), (Vec<ClassId>, SubjectId)> =
        BTreeMap::new();

    for teacher_id in absent {
        let start = leave.get(teacher_id).cloned().unwrap_or_default().start_index();
        trace!("Teacher {} vacant from period index {} on {}.", teacher_id, start, day);

        for class in &school.classes {
            for (period_index, entries) in class.periods(day).iter().enumerate().skip(start) {
                for entry in entries.iter().filter(|e| &e.teacher_id == teacher_id) {
                    let key = match &entry.joint_period_id {
                        Some(joint) => GroupKey::Joint(joint.clone()),
                        None => GroupKey::Single(class.id.clone()),
                    };
                    let (class_ids, _) = pending
                        .entry((teacher_id.clone(), period_index, key))
                        .or_insert_with(|| (Vec::new(), entry.subject_id.clone()));
                    if !class_ids.contains(&class.id) {
                        class_ids.push(class.id.clone());
                    }
                }
            }
        }
    }

    let groups: Vec<SubstitutionGroup> = pending
        .into_iter()
        .map(|((absent_teacher_id, period_index, key), (class_ids, subject_id))| {
            let class_names = school.class_names(&class_ids);
            SubstitutionGroup {
                absent_teacher_id,
                day,
                period_index,
                key,
                class_ids,
                subject_id,
                class_names,
            }
        })
        .collect();

    debug!(
        "Found {} substitution groups for {} absent teachers on {}.",
        groups.len(),
        absent.len(),
        date
    );
    groups
}

/// Looks up the group an absent teacher leaves open at `period_index`.
///
/// A teacher with separate lessons in the same period leaves several
/// groups; `class_id` picks one of them and is required in that case.
pub fn find_group<'a>(
    groups: &'a [SubstitutionGroup],
    absent_teacher_id: &str,
    period_index: PeriodIndex,
    class_id: Option<&str>,
) -> Result<&'a SubstitutionGroup, DeskError> {
    let mut matches = groups.iter().filter(|g| {
        g.absent_teacher_id == absent_teacher_id
            && g.period_index == period_index
            && class_id.is_none_or(|c| g.class_ids.iter().any(|id| id == c))
    });
    let group = matches.next().ok_or_else(|| DeskError::UnknownGroup {
        teacher_id: absent_teacher_id.to_string(),
        period_index,
    })?;
    if matches.next().is_some() {
        return Err(DeskError::AmbiguousGroup {
            teacher_id: absent_teacher_id.to_string(),
            period_index,
        });
    }
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{half_day, monday, saturday, school};

    fn absent(ids: &[&str]) -> BTreeSet<TeacherId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_day_covers_every_taught_period_once() {
        let groups = extract_groups(&school(), monday(), &absent(&["t1"]), &LeaveMap::new());
        let periods: Vec<_> = groups.iter().map(|g| g.period_index).collect();
        assert_eq!(periods, [0, 2]);
        assert_eq!(groups[0].class_ids, ["c1"]);
        assert_eq!(groups[0].key, GroupKey::Single("c1".into()));
    }

    #[test]
    fn joint_period_is_one_group() {
        let leave: LeaveMap = [("t1".to_string(), half_day(2))].into();
        let groups = extract_groups(&school(), monday(), &absent(&["t1"]), &leave);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.period_index, 2);
        assert_eq!(group.key, GroupKey::Joint("j1".into()));
        assert_eq!(group.class_ids, ["c1", "c2"]);
        assert_eq!(group.subject_id, "sci");
        assert_eq!(group.class_names.primary, "C1, C2");
        assert_eq!(group.class_names.secondary, "c1-alt, c2-alt");
    }

    #[test]
    fn half_day_skips_earlier_periods() {
        let leave: LeaveMap = [("t6".to_string(), half_day(3))].into();
        let groups = extract_groups(&school(), monday(), &absent(&["t6"]), &leave);
        let periods: Vec<_> = groups.iter().map(|g| g.period_index).collect();
        assert_eq!(periods, [3]);
    }

    #[test]
    fn idle_teacher_and_weekend_produce_nothing() {
        let leave = LeaveMap::new();
        assert!(extract_groups(&school(), monday(), &absent(&["t2"]), &leave).is_empty());
        assert!(extract_groups(&school(), saturday(), &absent(&["t1"]), &leave).is_empty());
    }

    #[test]
    fn groups_sorted_by_teacher_then_period() {
        let groups = extract_groups(&school(), monday(), &absent(&["t6", "t1"]), &LeaveMap::new());
        let order: Vec<_> = groups
            .iter()
            .map(|g| (g.absent_teacher_id.as_str(), g.period_index))
            .collect();
        assert_eq!(order, [("t1", 0), ("t1", 2), ("t6", 0), ("t6", 1), ("t6", 3)]);
        assert!(find_group(&groups, "t6", 1, None).is_ok());
        assert!(find_group(&groups, "t1", 2, Some("c2")).is_ok());
        assert!(matches!(
            find_group(&groups, "t6", 2, None),
            Err(DeskError::UnknownGroup { .. })
        ));
    }
}
