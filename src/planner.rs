use crate::assignment::current_substitute;
use crate::availability::rank_candidates;
use crate::booking::BookingIndex;
use crate::data::{
    Availability, ClassId, DayState, PeriodIndex, SchoolData, SubstitutionGroup, TeacherId,
};
use crate::error::DeskError;
use crate::groups::extract_groups;
use chrono::NaiveDate;
use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
    variable,
};
use itertools::Itertools;
use log::{info, trace};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

/// A substitute proposed for an open group, addressed by the group's first
/// class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub absent_teacher_id: TeacherId,
    pub period_index: PeriodIndex,
    pub class_id: ClassId,
    pub substitute_teacher_id: TeacherId,
}

// objective weights
const IN_CHARGE_WEIGHT: f64 = 3.0;
const TEACHES_CLASS_WEIGHT: f64 = 2.0;
const AVAILABLE_WEIGHT: f64 = 1.0;
const LOAD_PENALTY: f64 = 0.1;

fn preference_weight(availability: &Availability) -> Option<f64> {
    match availability {
        Availability::InCharge => Some(IN_CHARGE_WEIGHT),
        Availability::TeachesClass => Some(TEACHES_CLASS_WEIGHT),
        Availability::Available => Some(AVAILABLE_WEIGHT),
        Availability::Unavailable(_) => None,
    }
}

/// Proposes substitutes for every group on `date` that has none yet, using
/// the HiGHS ILP solver.
///
/// Only teachers who are free for a group are considered. Each group gets at
/// most one substitute and nobody covers two groups in the same period.
/// Preferred relations score higher; teachers already substituting that day
/// are slightly penalised so the load spreads.
pub fn plan(
    school: &SchoolData,
    bookings: &BookingIndex,
    date: NaiveDate,
    state: &DayState,
    threads: i32,
) -> Result<Vec<Suggestion>, DeskError> {
    let start_time = Instant::now();
    let absent = state.absent_teachers();
    let groups = extract_groups(school, date, &absent, &state.leave_details);
    let open: Vec<&SubstitutionGroup> = groups
        .iter()
        .filter(|g| current_substitute(&state.adjustments, g).is_none())
        .collect();

    let existing_load: HashMap<&str, usize> = state
        .adjustments
        .iter()
        .map(|a| (a.substitute_teacher_id.as_str(), a.period_index))
        .unique()
        .map(|(teacher, _)| teacher)
        .counts();

    // (open group index, teacher, weight)
    let mut options: Vec<(usize, TeacherId, f64)> = Vec::new();
    for (group_idx, group) in open.iter().enumerate() {
        for candidate in rank_candidates(school, bookings, &state.adjustments, &absent, group) {
            if let Some(weight) = preference_weight(&candidate.availability) {
                let load = existing_load
                    .get(candidate.teacher_id.as_str())
                    .copied()
                    .unwrap_or(0);
                let score = weight - LOAD_PENALTY * load as f64;
                options.push((group_idx, candidate.teacher_id, score));
            }
        }
    }

    info!(
        "Planning substitutes for {} open groups with {} candidate pairs on {}.",
        open.len(),
        options.len(),
        date
    );
    if options.is_empty() {
        return Ok(Vec::new());
    }

    let mut problem = ProblemVariables::new();
    let vars: Vec<Variable> = problem.add_vector(variable().binary(), options.len());

    let objective: Expression = options
        .iter()
        .zip(&vars)
        .map(|((_, _, weight), var)| *weight * *var)
        .sum();

    let mut model = problem
        .maximise(objective)
        .using(default_solver)
        .set_option("threads", threads)
        .set_option("random_seed", 1234)
        .set_option("output_flag", false);

    // one substitute per group
    let by_group = options
        .iter()
        .zip(&vars)
        .map(|((group_idx, _, _), var)| (*group_idx, *var))
        .into_group_map();
    for group_vars in by_group.values() {
        let assigned: Expression = group_vars.iter().copied().sum();
        model.add_constraint(constraint!(assigned <= 1));
    }

    // nobody covers two groups in one period
    let by_teacher_period = options
        .iter()
        .zip(&vars)
        .map(|((group_idx, teacher, _), var)| {
            ((teacher.clone(), open[*group_idx].period_index), *var)
        })
        .into_group_map();
    for ((teacher, period_index), teacher_vars) in &by_teacher_period {
        if teacher_vars.len() > 1 {
            trace!(
                "{} competes for {} groups at period index {}.",
                teacher,
                teacher_vars.len(),
                period_index
            );
            let busy: Expression = teacher_vars.iter().copied().sum();
            model.add_constraint(constraint!(busy <= 1));
        }
    }

    let solution = model.solve().map_err(|e| DeskError::Solver(e.to_string()))?;

    let mut suggestions: Vec<Suggestion> = options
        .iter()
        .zip(&vars)
        .filter(|(_, var)| solution.value(**var) > 0.9)
        .filter_map(|((group_idx, teacher, _), _)| {
            let group = open[*group_idx];
            Some(Suggestion {
                absent_teacher_id: group.absent_teacher_id.clone(),
                period_index: group.period_index,
                class_id: group.class_ids.first()?.clone(),
                substitute_teacher_id: teacher.clone(),
            })
        })
        .collect();
    suggestions.sort();

    info!(
        "Suggested {} substitutes in {:.2?}.",
        suggestions.len(),
        start_time.elapsed()
    );
    Ok(suggestions)
}
