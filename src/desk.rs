//! Day-by-day substitution bookkeeping on top of the pure resolver.
//!
//! The desk owns the current school snapshot and a store. Every mutation
//! loads the day, recomputes what it needs from scratch and hands the
//! result back to the store.

use crate::assignment::{
    assign_substitute, current_substitute, release_substitute, remove_before, remove_for_teacher,
};
use crate::availability::rank_candidates;
use crate::booking::BookingIndex;
use crate::data::{
    Adjustment, Day, DayState, GroupView, LeaveDetails, PeriodIndex, ResolveInput, ResolveOutput,
    SchoolData,
};
use crate::error::DeskError;
use crate::groups::{extract_groups, find_group};
use crate::planner::{self, Suggestion};
use crate::store::DayStore;
use crate::transfer;
use chrono::NaiveDate;
use log::info;
use serde_json::Value;

/// School catalogs together with the booking index derived from them.
#[derive(Debug, Clone, Default)]
pub struct SchoolSnapshot {
    pub data: SchoolData,
    pub bookings: BookingIndex,
}

impl SchoolSnapshot {
    pub fn new(data: SchoolData) -> Self {
        let bookings = BookingIndex::build(&data);
        Self { data, bookings }
    }

    /// Groups for the day with ranked candidates and whoever covers them.
    pub fn view(&self, date: NaiveDate, state: &DayState) -> Vec<GroupView> {
        let absent = state.absent_teachers();
        extract_groups(&self.data, date, &absent, &state.leave_details)
            .into_iter()
            .map(|group| {
                let candidates = rank_candidates(
                    &self.data,
                    &self.bookings,
                    &state.adjustments,
                    &absent,
                    &group,
                );
                let substitute_teacher_id =
                    current_substitute(&state.adjustments, &group).map(str::to_string);
                let subject_name = self
                    .data
                    .subject(&group.subject_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                GroupView {
                    group,
                    subject_name,
                    candidates,
                    substitute_teacher_id,
                }
            })
            .collect()
    }
}

/// Resolves a self-contained snapshot without touching any desk state.
pub fn resolve(input: ResolveInput) -> ResolveOutput {
    let snapshot = SchoolSnapshot::new(input.school);
    // teachers marked absent without details still get a full-day default
    let mut state = DayState {
        leave_details: input.leave_details,
        adjustments: input.adjustments,
    };
    state.leave_details.retain(|id, _| input.absent_teacher_ids.contains(id));
    for id in input.absent_teacher_ids {
        state.leave_details.entry(id).or_default();
    }
    ResolveOutput {
        date: input.date,
        day: Day::from_date(input.date),
        groups: snapshot.view(input.date, &state),
    }
}

pub struct SubstituteDesk<S: DayStore> {
    school: SchoolSnapshot,
    store: S,
    solver_threads: i32,
}

impl<S: DayStore> SubstituteDesk<S> {
    pub fn new(school: SchoolData, store: S, solver_threads: i32) -> Self {
        Self {
            school: SchoolSnapshot::new(school),
            store,
            solver_threads,
        }
    }

    pub fn school(&self) -> &SchoolData {
        &self.school.data
    }

    /// Swaps the catalogs and rebuilds the booking index.
    pub fn replace_school(&mut self, data: SchoolData) {
        info!(
            "Replacing school data: {} teachers, {} classes, {} subjects.",
            data.teachers.len(),
            data.classes.len(),
            data.subjects.len()
        );
        self.school = SchoolSnapshot::new(data);
    }

    pub fn day(&self, date: NaiveDate) -> DayState {
        self.store.load_day(date)
    }

    pub fn day_view(&self, date: NaiveDate) -> Vec<GroupView> {
        self.school.view(date, &self.store.load_day(date))
    }

    /// Marks a teacher absent for the whole day. Lessons they were booked to
    /// cover that day are left open again.
    pub fn mark_absent(
        &mut self,
        date: NaiveDate,
        teacher_id: &str,
    ) -> Result<DayState, DeskError> {
        self.require_teacher(teacher_id)?;
        let mut state = self.store.load_day(date);
        if !state.leave_details.contains_key(teacher_id) {
            info!("Marking {} absent on {}.", teacher_id, date);
            let details = LeaveDetails::default();
            let start = details.start_index();
            state.leave_details.insert(teacher_id.to_string(), details);
            release_substitute(&mut state.adjustments, teacher_id, start);
            self.store.persist_leave_details(date, &state.leave_details);
            self.store.persist_adjustments(date, &state.adjustments);
        }
        Ok(state)
    }

    /// Brings a teacher back and drops every substitution made for them.
    pub fn unmark_absent(&mut self, date: NaiveDate, teacher_id: &str) -> DayState {
        let mut state = self.store.load_day(date);
        if state.leave_details.remove(teacher_id).is_some() {
            info!("{} is no longer absent on {}.", teacher_id, date);
            remove_for_teacher(&mut state.adjustments, teacher_id);
            self.store.persist_leave_details(date, &state.leave_details);
            self.store.persist_adjustments(date, &state.adjustments);
        }
        state
    }

    /// Changes a leave window. Substitutions for the teacher before the new
    /// start no longer apply, nor do the ones they cover from it on.
    pub fn set_leave(
        &mut self,
        date: NaiveDate,
        teacher_id: &str,
        details: LeaveDetails,
    ) -> Result<DayState, DeskError> {
        self.require_teacher(teacher_id)?;
        let mut state = self.store.load_day(date);
        let start = details.start_index();
        state.leave_details.insert(teacher_id.to_string(), details);
        remove_before(&mut state.adjustments, teacher_id, start);
        release_substitute(&mut state.adjustments, teacher_id, start);
        self.store.persist_leave_details(date, &state.leave_details);
        self.store.persist_adjustments(date, &state.adjustments);
        Ok(state)
    }

    /// Sets or clears (`""`) the substitute for the lesson `teacher_id`
    /// leaves open at `period_index`. `class_id` picks the lesson when the
    /// teacher has more than one at that index.
    pub fn assign(
        &mut self,
        date: NaiveDate,
        teacher_id: &str,
        period_index: PeriodIndex,
        class_id: Option<&str>,
        substitute_id: &str,
    ) -> Result<Vec<Adjustment>, DeskError> {
        if Day::from_date(date).is_none() {
            return Err(DeskError::NotASchoolDay(date));
        }
        if !substitute_id.is_empty() {
            self.require_teacher(substitute_id)?;
        }
        let mut state = self.store.load_day(date);
        if !state.leave_details.contains_key(teacher_id) {
            return Err(DeskError::NotAbsent(teacher_id.to_string()));
        }
        let groups = extract_groups(
            &self.school.data,
            date,
            &state.absent_teachers(),
            &state.leave_details,
        );
        let group = find_group(&groups, teacher_id, period_index, class_id)?;
        state.adjustments = assign_substitute(
            &self.school.data,
            &self.school.bookings,
            date,
            &state.adjustments,
            group,
            substitute_id,
        );
        self.store.persist_adjustments(date, &state.adjustments);
        Ok(state.adjustments)
    }

    /// Cancels every absence on `date` together with its substitutions.
    pub fn cancel_day(&mut self, date: NaiveDate) {
        info!("Cancelling all absences on {}.", date);
        self.store.persist_adjustments(date, &[]);
        self.store.persist_leave_details(date, &Default::default());
    }

    pub fn export_adjustments(&self, date: NaiveDate) -> Result<Value, DeskError> {
        transfer::export_adjustments(&self.store.load_day(date).adjustments)
    }

    /// Replaces the day's adjustments. A rejected import changes nothing.
    pub fn import_adjustments(
        &mut self,
        date: NaiveDate,
        raw: Value,
    ) -> Result<Vec<Adjustment>, DeskError> {
        let adjustments = transfer::import_adjustments(raw, date)?;
        info!("Imported {} adjustments for {}.", adjustments.len(), date);
        self.store.persist_adjustments(date, &adjustments);
        Ok(adjustments)
    }

    /// Plans substitutes for the open groups and commits them.
    pub fn auto_assign(&mut self, date: NaiveDate) -> Result<Vec<Suggestion>, DeskError> {
        let state = self.store.load_day(date);
        let suggestions = planner::plan(
            &self.school.data,
            &self.school.bookings,
            date,
            &state,
            self.solver_threads,
        )?;
        for s in &suggestions {
            self.assign(
                date,
                &s.absent_teacher_id,
                s.period_index,
                Some(&s.class_id),
                &s.substitute_teacher_id,
            )?;
        }
        Ok(suggestions)
    }

    fn require_teacher(&self, teacher_id: &str) -> Result<(), DeskError> {
        match self.school.data.teacher(teacher_id) {
            Some(_) => Ok(()),
            None => Err(DeskError::UnknownTeacher(teacher_id.to_string())),
        }
    }
}
