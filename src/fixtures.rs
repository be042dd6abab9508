//! Shared builders for unit tests.

use crate::data::{
    ClassSubject, Day, DisplayName, Gender, LeaveDetails, LeaveType, PeriodSlot, SchoolClass,
    SchoolData, Subject, Teacher,
};
use chrono::NaiveDate;

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 13).unwrap()
}

pub fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()
}

pub fn slot(subject: &str, teacher: &str, joint: Option<&str>) -> PeriodSlot {
    PeriodSlot {
        subject_id: subject.to_string(),
        teacher_id: teacher.to_string(),
        joint_period_id: joint.map(str::to_string),
    }
}

pub fn half_day(start_period: u32) -> LeaveDetails {
    LeaveDetails {
        leave_type: LeaveType::Half,
        start_period,
    }
}

pub fn binding(subject: &str, teacher: &str) -> ClassSubject {
    ClassSubject {
        subject_id: subject.to_string(),
        teacher_id: teacher.to_string(),
    }
}

pub fn teacher(id: &str) -> Teacher {
    Teacher {
        id: id.to_string(),
        name: DisplayName::new(id.to_uppercase(), format!("{id}-alt")),
        gender: Gender::Unspecified,
        contact_number: None,
    }
}

pub fn class_with(id: &str, day: Day, periods: Vec<Vec<PeriodSlot>>) -> SchoolClass {
    SchoolClass {
        id: id.to_string(),
        name: DisplayName::new(id.to_uppercase(), format!("{id}-alt")),
        in_charge: None,
        subjects: Vec::new(),
        timetable: [(day, periods)].into_iter().collect(),
    }
}

/// Monday timetable, four periods:
///
/// - c1: t1 math p1, t4 eng p2, t1+c2 joint science p3, t5 art p4
/// - c2: t5 art p1, t6 eng p2, t1+c1 joint science p3, t4 math p4
/// - c3: t6 hist p1, t3 geo p2, t3 geo p3, t6 hist p4
///
/// t2 teaches nothing on Monday. t4 is in charge of c1. t5 teaches c2.
pub fn school() -> SchoolData {
    let mut c1 = class_with(
        "c1",
        Day::Monday,
        vec![
            vec![slot("math", "t1", None)],
            vec![slot("eng", "t4", None)],
            vec![slot("sci", "t1", Some("j1"))],
            vec![slot("art", "t5", None)],
        ],
    );
    c1.in_charge = Some("t4".into());
    c1.subjects = vec![
        binding("math", "t1"),
        binding("eng", "t4"),
        binding("art", "t5"),
    ];

    let mut c2 = class_with(
        "c2",
        Day::Monday,
        vec![
            vec![slot("art", "t5", None)],
            vec![slot("eng", "t6", None)],
            vec![slot("sci", "t1", Some("j1"))],
            vec![slot("math", "t4", None)],
        ],
    );
    c2.subjects = vec![
        binding("art", "t5"),
        binding("eng", "t6"),
        binding("math", "t4"),
    ];

    let c3 = class_with(
        "c3",
        Day::Monday,
        vec![
            vec![slot("hist", "t6", None)],
            vec![slot("geo", "t3", None)],
            vec![slot("geo", "t3", None)],
            vec![slot("hist", "t6", None)],
        ],
    );

    SchoolData {
        teachers: ["t1", "t2", "t3", "t4", "t5", "t6"]
            .into_iter()
            .map(teacher)
            .collect(),
        classes: vec![c1, c2, c3],
        subjects: ["math", "eng", "sci", "art", "hist", "geo"]
            .into_iter()
            .map(|id| Subject {
                id: id.to_string(),
                name: DisplayName::new(id, ""),
            })
            .collect(),
    }
}
