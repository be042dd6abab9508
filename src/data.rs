use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// Type aliases for clarity
pub type TeacherId = String;
pub type ClassId = String;
pub type SubjectId = String;
pub type PeriodIndex = usize;

/// A label carried in both languages the school prints on its reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayName {
    pub primary: String,
    pub secondary: String,
}

impl DisplayName {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Joins several names language by language, e.g. `7A, 7B`.
    pub fn combine<'a>(names: impl IntoIterator<Item = &'a DisplayName>) -> Self {
        let (primary, secondary): (Vec<&str>, Vec<&str>) = names
            .into_iter()
            .map(|n| (n.primary.as_str(), n.secondary.as_str()))
            .unzip();
        Self::new(primary.join(", "), secondary.join(", "))
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secondary.is_empty() {
            write!(f, "{}", self.primary)
        } else {
            write!(f, "{} / {}", self.primary, self.secondary)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: DisplayName,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub contact_number: Option<String>,
}

impl Teacher {
    pub fn salutation(&self) -> &'static str {
        match self.gender {
            Gender::Male => "Mr.",
            Gender::Female => "Ms.",
            Gender::Unspecified => "",
        }
    }

    /// Name prefixed with the salutation in the primary language.
    pub fn display_name(&self) -> String {
        match self.salutation() {
            "" => self.name.primary.clone(),
            s => format!("{} {}", s, self.name.primary),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: DisplayName,
}

/// School days. Saturday and Sunday have no timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub fn from_date(date: NaiveDate) -> Option<Day> {
        match date.weekday() {
            Weekday::Mon => Some(Day::Monday),
            Weekday::Tue => Some(Day::Tuesday),
            Weekday::Wed => Some(Day::Wednesday),
            Weekday::Thu => Some(Day::Thursday),
            Weekday::Fri => Some(Day::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
        };
        f.write_str(name)
    }
}

/// One teaching entry inside a period. Slots sharing a `joint_period_id`
/// across classes are the same physical lesson.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSlot {
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub joint_period_id: Option<String>,
}

/// day -> periods in order -> slots taught in that period
pub type Timetable = BTreeMap<Day, Vec<Vec<PeriodSlot>>>;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSubject {
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    pub id: ClassId,
    pub name: DisplayName,
    #[serde(default)]
    pub in_charge: Option<TeacherId>,
    #[serde(default)]
    pub subjects: Vec<ClassSubject>,
    #[serde(default)]
    pub timetable: Timetable,
}

impl SchoolClass {
    pub fn periods(&self, day: Day) -> &[Vec<PeriodSlot>] {
        self.timetable.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn teaches(&self, teacher_id: &str) -> bool {
        self.subjects.iter().any(|s| s.teacher_id == teacher_id)
    }
}

/// Catalogs the resolver reads from.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolData {
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub classes: Vec<SchoolClass>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl SchoolData {
    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn class(&self, id: &str) -> Option<&SchoolClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Unknown ids render as an empty name.
    pub fn class_name(&self, id: &str) -> DisplayName {
        self.class(id).map(|c| c.name.clone()).unwrap_or_default()
    }

    pub fn class_names<'a>(&self, ids: impl IntoIterator<Item = &'a ClassId>) -> DisplayName {
        let names: Vec<DisplayName> = ids.into_iter().map(|id| self.class_name(id)).collect();
        DisplayName::combine(&names)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    #[default]
    Full,
    Half,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDetails {
    pub leave_type: LeaveType,
    /// 1-based period the absence starts from; only read for half-day leave.
    #[serde(default = "first_period")]
    pub start_period: u32,
}

fn first_period() -> u32 {
    1
}

impl Default for LeaveDetails {
    fn default() -> Self {
        Self {
            leave_type: LeaveType::Full,
            start_period: first_period(),
        }
    }
}

impl LeaveDetails {
    /// First vacant period index.
    pub fn start_index(&self) -> PeriodIndex {
        match self.leave_type {
            LeaveType::Full => 0,
            LeaveType::Half => self.start_period.saturating_sub(1) as PeriodIndex,
        }
    }
}

pub type LeaveMap = BTreeMap<TeacherId, LeaveDetails>;

/// A substitute already booked elsewhere at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub class_names: DisplayName,
}

/// A committed substitution for one class in one period.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    pub id: String,
    pub date: NaiveDate,
    pub day: Day,
    pub period_index: PeriodIndex,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub original_teacher_id: TeacherId,
    pub substitute_teacher_id: TeacherId,
    #[serde(default)]
    pub conflict: Option<Conflict>,
}

impl Adjustment {
    pub fn key(
        date: NaiveDate,
        day: Day,
        period_index: PeriodIndex,
        class_id: &str,
        original_teacher_id: &str,
    ) -> String {
        format!("{date}-{day}-{period_index}-{class_id}-{original_teacher_id}")
    }
}

/// Everything recorded for one date. The absent set is the key set of
/// `leave_details`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayState {
    #[serde(default)]
    pub leave_details: LeaveMap,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

impl DayState {
    pub fn absent_teachers(&self) -> BTreeSet<TeacherId> {
        self.leave_details.keys().cloned().collect()
    }
}

/// How one joint or single lesson is identified when grouping vacancies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum GroupKey {
    Joint(String),
    Single(ClassId),
}

/// A vacancy needing one substitute decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionGroup {
    pub absent_teacher_id: TeacherId,
    pub day: Day,
    pub period_index: PeriodIndex,
    pub key: GroupKey,
    pub class_ids: Vec<ClassId>,
    pub subject_id: SubjectId,
    pub class_names: DisplayName,
}

impl SubstitutionGroup {
    /// Whether `adjustment` fills one of this group's classes.
    pub fn covers(&self, adjustment: &Adjustment) -> bool {
        adjustment.period_index == self.period_index
            && adjustment.original_teacher_id == self.absent_teacher_id
            && self.class_ids.contains(&adjustment.class_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    Substitution,
    #[serde(rename_all = "camelCase")]
    DoubleBook { class_names: DisplayName },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    InCharge,
    TeachesClass,
    Available,
    Unavailable(UnavailableReason),
}

impl Availability {
    /// Position in the preference order, lower is better.
    pub fn rank(&self) -> u8 {
        match self {
            Availability::InCharge => 0,
            Availability::TeachesClass => 1,
            Availability::Available => 2,
            Availability::Unavailable(UnavailableReason::Substitution) => 3,
            Availability::Unavailable(UnavailableReason::DoubleBook { .. }) => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub teacher_id: TeacherId,
    pub display_name: String,
    pub availability: Availability,
}

/// A group as shown to the person choosing substitutes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub group: SubstitutionGroup,
    pub subject_name: DisplayName,
    pub candidates: Vec<Candidate>,
    pub substitute_teacher_id: Option<TeacherId>,
}

/// Stateless resolve request: a full snapshot in, ranked vacancies out.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveInput {
    pub school: SchoolData,
    pub date: NaiveDate,
    pub absent_teacher_ids: BTreeSet<TeacherId>,
    #[serde(default)]
    pub leave_details: LeaveMap,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOutput {
    pub date: NaiveDate,
    pub day: Option<Day>,
    pub groups: Vec<GroupView>,
}
