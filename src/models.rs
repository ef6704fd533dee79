use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SrsError;
use crate::normalize;

/// Term within an academic year, ordered as the registrar lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Fall,
    Spring,
    Summer,
}

impl Season {
    pub const ALL: [Season; 3] = [Season::Fall, Season::Spring, Season::Summer];

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Fall => "Fall",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize::season(s)
    }
}

/// A registered section: `CS 101-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCourseId")]
pub struct CourseId {
    department: String,
    number: String,
    section: String,
}

#[derive(Deserialize)]
struct RawCourseId {
    department: String,
    number: String,
    section: String,
}

impl TryFrom<RawCourseId> for CourseId {
    type Error = SrsError;

    fn try_from(raw: RawCourseId) -> Result<Self, Self::Error> {
        normalize::course_id(&raw.department, &raw.number, &raw.section)
    }
}

impl CourseId {
    pub(crate) fn from_parts(department: String, number: String, section: String) -> Self {
        CourseId {
            department,
            number,
            section,
        }
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Drops the section, keeping subject and number.
    pub fn definition(&self) -> CourseDefinition {
        CourseDefinition {
            department: self.department.clone(),
            number: self.number.clone(),
        }
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", self.department, self.number, self.section)
    }
}

impl FromStr for CourseId {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize::parse_course_code(s)
    }
}

/// Subject and number without a section, used by transcripts and curricula.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCourseDefinition")]
pub struct CourseDefinition {
    department: String,
    number: String,
}

#[derive(Deserialize)]
struct RawCourseDefinition {
    department: String,
    number: String,
}

impl TryFrom<RawCourseDefinition> for CourseDefinition {
    type Error = SrsError;

    fn try_from(raw: RawCourseDefinition) -> Result<Self, Self::Error> {
        normalize::course_definition(&raw.department, &raw.number)
    }
}

impl CourseDefinition {
    pub(crate) fn from_parts(department: String, number: String) -> Self {
        CourseDefinition { department, number }
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn number(&self) -> &str {
        &self.number
    }
}

impl fmt::Display for CourseDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.department, self.number)
    }
}

impl FromStr for CourseDefinition {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize::parse_course_definition(s)
    }
}

/// `2020-2021 Fall`. Orders by academic year, then season.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSemesterId")]
pub struct SemesterId {
    year: String,
    season: Season,
}

#[derive(Deserialize)]
struct RawSemesterId {
    year: String,
    season: String,
}

impl TryFrom<RawSemesterId> for SemesterId {
    type Error = SrsError;

    fn try_from(raw: RawSemesterId) -> Result<Self, Self::Error> {
        normalize::semester_id(&raw.year, &raw.season)
    }
}

impl SemesterId {
    pub(crate) fn from_parts(year: String, season: Season) -> Self {
        SemesterId { year, season }
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn season(&self) -> Season {
        self.season
    }
}

impl fmt::Display for SemesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.year, self.season)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl LetterGrade {
    pub const ALL: [LetterGrade; 11] = [
        LetterGrade::A,
        LetterGrade::AMinus,
        LetterGrade::BPlus,
        LetterGrade::B,
        LetterGrade::BMinus,
        LetterGrade::CPlus,
        LetterGrade::C,
        LetterGrade::CMinus,
        LetterGrade::DPlus,
        LetterGrade::D,
        LetterGrade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::DPlus => "D+",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterGrade {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LetterGrade::ALL
            .into_iter()
            .find(|grade| grade.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SrsError::UnknownGrade {
                course: None,
                grade: s.to_string(),
            })
    }
}

/// Grade column of transcript and curriculum rows, which may read `N/A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedGrade {
    Letter(LetterGrade),
    NotAvailable,
}

impl RecordedGrade {
    pub fn letter(self) -> Option<LetterGrade> {
        match self {
            RecordedGrade::Letter(grade) => Some(grade),
            RecordedGrade::NotAvailable => None,
        }
    }
}

impl fmt::Display for RecordedGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedGrade::Letter(grade) => grade.fmt(f),
            RecordedGrade::NotAvailable => f.write_str(normalize::NOT_AVAILABLE),
        }
    }
}

impl FromStr for RecordedGrade {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize::recorded_grade(s)
    }
}

impl Serialize for RecordedGrade {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordedGrade {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of aggregator input: a counted letter grade and its credit weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedCourse {
    pub course: CourseDefinition,
    pub grade: LetterGrade,
    pub credits: f64,
}

/// Credit and point totals for one scope (semester, carry-in, or grand).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub credits: f64,
    pub points: f64,
}

impl Totals {
    pub fn new(credits: f64, points: f64) -> Self {
        Totals { credits, points }
    }

    /// Points per credit; zero when no credits were counted.
    pub fn average(&self) -> f64 {
        if self.credits == 0.0 {
            0.0
        } else {
            self.points / self.credits
        }
    }
}

impl std::ops::Add for Totals {
    type Output = Totals;

    fn add(self, rhs: Totals) -> Totals {
        Totals {
            credits: self.credits + rhs.credits,
            points: self.points + rhs.points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsBreakdown {
    pub semester_total: f64,
    pub previous_total: f64,
    pub grand_total: f64,
}

/// Snapshot produced by the aggregator. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CgpaCalculation {
    pub gpa: f64,
    pub cgpa: f64,
    pub standing: String,
    pub credits: TotalsBreakdown,
    pub points: TotalsBreakdown,
}

impl CgpaCalculation {
    pub fn semester_total(&self) -> Totals {
        Totals::new(self.credits.semester_total, self.points.semester_total)
    }

    pub fn previous_total(&self) -> Totals {
        Totals::new(self.credits.previous_total, self.points.previous_total)
    }

    pub fn grand_total(&self) -> Totals {
        Totals::new(self.credits.grand_total, self.points.grand_total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCourse {
    pub course: CourseDefinition,
    pub name: String,
    pub grade: RecordedGrade,
    pub credits: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSemester {
    pub semester: SemesterId,
    pub gpa: String,
    pub cgpa: String,
    pub standing: String,
    pub courses: Vec<TranscriptCourse>,
}

impl TranscriptSemester {
    /// Rows that can feed the aggregator. `N/A` grades or credits are left out.
    pub fn graded_courses(&self) -> Vec<GradedCourse> {
        self.courses
            .iter()
            .filter_map(|row| {
                let grade = row.grade.letter()?;
                let credits = row.credits?;
                Some(GradedCourse {
                    course: row.course.clone(),
                    grade,
                    credits,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurriculumStatus {
    Successful,
    #[serde(rename = "Not taken")]
    NotTaken,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    pub course: CourseDefinition,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumItem {
    /// `None` for elective placeholders the registrar lists as `N/A`.
    pub course: Option<CourseDefinition>,
    pub name: String,
    pub status: CurriculumStatus,
    pub grade: RecordedGrade,
    pub credits: Option<f64>,
    pub semester: Option<SemesterId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<Replacement>,
}

pub type CurriculumSemester = Vec<CurriculumItem>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurriculumProgress {
    pub successful: usize,
    pub not_taken: usize,
    pub failed: usize,
    pub earned_credits: f64,
    pub replacements: Vec<(Option<CourseDefinition>, Replacement)>,
}

impl CurriculumProgress {
    pub fn from_curriculum(curriculum: &[CurriculumSemester]) -> Self {
        let mut progress = CurriculumProgress::default();

        for item in curriculum.iter().flatten() {
            match item.status {
                CurriculumStatus::Successful => {
                    progress.successful += 1;
                    progress.earned_credits += item.credits.unwrap_or(0.0);
                }
                CurriculumStatus::NotTaken => progress.not_taken += 1,
                CurriculumStatus::Failed => progress.failed += 1,
            }

            if let Some(replacement) = &item.replacement {
                progress
                    .replacements
                    .push((item.course.clone(), replacement.clone()));
            }
        }

        progress
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredCourse {
    pub code: CourseId,
    pub name: String,
    pub instructor: String,
    pub credits: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterCourses {
    pub semester: SemesterId,
    pub courses: Vec<RegisteredCourse>,
}

impl SemesterCourses {
    /// Credit weights keyed by course definition, for pairing with announced grades.
    pub fn credit_weights(&self) -> BTreeMap<CourseDefinition, f64> {
        self.courses
            .iter()
            .map(|course| (course.code.definition(), course.credits))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub course_name: String,
    pub exam_type: String,
    pub starting_time: NaiveDateTime,
    pub time_block: String,
    pub classrooms: Vec<String>,
}

/// One row of a letter grade announcement.
///
/// Announcements list the course as a code string, with or without a section
/// (`"CS 101-1"` or `"CS 101"`). Only the definition is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterGradeResult {
    #[serde(with = "announced_course")]
    pub course: CourseDefinition,
    pub grade: LetterGrade,
}

mod announced_course {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::CourseDefinition;
    use crate::normalize;

    pub fn serialize<S: Serializer>(
        course: &CourseDefinition,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(course)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<CourseDefinition, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize::announced_course(&raw).map_err(serde::de::Error::custom)
    }
}

/// Announced grades joined with registered credits; unmatched courses are returned as-is.
pub fn grade_announcement_entries(
    results: &[LetterGradeResult],
    registered: &SemesterCourses,
) -> (Vec<GradedCourse>, Vec<CourseDefinition>) {
    let weights = registered.credit_weights();
    let mut graded = Vec::new();
    let mut unmatched = Vec::new();

    for result in results {
        match weights.get(&result.course) {
            Some(&credits) => graded.push(GradedCourse {
                course: result.course.clone(),
                grade: result.grade,
                credits,
            }),
            None => unmatched.push(result.course.clone()),
        }
    }

    (graded, unmatched)
}

/// Student summary card. Values are kept as the registrar displays them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoCard {
    pub student: StudentInfo,
    pub advisor: AdvisorInfo,
    pub academic: AcademicInfo,
    pub scholarship: ScholarshipInfo,
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub id: String,
    pub national_id: String,
    pub full_name: String,
    pub status: String,
    pub faculty: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorInfo {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicInfo {
    pub standing: String,
    pub gpa: String,
    pub cgpa: String,
    pub registration_semester: String,
    pub curriculum_semester: String,
    #[serde(rename = "class")]
    pub class_level: String,
    pub nominal_credit_load: String,
    pub course_limits: CourseLimits,
    pub ranking: Ranking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseLimits {
    pub lower: String,
    pub upper: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub cohort: String,
    pub agpa: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipInfo {
    pub by_placement: String,
    pub merit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub contact_email: String,
    pub bilkent_email: String,
    pub mobile_phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarEventType {
    StudentAffairs,
    Vacation,
    EnglishPrep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicCalendarItem {
    pub date: String,
    pub event: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CalendarEventType>,
}

pub type AcademicCalendar = Vec<AcademicCalendarItem>;

/// One row of a course grade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeItem {
    pub title: String,
    pub date: String,
    pub grade: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCategory {
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<GradeItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseGrades {
    pub title: String,
    pub categories: Vec<GradeCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceItem {
    pub title: String,
    pub date: String,
    pub attendance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAttendance {
    pub title: String,
    pub data: Vec<AttendanceItem>,
    /// As displayed, e.g. `"92.50%"`.
    pub ratio: String,
}
