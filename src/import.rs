use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::models::{CourseId, GradedCourse};
use crate::normalize;
use crate::schedule::RawMeeting;

/// Grades that are recorded but never counted toward GPA.
const NON_COUNTING_GRADES: [&str; 4] = ["", normalize::NOT_AVAILABLE, "W", "I"];

#[derive(Deserialize)]
struct MeetingRow {
    department: String,
    number: String,
    section: String,
    day: String,
    slot: String,
    duration: String,
    #[serde(default)]
    rooms: String,
}

#[derive(Deserialize)]
struct GradeRow {
    department: String,
    number: String,
    section: String,
    grade: String,
    credits: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeImport {
    pub entries: Vec<GradedCourse>,
    /// Rows left out before aggregation, with the grade they carried.
    pub filtered: Vec<(CourseId, String)>,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Rooms are `;`-separated inside one column.
pub fn read_meetings<R: Read>(reader: R) -> anyhow::Result<Vec<RawMeeting>> {
    let mut reader = csv_reader(reader);
    let mut meetings = Vec::new();

    for (index, result) in reader.deserialize::<MeetingRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("meetings row {line}"))?;
        let course = normalize::course_id(&row.department, &row.number, &row.section)
            .with_context(|| format!("meetings row {line}"))?;
        let rooms = row
            .rooms
            .split(';')
            .map(str::trim)
            .filter(|room| !room.is_empty())
            .map(str::to_string)
            .collect();

        meetings.push(RawMeeting {
            course,
            day: row.day,
            start_slot: row.slot,
            duration: row.duration,
            rooms,
        });
    }

    Ok(meetings)
}

pub fn import_meetings(csv_path: &Path) -> anyhow::Result<Vec<RawMeeting>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let meetings = read_meetings(file)?;
    info!(path = %csv_path.display(), meetings = meetings.len(), "imported meetings");
    Ok(meetings)
}

/// Unknown grades other than the non-counting placeholders fail the import.
pub fn read_grades<R: Read>(reader: R) -> anyhow::Result<GradeImport> {
    let mut reader = csv_reader(reader);
    let mut import = GradeImport::default();

    for (index, result) in reader.deserialize::<GradeRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("grades row {line}"))?;
        let course = normalize::course_id(&row.department, &row.number, &row.section)
            .with_context(|| format!("grades row {line}"))?;

        let placeholder = NON_COUNTING_GRADES
            .iter()
            .any(|grade| grade.eq_ignore_ascii_case(&row.grade));
        let credits = normalize::credits(&row.credits)
            .with_context(|| format!("grades row {line}"))?;

        match (placeholder, credits) {
            (false, Some(credits)) => {
                let entry = normalize::graded_course(&course.definition(), &row.grade, credits)
                    .with_context(|| format!("grades row {line}"))?;
                import.entries.push(entry);
            }
            _ => import.filtered.push((course, row.grade)),
        }
    }

    Ok(import)
}

pub fn import_grades(csv_path: &Path) -> anyhow::Result<GradeImport> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let import = read_grades(file)?;
    info!(
        path = %csv_path.display(),
        counted = import.entries.len(),
        filtered = import.filtered.len(),
        "imported grades"
    );
    Ok(import)
}
