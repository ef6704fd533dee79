//! Canonical forms for identifiers scraped from the registration system.
//!
//! Every key used elsewhere in the crate (grid details, transcript rows,
//! curriculum lookups) is built here, so two scrape passes over the same
//! course always produce values that compare equal.

use crate::error::SrsError;
use crate::models::{
    CourseDefinition, CourseId, CurriculumItem, CurriculumStatus, GradedCourse, LetterGrade,
    RecordedGrade, Replacement, Season, SemesterId, TranscriptCourse,
};

pub const NOT_AVAILABLE: &str = "N/A";

/// Width the numeric part of a course number is padded to.
const NUMBER_WIDTH: usize = 3;

pub fn department(raw: &str) -> Result<String, SrsError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(SrsError::identifier("department", raw, "empty segment"));
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SrsError::identifier(
            "department",
            raw,
            "only letters are allowed",
        ));
    }
    Ok(value.to_ascii_uppercase())
}

/// `"101"`, `"0101"` and `" 101 "` all become `"101"`; `"5"` becomes `"005"`.
/// A trailing letter suffix (`"299a"`) is kept and uppercased.
pub fn number(raw: &str) -> Result<String, SrsError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(SrsError::identifier("course number", raw, "empty segment"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SrsError::identifier(
            "course number",
            raw,
            "only letters and digits are allowed",
        ));
    }

    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, suffix) = value.split_at(split);
    if digits.is_empty() {
        return Err(SrsError::identifier(
            "course number",
            raw,
            "must start with a digit",
        ));
    }
    if !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SrsError::identifier(
            "course number",
            raw,
            "digits may only be followed by letters",
        ));
    }

    let significant = strip_leading_zeros(digits);
    Ok(format!(
        "{:0>width$}{}",
        significant,
        suffix.to_ascii_uppercase(),
        width = NUMBER_WIDTH
    ))
}

pub fn section(raw: &str) -> Result<String, SrsError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(SrsError::identifier("section", raw, "empty segment"));
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(SrsError::identifier("section", raw, "only digits are allowed"));
    }
    Ok(strip_leading_zeros(value).to_string())
}

fn strip_leading_zeros(digits: &str) -> &str {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0"
    } else {
        stripped
    }
}

pub fn course_id(
    department_raw: &str,
    number_raw: &str,
    section_raw: &str,
) -> Result<CourseId, SrsError> {
    Ok(CourseId::from_parts(
        department(department_raw)?,
        number(number_raw)?,
        section(section_raw)?,
    ))
}

pub fn course_definition(
    department_raw: &str,
    number_raw: &str,
) -> Result<CourseDefinition, SrsError> {
    Ok(CourseDefinition::from_parts(
        department(department_raw)?,
        number(number_raw)?,
    ))
}

/// Splits `"CS 101"` / `"CS101"` into department and number.
fn split_code<'a>(raw: &'a str, kind: &'static str) -> Result<(&'a str, &'a str), SrsError> {
    let value = raw.trim();
    let split = value
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(|| SrsError::identifier(kind, raw, "missing course number"))?;
    let (dept, rest) = value.split_at(split);
    if dept.is_empty() {
        return Err(SrsError::identifier(kind, raw, "missing department"));
    }
    Ok((dept, rest))
}

/// Parses a section code such as `"CS 101-1"` or `"cs101 - 01"`.
pub fn parse_course_code(raw: &str) -> Result<CourseId, SrsError> {
    let (dept, rest) = split_code(raw, "course code")?;
    let (num, sec) = rest
        .split_once('-')
        .ok_or_else(|| SrsError::identifier("course code", raw, "missing section"))?;
    course_id(dept, num, sec)
}

/// Parses a section-less code such as `"CS 101"`.
pub fn parse_course_definition(raw: &str) -> Result<CourseDefinition, SrsError> {
    let (dept, rest) = split_code(raw, "course code")?;
    course_definition(dept, rest)
}

/// Parses an announced course, where the section is optional and dropped.
pub fn announced_course(raw: &str) -> Result<CourseDefinition, SrsError> {
    let (dept, rest) = split_code(raw, "course code")?;
    match rest.split_once('-') {
        Some((num, sec)) => course_id(dept, num, sec).map(|course| course.definition()),
        None => course_definition(dept, rest),
    }
}

pub fn season(raw: &str) -> Result<Season, SrsError> {
    let value = raw.trim();
    Season::ALL
        .into_iter()
        .find(|season| season.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| SrsError::identifier("season", raw, "expected Fall, Spring or Summer"))
}

/// Validates `"YYYY-YYYY"` where the second year follows the first.
pub fn academic_year(raw: &str) -> Result<String, SrsError> {
    let (first, second) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| SrsError::identifier("academic year", raw, "expected YYYY-YYYY"))?;
    let (first, second) = (first.trim(), second.trim());

    let parse = |part: &str| -> Result<u16, SrsError> {
        if part.len() != 4 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(SrsError::identifier(
                "academic year",
                raw,
                "years must have four digits",
            ));
        }
        part.parse()
            .map_err(|_| SrsError::identifier("academic year", raw, "years must have four digits"))
    };

    let start = parse(first)?;
    let end = parse(second)?;
    if end != start + 1 {
        return Err(SrsError::identifier(
            "academic year",
            raw,
            "second year must follow the first",
        ));
    }
    Ok(format!("{start}-{end}"))
}

pub fn semester_id(year_raw: &str, season_raw: &str) -> Result<SemesterId, SrsError> {
    Ok(SemesterId::from_parts(
        academic_year(year_raw)?,
        season(season_raw)?,
    ))
}

pub fn recorded_grade(raw: &str) -> Result<RecordedGrade, SrsError> {
    if raw.trim().eq_ignore_ascii_case(NOT_AVAILABLE) {
        return Ok(RecordedGrade::NotAvailable);
    }
    raw.parse::<LetterGrade>().map(RecordedGrade::Letter)
}

/// Credit strings are numeric or `N/A`.
pub fn credits(raw: &str) -> Result<Option<f64>, SrsError> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(credits) if credits.is_finite() && credits >= 0.0 => Ok(Some(credits)),
        _ => Err(SrsError::MalformedRecord {
            field: "credits",
            value: raw.to_string(),
        }),
    }
}

/// Builds aggregator input from a raw grade, naming the course on failure.
pub fn graded_course(
    course: &CourseDefinition,
    grade_raw: &str,
    credits: f64,
) -> Result<GradedCourse, SrsError> {
    if !credits.is_finite() || credits < 0.0 {
        return Err(SrsError::MalformedRecord {
            field: "credits",
            value: credits.to_string(),
        });
    }
    let grade = grade_raw
        .parse::<LetterGrade>()
        .map_err(|err| err.for_course(course))?;
    Ok(GradedCourse {
        course: course.clone(),
        grade,
        credits,
    })
}

pub fn transcript_course(
    department_raw: &str,
    number_raw: &str,
    name: &str,
    grade_raw: &str,
    credits_raw: &str,
) -> Result<TranscriptCourse, SrsError> {
    let course = course_definition(department_raw, number_raw)?;
    let grade = recorded_grade(grade_raw).map_err(|err| err.for_course(&course))?;
    Ok(TranscriptCourse {
        course,
        name: name.trim().to_string(),
        grade,
        credits: credits(credits_raw)?,
    })
}

pub fn curriculum_status(raw: &str) -> Result<CurriculumStatus, SrsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "successful" => Ok(CurriculumStatus::Successful),
        "not taken" => Ok(CurriculumStatus::NotTaken),
        "failed" => Ok(CurriculumStatus::Failed),
        _ => Err(SrsError::MalformedRecord {
            field: "curriculum status",
            value: raw.to_string(),
        }),
    }
}

/// Canonicalizes one curriculum row.
///
/// `course_raw` is a code like `"CS 101"` or `N/A` for elective placeholders.
/// `semester_raw` is the (year, season) pair when the course was taken, and
/// `replacement_raw` the (code, name) of a substituted course.
pub fn curriculum_item(
    course_raw: &str,
    name: &str,
    status_raw: &str,
    grade_raw: &str,
    credits_raw: &str,
    semester_raw: Option<(&str, &str)>,
    replacement_raw: Option<(&str, &str)>,
) -> Result<CurriculumItem, SrsError> {
    let course = if course_raw.trim().eq_ignore_ascii_case(NOT_AVAILABLE) {
        None
    } else {
        Some(parse_course_definition(course_raw)?)
    };
    let name = name.trim().to_string();
    let grade = recorded_grade(grade_raw).map_err(|err| match &course {
        Some(course) => err.for_course(course),
        None => err.for_course(&name),
    })?;
    let semester = semester_raw
        .map(|(year, season)| semester_id(year, season))
        .transpose()?;
    let replacement = replacement_raw
        .map(|(code, replacement_name)| -> Result<Replacement, SrsError> {
            Ok(Replacement {
                course: parse_course_definition(code)?,
                name: replacement_name.trim().to_string(),
            })
        })
        .transpose()?;

    Ok(CurriculumItem {
        course,
        name,
        status: curriculum_status(status_raw)?,
        grade,
        credits: credits(credits_raw)?,
        semester,
        replacement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_course_from_different_passes_compares_equal() {
        let a = course_id("cs", "101", "1").unwrap();
        let b = course_id(" CS ", "0101", "01").unwrap();
        let c = parse_course_code("Cs 101-1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.to_string(), "CS101-1");
    }

    #[test]
    fn short_numbers_are_left_padded() {
        assert_eq!(number("5").unwrap(), "005");
        assert_eq!(number("299a").unwrap(), "299A");
        assert_eq!(number("1010").unwrap(), "1010");
        assert_eq!(number("0").unwrap(), "000");
    }

    #[test]
    fn rejects_malformed_segments() {
        for (dept, num, sec) in [
            ("", "101", "1"),
            ("C5", "101", "1"),
            ("CS", "", "1"),
            ("CS", "A101", "1"),
            ("CS", "1A1", "1"),
            ("CS", "10-1", "1"),
            ("CS", "101", ""),
            ("CS", "101", "A"),
        ] {
            let err = course_id(dept, num, sec).unwrap_err();
            assert!(
                matches!(err, SrsError::MalformedIdentifier { .. }),
                "{dept}/{num}/{sec} gave {err:?}"
            );
        }
    }

    #[test]
    fn parses_course_codes_with_and_without_section() {
        let course = parse_course_code("math102 - 03").unwrap();
        assert_eq!(course.department(), "MATH");
        assert_eq!(course.number(), "102");
        assert_eq!(course.section(), "3");

        let definition = parse_course_definition("HUM 111").unwrap();
        assert_eq!(definition.to_string(), "HUM111");
        assert_eq!(course.definition(), parse_course_definition("MATH102").unwrap());

        assert!(parse_course_code("CS 101").is_err());
        assert!(parse_course_code("101-1").is_err());
        assert!(parse_course_definition("CS").is_err());
    }

    #[test]
    fn announced_course_section_is_optional() {
        assert_eq!(announced_course("cs 202 - 01").unwrap().to_string(), "CS202");
        assert_eq!(announced_course("CS 202").unwrap().to_string(), "CS202");
        assert!(announced_course("CS 202-x").is_err());
        assert!(announced_course("-202").is_err());
    }

    #[test]
    fn semester_identifiers_validate_year_and_season() {
        let semester = semester_id(" 2020 - 2021 ", "fall").unwrap();
        assert_eq!(semester.to_string(), "2020-2021 Fall");
        assert!(semester_id("2020-2022", "Fall").is_err());
        assert!(semester_id("20-21", "Fall").is_err());
        assert!(semester_id("2020", "Fall").is_err());
        let err = semester_id("2020-2021", "Winter").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed season 'Winter': expected Fall, Spring or Summer"
        );
    }

    #[test]
    fn credits_accept_not_available() {
        assert_eq!(credits("3").unwrap(), Some(3.0));
        assert_eq!(credits(" 1.5 ").unwrap(), Some(1.5));
        assert_eq!(credits("N/A").unwrap(), None);
        assert!(credits("three").is_err());
        assert!(credits("-1").is_err());
    }

    #[test]
    fn graded_course_reports_unknown_grade_with_course() {
        let course = parse_course_definition("CS 101").unwrap();
        let err = graded_course(&course, "NA", 3.0).unwrap_err();
        assert_eq!(err.to_string(), "unknown grade 'NA' for CS101");
        let graded = graded_course(&course, "a-", 3.0).unwrap();
        assert_eq!(graded.grade, LetterGrade::AMinus);
    }

    #[test]
    fn transcript_rows_keep_not_available_grades() {
        let row = transcript_course("ge", "100", " Orientation ", "N/A", "1").unwrap();
        assert_eq!(row.grade, RecordedGrade::NotAvailable);
        assert_eq!(row.name, "Orientation");
        let err = transcript_course("CS", "101", "Intro", "W", "3").unwrap_err();
        assert_eq!(err.to_string(), "unknown grade 'W' for CS101");
    }

    #[test]
    fn curriculum_row_with_replacement() {
        let item = curriculum_item(
            "cs 102",
            "Algorithms and Programming II",
            "Successful",
            "b+",
            "4",
            Some(("2021 - 2022", "spring")),
            Some(("CS 114", " Structured Programming ")),
        )
        .unwrap();

        assert_eq!(item.course.unwrap().to_string(), "CS102");
        assert_eq!(item.grade, RecordedGrade::Letter(LetterGrade::BPlus));
        assert_eq!(item.credits, Some(4.0));
        assert_eq!(item.semester.unwrap().to_string(), "2021-2022 Spring");
        let replacement = item.replacement.unwrap();
        assert_eq!(replacement.course.to_string(), "CS114");
        assert_eq!(replacement.name, "Structured Programming");
    }

    #[test]
    fn curriculum_row_with_placeholder_course() {
        let item = curriculum_item(
            "N/A",
            "Technical Elective",
            "Not taken",
            "N/A",
            "N/A",
            None,
            None,
        )
        .unwrap();

        assert_eq!(item.course, None);
        assert_eq!(item.status, CurriculumStatus::NotTaken);
        assert_eq!(item.grade, RecordedGrade::NotAvailable);
        assert_eq!(item.credits, None);
        assert_eq!(item.semester, None);
        assert_eq!(item.replacement, None);
    }

    #[test]
    fn curriculum_row_errors_name_the_row() {
        let err = curriculum_item("N/A", "Free Elective", "Failed", "X", "3", None, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown grade 'X' for Free Elective");
        assert!(curriculum_item("CS 101", "Intro", "Done", "A", "3", None, None).is_err());
        assert!(
            curriculum_item("CS 101", "Intro", "Successful", "A", "3", Some(("2021", "Fall")), None)
                .is_err()
        );
        assert!(curriculum_item(
            "CS 101",
            "Intro",
            "Successful",
            "A",
            "3",
            None,
            Some(("N/A", "Anything"))
        )
        .is_err());
    }

    #[test]
    fn curriculum_status_is_case_insensitive() {
        assert_eq!(curriculum_status("Not Taken").unwrap(), CurriculumStatus::NotTaken);
        assert!(curriculum_status("Pending").is_err());
    }
}
