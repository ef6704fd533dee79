use std::fmt;

/// Errors raised while normalizing records or aggregating grades.
///
/// Every variant carries the offending raw value so callers can surface a
/// precise message ("unknown grade 'NA' for CS101") instead of a generic one.
#[derive(Debug, Clone, PartialEq)]
pub enum SrsError {
    MalformedIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },
    InvalidScheduleEntry {
        course: String,
        value: String,
        reason: &'static str,
    },
    UnknownGrade {
        course: Option<String>,
        grade: String,
    },
    MalformedRecord {
        field: &'static str,
        value: String,
    },
}

impl SrsError {
    pub(crate) fn identifier(kind: &'static str, value: &str, reason: &'static str) -> Self {
        SrsError::MalformedIdentifier {
            kind,
            value: value.to_string(),
            reason,
        }
    }

    /// Attaches a course label to an `UnknownGrade` raised without one.
    pub fn for_course(self, course: impl fmt::Display) -> Self {
        match self {
            SrsError::UnknownGrade { course: None, grade } => SrsError::UnknownGrade {
                course: Some(course.to_string()),
                grade,
            },
            other => other,
        }
    }
}

impl std::error::Error for SrsError {}

impl fmt::Display for SrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SrsError::MalformedIdentifier {
                kind,
                value,
                reason,
            } => write!(f, "malformed {kind} '{value}': {reason}"),
            SrsError::InvalidScheduleEntry {
                course,
                value,
                reason,
            } => write!(f, "invalid schedule entry for {course} ('{value}'): {reason}"),
            SrsError::UnknownGrade {
                course: Some(course),
                grade,
            } => write!(f, "unknown grade '{grade}' for {course}"),
            SrsError::UnknownGrade { course: None, grade } => {
                write!(f, "unknown grade '{grade}'")
            }
            SrsError::MalformedRecord { field, value } => {
                write!(f, "malformed {field} value '{value}'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_grade_message_names_course() {
        let err = SrsError::UnknownGrade {
            course: None,
            grade: "NA".to_string(),
        }
        .for_course("CS101");
        assert_eq!(err.to_string(), "unknown grade 'NA' for CS101");
    }

    #[test]
    fn for_course_keeps_existing_label() {
        let err = SrsError::UnknownGrade {
            course: Some("MATH102".to_string()),
            grade: "X".to_string(),
        }
        .for_course("CS101");
        assert_eq!(err.to_string(), "unknown grade 'X' for MATH102");
    }
}
