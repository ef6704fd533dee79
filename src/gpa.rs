use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SrsError;
use crate::models::{
    CgpaCalculation, GradedCourse, LetterGrade, SemesterId, Totals, TotalsBreakdown,
    TranscriptSemester,
};

/// Letter grade to point value. Institutions may supply their own scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradePointTable(BTreeMap<LetterGrade, f64>);

impl Default for GradePointTable {
    fn default() -> Self {
        GradePointTable(
            [
                (LetterGrade::A, 4.00),
                (LetterGrade::AMinus, 3.70),
                (LetterGrade::BPlus, 3.30),
                (LetterGrade::B, 3.00),
                (LetterGrade::BMinus, 2.70),
                (LetterGrade::CPlus, 2.30),
                (LetterGrade::C, 2.00),
                (LetterGrade::CMinus, 1.70),
                (LetterGrade::DPlus, 1.30),
                (LetterGrade::D, 1.00),
                (LetterGrade::F, 0.00),
            ]
            .into_iter()
            .collect(),
        )
    }
}

impl GradePointTable {
    pub fn new(values: BTreeMap<LetterGrade, f64>) -> Result<Self, SrsError> {
        let table = GradePointTable(values);
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), SrsError> {
        for (grade, value) in &self.0 {
            if !value.is_finite() || *value < 0.0 {
                return Err(SrsError::MalformedRecord {
                    field: "grade point value",
                    value: format!("{grade}={value}"),
                });
            }
        }
        Ok(())
    }

    pub fn point_value(&self, grade: LetterGrade) -> Result<f64, SrsError> {
        self.0
            .get(&grade)
            .copied()
            .ok_or_else(|| SrsError::UnknownGrade {
                course: None,
                grade: grade.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingBand {
    pub min_cgpa: f64,
    pub label: String,
}

/// Standing bands, kept sorted from the highest minimum down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StandingBand>", into = "Vec<StandingBand>")]
pub struct StandingTable {
    bands: Vec<StandingBand>,
}

impl StandingTable {
    pub fn new(mut bands: Vec<StandingBand>) -> Result<Self, SrsError> {
        if bands.is_empty() {
            return Err(SrsError::MalformedRecord {
                field: "standing table",
                value: "[]".to_string(),
            });
        }
        if let Some(band) = bands.iter().find(|band| !band.min_cgpa.is_finite()) {
            return Err(SrsError::MalformedRecord {
                field: "standing threshold",
                value: format!("{}={}", band.label, band.min_cgpa),
            });
        }
        bands.sort_by(|a, b| b.min_cgpa.total_cmp(&a.min_cgpa));
        Ok(StandingTable { bands })
    }

    pub fn bands(&self) -> &[StandingBand] {
        &self.bands
    }

    /// First band whose minimum the CGPA reaches; below every band, the lowest one.
    pub fn classify(&self, cgpa: f64) -> &str {
        self.bands
            .iter()
            .find(|band| cgpa >= band.min_cgpa)
            .or_else(|| self.bands.last())
            .map(|band| band.label.as_str())
            .unwrap_or_default()
    }
}

impl Default for StandingTable {
    fn default() -> Self {
        let bands = [
            (3.50, "High Honor"),
            (3.00, "Honor"),
            (2.00, "Satisfactory"),
            (1.80, "Probation"),
            (0.00, "Unsatisfactory"),
        ]
        .into_iter()
        .map(|(min_cgpa, label)| StandingBand {
            min_cgpa,
            label: label.to_string(),
        })
        .collect();
        StandingTable { bands }
    }
}

impl TryFrom<Vec<StandingBand>> for StandingTable {
    type Error = SrsError;

    fn try_from(bands: Vec<StandingBand>) -> Result<Self, Self::Error> {
        StandingTable::new(bands)
    }
}

impl From<StandingTable> for Vec<StandingBand> {
    fn from(table: StandingTable) -> Self {
        table.bands
    }
}

/// Credit and point inputs must be finite and non-negative.
fn check_amount(
    field: &'static str,
    value: f64,
    label: impl std::fmt::Display,
) -> Result<(), SrsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SrsError::MalformedRecord {
            field,
            value: format!("{label}={value}"),
        })
    }
}

/// Totals for one batch of graded courses.
pub fn semester_totals(
    entries: &[GradedCourse],
    grade_points: &GradePointTable,
) -> Result<Totals, SrsError> {
    let mut totals = Totals::default();
    for entry in entries {
        check_amount("credits", entry.credits, &entry.course)?;
        let value = grade_points
            .point_value(entry.grade)
            .map_err(|err| err.for_course(&entry.course))?;
        totals.credits += entry.credits;
        totals.points += entry.credits * value;
    }
    Ok(totals)
}

/// Computes GPA, CGPA and standing for one semester on top of prior totals.
///
/// Nothing is rounded here; callers format for display.
pub fn calculate(
    entries: &[GradedCourse],
    previous: Totals,
    grade_points: &GradePointTable,
    standings: &StandingTable,
) -> Result<CgpaCalculation, SrsError> {
    check_amount("previous credits", previous.credits, "previous")?;
    check_amount("previous points", previous.points, "previous")?;
    let semester = semester_totals(entries, grade_points)?;
    let grand = previous + semester;
    let gpa = semester.average();
    let cgpa = grand.average();

    debug!(
        courses = entries.len(),
        semester_credits = semester.credits,
        grand_credits = grand.credits,
        gpa,
        cgpa,
        "aggregated grades"
    );

    Ok(CgpaCalculation {
        gpa,
        cgpa,
        standing: standings.classify(cgpa).to_string(),
        credits: TotalsBreakdown {
            semester_total: semester.credits,
            previous_total: previous.credits,
            grand_total: grand.credits,
        },
        points: TotalsBreakdown {
            semester_total: semester.points,
            previous_total: previous.points,
            grand_total: grand.points,
        },
    })
}

/// Runs `calculate` semester by semester in chronological order, carrying each
/// grand total into the next semester's previous total.
pub fn chain_semesters(
    prior: Totals,
    semesters: &[(SemesterId, Vec<GradedCourse>)],
    grade_points: &GradePointTable,
    standings: &StandingTable,
) -> Result<Vec<(SemesterId, CgpaCalculation)>, SrsError> {
    let mut ordered: Vec<&(SemesterId, Vec<GradedCourse>)> = semesters.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0));

    let mut previous = prior;
    let mut results = Vec::with_capacity(ordered.len());
    for (semester, entries) in ordered {
        let result = calculate(entries, previous, grade_points, standings)?;
        previous = result.grand_total();
        results.push((semester.clone(), result));
    }
    Ok(results)
}

/// Recomputes every transcript semester from its counted rows.
pub fn chain_transcript(
    transcript: &[TranscriptSemester],
    grade_points: &GradePointTable,
    standings: &StandingTable,
) -> Result<Vec<(SemesterId, CgpaCalculation)>, SrsError> {
    let semesters: Vec<(SemesterId, Vec<GradedCourse>)> = transcript
        .iter()
        .map(|semester| (semester.semester.clone(), semester.graded_courses()))
        .collect();
    chain_semesters(Totals::default(), &semesters, grade_points, standings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordedGrade, TranscriptCourse};
    use crate::normalize::{parse_course_definition, semester_id};

    fn entry(code: &str, grade: LetterGrade, credits: f64) -> GradedCourse {
        GradedCourse {
            course: parse_course_definition(code).unwrap(),
            grade,
            credits,
        }
    }

    #[test]
    fn default_table_matches_published_scale() {
        let table = GradePointTable::default();
        let expected = [4.00, 3.70, 3.30, 3.00, 2.70, 2.30, 2.00, 1.70, 1.30, 1.00, 0.00];
        for (grade, value) in LetterGrade::ALL.into_iter().zip(expected) {
            assert_eq!(table.point_value(grade).unwrap(), value);
        }
    }

    #[test]
    fn semester_on_top_of_previous_totals() {
        let entries = vec![
            entry("CS 101", LetterGrade::A, 3.0),
            entry("MATH 101", LetterGrade::BPlus, 4.0),
        ];
        let result = calculate(
            &entries,
            Totals::new(60.0, 210.0),
            &GradePointTable::default(),
            &StandingTable::default(),
        )
        .unwrap();

        assert!((result.credits.semester_total - 7.0).abs() < 1e-9);
        assert!((result.points.semester_total - 25.2).abs() < 1e-9);
        assert!((result.gpa - 3.6).abs() < 1e-9);
        assert!((result.credits.grand_total - 67.0).abs() < 1e-9);
        assert!((result.points.grand_total - 235.2).abs() < 1e-9);
        assert!((result.cgpa - 235.2 / 67.0).abs() < 1e-9);
        assert!((result.cgpa - 3.5104).abs() < 1e-4);
        assert_eq!(result.credits.previous_total, 60.0);
        assert_eq!(result.points.previous_total, 210.0);
        assert_eq!(result.standing, "High Honor");
    }

    #[test]
    fn zero_credits_give_zero_averages() {
        let result = calculate(
            &[],
            Totals::default(),
            &GradePointTable::default(),
            &StandingTable::default(),
        )
        .unwrap();
        assert_eq!(result.gpa, 0.0);
        assert_eq!(result.cgpa, 0.0);
        assert!(!result.gpa.is_nan());
        assert_eq!(result.standing, "Unsatisfactory");

        let zero_credit = vec![entry("GE 100", LetterGrade::A, 0.0)];
        let result = calculate(
            &zero_credit,
            Totals::default(),
            &GradePointTable::default(),
            &StandingTable::default(),
        )
        .unwrap();
        assert_eq!(result.gpa, 0.0);
        assert_eq!(result.cgpa, 0.0);
    }

    #[test]
    fn rejects_non_finite_carry_in() {
        let grade_points = GradePointTable::default();
        let standings = StandingTable::default();

        for previous in [
            Totals::new(f64::NAN, 0.0),
            Totals::new(0.0, f64::NAN),
            Totals::new(f64::INFINITY, 10.0),
            Totals::new(-3.0, 0.0),
            Totals::new(3.0, -12.0),
        ] {
            let err = calculate(&[], previous, &grade_points, &standings).unwrap_err();
            assert!(
                matches!(err, SrsError::MalformedRecord { .. }),
                "{previous:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_negative_or_nan_credit_weights() {
        let grade_points = GradePointTable::default();
        let standings = StandingTable::default();

        let cancelling = vec![
            entry("CS 101", LetterGrade::A, 3.0),
            entry("CS 102", LetterGrade::F, -3.0),
        ];
        let err = calculate(&cancelling, Totals::default(), &grade_points, &standings)
            .unwrap_err();
        assert_eq!(err.to_string(), "malformed credits value 'CS102=-3'");

        let not_a_number = vec![entry("CS 103", LetterGrade::B, f64::NAN)];
        assert!(calculate(&not_a_number, Totals::default(), &grade_points, &standings).is_err());
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let entries = vec![
            entry("CS 201", LetterGrade::CPlus, 3.0),
            entry("CS 223", LetterGrade::AMinus, 4.0),
            entry("HUM 111", LetterGrade::F, 3.0),
        ];
        let previous = Totals::new(31.0, 92.4);
        let grade_points = GradePointTable::default();
        let standings = StandingTable::default();
        let first = calculate(&entries, previous, &grade_points, &standings).unwrap();
        let second = calculate(&entries, previous, &grade_points, &standings).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.cgpa.to_bits(), second.cgpa.to_bits());
    }

    #[test]
    fn grade_missing_from_custom_table_is_unknown() {
        let mut values = BTreeMap::new();
        values.insert(LetterGrade::A, 4.0);
        values.insert(LetterGrade::F, 0.0);
        let table = GradePointTable::new(values).unwrap();

        let err = calculate(
            &[entry("CS 101", LetterGrade::BPlus, 3.0)],
            Totals::default(),
            &table,
            &StandingTable::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "unknown grade 'B+' for CS101");
    }

    #[test]
    fn grade_point_table_rejects_negative_values() {
        let mut values = BTreeMap::new();
        values.insert(LetterGrade::A, -4.0);
        assert!(GradePointTable::new(values).is_err());
    }

    #[test]
    fn standing_bands_are_sorted_and_classify_by_minimum() {
        let table = StandingTable::new(vec![
            StandingBand {
                min_cgpa: 2.0,
                label: "Good Standing".to_string(),
            },
            StandingBand {
                min_cgpa: 3.5,
                label: "Dean's List".to_string(),
            },
            StandingBand {
                min_cgpa: 1.0,
                label: "Probation".to_string(),
            },
        ])
        .unwrap();

        assert_eq!(table.bands()[0].label, "Dean's List");
        assert_eq!(table.classify(3.9), "Dean's List");
        assert_eq!(table.classify(3.5), "Dean's List");
        assert_eq!(table.classify(3.49), "Good Standing");
        assert_eq!(table.classify(1.0), "Probation");
        assert_eq!(table.classify(0.4), "Probation");
        assert!(StandingTable::new(Vec::new()).is_err());
    }

    #[test]
    fn standing_table_deserializes_from_band_list() {
        let table: StandingTable = serde_json::from_str(
            r#"[{"min_cgpa":0.0,"label":"Dismissal"},{"min_cgpa":2.0,"label":"Good Standing"}]"#,
        )
        .unwrap();
        assert_eq!(table.classify(2.5), "Good Standing");
        assert!(serde_json::from_str::<StandingTable>("[]").is_err());
    }

    #[test]
    fn chaining_carries_grand_totals_forward_in_semester_order() {
        let fall = semester_id("2020-2021", "Fall").unwrap();
        let spring = semester_id("2020-2021", "Spring").unwrap();
        let semesters = vec![
            (spring.clone(), vec![entry("CS 102", LetterGrade::B, 4.0)]),
            (fall.clone(), vec![entry("CS 101", LetterGrade::A, 4.0)]),
        ];

        let results = chain_semesters(
            Totals::default(),
            &semesters,
            &GradePointTable::default(),
            &StandingTable::default(),
        )
        .unwrap();

        assert_eq!(results[0].0, fall);
        assert_eq!(results[1].0, spring);
        assert!((results[0].1.cgpa - 4.0).abs() < 1e-9);
        assert_eq!(results[1].1.previous_total(), results[0].1.grand_total());
        assert!((results[1].1.gpa - 3.0).abs() < 1e-9);
        assert!((results[1].1.cgpa - 3.5).abs() < 1e-9);
    }

    #[test]
    fn transcript_chain_ignores_not_available_rows() {
        let transcript = vec![TranscriptSemester {
            semester: semester_id("2019-2020", "Fall").unwrap(),
            gpa: "3.00".to_string(),
            cgpa: "3.00".to_string(),
            standing: "Honor".to_string(),
            courses: vec![
                TranscriptCourse {
                    course: parse_course_definition("CS 101").unwrap(),
                    name: "Algorithms and Programming I".to_string(),
                    grade: RecordedGrade::Letter(LetterGrade::B),
                    credits: Some(4.0),
                },
                TranscriptCourse {
                    course: parse_course_definition("GE 100").unwrap(),
                    name: "Orientation".to_string(),
                    grade: RecordedGrade::NotAvailable,
                    credits: Some(1.0),
                },
            ],
        }];

        let results =
            chain_transcript(&transcript, &GradePointTable::default(), &StandingTable::default())
                .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.credits.semester_total, 4.0);
        assert!((results[0].1.gpa - 3.0).abs() < 1e-9);
    }
}
