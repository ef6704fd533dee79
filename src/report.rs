use std::fmt::Write;

use crate::import::GradeImport;
use crate::models::CgpaCalculation;
use crate::schedule::{Day, ScheduleBuild, TimeSlot, WeeklySchedule};

/// GPA values are shown to two decimals; the calculation itself stays unrounded.
pub fn render_calculation(result: &CgpaCalculation) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "- GPA: {:.2}", result.gpa);
    let _ = writeln!(output, "- CGPA: {:.2}", result.cgpa);
    let _ = writeln!(output, "- Standing: {}", result.standing);
    let _ = writeln!(output);
    let _ = writeln!(output, "| | Credits | Points |");
    let _ = writeln!(output, "|---|---|---|");
    for (label, totals) in [
        ("Semester", result.semester_total()),
        ("Previous", result.previous_total()),
        ("Grand", result.grand_total()),
    ] {
        let _ = writeln!(
            output,
            "| {} | {} | {:.2} |",
            label, totals.credits, totals.points
        );
    }

    output
}

pub fn render_schedule(schedule: &WeeklySchedule) -> String {
    let mut output = String::new();

    let _ = write!(output, "| Time |");
    for day in Day::ALL {
        let _ = write!(output, " {} |", day);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|{}", "---|".repeat(Day::ALL.len()));

    for slot in TimeSlot::ALL {
        let _ = write!(output, "| {} |", slot.label());
        for day in Day::ALL {
            let cell = schedule
                .cell(day, slot)
                .map(|details| details.join("<br>"))
                .unwrap_or_default();
            let _ = write!(output, " {} |", cell);
        }
        let _ = writeln!(output);
    }

    output
}

pub fn build_report(
    calculation: &CgpaCalculation,
    grades: &GradeImport,
    schedule: &ScheduleBuild,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Summary");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Point Averages");
    let _ = write!(output, "{}", render_calculation(calculation));

    if !grades.filtered.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Not counted toward GPA:");
        for (course, grade) in &grades.filtered {
            let grade = if grade.is_empty() { "(blank)" } else { grade.as_str() };
            let _ = writeln!(output, "- {} ({})", course, grade);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Schedule");
    let _ = write!(output, "{}", render_schedule(&schedule.schedule));

    let conflicts = schedule.schedule.conflicts();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Conflicts");

    if conflicts.is_empty() {
        let _ = writeln!(output, "No overlapping meetings.");
    } else {
        for conflict in &conflicts {
            let _ = writeln!(
                output,
                "- {} {}: {}",
                conflict.day,
                conflict.slot.label(),
                conflict.details.join(" / ")
            );
        }
    }

    if !schedule.skipped.is_empty() || !schedule.truncated.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Source Data Issues");
        for skipped in &schedule.skipped {
            let _ = writeln!(output, "- entry {}: {}", skipped.index + 1, skipped.error);
        }
        for truncation in &schedule.truncated {
            let _ = writeln!(
                output,
                "- entry {}: {} on {} from {} asked for {} slots, placed {}",
                truncation.index + 1,
                truncation.course,
                truncation.day,
                truncation.start,
                truncation.requested,
                truncation.placed
            );
        }
    }

    output
}
