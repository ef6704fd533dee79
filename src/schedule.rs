//! Weekly schedule grid: 7 days by 14 fixed fifty-minute slots.
//!
//! Meetings are laid onto the grid in input order. A cell that receives more
//! than one meeting keeps every detail string, so overlapping sections stay
//! visible to whoever renders the grid.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::SrsError;
use crate::models::CourseId;

pub const DAYS: usize = 7;
pub const SLOTS: usize = 14;

const SLOT_MINUTES: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; DAYS] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts full names and three-letter abbreviations, any case.
impl FromStr for Day {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        Day::ALL
            .into_iter()
            .find(|day| {
                let name = day.name();
                name.eq_ignore_ascii_case(value)
                    || (value.len() == 3 && name[..3].eq_ignore_ascii_case(value))
            })
            .ok_or(())
    }
}

/// Fixed daily slots, named after the hour they start in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    H8,
    H9,
    H10,
    H11,
    H12,
    H13,
    H14,
    H15,
    H16,
    H17,
    H18,
    H19,
    H20,
    H21,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; SLOTS] = [
        TimeSlot::H8,
        TimeSlot::H9,
        TimeSlot::H10,
        TimeSlot::H11,
        TimeSlot::H12,
        TimeSlot::H13,
        TimeSlot::H14,
        TimeSlot::H15,
        TimeSlot::H16,
        TimeSlot::H17,
        TimeSlot::H18,
        TimeSlot::H19,
        TimeSlot::H20,
        TimeSlot::H21,
    ];

    pub const LAST: TimeSlot = TimeSlot::H21;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn hour(self) -> u32 {
        8 + self as u32
    }

    pub fn start(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), 30, 0).unwrap_or_default()
    }

    pub fn end(self) -> NaiveTime {
        self.start() + Duration::minutes(SLOT_MINUTES)
    }

    /// `"08:30 - 09:20"`
    pub fn label(self) -> String {
        format!(
            "{} - {}",
            self.start().format("%H:%M"),
            self.end().format("%H:%M")
        )
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.hour())
    }
}

/// Accepts `H8`, a start time (`08:30`, `8:30`) or a full label.
impl FromStr for TimeSlot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if let Some(hour) = value.strip_prefix(|c: char| c == 'H' || c == 'h') {
            let hour: u32 = hour.parse().map_err(|_| ())?;
            return TimeSlot::ALL
                .into_iter()
                .find(|slot| slot.hour() == hour)
                .ok_or(());
        }

        let start = value.split('-').next().unwrap_or(value).trim();
        let start = NaiveTime::parse_from_str(start, "%H:%M").map_err(|_| ())?;
        TimeSlot::ALL
            .into_iter()
            .find(|slot| slot.start() == start)
            .ok_or(())
    }
}

type Cell = Option<Vec<String>>;

/// Always fully populated: every day has all fourteen cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    cells: [[Cell; SLOTS]; DAYS],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub day: Day,
    pub slot: TimeSlot,
    pub details: Vec<String>,
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the cell is free, otherwise a non-empty list in insertion order.
    pub fn cell(&self, day: Day, slot: TimeSlot) -> Option<&[String]> {
        self.cells[day.index()][slot.index()].as_deref()
    }

    pub fn day(&self, day: Day) -> &[Cell; SLOTS] {
        &self.cells[day.index()]
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for day in Day::ALL {
            for slot in TimeSlot::ALL {
                if let Some(details) = self.cell(day, slot) {
                    if details.len() > 1 {
                        conflicts.push(Conflict {
                            day,
                            slot,
                            details: details.to_vec(),
                        });
                    }
                }
            }
        }
        conflicts
    }

    fn push(&mut self, day: Day, slot: TimeSlot, detail: String) {
        self.cells[day.index()][slot.index()]
            .get_or_insert_with(Vec::new)
            .push(detail);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotView<'a> {
    time_slot: String,
    details: Option<&'a [String]>,
}

impl Serialize for WeeklySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let days: Vec<Vec<SlotView<'_>>> = Day::ALL
            .iter()
            .map(|&day| {
                TimeSlot::ALL
                    .iter()
                    .map(|&slot| SlotView {
                        time_slot: slot.label(),
                        details: self.cell(day, slot),
                    })
                    .collect()
            })
            .collect();
        days.serialize(serializer)
    }
}

/// One meeting as extracted from the registration page, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeeting {
    pub course: CourseId,
    pub day: String,
    pub start_slot: String,
    /// Consecutive slots, as scraped; must be a positive whole number.
    pub duration: String,
    pub rooms: Vec<String>,
}

impl RawMeeting {
    fn detail(&self) -> String {
        if self.rooms.is_empty() {
            self.course.to_string()
        } else {
            format!("{} — {}", self.course, self.rooms.join(", "))
        }
    }

    fn invalid(&self, value: &str, reason: &'static str) -> SrsError {
        SrsError::InvalidScheduleEntry {
            course: self.course.to_string(),
            value: value.to_string(),
            reason,
        }
    }

    fn resolve(&self) -> Result<(Day, TimeSlot, usize), SrsError> {
        let day = self
            .day
            .parse::<Day>()
            .map_err(|_| self.invalid(&self.day, "unrecognized day"))?;
        let slot = self
            .start_slot
            .parse::<TimeSlot>()
            .map_err(|_| self.invalid(&self.start_slot, "unrecognized time slot"))?;
        let duration = self
            .duration
            .trim()
            .parse::<usize>()
            .map_err(|_| self.invalid(&self.duration, "duration must be a whole number of slots"))?;
        if duration == 0 {
            return Err(self.invalid(&self.duration, "duration must cover at least one slot"));
        }
        Ok((day, slot, duration))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMeeting {
    /// Position in the input sequence.
    pub index: usize,
    pub meeting: RawMeeting,
    pub error: SrsError,
}

/// A meeting whose slot range ran past the last slot of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub index: usize,
    pub course: CourseId,
    pub day: Day,
    pub start: TimeSlot,
    pub requested: usize,
    pub placed: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleBuild {
    pub schedule: WeeklySchedule,
    pub skipped: Vec<SkippedMeeting>,
    pub truncated: Vec<Truncation>,
}

/// Lays meetings onto a fresh grid. Bad rows are skipped and reported; the rest
/// of the grid is still built.
pub fn build_schedule(meetings: &[RawMeeting]) -> ScheduleBuild {
    let mut build = ScheduleBuild::default();

    for (index, meeting) in meetings.iter().enumerate() {
        let (day, start, duration) = match meeting.resolve() {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(index, %error, "skipping schedule entry");
                build.skipped.push(SkippedMeeting {
                    index,
                    meeting: meeting.clone(),
                    error,
                });
                continue;
            }
        };

        let available = SLOTS - start.index();
        let placed = duration.min(available);
        if placed < duration {
            warn!(
                index,
                course = %meeting.course,
                %day,
                %start,
                requested = duration,
                placed,
                "meeting runs past {}, truncated",
                TimeSlot::LAST
            );
            build.truncated.push(Truncation {
                index,
                course: meeting.course.clone(),
                day,
                start,
                requested: duration,
                placed,
            });
        }

        let detail = meeting.detail();
        for slot in &TimeSlot::ALL[start.index()..start.index() + placed] {
            build.schedule.push(day, *slot, detail.clone());
        }
    }

    debug!(
        occupied = build.schedule.occupied_cells(),
        skipped = build.skipped.len(),
        truncated = build.truncated.len(),
        "schedule built"
    );
    build
}
