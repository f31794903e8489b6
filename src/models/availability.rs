use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityType {
    Available,
    Unavailable,
}

impl AvailabilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityType::Available => "available",
            AvailabilityType::Unavailable => "unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(AvailabilityType::Available),
            "unavailable" => Some(AvailabilityType::Unavailable),
            _ => None,
        }
    }
}

/// A same-day wall-clock window, `[start, end)`. Times are "HH:MM" in the
/// platform's single operating locale; no timezone conversion happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    pub fn new(start: &str, end: &str) -> anyhow::Result<Self> {
        let s = parse_time(start)?;
        let e = parse_end_time(end)?;
        if e <= s {
            return Err(anyhow::anyhow!("end time {end} must be after start time {start}"));
        }
        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    /// Window starting at `start` and lasting `duration_minutes`. Jobs must
    /// finish by midnight.
    pub fn from_duration(start: &str, duration_minutes: i32) -> anyhow::Result<Self> {
        let s = parse_time(start)?;
        if duration_minutes <= 0 {
            return Err(anyhow::anyhow!("duration must be positive, got {duration_minutes} minutes"));
        }
        let e = s + duration_minutes as u32;
        if e > MINUTES_PER_DAY {
            return Err(anyhow::anyhow!(
                "a {duration_minutes} minute job starting at {start} would run past midnight"
            ));
        }
        Ok(Self {
            start: start.to_string(),
            end: format_minutes(e),
        })
    }

    fn bounds(&self) -> Option<(u32, u32)> {
        Some((parse_time(&self.start).ok()?, parse_end_time(&self.end).ok()?))
    }

    /// Half-open overlap: touching windows do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some((s1, e1)), Some((s2, e2))) => s1 < e2 && s2 < e1,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub id: String,
    pub cleaner_profile_id: String,
    pub kind: AvailabilityType,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub recurring_weekly: bool,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Availability {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time.clone(),
            end: self.end_time.clone(),
        }
    }

    /// Whether this entry covers `date`: the exact date, or for weekly
    /// entries any later date on the same weekday up to the recurrence end.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        if date == self.date {
            return true;
        }
        if !self.recurring_weekly || date < self.date {
            return false;
        }
        if let Some(end) = self.recurrence_end_date {
            if date > end {
                return false;
            }
        }
        date.weekday() == self.date.weekday()
    }

    pub fn blocks(&self, date: NaiveDate, window: &TimeWindow) -> bool {
        self.kind == AvailabilityType::Unavailable
            && self.applies_on(date)
            && self.window().overlaps(window)
    }
}

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parses "HH:MM" into minutes since midnight.
pub fn parse_time(s: &str) -> anyhow::Result<u32> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 || parts[0].len() != 2 || parts[1].len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(hour * 60 + minute)
}

/// Like [`parse_time`] but also accepts "24:00" as the end of the day.
pub fn parse_end_time(s: &str) -> anyhow::Result<u32> {
    if s == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }
    parse_time(s)
}

pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
