//! Named dates that recur every year, and the "days left" countdown drawn on
//! the wallpaper.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use config_model::BuiltinHolidays;
use tracing::warn;

use crate::error::Error;

/// Years searched ahead for rules that do not occur every year (Feb 29, fifth
/// weekdays).
const LOOKAHEAD_YEARS: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidayRule {
    Fixed {
        month: u32,
        day: u32,
    },
    NthWeekday {
        nth: u8,
        weekday: Weekday,
        month: u32,
    },
    LastWeekday {
        weekday: Weekday,
        month: u32,
    },
}

impl HolidayRule {
    /// The date this rule falls on in `year`, if it exists that year.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            Self::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            Self::NthWeekday {
                nth,
                weekday,
                month,
            } => NaiveDate::from_weekday_of_month_opt(year, month, weekday, nth),
            Self::LastWeekday { weekday, month } => {
                let last = last_day_of_month(year, month)?;
                let back = (last.weekday().num_days_from_monday() + 7
                    - weekday.num_days_from_monday())
                    % 7;
                Some(last - Duration::days(i64::from(back)))
            }
        }
    }

    /// First occurrence on or after `today`.
    pub fn next_on_or_after(&self, today: NaiveDate) -> Option<NaiveDate> {
        (today.year()..=today.year() + LOOKAHEAD_YEARS)
            .filter_map(|year| self.in_year(year))
            .find(|date| *date >= today)
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

impl FromStr for HolidayRule {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let rule = if let Some((month, day)) = trimmed.split_once('-') {
            let month = month
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid month '{month}'"))?;
            let day = day
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid day '{day}'"))?;
            Self::Fixed { month, day }
        } else {
            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            let [ordinal, weekday, month] = tokens.as_slice() else {
                return Err(format!(
                    "expected 'MM-DD' or '<nth|last> <weekday> <month>', got '{trimmed}'"
                ));
            };
            let weekday = parse_weekday(weekday)?;
            let month = parse_month(month)?;
            if ordinal.eq_ignore_ascii_case("last") {
                Self::LastWeekday { weekday, month }
            } else {
                Self::NthWeekday {
                    nth: parse_ordinal(ordinal)?,
                    weekday,
                    month,
                }
            }
        };

        // 2000..2008 spans a leap year, so any real calendar date shows up.
        if (2000..2008).any(|year| rule.in_year(year).is_some()) {
            Ok(rule)
        } else {
            Err(format!("'{trimmed}' never occurs"))
        }
    }
}

fn parse_ordinal(raw: &str) -> Result<u8, String> {
    let digits = raw.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    match digits.parse::<u8>() {
        Ok(n @ 1..=5) => Ok(n),
        _ => Err(format!("invalid ordinal '{raw}'")),
    }
}

fn parse_weekday(raw: &str) -> Result<Weekday, String> {
    const NAMES: [(&str, Weekday); 7] = [
        ("mon", Weekday::Mon),
        ("tue", Weekday::Tue),
        ("wed", Weekday::Wed),
        ("thu", Weekday::Thu),
        ("fri", Weekday::Fri),
        ("sat", Weekday::Sat),
        ("sun", Weekday::Sun),
    ];
    let lower = raw.to_ascii_lowercase();
    NAMES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, weekday)| *weekday)
        .ok_or_else(|| format!("invalid weekday '{raw}'"))
}

fn parse_month(raw: &str) -> Result<u32, String> {
    const NAMES: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = raw.to_ascii_lowercase();
    NAMES
        .iter()
        .position(|prefix| lower.starts_with(prefix))
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| format!("invalid month '{raw}'"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    name: String,
    rule: HolidayRule,
}

impl Holiday {
    pub fn new(name: impl Into<String>, rule: HolidayRule) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }

    /// Display name, including any emphasis marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> HolidayRule {
        self.rule
    }

    pub fn next_occurrence(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.rule.next_on_or_after(today)
    }

    /// Whole days until the next occurrence; zero on the day itself.
    pub fn days_left(&self, today: NaiveDate) -> Option<i64> {
        self.next_occurrence(today)
            .map(|next| (next - today).num_days())
    }

    pub fn is_emphasized(&self, marker: Option<&str>) -> bool {
        marker.is_some_and(|marker| self.name.contains(marker))
    }
}

impl fmt::Display for Holiday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for Holiday {
    type Err = Error;

    /// Parses `<rule>|<name>`.
    fn from_str(record: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| Error::InvalidHoliday {
            record: record.to_string(),
            reason,
        };
        let (rule, name) = record
            .split_once('|')
            .ok_or_else(|| invalid("missing '|' between rule and name".to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("name must not be blank".to_string()));
        }
        let rule = rule.parse::<HolidayRule>().map_err(invalid)?;
        Ok(Self::new(name, rule))
    }
}

/// Decode user records, skipping the ones that do not parse.
pub fn parse_records<S: AsRef<str>>(records: &[S]) -> Vec<Holiday> {
    records
        .iter()
        .map(|record| record.as_ref())
        .filter(|record| !record.trim().is_empty())
        .filter_map(|record| match record.parse::<Holiday>() {
            Ok(holiday) => Some(holiday),
            Err(err) => {
                warn!(%err, "skipping holiday record");
                None
            }
        })
        .collect()
}

pub fn builtin(set: BuiltinHolidays) -> Vec<Holiday> {
    match set {
        BuiltinHolidays::UnitedStates => united_states(),
        BuiltinHolidays::Disabled => Vec::new(),
    }
}

/// Federal holidays of the United States.
pub fn united_states() -> Vec<Holiday> {
    use HolidayRule::{Fixed, LastWeekday, NthWeekday};
    vec![
        Holiday::new("New Year's Day", Fixed { month: 1, day: 1 }),
        Holiday::new(
            "Martin Luther King Jr. Day",
            NthWeekday {
                nth: 3,
                weekday: Weekday::Mon,
                month: 1,
            },
        ),
        Holiday::new(
            "Presidents' Day",
            NthWeekday {
                nth: 3,
                weekday: Weekday::Mon,
                month: 2,
            },
        ),
        Holiday::new(
            "Memorial Day",
            LastWeekday {
                weekday: Weekday::Mon,
                month: 5,
            },
        ),
        Holiday::new("Juneteenth", Fixed { month: 6, day: 19 }),
        Holiday::new("Independence Day", Fixed { month: 7, day: 4 }),
        Holiday::new(
            "Labor Day",
            NthWeekday {
                nth: 1,
                weekday: Weekday::Mon,
                month: 9,
            },
        ),
        Holiday::new(
            "Columbus Day",
            NthWeekday {
                nth: 2,
                weekday: Weekday::Mon,
                month: 10,
            },
        ),
        Holiday::new("Veterans Day", Fixed { month: 11, day: 11 }),
        Holiday::new(
            "Thanksgiving Day",
            NthWeekday {
                nth: 4,
                weekday: Weekday::Thu,
                month: 11,
            },
        ),
        Holiday::new("Christmas Day", Fixed { month: 12, day: 25 }),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upcoming<'a> {
    pub holiday: &'a Holiday,
    pub date: NaiveDate,
    pub days_left: i64,
}

/// Holidays closer than `window_days`, soonest first, at most `limit`.
pub fn upcoming<'a>(
    holidays: &'a [Holiday],
    today: NaiveDate,
    window_days: i64,
    limit: usize,
) -> Vec<Upcoming<'a>> {
    let mut out: Vec<Upcoming<'a>> = holidays
        .iter()
        .filter_map(|holiday| {
            let date = holiday.next_occurrence(today)?;
            let days_left = (date - today).num_days();
            (days_left < window_days).then_some(Upcoming {
                holiday,
                date,
                days_left,
            })
        })
        .collect();
    out.sort_by(|a, b| a.days_left.cmp(&b.days_left));
    out.truncate(limit);
    out
}
