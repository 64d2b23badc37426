//! Per-weekday caption lists that rotate week by week.

use chrono::Weekday;
use config_model::CaptionConfig;

const MONDAY: &[&str] = &[
    "Fresh week, blank page.",
    "Pick one thing and finish it.",
    "Small steps still count.",
    "Start with the hardest part.",
];
const TUESDAY: &[&str] = &[
    "Keep the momentum going.",
    "Write it down before you forget it.",
    "Ask the question you have been saving.",
];
const WEDNESDAY: &[&str] = &[
    "Halfway there.",
    "Check the plan, adjust the plan.",
    "Take a real lunch break today.",
    "Clear one old item off the list.",
];
const THURSDAY: &[&str] = &[
    "Almost Friday.",
    "Follow up on what you started Monday.",
    "Tidy the desk, tidy the mind.",
];
const FRIDAY: &[&str] = &[
    "Wrap it up and write the notes.",
    "Leave something easy for Monday.",
    "Celebrate one thing that went well.",
    "Close the tabs.",
];
const SATURDAY: &[&str] = &[
    "Go outside.",
    "Call someone you have not talked to in a while.",
    "Read something long.",
];
const SUNDAY: &[&str] = &[
    "Rest is part of the work.",
    "Plan lightly for the week ahead.",
    "Cook something new.",
];

fn builtin(weekday: Weekday) -> &'static [&'static str] {
    match weekday {
        Weekday::Mon => MONDAY,
        Weekday::Tue => TUESDAY,
        Weekday::Wed => WEDNESDAY,
        Weekday::Thu => THURSDAY,
        Weekday::Fri => FRIDAY,
        Weekday::Sat => SATURDAY,
        Weekday::Sun => SUNDAY,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Captions {
    overrides: CaptionConfig,
}

impl Captions {
    pub fn new(overrides: CaptionConfig) -> Self {
        Self { overrides }
    }

    /// Caption for `weekday`, rolling through that day's list once per week.
    pub fn pick(&self, weekday: Weekday, day_number: i64) -> &str {
        let week = day_number.div_euclid(7);
        match self.overrides.for_weekday(weekday) {
            Some(list) => &list[rotate(week, list.len())],
            None => {
                let list = builtin(weekday);
                list[rotate(week, list.len())]
            }
        }
    }
}

fn rotate(week: i64, len: usize) -> usize {
    week.rem_euclid(len as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_once_per_week() {
        let captions = Captions::default();
        let first = captions.pick(Weekday::Mon, 0);
        assert_eq!(first, MONDAY[0]);
        assert_eq!(captions.pick(Weekday::Mon, 6), MONDAY[0]);
        assert_eq!(captions.pick(Weekday::Mon, 7), MONDAY[1]);
        assert_eq!(captions.pick(Weekday::Mon, 7 * MONDAY.len() as i64), MONDAY[0]);
    }

    #[test]
    fn overrides_replace_builtin_list() {
        let overrides: CaptionConfig =
            serde_yaml::from_str("sunday: [\"one\", \"two\"]").unwrap();
        let captions = Captions::new(overrides);
        assert_eq!(captions.pick(Weekday::Sun, 0), "one");
        assert_eq!(captions.pick(Weekday::Sun, 7), "two");
        assert_eq!(captions.pick(Weekday::Sun, 14), "one");
        assert_eq!(captions.pick(Weekday::Sat, 0), SATURDAY[0]);
    }

    #[test]
    fn negative_day_numbers_wrap() {
        let captions = Captions::default();
        assert_eq!(captions.pick(Weekday::Tue, -1), TUESDAY[TUESDAY.len() - 1]);
    }
}
