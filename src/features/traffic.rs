//! Rule table for inferring the traffic level of a trip from its departure
//! hour and weekday.
//!
//! The table stands in for a live traffic feed at serving time. Training data
//! carries an observed `TrafficLevel` column instead.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    /// One-hot column order: `Traffic_Low`, `Traffic_Medium`, `Traffic_High`.
    pub const ALL: [TrafficLevel; 3] = [TrafficLevel::Low, TrafficLevel::Medium, TrafficLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            TrafficLevel::Low => "Low",
            TrafficLevel::Medium => "Medium",
            TrafficLevel::High => "High",
        }
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrafficLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        TrafficLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownTrafficLevel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Monday through Friday.
    pub fn is_weekday(self) -> bool {
        !matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownDay(s.to_string()))
    }
}

impl TryFrom<String> for DayOfWeek {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<time::Weekday> for DayOfWeek {
    fn from(weekday: time::Weekday) -> Self {
        match weekday {
            time::Weekday::Monday => DayOfWeek::Monday,
            time::Weekday::Tuesday => DayOfWeek::Tuesday,
            time::Weekday::Wednesday => DayOfWeek::Wednesday,
            time::Weekday::Thursday => DayOfWeek::Thursday,
            time::Weekday::Friday => DayOfWeek::Friday,
            time::Weekday::Saturday => DayOfWeek::Saturday,
            time::Weekday::Sunday => DayOfWeek::Sunday,
        }
    }
}

/// Infer the traffic level for a departure hour on a given day.
///
/// Rules are evaluated in order and the first match wins:
/// 1. Sunday is always `Low`.
/// 2. Saturday is `Medium` from 08:00 through 17:59, otherwise `Low`.
/// 3. Weekdays are `High` during 08-10 and 17-20 (inclusive hours).
/// 4. Weekdays are `Medium` during 11-13 and hour 16.
/// 5. Any other weekday hour is `Low`.
pub fn get_traffic_level(hour: u8, day: DayOfWeek) -> TrafficLevel {
    match day {
        DayOfWeek::Sunday => TrafficLevel::Low,
        DayOfWeek::Saturday => {
            if (8..=17).contains(&hour) {
                TrafficLevel::Medium
            } else {
                TrafficLevel::Low
            }
        }
        _ => {
            if (8..=10).contains(&hour) || (17..=20).contains(&hour) {
                TrafficLevel::High
            } else if (11..=13).contains(&hour) || (16..17).contains(&hour) {
                TrafficLevel::Medium
            } else {
                TrafficLevel::Low
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_cases_match_rule_table() {
        assert_eq!(get_traffic_level(9, DayOfWeek::Monday), TrafficLevel::High);
        assert_eq!(get_traffic_level(12, DayOfWeek::Monday), TrafficLevel::Medium);
        assert_eq!(get_traffic_level(9, DayOfWeek::Sunday), TrafficLevel::Low);
        assert_eq!(get_traffic_level(10, DayOfWeek::Saturday), TrafficLevel::Medium);
        assert_eq!(get_traffic_level(20, DayOfWeek::Saturday), TrafficLevel::Low);
    }

    #[test]
    fn weekday_boundaries_are_inclusive_where_listed() {
        let day = DayOfWeek::Wednesday;
        assert_eq!(get_traffic_level(7, day), TrafficLevel::Low);
        assert_eq!(get_traffic_level(8, day), TrafficLevel::High);
        assert_eq!(get_traffic_level(10, day), TrafficLevel::High);
        assert_eq!(get_traffic_level(11, day), TrafficLevel::Medium);
        assert_eq!(get_traffic_level(13, day), TrafficLevel::Medium);
        assert_eq!(get_traffic_level(14, day), TrafficLevel::Low);
        assert_eq!(get_traffic_level(15, day), TrafficLevel::Low);
        assert_eq!(get_traffic_level(16, day), TrafficLevel::Medium);
        // 17 falls in the High window before the [16,17) Medium window is checked.
        assert_eq!(get_traffic_level(17, day), TrafficLevel::High);
        assert_eq!(get_traffic_level(20, day), TrafficLevel::High);
        assert_eq!(get_traffic_level(21, day), TrafficLevel::Low);
        assert_eq!(get_traffic_level(0, day), TrafficLevel::Low);
    }

    #[test]
    fn saturday_window_covers_eight_through_seventeen() {
        assert_eq!(get_traffic_level(7, DayOfWeek::Saturday), TrafficLevel::Low);
        assert_eq!(get_traffic_level(8, DayOfWeek::Saturday), TrafficLevel::Medium);
        assert_eq!(get_traffic_level(17, DayOfWeek::Saturday), TrafficLevel::Medium);
        assert_eq!(get_traffic_level(18, DayOfWeek::Saturday), TrafficLevel::Low);
    }

    #[test]
    fn sunday_is_low_all_day() {
        for hour in 0..24 {
            assert_eq!(get_traffic_level(hour, DayOfWeek::Sunday), TrafficLevel::Low);
        }
    }

    #[test]
    fn day_names_parse_case_insensitively() -> Result<(), ValidationError> {
        assert_eq!("monday".parse::<DayOfWeek>()?, DayOfWeek::Monday);
        assert_eq!(" SUNDAY ".parse::<DayOfWeek>()?, DayOfWeek::Sunday);
        assert!(matches!(
            "Funday".parse::<DayOfWeek>(),
            Err(ValidationError::UnknownDay(_))
        ));
        Ok(())
    }

    #[test]
    fn traffic_levels_parse_and_reject_unknown() -> Result<(), ValidationError> {
        assert_eq!("medium".parse::<TrafficLevel>()?, TrafficLevel::Medium);
        assert!(matches!(
            "Gridlock".parse::<TrafficLevel>(),
            Err(ValidationError::UnknownTrafficLevel(_))
        ));
        Ok(())
    }

    #[test]
    fn weekday_conversion_from_time_crate() {
        assert_eq!(DayOfWeek::from(time::Weekday::Friday), DayOfWeek::Friday);
        assert!(DayOfWeek::Friday.is_weekday());
        assert!(!DayOfWeek::from(time::Weekday::Saturday).is_weekday());
    }
}
