// Half-open stay ranges and the overlap rule used by availability checks

use chrono::{Duration, NaiveDate};
use std::fmt;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Malformed date '{0}', expected YYYY-MM-DD")]
    Malformed(String),

    #[error("Check-out must be after check-in")]
    NotIncreasing,
}

/// `[check_in, check_out)`: the check-out day is free for the next guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, DateRangeError> {
        if check_in >= check_out {
            return Err(DateRangeError::NotIncreasing);
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_date(check_in)?, parse_date(check_out)?)
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days() as u32
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }

    // Every occupied night, check-out excluded
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.check_in;
        (0..self.nights() as i64).map(move |offset| start + Duration::days(offset))
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.check_in.format(DATE_FORMAT),
            self.check_out.format(DATE_FORMAT)
        )
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| DateRangeError::Malformed(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn range(a: &str, b: &str) -> StayRange {
        StayRange::parse(a, b).unwrap()
    }

    #[test_case("2024-03-01", "2024-03-03", "2024-03-02", "2024-03-04", true; "partial overlap")]
    #[test_case("2024-03-01", "2024-03-03", "2024-03-03", "2024-03-05", false; "back to back")]
    #[test_case("2024-03-05", "2024-03-07", "2024-03-01", "2024-03-05", false; "ends on check-in")]
    #[test_case("2024-03-01", "2024-03-10", "2024-03-04", "2024-03-05", true; "contains other")]
    #[test_case("2024-03-04", "2024-03-05", "2024-03-01", "2024-03-10", true; "contained by other")]
    #[test_case("2024-03-01", "2024-03-02", "2024-04-01", "2024-04-02", false; "disjoint")]
    fn test_overlap(a: &str, b: &str, c: &str, d: &str, expected: bool) {
        let first = range(a, b);
        let second = range(c, d);
        assert_eq!(first.overlaps(&second), expected);
        assert_eq!(second.overlaps(&first), expected);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            StayRange::parse("2024-03-03", "2024-03-03"),
            Err(DateRangeError::NotIncreasing)
        );
        assert_eq!(
            StayRange::parse("2024-03-04", "2024-03-03"),
            Err(DateRangeError::NotIncreasing)
        );
        assert!(matches!(
            StayRange::parse("2024-02-30", "2024-03-03"),
            Err(DateRangeError::Malformed(_))
        ));
        assert!(matches!(
            StayRange::parse("03/01/2024", "2024-03-03"),
            Err(DateRangeError::Malformed(_))
        ));
        assert_eq!(
            parse_date("03/01/2024").unwrap_err().to_string(),
            "Malformed date '03/01/2024', expected YYYY-MM-DD"
        );
        assert_eq!(
            DateRangeError::NotIncreasing.to_string(),
            "Check-out must be after check-in"
        );
    }

    #[test]
    fn test_nights_and_days() {
        let stay = range("2024-02-28", "2024-03-02");
        assert_eq!(stay.nights(), 3);
        let days: Vec<String> = stay
            .days()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();
        assert_eq!(days, vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
        assert!(stay.contains(parse_date("2024-03-01").unwrap()));
        assert!(!stay.contains(parse_date("2024-03-02").unwrap()));
        assert_eq!(stay.to_string(), "2024-02-28..2024-03-02");
    }
}
