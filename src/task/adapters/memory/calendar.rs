//! Working calendar backed by a fixed list of holidays.

use crate::task::ports::WorkingCalendar;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Calendar with an explicit holiday list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedHolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl FixedHolidayCalendar {
    /// Creates a calendar with no holidays.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a calendar with the given holidays.
    #[must_use]
    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }
}

impl WorkingCalendar for FixedHolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}
