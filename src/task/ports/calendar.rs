//! Port for the working calendar used by date calculation.

use chrono::NaiveDate;

/// Source of public holidays and other non-working dates.
pub trait WorkingCalendar: Send + Sync {
    /// Returns whether `date` is a holiday.
    fn is_holiday(&self, date: NaiveDate) -> bool;
}
