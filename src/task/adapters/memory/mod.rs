//! In-memory adapters for task ports.

mod calendar;
mod rules;
mod task;

pub use calendar::FixedHolidayCalendar;
pub use rules::InMemoryRuleEvaluator;
pub use task::{InMemoryTaskLock, InMemoryTaskRepository};
