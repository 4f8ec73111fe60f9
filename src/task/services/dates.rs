//! Calculated date fields derived from configuration inputs.

use crate::task::{
    domain::{DateField, DateInput, TaskAttributes, TaskDomainError},
    ports::WorkingCalendar,
};
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use std::collections::BTreeMap;

/// Upper bound on day-by-day walks, roughly ten years.
const MAX_DAY_STEPS: u32 = 3660;

/// Raw inputs for one date field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FieldInputs {
    value: Option<String>,
    origin: Option<String>,
    origin_ref: Option<String>,
    interval_days: Option<String>,
    non_working_days_of_week: Option<String>,
    skip_non_working_days: Option<String>,
    must_be_working_day: Option<String>,
    time: Option<String>,
}

/// Date inputs collected from a configuration response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateInputs {
    fields: BTreeMap<DateField, FieldInputs>,
}

impl DateInputs {
    /// Creates an empty input set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one input. Later values for the same input win.
    pub fn record(&mut self, field: DateField, input: DateInput, value: &str) {
        let inputs = self.fields.entry(field).or_default();
        let slot = match input {
            DateInput::Value => &mut inputs.value,
            DateInput::Origin => &mut inputs.origin,
            DateInput::OriginRef => &mut inputs.origin_ref,
            DateInput::IntervalDays => &mut inputs.interval_days,
            DateInput::NonWorkingDaysOfWeek => &mut inputs.non_working_days_of_week,
            DateInput::SkipNonWorkingDays => &mut inputs.skip_non_working_days,
            DateInput::MustBeWorkingDay => &mut inputs.must_be_working_day,
            DateInput::Time => &mut inputs.time,
        };
        let trimmed = value.trim();
        *slot = (!trimmed.is_empty()).then(|| trimmed.to_owned());
    }

    /// Returns whether no input was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Direction to roll a date that lands on a non-working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Roll {
    Next,
    Previous,
    No,
}

/// Derives calculated dates using a working calendar.
#[derive(Debug, Clone, Copy)]
pub struct DateCalculator<'a, W: WorkingCalendar + ?Sized> {
    calendar: &'a W,
}

impl<'a, W: WorkingCalendar + ?Sized> DateCalculator<'a, W> {
    /// Creates a calculator backed by `calendar`.
    #[must_use]
    pub const fn new(calendar: &'a W) -> Self {
        Self { calendar }
    }

    /// Recomputes every date field that has inputs, in derivation order.
    ///
    /// Fields without inputs keep their current value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DateCalculation`] when an input cannot be
    /// parsed or an origin reference names an unknown or empty field.
    pub fn derive(
        &self,
        attributes: &mut TaskAttributes,
        inputs: &DateInputs,
    ) -> Result<(), TaskDomainError> {
        for field in DateField::ORDER {
            let Some(field_inputs) = inputs.fields.get(&field) else {
                continue;
            };
            if let Some(value) = self.derive_field(field, field_inputs, attributes)? {
                attributes.set_date(field, Some(value));
            }
        }
        Ok(())
    }

    fn derive_field(
        &self,
        field: DateField,
        inputs: &FieldInputs,
        attributes: &TaskAttributes,
    ) -> Result<Option<DateTime<Utc>>, TaskDomainError> {
        let time = inputs
            .time
            .as_deref()
            .map(|raw| parse_time(field, raw))
            .transpose()?;

        if let Some(raw) = inputs.value.as_deref() {
            let explicit = parse_date_time(field, raw)?;
            return Ok(Some(with_time(explicit, time)));
        }

        let origin = match (inputs.origin.as_deref(), inputs.origin_ref.as_deref()) {
            (Some(raw), _) => parse_date_time(field, raw)?,
            (None, Some(reference)) => resolve_reference(field, reference, attributes)?,
            (None, None) => return Ok(None),
        };

        let interval = inputs
            .interval_days
            .as_deref()
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| date_error(field, format!("invalid interval days: {raw}")))
            })
            .transpose()?
            .unwrap_or(0);
        let non_working = inputs
            .non_working_days_of_week
            .as_deref()
            .map(|raw| parse_weekdays(field, raw))
            .transpose()?
            .unwrap_or_default();
        let skip = inputs
            .skip_non_working_days
            .as_deref()
            .map(|raw| parse_flag(field, raw))
            .transpose()?
            .unwrap_or(false);
        let roll = inputs
            .must_be_working_day
            .as_deref()
            .map(|raw| parse_roll(field, raw))
            .transpose()?
            .unwrap_or(Roll::No);

        let is_working =
            |date: NaiveDate| !non_working.contains(&date.weekday()) && !self.calendar.is_holiday(date);

        let mut date = origin.date_naive();
        if skip {
            date = add_working_days(field, date, interval, &is_working)?;
        } else {
            date += Duration::days(interval);
        }
        date = match roll {
            Roll::No => date,
            Roll::Next => walk_to_working(field, date, 1, &is_working)?,
            Roll::Previous => walk_to_working(field, date, -1, &is_working)?,
        };

        let time = time.unwrap_or_else(|| origin.time());
        Ok(Some(Utc.from_utc_datetime(&date.and_time(time))))
    }
}

fn date_error(field: DateField, reason: impl Into<String>) -> TaskDomainError {
    TaskDomainError::DateCalculation {
        field: field.name().to_owned(),
        reason: reason.into(),
    }
}

fn resolve_reference(
    field: DateField,
    reference: &str,
    attributes: &TaskAttributes,
) -> Result<DateTime<Utc>, TaskDomainError> {
    let Some(referenced) = DateField::from_name(reference) else {
        return Err(date_error(field, format!("unknown origin reference: {reference}")));
    };
    if referenced == field {
        return Err(date_error(field, "origin reference points at itself"));
    }
    attributes
        .date(referenced)
        .ok_or_else(|| date_error(field, format!("origin reference {referenced} has no value")))
}

fn parse_date_time(field: DateField, raw: &str) -> Result<DateTime<Utc>, TaskDomainError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&parsed));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        .map_err(|_| date_error(field, format!("invalid date: {raw}")))
}

fn parse_time(field: DateField, raw: &str) -> Result<NaiveTime, TaskDomainError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| date_error(field, format!("invalid time: {raw}")))
}

fn with_time(value: DateTime<Utc>, time: Option<NaiveTime>) -> DateTime<Utc> {
    time.map_or(value, |time| {
        Utc.from_utc_datetime(&value.date_naive().and_time(time))
    })
}

fn parse_weekdays(field: DateField, raw: &str) -> Result<Vec<Weekday>, TaskDomainError> {
    raw.split(',')
        .map(str::trim)
        .filter(|day| !day.is_empty())
        .map(|day| {
            day.parse::<Weekday>()
                .map_err(|_| date_error(field, format!("invalid weekday: {day}")))
        })
        .collect()
}

fn parse_flag(field: DateField, raw: &str) -> Result<bool, TaskDomainError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(date_error(field, format!("invalid flag: {raw}"))),
    }
}

fn parse_roll(field: DateField, raw: &str) -> Result<Roll, TaskDomainError> {
    match raw.to_ascii_lowercase().as_str() {
        "next" => Ok(Roll::Next),
        "previous" => Ok(Roll::Previous),
        "no" => Ok(Roll::No),
        _ => Err(date_error(field, format!("invalid working day rule: {raw}"))),
    }
}

fn add_working_days(
    field: DateField,
    start: NaiveDate,
    days: i64,
    is_working: &impl Fn(NaiveDate) -> bool,
) -> Result<NaiveDate, TaskDomainError> {
    let step = if days < 0 { -1 } else { 1 };
    let mut date = start;
    let mut remaining = days.unsigned_abs();
    let mut steps = 0_u32;
    while remaining > 0 {
        date += Duration::days(step);
        steps += 1;
        if steps > MAX_DAY_STEPS {
            return Err(date_error(field, "no working days within range"));
        }
        if is_working(date) {
            remaining -= 1;
        }
    }
    Ok(date)
}

fn walk_to_working(
    field: DateField,
    start: NaiveDate,
    step: i64,
    is_working: &impl Fn(NaiveDate) -> bool,
) -> Result<NaiveDate, TaskDomainError> {
    let mut date = start;
    for _ in 0..MAX_DAY_STEPS {
        if is_working(date) {
            return Ok(date);
        }
        date += Duration::days(step);
    }
    Err(date_error(field, "no working days within range"))
}
