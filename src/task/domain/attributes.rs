//! Business attributes of a task and the catalogue of configurable names.

use super::{RoleCategory, TaskDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default major priority for tasks without a configured value.
pub const DEFAULT_MAJOR_PRIORITY: i32 = 5000;

/// Default minor priority for tasks without a configured value.
pub const DEFAULT_MINOR_PRIORITY: i32 = 500;

/// Mutable business attributes of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAttributes {
    /// Display title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Case name shown to caseworkers.
    pub case_name: Option<String>,
    /// Case management category.
    pub case_category: Option<String>,
    /// Work type used for filtering work queues.
    pub work_type: Option<String>,
    /// Role category expected to carry out the task.
    pub role_category: Option<RoleCategory>,
    /// Region of the hearing centre.
    pub region: Option<String>,
    /// Location of the hearing centre.
    pub location: Option<String>,
    /// Human readable location name.
    pub location_name: Option<String>,
    /// Major priority, lower sorts first.
    pub major_priority: i32,
    /// Minor priority, lower sorts first.
    pub minor_priority: i32,
    /// Date used for priority ordering.
    pub priority_date: Option<DateTime<Utc>>,
    /// Identifier of the next listed hearing.
    pub next_hearing_id: Option<String>,
    /// Date of the next listed hearing.
    pub next_hearing_date: Option<DateTime<Utc>>,
    /// Date by which the task should be done.
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskAttributes {
    /// Creates attributes with the given title and defaults elsewhere.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            case_name: None,
            case_category: None,
            work_type: None,
            role_category: None,
            region: None,
            location: None,
            location_name: None,
            major_priority: DEFAULT_MAJOR_PRIORITY,
            minor_priority: DEFAULT_MINOR_PRIORITY,
            priority_date: None,
            next_hearing_id: None,
            next_hearing_date: None,
            due_date: None,
        }
    }

    /// Applies a plain attribute value.
    ///
    /// Blank values clear optional attributes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAttributeValue`] when a numeric or
    /// enumerated attribute cannot be parsed.
    pub fn apply(&mut self, attribute: PlainAttribute, value: &str) -> Result<(), TaskDomainError> {
        let trimmed = value.trim();
        let optional = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        match attribute {
            PlainAttribute::Title => trimmed.clone_into(&mut self.title),
            PlainAttribute::Description => self.description = optional,
            PlainAttribute::CaseName => self.case_name = optional,
            PlainAttribute::CaseCategory => self.case_category = optional,
            PlainAttribute::WorkType => self.work_type = optional,
            PlainAttribute::Region => self.region = optional,
            PlainAttribute::Location => self.location = optional,
            PlainAttribute::LocationName => self.location_name = optional,
            PlainAttribute::NextHearingId => self.next_hearing_id = optional,
            PlainAttribute::RoleCategory => {
                self.role_category = optional
                    .map(|raw| RoleCategory::try_from(raw.as_str()))
                    .transpose()
                    .map_err(|_| invalid(attribute, value))?;
            }
            PlainAttribute::MajorPriority => {
                self.major_priority = trimmed.parse().map_err(|_| invalid(attribute, value))?;
            }
            PlainAttribute::MinorPriority => {
                self.minor_priority = trimmed.parse().map_err(|_| invalid(attribute, value))?;
            }
        }
        Ok(())
    }

    /// Returns the current value of a calculated date field.
    #[must_use]
    pub const fn date(&self, field: DateField) -> Option<DateTime<Utc>> {
        match field {
            DateField::NextHearingDate => self.next_hearing_date,
            DateField::DueDate => self.due_date,
            DateField::PriorityDate => self.priority_date,
        }
    }

    /// Overwrites a calculated date field.
    pub const fn set_date(&mut self, field: DateField, value: Option<DateTime<Utc>>) {
        match field {
            DateField::NextHearingDate => self.next_hearing_date = value,
            DateField::DueDate => self.due_date = value,
            DateField::PriorityDate => self.priority_date = value,
        }
    }
}

fn invalid(attribute: PlainAttribute, value: &str) -> TaskDomainError {
    TaskDomainError::InvalidAttributeValue {
        attribute: attribute.name().to_owned(),
        value: value.to_owned(),
    }
}

/// Attributes copied verbatim from a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlainAttribute {
    /// `title`
    Title,
    /// `description`
    Description,
    /// `caseName`
    CaseName,
    /// `caseCategory` or `caseManagementCategory`
    CaseCategory,
    /// `workType`
    WorkType,
    /// `roleCategory`
    RoleCategory,
    /// `region`
    Region,
    /// `location`
    Location,
    /// `locationName`
    LocationName,
    /// `majorPriority`
    MajorPriority,
    /// `minorPriority`
    MinorPriority,
    /// `nextHearingId`
    NextHearingId,
}

impl PlainAttribute {
    /// Returns the canonical configuration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::CaseName => "caseName",
            Self::CaseCategory => "caseCategory",
            Self::WorkType => "workType",
            Self::RoleCategory => "roleCategory",
            Self::Region => "region",
            Self::Location => "location",
            Self::LocationName => "locationName",
            Self::MajorPriority => "majorPriority",
            Self::MinorPriority => "minorPriority",
            Self::NextHearingId => "nextHearingId",
        }
    }
}

/// Date fields derived from configuration inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateField {
    /// `nextHearingDate`
    NextHearingDate,
    /// `dueDate`
    DueDate,
    /// `priorityDate`
    PriorityDate,
}

impl DateField {
    /// Derivation order; later fields may reference earlier ones.
    pub const ORDER: [Self; 3] = [Self::NextHearingDate, Self::DueDate, Self::PriorityDate];

    /// Returns the canonical configuration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NextHearingDate => "nextHearingDate",
            Self::DueDate => "dueDate",
            Self::PriorityDate => "priorityDate",
        }
    }

    /// Resolves a field from its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|field| field.name() == name.trim())
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs that together describe how a date field is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateInput {
    /// Explicit value, e.g. `dueDate`.
    Value,
    /// Base date, e.g. `dueDateOrigin`.
    Origin,
    /// Base date taken from another field, e.g. `dueDateOriginRef`.
    OriginRef,
    /// Days to add to the origin.
    IntervalDays,
    /// Comma separated weekdays that are not worked.
    NonWorkingDaysOfWeek,
    /// Whether the interval counts working days only.
    SkipNonWorkingDays,
    /// `Next`, `Previous` or `No`.
    MustBeWorkingDay,
    /// Time of day, `HH:MM`.
    Time,
}

impl DateInput {
    const SUFFIXES: [(&'static str, Self); 7] = [
        ("OriginRef", Self::OriginRef),
        ("Origin", Self::Origin),
        ("IntervalDays", Self::IntervalDays),
        ("NonWorkingDaysOfWeek", Self::NonWorkingDaysOfWeek),
        ("SkipNonWorkingDays", Self::SkipNonWorkingDays),
        ("MustBeWorkingDay", Self::MustBeWorkingDay),
        ("Time", Self::Time),
    ];
}

/// Classified configuration attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeName {
    /// Attribute copied verbatim.
    Plain(PlainAttribute),
    /// Input to a calculated date.
    Date(DateField, DateInput),
}

impl AttributeName {
    /// Classifies a configuration attribute name.
    ///
    /// Returns `None` for names the task does not model.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let plain = match name {
            "title" => Some(PlainAttribute::Title),
            "description" => Some(PlainAttribute::Description),
            "caseName" => Some(PlainAttribute::CaseName),
            "caseCategory" | "caseManagementCategory" => Some(PlainAttribute::CaseCategory),
            "workType" => Some(PlainAttribute::WorkType),
            "roleCategory" => Some(PlainAttribute::RoleCategory),
            "region" => Some(PlainAttribute::Region),
            "location" => Some(PlainAttribute::Location),
            "locationName" => Some(PlainAttribute::LocationName),
            "majorPriority" => Some(PlainAttribute::MajorPriority),
            "minorPriority" => Some(PlainAttribute::MinorPriority),
            "nextHearingId" => Some(PlainAttribute::NextHearingId),
            _ => None,
        };
        if let Some(attribute) = plain {
            return Some(Self::Plain(attribute));
        }

        DateField::ORDER.into_iter().find_map(|field| {
            let rest = name.strip_prefix(field.name())?;
            if rest.is_empty() {
                return Some(Self::Date(field, DateInput::Value));
            }
            DateInput::SUFFIXES
                .into_iter()
                .find(|(suffix, _)| *suffix == rest)
                .map(|(_, input)| Self::Date(field, input))
        })
    }
}
