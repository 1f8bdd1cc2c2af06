//! Validated scalar values carried by tasks and participations.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum title length, matching the `VARCHAR(200)` column.
const MAX_TITLE_LENGTH: usize = 200;

/// Maximum location length, matching the `VARCHAR(255)` column.
const MAX_LOCATION_LENGTH: usize = 255;

/// Maximum participation note length.
const MAX_NOTE_LENGTH: usize = 2000;

/// Non-empty task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated, trimmed title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the value is blank or
    /// [`TaskDomainError::TitleTooLong`] when it exceeds 200 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let length = normalized.chars().count();
        if length > MAX_TITLE_LENGTH {
            return Err(TaskDomainError::TitleTooLong {
                max: MAX_TITLE_LENGTH,
                actual: length,
            });
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskTitle {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskTitle> for String {
    fn from(title: TaskTitle) -> Self {
        title.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive fields of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskDetailsRecord")]
pub struct TaskDetails {
    title: TaskTitle,
    description: Option<String>,
    location: Option<String>,
}

/// Wire form of task details, normalized through the builder methods.
#[derive(Deserialize)]
struct TaskDetailsRecord {
    title: TaskTitle,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

impl TryFrom<TaskDetailsRecord> for TaskDetails {
    type Error = TaskDomainError;

    fn try_from(record: TaskDetailsRecord) -> Result<Self, Self::Error> {
        let mut details = Self::new(record.title);
        if let Some(text) = record.description {
            details = details.with_description(text);
        }
        match record.location {
            Some(place) => details.with_location(place),
            None => Ok(details),
        }
    }
}

impl TaskDetails {
    /// Creates task details with a title and no description or location.
    #[must_use]
    pub const fn new(title: TaskTitle) -> Self {
        Self {
            title,
            description: None,
            location: None,
        }
    }

    /// Sets the description. Blank descriptions are dropped.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let raw: String = description.into();
        self.description = non_blank(&raw);
        self
    }

    /// Sets the location. Blank locations are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::LocationTooLong`] when the trimmed location
    /// exceeds 255 characters.
    pub fn with_location(mut self, location: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw: String = location.into();
        let normalized = non_blank(&raw);
        if let Some(value) = &normalized {
            let length = value.chars().count();
            if length > MAX_LOCATION_LENGTH {
                return Err(TaskDomainError::LocationTooLong {
                    max: MAX_LOCATION_LENGTH,
                    actual: length,
                });
            }
        }
        self.location = normalized;
        Ok(self)
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the location, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// Positive participant limit of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MaxParticipants(u32);

impl MaxParticipants {
    /// Largest limit representable in the `INTEGER` column.
    const MAX_PERSISTED_VALUE: u32 = i32::MAX as u32;

    /// Creates a validated participant limit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidMaxParticipants`] when the value is
    /// zero or exceeds `i32::MAX`.
    pub const fn new(value: u32) -> Result<Self, TaskDomainError> {
        if value == 0 || value > Self::MAX_PERSISTED_VALUE {
            return Err(TaskDomainError::InvalidMaxParticipants(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for MaxParticipants {
    type Error = TaskDomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaxParticipants> for u32 {
    fn from(limit: MaxParticipants) -> Self {
        limit.0
    }
}

impl fmt::Display for MaxParticipants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text note attached to a participation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipationNote(String);

impl ParticipationNote {
    /// Creates a trimmed note, returning `Ok(None)` for blank input.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoteTooLong`] when the trimmed note exceeds
    /// 2000 characters.
    pub fn new(value: impl Into<String>) -> Result<Option<Self>, TaskDomainError> {
        let raw: String = value.into();
        let Some(normalized) = non_blank(&raw) else {
            return Ok(None);
        };
        let length = normalized.chars().count();
        if length > MAX_NOTE_LENGTH {
            return Err(TaskDomainError::NoteTooLong {
                max: MAX_NOTE_LENGTH,
                actual: length,
            });
        }
        Ok(Some(Self(normalized)))
    }

    /// Returns the note as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipationNote {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)?.ok_or(TaskDomainError::EmptyNote)
    }
}

impl From<ParticipationNote> for String {
    fn from(note: ParticipationNote) -> Self {
        note.0
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
