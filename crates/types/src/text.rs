//! Free-text form fields that must carry content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    #[error("text is empty or whitespace only")]
    Empty,
}

/// Trimmed text with at least one non-whitespace character.
///
/// Used for the diagnosis, treatment and subject name sent with a new record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Empty),
            trimmed => Ok(Self(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    /// Reuses the allocation when `value` needs no trimming.
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().len() == value.len() && !value.is_empty() {
            Ok(Self(value))
        } else {
            Self::new(value)
        }
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

impl FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
