//! Validated text fields
//!
//! Titles, descriptions, comment bodies and emails are normalised here so the
//! HTTP layer and the stores only ever see trimmed, bounded values.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for board, column and card titles
const MAX_TITLE_LEN: usize = 256;

/// Maximum length for descriptions
const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Maximum length for comment bodies
const MAX_COMMENT_LEN: usize = 10_000;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex"));

/// Validated title for boards, columns and cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    /// Create a new title.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 256 characters
    ///
    /// # Example
    /// ```
    /// use kanban_core::Title;
    ///
    /// assert!(Title::new("Backlog").is_ok());
    /// assert!(Title::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Parse an optional request field, treating blank input as missing.
    pub fn required(s: Option<&str>, message: &'static str) -> Result<Self, ValidationError> {
        match s.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Self::new(t),
            None => Err(ValidationError::Required { message }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalise a free-text description: trimmed, blank becomes `None`.
pub fn description(s: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = s.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description",
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(Some(trimmed.to_owned()))
}

/// Validated comment body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }

        if trimmed.chars().count() > MAX_COMMENT_LEN {
            return Err(ValidationError::TooLong {
                field: "content",
                max: MAX_COMMENT_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Lowercased, trimmed email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ValidationError::Required {
                message: "Email is required",
            });
        }

        if !EMAIL_RE.is_match(&normalized) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@example.com",
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
