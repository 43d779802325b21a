//! Board roles and what each role may do
//!
//! Every board has exactly one `owner` membership (created with the board).
//! Admins manage members and structure; members work with cards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Role of a user within a board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    /// Owners and admins can edit board settings, manage members and delete columns.
    pub fn is_manager(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Role that may be handed out through the members API.
    pub fn grantable(&self) -> bool {
        !matches!(self, Self::Owner)
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(ValidationError::InvalidVariant {
                field: "role",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Board-scoped actions that are gated on membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    /// Read the board, its members and activity
    View,
    /// Create, edit and move columns and cards, comment, delete cards
    Edit,
    /// Update board settings
    Configure,
    /// Add, re-role or remove members
    ManageMembers,
    /// Delete a column with all its cards
    DeleteColumn,
}

impl BoardAction {
    /// Whether `role` may perform this action. `None` means the caller is not a member.
    pub fn allowed_for(&self, role: Option<Role>) -> bool {
        let Some(role) = role else {
            return false;
        };

        match self {
            Self::View | Self::Edit => true,
            Self::Configure | Self::ManageMembers | Self::DeleteColumn => role.is_manager(),
        }
    }
}
