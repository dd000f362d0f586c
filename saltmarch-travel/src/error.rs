//! Recoverable command failures shared by the travel and encounter domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Enumerated failure codes carried by [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoRoute,
    WaypointNotFound,
    AlreadyTraveling,
    NotTraveling,
    NotPaused,
    EncounterActive,
    NoActiveEncounter,
    NoCreaturesAvailable,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoRoute => "NO_ROUTE",
            Self::WaypointNotFound => "WAYPOINT_NOT_FOUND",
            Self::AlreadyTraveling => "ALREADY_TRAVELING",
            Self::NotTraveling => "NOT_TRAVELING",
            Self::NotPaused => "NOT_PAUSED",
            Self::EncounterActive => "ENCOUNTER_ACTIVE",
            Self::NoActiveEncounter => "NO_ACTIVE_ENCOUNTER",
            Self::NoCreaturesAvailable => "NO_CREATURES_AVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure returned by a command. The state that rejected the
/// command is left untouched.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct CommandError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CommandError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result of a travel or encounter command.
pub type CommandResult<T = ()> = Result<T, CommandError>;
