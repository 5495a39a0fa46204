//! Identifier newtypes with smart constructors.
//!
//! Identifiers validate non-empty strings at construction time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an ingredient, unique within one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientId(String);

impl IngredientId {
    /// Smart constructor: validates a non-empty, whitespace-free id.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidIngredientId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidIngredientId::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(InvalidIngredientId::Whitespace(raw));
        }
        Ok(Self(raw))
    }

    /// Id for the `seq`-th generated ingredient with the given prefix.
    pub(crate) fn generated(prefix: &str, seq: u64) -> Self {
        Self(format!("{prefix}-{seq}"))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned by a meal store to a committed meal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedId(String);

impl PersistedId {
    /// Smart constructor: validates non-empty id.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidPersistedId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidPersistedId::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersistedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle for one in-flight analysis or submission.
///
/// Issued by the coordinator when an operation begins; the outcome must be
/// reported with the same ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub(crate) fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Sequence number of this ticket.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ===== Error Types =====

/// Rejected ingredient id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIngredientId {
    /// The id was empty.
    #[error("Ingredient ID cannot be empty")]
    Empty,
    /// The id contained whitespace.
    #[error("Ingredient ID cannot contain whitespace: '{0}'")]
    Whitespace(String),
}

/// Rejected persisted meal id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPersistedId {
    /// The id was empty.
    #[error("Persisted ID cannot be empty")]
    Empty,
}
