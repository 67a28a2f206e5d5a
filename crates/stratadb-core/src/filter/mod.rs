//! Payload filtering for vector search.
//!
//! A [`Filter`] narrows search results to points whose payload satisfies a
//! condition tree. The in-process index variants evaluate conditions
//! directly against payload documents; the Basalt variant ships the
//! serialized tree across the foreign boundary instead (see
//! [`Filter::to_exchange_json`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stratadb_core::filter::{Condition, Filter};
//!
//! let filter = Filter::new(Condition::and(vec![
//!     Condition::eq("category", "tech"),
//!     Condition::gt("price", 100),
//! ]));
//! ```

mod matching;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A filter for payload-based search refinement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    /// The root condition of the filter.
    pub condition: Condition,
}

impl Filter {
    /// Creates a new filter with the given condition.
    #[must_use]
    pub fn new(condition: Condition) -> Self {
        Self { condition }
    }

    /// Evaluates the filter against a payload document.
    #[must_use]
    pub fn matches(&self, payload: &crate::point::Payload) -> bool {
        self.condition.matches(payload)
    }

    /// Serializes the condition tree into the JSON exchange form understood
    /// by the Basalt engine. The engine has no knowledge of this crate's
    /// filter types, so this is the only representation that crosses the
    /// boundary.
    pub fn to_exchange_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A condition over payload fields.
///
/// Field names support dot notation for nested objects
/// (`"meta.author.name"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Equality comparison: field == value.
    Eq {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// Not equal comparison: field != value.
    Neq {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// Greater than comparison: field > value.
    Gt {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// Greater than or equal comparison: field >= value.
    Gte {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// Less than comparison: field < value.
    Lt {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// Less than or equal comparison: field <= value.
    Lte {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },
    /// Check if field value is in a list.
    In {
        /// Field name.
        field: String,
        /// Values to check against.
        values: Vec<Value>,
    },
    /// Check if field is absent or null.
    IsNull {
        /// Field name.
        field: String,
    },
    /// Logical AND of multiple conditions.
    And {
        /// Conditions to AND together.
        conditions: Vec<Condition>,
    },
    /// Logical OR of multiple conditions.
    Or {
        /// Conditions to OR together.
        conditions: Vec<Condition>,
    },
    /// Logical NOT of a condition.
    Not {
        /// Condition to negate.
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Builds an equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a not-equal condition.
    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Neq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a greater-than condition.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a greater-or-equal condition.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a less-than condition.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a less-or-equal condition.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a membership condition.
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Builds a null/absence check.
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull {
            field: field.into(),
        }
    }

    /// Combines conditions with logical AND.
    #[must_use]
    pub fn and(conditions: Vec<Self>) -> Self {
        Self::And { conditions }
    }

    /// Combines conditions with logical OR.
    #[must_use]
    pub fn or(conditions: Vec<Self>) -> Self {
        Self::Or { conditions }
    }

    /// Negates a condition.
    #[must_use]
    pub fn not(condition: Self) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }
}
