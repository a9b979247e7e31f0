//! Unified error types for the school ledger.
//!
//! Malformed ledger input is rejected with a typed error carrying enough context
//! to show staff an actionable message, rather than producing a silently wrong status.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// An entry references a fee component or attendance date that is not on the schedule
    #[error(
        "entry for student '{entity_id}' references '{key}', which is not on this schedule \
         (it may have been removed); re-record it against an existing component"
    )]
    UnknownComponent {
        /// Student the entry was recorded for
        entity_id: String,
        /// The schedule key the entry referenced
        key: String,
    },

    /// An entry references a student that is not part of the roster being reconciled
    #[error("entry references student '{entity_id}', who is not on this class roster")]
    UnknownEntity {
        /// The unknown student id
        entity_id: String,
    },

    /// A per-student reconcile received an entry recorded for another student
    #[error("entry for student '{found}' cannot be reconciled against student '{expected}'")]
    EntityMismatch {
        /// Student being reconciled
        expected: String,
        /// Student named on the entry
        found: String,
    },

    /// Schedule failed validation at build or edit time
    #[error("invalid schedule: {reason}")]
    InvalidSchedule {
        /// What was wrong with the schedule
        reason: String,
    },

    /// Ledger amount is negative or not a finite number
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Component key text could not be parsed
    #[error("invalid fee component key: '{input}'")]
    InvalidKey {
        /// The rejected text
        input: String,
    },

    /// A stored or configured value could not be parsed
    #[error("invalid {field}: '{input}'")]
    InvalidValue {
        /// Which kind of value was being parsed
        field: &'static str,
        /// The rejected text
        input: String,
    },

    /// No schedule is stored for the class and term
    #[error("no schedule found for class '{group_id}' in term '{term_id}'")]
    ScheduleNotFound {
        /// Class or section
        group_id: String,
        /// Academic term
        term_id: String,
    },

    /// No student is stored with the id
    #[error("student not found: {id}")]
    StudentNotFound {
        /// The missing student id
        id: String,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Database error raised by `SeaORM`
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
