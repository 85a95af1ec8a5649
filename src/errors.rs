//! Unified error types for Threadline.
//!
//! Infrastructure failures (database, configuration, Discord) and invalid input shapes
//! are reported through [`Error`]. Ordinary business-rule violations such as an
//! oversized discount are *not* errors; they are returned as field-keyed
//! [`crate::core::validation::FieldErrors`] so callers can attach them to form fields.

use thiserror::Error;

/// Every failure a Threadline operation can propagate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Any error reported by `SeaORM` or the underlying driver
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error while reading files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A record does not exist, or belongs to another shop
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record (`"order"`, `"garment"`, ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// A monetary amount is malformed (for example, a non-positive payment)
    #[error("Invalid amount: {cents} cents")]
    InvalidAmount {
        /// Offending amount in cents
        cents: i64,
    },

    /// Money arithmetic left the representable range
    #[error("Amount out of range while computing {what}")]
    AmountOutOfRange {
        /// Quantity being computed (`"subtotal"`, `"tax"`, ...)
        what: &'static str,
    },

    /// A record failed validation at the storage boundary
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Human-readable description of the problem
        message: String,
    },

    /// A dollar string could not be parsed into cents
    #[error("Invalid dollar amount: '{value}'")]
    InvalidDollarAmount {
        /// Raw input
        value: String,
    },

    /// A stored due date could not be parsed
    #[error("Invalid date '{value}'")]
    InvalidDate {
        /// Raw input
        value: String,
    },

    /// The configured shop timezone is not a known IANA zone
    #[error("Unknown timezone '{name}'")]
    InvalidTimezone {
        /// Raw timezone name
        name: String,
    },

    /// The caller is not allowed to act on this shop
    #[error("Staff member {user_id} cannot act on shop {shop_id}")]
    Forbidden {
        /// Staff identifier from the session
        user_id: String,
        /// Shop that was targeted
        shop_id: i64,
    },

    /// A garment cannot move past its terminal stage
    #[error("Garment {id} is already done")]
    InvalidStageTransition {
        /// Garment identifier
        id: i64,
    },

    /// Integer conversion overflow (page sizes, percentages)
    #[error("Integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// Serenity/Poise framework error
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<sea_orm::TransactionError<Error>> for Error {
    fn from(value: sea_orm::TransactionError<Error>) -> Self {
        match value {
            sea_orm::TransactionError::Connection(e) => Self::Database(e),
            sea_orm::TransactionError::Transaction(e) => e,
        }
    }
}

impl Error {
    /// Shorthand for a [`Error::NotFound`].
    #[must_use]
    pub const fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Shorthand for an [`Error::AmountOutOfRange`].
    #[must_use]
    pub const fn out_of_range(what: &'static str) -> Self {
        Self::AmountOutOfRange { what }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
