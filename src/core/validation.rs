//! Field-keyed validation errors and the result envelope returned by shop actions.
//!
//! Business-rule violations are values, not `Err`s: the caller attaches each message
//! to the form field named by its key (e.g. `discountCents`).

use serde::Serialize;
use std::collections::BTreeMap;

/// Validation messages grouped by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error on one field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Appends a message to `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Iterates `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| (field.as_str(), m.as_str())))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Outcome of a shop action that can fail validation.
///
/// Infrastructure failures never appear here; they are the `Err` side of the
/// surrounding [`crate::errors::Result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult<T> {
    /// The action ran
    Success(T),
    /// The input was rejected
    Invalid(FieldErrors),
}

impl<T> ActionResult<T> {
    /// True for [`ActionResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The data, if the action succeeded.
    pub fn data(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Invalid(_) => None,
        }
    }

    /// The field errors, if the action was rejected.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Success(_) => None,
            Self::Invalid(errors) => Some(errors),
        }
    }
}

impl<T> From<Result<T, FieldErrors>> for ActionResult<T> {
    fn from(value: Result<T, FieldErrors>) -> Self {
        match value {
            Ok(data) => Self::Success(data),
            Err(errors) => Self::Invalid(errors),
        }
    }
}

/// Wire shape: `{ "success": true, "data": ... }` or
/// `{ "success": false, "error": "...", "fieldErrors": { ... } }`.
impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        match self {
            Self::Success(data) => {
                let mut s = serializer.serialize_struct("ActionResult", 2)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            Self::Invalid(errors) => {
                let mut s = serializer.serialize_struct("ActionResult", 3)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", &errors.to_string())?;
                s.serialize_field("fieldErrors", errors)?;
                s.end()
            }
        }
    }
}
