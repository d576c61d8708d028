/// Field-level validation results
///
/// Every validator in this crate reports *all* violated fields at once rather
/// than stopping at the first failure. Rules that `validator` can express
/// (required, length, email) come from derive attributes; the rest (enum
/// membership, per-tag length, timestamp parsing) are checked by hand and
/// merged into the same list.
///
/// # Example
///
/// ```
/// use taskdesk_shared::validation::{FieldViolation, Violations};
///
/// let violations = Violations::new(vec![
///     FieldViolation::new("title", "Title cannot be more than 100 characters"),
/// ]);
/// assert!(violations.contains_field("title"));
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

/// A single violated constraint on a named field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field that failed validation (wire name, e.g. `dueDate`)
    pub field: String,

    /// Human-readable message, returned verbatim to clients
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A non-empty, field-sorted list of violations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    /// Sorts by field name so the order is stable across runs
    pub fn new(mut violations: Vec<FieldViolation>) -> Self {
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        Self(violations)
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldViolation::new(field, message)])
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn as_slice(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<FieldViolation> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|v| v.message.as_str()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

/// Flattens `validator` derive output into field violations
///
/// `rename` maps struct field names to the wire names clients send
/// (`due_date` -> `dueDate`). Fields without a mapping keep their name.
pub fn from_validator_errors(
    errors: &ValidationErrors,
    rename: &[(&str, &str)],
) -> Vec<FieldViolation> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            let field = field.to_string();
            let wire = rename
                .iter()
                .find(|(rust, _)| *rust == field)
                .map(|(_, wire)| wire.to_string())
                .unwrap_or(field);
            errors.iter().map(move |error| FieldViolation {
                field: wire.clone(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect()
}

/// Returns `Ok(())` for an empty list, otherwise the sorted violations
pub fn finish(violations: Vec<FieldViolation>) -> Result<(), Violations> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Violations::new(violations))
    }
}
