//! Form validation gate
//!
//! Field rules are declarative. A schema is evaluated on every submit attempt
//! and produces a fresh [`ValidationResult`]; nothing is retained between
//! attempts except the per-field error state the session keeps for display.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::types::FormValues;

/// Custom predicate: returns an error message when the value is rejected
pub type RulePredicate = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A single declarative check applied to a trimmed field value
#[derive(Clone)]
pub enum FieldRule {
    /// Value must not be blank
    Required { message: String },
    /// Value must have at least `min` characters after trimming
    MinLength { min: usize, message: String },
    /// Value must have at most `max` characters after trimming
    MaxLength { max: usize, message: String },
    /// Non-blank value must match the pattern
    Pattern { regex: Regex, message: String },
    /// Domain-specific check
    Custom(RulePredicate),
}

impl FieldRule {
    pub fn required(message: impl Into<String>) -> Self {
        Self::Required { message: message.into() }
    }

    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::MinLength { min, message: message.into() }
    }

    pub fn max_length(max: usize, message: impl Into<String>) -> Self {
        Self::MaxLength { max, message: message.into() }
    }

    pub fn pattern(regex: Regex, message: impl Into<String>) -> Self {
        Self::Pattern { regex, message: message.into() }
    }

    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(check))
    }

    /// Apply the rule to an already-trimmed value
    fn check(&self, value: &str) -> Option<String> {
        let len = value.chars().count();
        match self {
            Self::Required { message } => value.is_empty().then(|| message.clone()),
            // Length rules leave blank optional fields alone
            Self::MinLength { min, message } => {
                (!value.is_empty() && len < *min).then(|| message.clone())
            }
            Self::MaxLength { max, message } => (len > *max).then(|| message.clone()),
            Self::Pattern { regex, message } => {
                (!value.is_empty() && !regex.is_match(value)).then(|| message.clone())
            }
            Self::Custom(check) => check(value),
        }
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { message } => f.debug_struct("Required").field("message", message).finish(),
            Self::MinLength { min, message } => f
                .debug_struct("MinLength")
                .field("min", min)
                .field("message", message)
                .finish(),
            Self::MaxLength { max, message } => f
                .debug_struct("MaxLength")
                .field("max", max)
                .field("message", message)
                .finish(),
            Self::Pattern { regex, message } => f
                .debug_struct("Pattern")
                .field("regex", &regex.as_str())
                .field("message", message)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Declaration of one form field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field identifier, used as the key in submitted values
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Placeholder shown while the field is empty
    pub placeholder: String,
    /// Rules evaluated in order; the first failure wins
    pub rules: Vec<FieldRule>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            placeholder: String::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Ordered set of fields plus the primary field that may never be blank
#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
    primary: String,
}

impl FormSchema {
    /// Create a schema; the first field is the primary one
    pub fn new(primary: FieldSpec) -> Self {
        Self {
            primary: primary.id.clone(),
            fields: vec![primary],
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Run every field's rules against the given values
    pub fn validate(&self, values: &FormValues) -> ValidationResult {
        let mut result = ValidationResult::default();

        for field in &self.fields {
            let value = values.get(&field.id).map(|v| v.trim()).unwrap_or("");

            let mut message = field.rules.iter().find_map(|rule| rule.check(value));

            if message.is_none() && field.id == self.primary && value.is_empty() {
                message = Some(format!("{} is required", field.label));
            }

            if let Some(message) = message {
                result.errors.push(ValidationError {
                    field: field.id.clone(),
                    message,
                });
            }
        }

        result
    }
}

/// A field-level, user-correctable validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Outcome of a single submit attempt, in field declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first failing field, which is what gets surfaced and focused
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn into_field_errors(self) -> FieldErrors {
        FieldErrors {
            entries: self.errors,
        }
    }
}

/// Per-field error state held by a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<ValidationError>,
}

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    /// Clear one field's error, leaving the others in place
    pub fn clear(&mut self, field: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|error| error.field != field);
        self.entries.len() != before
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.entries.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.entries.iter()
    }
}
