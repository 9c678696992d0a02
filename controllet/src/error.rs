//! Error types and the diagnostics sink.

use std::any::Any;
use std::sync::{Mutex, PoisonError};

use log::Level;

/// Boxed error returned by fallible custom conditions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Diagnostics raised while validating a form.
///
/// None of these stop the coordinator: the failing rule or operation is
/// reported and the remaining fields are still validated.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// A `pattern` attribute is not a valid regular expression.
    #[error("Field '{field}' has an invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        /// First line of the compiler's message.
        reason: String,
        #[source]
        source: fancy_regex::Error,
    },

    /// A custom condition returned an error or panicked.
    #[error("Custom validation #{rule} for field '{field}' crashed: {cause}")]
    ValidatorCrashed {
        field: String,
        /// Position of the rule in the field's validation list.
        rule: usize,
        cause: String,
    },

    /// A field name was referenced that no snapshot carries.
    #[error("Field with name '{field}' not found")]
    MissingField { field: String },

    /// A locale tag outside the supported set.
    #[error("Unknown locale '{0}'")]
    UnknownLocale(String),
}

impl FormError {
    /// Creates a new invalid pattern error.
    pub fn invalid_pattern(
        field: impl Into<String>,
        pattern: impl Into<String>,
        source: fancy_regex::Error,
    ) -> Self {
        let reason = source.to_string();
        Self::InvalidPattern {
            field: field.into(),
            pattern: pattern.into(),
            reason: reason.lines().next().unwrap_or_default().trim().to_string(),
            source,
        }
    }

    /// Creates a new crashed validator error.
    pub fn crashed(field: impl Into<String>, rule: usize, cause: impl Into<String>) -> Self {
        Self::ValidatorCrashed {
            field: field.into(),
            rule,
            cause: cause.into(),
        }
    }

    /// Creates a new missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Log level this diagnostic is reported at.
    pub fn level(&self) -> Level {
        match self {
            Self::MissingField { .. } => Level::Warn,
            Self::InvalidPattern { .. } | Self::ValidatorCrashed { .. } | Self::UnknownLocale(_) => {
                Level::Error
            }
        }
    }

    /// Name of the field this diagnostic concerns, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidPattern { field, .. }
            | Self::ValidatorCrashed { field, .. }
            | Self::MissingField { field } => Some(field),
            Self::UnknownLocale(_) => None,
        }
    }
}

/// Observability sink receiving non-fatal diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Report a diagnostic.
    fn report(&self, error: &FormError);
}

/// Sink that forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, error: &FormError) {
        log::log!(error.level(), "{}", error);
    }
}

/// Sink that keeps every reported diagnostic in memory.
///
/// Each report is also forwarded to the `log` facade.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<String>>,
    crashed: Mutex<Vec<(String, usize)>>,
    missing: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Display text of every report, in order.
    pub fn reports(&self) -> Vec<String> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(field, rule)` pairs of crashed custom validations.
    pub fn crashed(&self) -> Vec<(String, usize)> {
        self.crashed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Field names reported missing.
    pub fn missing(&self) -> Vec<String> {
        self.missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check if nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.reports
            .lock()
            .map(|reports| reports.is_empty())
            .unwrap_or(true)
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, error: &FormError) {
        LogSink.report(error);

        match error {
            FormError::ValidatorCrashed { field, rule, .. } => self
                .crashed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((field.clone(), *rule)),
            FormError::MissingField { field } => self
                .missing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(field.clone()),
            _ => {}
        }

        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }
}

/// Extract a human-readable message from a panic payload.
///
/// Panics carry either `&str` or `String` payloads; anything else yields a
/// generic message.
pub fn extract_panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
