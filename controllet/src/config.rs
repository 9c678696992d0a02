//! Construction-time configuration for a form.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Locale, MessageCatalog};
use crate::custom::{CustomValidator, SuccessMessage};

/// Decoration class names handed to renderers.
///
/// An empty string disables that decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    /// Container holding an error message.
    pub error: String,
    /// Class added to an invalid input.
    pub invalid_input: String,
    /// Container holding a success message.
    pub success: String,
    /// Class added to a valid input.
    pub valid_input: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            error: "error-message".to_string(),
            invalid_input: String::new(),
            success: "success-message".to_string(),
            valid_input: String::new(),
        }
    }
}

impl ClassNames {
    pub fn error_box(&self) -> Option<&str> {
        non_empty(&self.error)
    }

    pub fn invalid_input(&self) -> Option<&str> {
        non_empty(&self.invalid_input)
    }

    pub fn success_box(&self) -> Option<&str> {
        non_empty(&self.success)
    }

    pub fn valid_input(&self) -> Option<&str> {
        non_empty(&self.valid_input)
    }
}

fn non_empty(class: &str) -> Option<&str> {
    (!class.is_empty()).then_some(class)
}

/// Initial value applied to a field at construction and on soft reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Checked state of a checkbox or radio.
    Checked(bool),
    /// Value of a text-like field, or option value of a radio.
    Text(String),
    /// Checked state of one option in a checkbox or radio group.
    Option { value: String, checked: bool },
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for DefaultValue {
    fn from(checked: bool) -> Self {
        Self::Checked(checked)
    }
}

/// Transformation applied to a field's submitted value.
#[derive(Clone)]
pub struct Modifier(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Modifier {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: &str) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Modifier(..)")
    }
}

/// What happens when a field is validated again while an earlier pass for
/// the same field is still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Every pass runs; only the most recently started one may publish.
    #[default]
    Latest,
    /// Passes for one field run one at a time, in start order.
    Queue,
}

/// Configuration supplied when the form is built.
///
/// # Example
///
/// ```
/// use controllet::catalog::Locale;
/// use controllet::config::FormConfig;
/// use controllet::custom::{CustomValidator, SuccessMessage, Validation};
///
/// let config = FormConfig::new()
///     .locale(Locale::FrFr)
///     .validator("email", CustomValidator::new().rule(Validation::email("Bad email")))
///     .success("email", SuccessMessage::always("Looks good"))
///     .default_value("country", "BE")
///     .modifier("email", |v| v.to_lowercase());
/// assert!(config.validators.contains_key("email"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormConfig {
    /// Locale of the built-in messages.
    pub locale: Locale,
    /// Custom rules per field name.
    pub validators: HashMap<String, CustomValidator>,
    /// Success messages per field name.
    pub success_messages: HashMap<String, SuccessMessage>,
    /// Decoration class names, handed to the renderer when the form is built.
    pub classes: ClassNames,
    /// Default values per field name.
    pub defaults: BTreeMap<String, DefaultValue>,
    /// Submitted value modifiers per field name.
    pub modifiers: HashMap<String, Modifier>,
    /// Handling of overlapping passes on one field.
    pub overlap: OverlapPolicy,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the locale.
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Register custom rules for a field.
    pub fn validator(mut self, field: impl Into<String>, validator: CustomValidator) -> Self {
        self.validators.insert(field.into(), validator);
        self
    }

    /// Register a success message for a field.
    pub fn success(mut self, field: impl Into<String>, message: SuccessMessage) -> Self {
        self.success_messages.insert(field.into(), message);
        self
    }

    /// Set the decoration class names.
    pub fn classes(mut self, classes: ClassNames) -> Self {
        self.classes = classes;
        self
    }

    /// Set a field's default value.
    pub fn default_value(mut self, field: impl Into<String>, value: impl Into<DefaultValue>) -> Self {
        self.defaults.insert(field.into(), value.into());
        self
    }

    /// Set a field's submitted value modifier.
    pub fn modifier<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.modifiers.insert(field.into(), Modifier::new(f));
        self
    }

    /// Set the overlap policy.
    pub fn overlap(mut self, policy: OverlapPolicy) -> Self {
        self.overlap = policy;
        self
    }

    /// Message catalog for the configured locale.
    pub fn catalog(&self) -> MessageCatalog {
        MessageCatalog::new(self.locale)
    }
}
