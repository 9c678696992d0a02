//! Point-in-time reads of form fields.

use serde::{Deserialize, Serialize};

/// Input type of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Password,
    Number,
    Textarea,
    Checkbox,
    Radio,
    File,
    Select,
    SelectMultiple,
    Hidden,
}

impl FieldKind {
    /// Checkbox or radio: the value is an option value and state lives in `checked`.
    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }
}

/// Reference to a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl FileRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mime: None,
        }
    }
}

/// Raw value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Files(Vec<FileRef>),
}

impl FieldValue {
    /// The value as a single string, read the way a text control reports it.
    ///
    /// Lists yield their first item and file lists the first file name.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::List(items) => items.first().map(String::as_str).unwrap_or(""),
            Self::Files(files) => files.first().map(|f| f.name.as_str()).unwrap_or(""),
        }
    }

    /// An empty value of the same shape.
    pub fn cleared(&self) -> Self {
        match self {
            Self::Text(_) => Self::Text(String::new()),
            Self::List(_) => Self::List(Vec::new()),
            Self::Files(_) => Self::Files(Vec::new()),
        }
    }

    /// Apply a string transformation to every string inside the value.
    ///
    /// File references are left untouched.
    pub fn map_text(self, f: impl Fn(&str) -> String) -> Self {
        match self {
            Self::Text(text) => Self::Text(f(&text)),
            Self::List(items) => Self::List(items.iter().map(|item| f(item)).collect()),
            files @ Self::Files(_) => files,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A single attribute in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// Empty for boolean attributes such as `required`.
    #[serde(default)]
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Immutable read of one field, taken fresh for every validation pass.
///
/// # Example
///
/// ```
/// use controllet::snapshot::{FieldKind, FieldSnapshot};
///
/// let age = FieldSnapshot::new("age", FieldKind::Number)
///     .value("15")
///     .attr("min", "18");
/// assert_eq!(age.text(), "15");
/// assert_eq!(age.attribute("MIN"), Some("18"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl FieldSnapshot {
    /// Create an empty snapshot.
    ///
    /// Checkable kinds start unchecked.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let value = match kind {
            FieldKind::File => FieldValue::Files(Vec::new()),
            FieldKind::SelectMultiple => FieldValue::List(Vec::new()),
            _ => FieldValue::default(),
        };
        Self {
            name: name.into(),
            kind,
            value,
            checked: kind.is_checkable().then_some(false),
            ..Default::default()
        }
    }

    /// Set the value.
    pub fn value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the checked state.
    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Append an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Append a boolean attribute such as `required`.
    pub fn flag(self, name: impl Into<String>) -> Self {
        self.attr(name, "")
    }

    /// Mark the field readonly.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Mark the field disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// The value as a single string.
    pub fn text(&self) -> &str {
        self.value.as_text()
    }

    /// Look up an attribute value, ignoring ASCII case in the name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    /// Check if an attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Whether validation should skip this field.
    pub fn is_skipped(&self) -> bool {
        self.readonly || self.disabled
    }

    /// Checked state, `false` when unset.
    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or(false)
    }
}
