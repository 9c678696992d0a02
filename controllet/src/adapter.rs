//! Boundaries to the UI: reading fields and rendering feedback.
//!
//! The coordinator only talks to a [`FormSource`] and a [`Renderer`].
//! [`MemoryForm`] and [`RecordingRenderer`] implement both sides in memory
//! for headless use and tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::Serialize;

use crate::config::ClassNames;
use crate::snapshot::{Attribute, FieldKind, FieldSnapshot, FieldValue};

/// Which fields of a name an update applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The first field carrying the name.
    First,
    /// The checkable field whose option value matches.
    Option(String),
    /// Every field carrying the name.
    All,
}

/// A write performed on reset or default application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Value(FieldValue),
    Checked(bool),
    /// Empty value, or unchecked for checkable fields.
    Clear,
}

/// Input boundary: field reads and writes plus listener lifecycle.
pub trait FormSource: Send + Sync {
    /// Fresh snapshots of every field, in document order.
    fn snapshots(&self) -> Vec<FieldSnapshot>;

    /// Write to the fields named `name`.
    fn apply(&self, name: &str, target: &Target, update: &FieldUpdate);

    /// (Re)attach input, change, submit and reset listeners.
    fn attach_events(&self) {}

    /// Detach every listener.
    fn detach_events(&self) {}
}

/// Output boundary: error and success feedback plus focus.
pub trait Renderer: Send + Sync {
    /// Show `message` as the field's error, or remove it on `None`.
    fn render_error(&self, field: &str, message: Option<&str>);

    /// Show `message` as the field's success, or remove it on `None`.
    fn render_success(&self, field: &str, message: Option<&str>);

    /// Move focus to the field.
    fn focus(&self, field: &str);

    /// Adopt the form's class names. Called once when the form is built.
    fn set_classes(&self, _classes: &ClassNames) {}
}

/// Form held in memory.
///
/// # Example
///
/// ```
/// use controllet::adapter::{FormSource, MemoryForm};
/// use controllet::snapshot::{FieldKind, FieldSnapshot};
///
/// let form = MemoryForm::new(vec![FieldSnapshot::new("name", FieldKind::Text)]);
/// form.set_value("name", "Ada");
/// assert_eq!(form.snapshots()[0].text(), "Ada");
/// ```
#[derive(Debug, Default)]
pub struct MemoryForm {
    fields: RwLock<Vec<FieldSnapshot>>,
    attached: AtomicUsize,
    detached: AtomicUsize,
}

impl MemoryForm {
    pub fn new(fields: Vec<FieldSnapshot>) -> Self {
        Self {
            fields: RwLock::new(fields),
            ..Default::default()
        }
    }

    /// Set the value of the first field named `name`.
    pub fn set_value(&self, name: &str, value: impl Into<FieldValue>) {
        self.apply(name, &Target::First, &FieldUpdate::Value(value.into()));
    }

    /// Check or uncheck the option `value` of a checkable group.
    pub fn set_checked(&self, name: &str, value: &str, checked: bool) {
        self.apply(
            name,
            &Target::Option(value.to_string()),
            &FieldUpdate::Checked(checked),
        );
    }

    /// Replace a field's attribute list entry, appending when absent.
    pub fn set_attribute(&self, name: &str, attr: &str, value: &str) {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(field) = fields.iter_mut().find(|f| f.name == name) {
            match field
                .attributes
                .iter_mut()
                .find(|a| a.name.eq_ignore_ascii_case(attr))
            {
                Some(existing) => existing.value = value.to_string(),
                None => field.attributes.push(Attribute::new(attr, value)),
            }
        }
    }

    /// First field carrying `name`.
    pub fn field(&self, name: &str) -> Option<FieldSnapshot> {
        self.fields
            .read()
            .ok()
            .and_then(|fields| fields.iter().find(|f| f.name == name).cloned())
    }

    /// Number of `attach_events` calls.
    pub fn attach_count(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    /// Whether listeners are currently attached.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst) > self.detached.load(Ordering::SeqCst)
    }
}

impl FormSource for MemoryForm {
    fn snapshots(&self) -> Vec<FieldSnapshot> {
        self.fields
            .read()
            .map(|fields| fields.clone())
            .unwrap_or_default()
    }

    fn apply(&self, name: &str, target: &Target, update: &FieldUpdate) {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);

        let selected: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.name == name)
            .filter(|(_, f)| match target {
                Target::Option(value) => f.text() == value.as_str(),
                Target::First | Target::All => true,
            })
            .map(|(index, _)| index)
            .collect();
        let selected = match target {
            Target::First => selected.into_iter().take(1).collect(),
            _ => selected,
        };

        for index in selected {
            match update {
                FieldUpdate::Value(value) => fields[index].value = value.clone(),
                FieldUpdate::Checked(checked) => {
                    if *checked && fields[index].kind == FieldKind::Radio {
                        for field in fields.iter_mut().filter(|f| f.name == name) {
                            field.checked = Some(false);
                        }
                    }
                    fields[index].checked = Some(*checked);
                }
                FieldUpdate::Clear => {
                    let field = &mut fields[index];
                    if field.kind.is_checkable() {
                        field.checked = Some(false);
                    } else {
                        field.value = field.value.cleared();
                    }
                }
            }
        }
    }

    fn attach_events(&self) {
        self.attached.fetch_add(1, Ordering::SeqCst);
    }

    fn detach_events(&self) {
        self.detached.fetch_add(1, Ordering::SeqCst);
    }
}

/// One call made on a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RenderCall {
    Error {
        field: String,
        message: Option<String>,
    },
    Success {
        field: String,
        message: Option<String>,
    },
    Focus {
        field: String,
    },
}

#[derive(Debug, Default)]
struct Rendered {
    errors: BTreeMap<String, String>,
    successes: BTreeMap<String, String>,
    classes: BTreeMap<String, Vec<String>>,
}

/// Renderer that records calls and keeps the resulting display state.
///
/// Messages are only displayed when the matching container class is
/// enabled; input classes are tracked per field. A form built over the
/// renderer replaces its class names with the form's.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    classes: RwLock<ClassNames>,
    calls: Mutex<Vec<RenderCall>>,
    rendered: Mutex<Rendered>,
}

impl RecordingRenderer {
    pub fn new(classes: ClassNames) -> Self {
        Self {
            classes: RwLock::new(classes),
            ..Default::default()
        }
    }

    /// Class names currently in use.
    pub fn classes(&self) -> ClassNames {
        self.classes
            .read()
            .map(|classes| classes.clone())
            .unwrap_or_default()
    }

    /// Every call, in order.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget recorded calls, keeping the display state.
    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Error currently displayed for a field.
    pub fn error(&self, field: &str) -> Option<String> {
        self.rendered().errors.get(field).cloned()
    }

    /// Success message currently displayed for a field.
    pub fn success(&self, field: &str) -> Option<String> {
        self.rendered().successes.get(field).cloned()
    }

    /// Input classes currently applied to a field.
    pub fn input_classes(&self, field: &str) -> Vec<String> {
        self.rendered()
            .classes
            .get(field)
            .cloned()
            .unwrap_or_default()
    }

    /// Fields focused, in order.
    pub fn focused(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RenderCall::Focus { field } => Some(field),
                _ => None,
            })
            .collect()
    }

    fn rendered(&self) -> std::sync::MutexGuard<'_, Rendered> {
        self.rendered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: RenderCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Renderer for RecordingRenderer {
    fn render_error(&self, field: &str, message: Option<&str>) {
        self.record(RenderCall::Error {
            field: field.to_string(),
            message: message.map(str::to_string),
        });

        let names = self.classes();
        let mut rendered = self.rendered();
        let Rendered { errors, classes, .. } = &mut *rendered;
        decorate(
            errors,
            classes,
            field,
            message,
            names.error_box(),
            names.invalid_input(),
        );
    }

    fn render_success(&self, field: &str, message: Option<&str>) {
        self.record(RenderCall::Success {
            field: field.to_string(),
            message: message.map(str::to_string),
        });

        let names = self.classes();
        let mut rendered = self.rendered();
        let Rendered {
            successes, classes, ..
        } = &mut *rendered;
        decorate(
            successes,
            classes,
            field,
            message,
            names.success_box(),
            names.valid_input(),
        );
    }

    fn focus(&self, field: &str) {
        self.record(RenderCall::Focus {
            field: field.to_string(),
        });
    }

    fn set_classes(&self, classes: &ClassNames) {
        *self.classes.write().unwrap_or_else(PoisonError::into_inner) = classes.clone();
    }
}

/// Update one message map and the input classes for a render call.
fn decorate(
    shown: &mut BTreeMap<String, String>,
    classes: &mut BTreeMap<String, Vec<String>>,
    field: &str,
    message: Option<&str>,
    container: Option<&str>,
    input_class: Option<&str>,
) {
    shown.remove(field);
    if let (Some(class), Some(applied)) = (input_class, classes.get_mut(field)) {
        applied.retain(|c| c != class);
    }

    let Some(message) = message else {
        return;
    };

    if container.is_some() {
        shown.insert(field.to_string(), message.to_string());
    }
    if let Some(class) = input_class {
        classes
            .entry(field.to_string())
            .or_default()
            .push(class.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radios() -> MemoryForm {
        MemoryForm::new(vec![
            FieldSnapshot::new("size", FieldKind::Radio).value("s"),
            FieldSnapshot::new("size", FieldKind::Radio).value("m").checked(true),
            FieldSnapshot::new("note", FieldKind::Text).value("hi"),
        ])
    }

    #[test]
    fn test_checking_radio_unchecks_siblings() {
        let form = radios();
        form.set_checked("size", "s", true);
        let checked: Vec<bool> = form
            .snapshots()
            .iter()
            .filter(|f| f.name == "size")
            .map(FieldSnapshot::is_checked)
            .collect();
        assert_eq!(checked, vec![true, false]);
    }

    #[test]
    fn test_clear_all() {
        let form = radios();
        form.apply("size", &Target::All, &FieldUpdate::Clear);
        form.apply("note", &Target::All, &FieldUpdate::Clear);
        let snapshots = form.snapshots();
        assert!(snapshots.iter().all(|f| !f.is_checked()));
        assert_eq!(form.field("note").unwrap().text(), "");
    }

    #[test]
    fn test_attach_tracking() {
        let form = radios();
        assert!(!form.is_attached());
        form.attach_events();
        assert!(form.is_attached());
        form.detach_events();
        assert!(!form.is_attached());
        assert_eq!(form.attach_count(), 1);
    }

    #[test]
    fn test_set_attribute_replaces() {
        let form = radios();
        form.set_attribute("note", "maxlength", "3");
        form.set_attribute("note", "MaxLength", "5");
        assert_eq!(form.field("note").unwrap().attribute("maxlength"), Some("5"));
    }

    #[test]
    fn test_recording_renderer_state() {
        let classes = ClassNames {
            invalid_input: "is-invalid".to_string(),
            ..Default::default()
        };
        let renderer = RecordingRenderer::new(classes);

        renderer.render_error("email", Some("Required"));
        assert_eq!(renderer.error("email").as_deref(), Some("Required"));
        assert_eq!(renderer.input_classes("email"), vec!["is-invalid"]);

        renderer.render_error("email", None);
        assert_eq!(renderer.error("email"), None);
        assert!(renderer.input_classes("email").is_empty());
        assert_eq!(renderer.calls().len(), 2);
    }

    #[test]
    fn test_disabled_container_hides_message() {
        let classes = ClassNames {
            success: String::new(),
            ..Default::default()
        };
        let renderer = RecordingRenderer::new(classes);
        renderer.render_success("name", Some("Nice"));
        assert_eq!(renderer.success("name"), None);
    }
}
