//! Form-level coordination: validating every field, submit, watch and reset.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::adapter::{FieldUpdate, FormSource, Renderer, Target};
use crate::catalog::MessageCatalog;
use crate::config::{DefaultValue, FormConfig, OverlapPolicy};
use crate::error::{DiagnosticSink, FormError, LogSink};
use crate::field::{FieldStatus, FieldValidator, FieldVerdict};
use crate::snapshot::{FieldKind, FieldSnapshot, FieldValue};

type SubmitHandler = Arc<dyn Fn(&FormResult) + Send + Sync>;
type WatchHandler = Arc<dyn Fn(&WatchData) + Send + Sync>;

/// Errors of one invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub name: String,
    pub errors: Vec<String>,
}

/// Aggregate verdict of a whole-form validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormResult {
    /// True iff no field has errors.
    pub status: bool,
    /// Submittable values of the fields without errors.
    pub data: BTreeMap<String, FieldValue>,
    /// Invalid fields in document order.
    pub errors: Vec<FieldErrors>,
}

impl FormResult {
    pub fn is_valid(&self) -> bool {
        self.status
    }

    /// Name of the first invalid field.
    pub fn first_invalid(&self) -> Option<&str> {
        self.errors.first().map(|e| e.name.as_str())
    }

    /// Errors recorded for a field.
    pub fn errors_for(&self, name: &str) -> Option<&[String]> {
        self.errors
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.errors.as_slice())
    }
}

/// Payload delivered to watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchData {
    pub errors: Vec<String>,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

/// How [`FormCoordinator::reset`] rewrites fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResetMode {
    /// Re-apply declared default values, leaving other fields alone.
    #[default]
    Defaults,
    /// Empty every field and uncheck every checkbox and radio.
    Blank,
}

/// Notifications from the input boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Input(String),
    Change(String),
    Submit,
    Reset,
}

#[derive(Debug, Default)]
struct FieldState {
    status: FieldStatus,
    errors: Vec<String>,
    /// Generation of the most recently started pass.
    generation: u64,
}

/// Builder for [`FormCoordinator`].
pub struct FormBuilder {
    source: Arc<dyn FormSource>,
    renderer: Arc<dyn Renderer>,
    config: FormConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl FormBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the diagnostics sink (defaults to [`LogSink`]).
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Build the coordinator, hand the class names to the renderer, apply
    /// default values and attach listeners.
    pub fn build(self) -> FormCoordinator {
        let form = FormCoordinator {
            catalog: self.config.catalog(),
            source: self.source,
            renderer: self.renderer,
            config: Arc::new(self.config),
            sink: self.sink,
            states: RwLock::new(HashMap::new()),
            queues: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            submit_handler: RwLock::new(None),
            watchers: RwLock::new(HashMap::new()),
        };
        form.renderer.set_classes(&form.config.classes);
        form.apply_defaults();
        form.source.attach_events();
        form
    }
}

/// Drives validation for every field of one form.
///
/// Each field name owns its error state. Overlapping passes on one field are
/// resolved by [`OverlapPolicy`]: with `Latest`, every pass is tagged with a
/// generation and only the most recently started pass may publish its
/// result; with `Queue`, passes for a field run one at a time.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use controllet::adapter::{MemoryForm, RecordingRenderer};
/// use controllet::form::FormCoordinator;
/// use controllet::snapshot::{FieldKind, FieldSnapshot};
///
/// # futures::executor::block_on(async {
/// let source = Arc::new(MemoryForm::new(vec![
///     FieldSnapshot::new("email", FieldKind::Email).flag("required"),
/// ]));
/// let renderer = Arc::new(RecordingRenderer::default());
/// let form = FormCoordinator::builder(source, renderer.clone()).build();
///
/// let result = form.submit().await;
/// assert!(!result.status);
/// assert_eq!(renderer.focused(), vec!["email".to_string()]);
/// # });
/// ```
pub struct FormCoordinator {
    source: Arc<dyn FormSource>,
    renderer: Arc<dyn Renderer>,
    config: Arc<FormConfig>,
    catalog: MessageCatalog,
    sink: Arc<dyn DiagnosticSink>,
    states: RwLock<HashMap<String, FieldState>>,
    queues: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    next_generation: AtomicU64,
    submit_handler: RwLock<Option<SubmitHandler>>,
    watchers: RwLock<HashMap<String, Vec<WatchHandler>>>,
}

impl FormCoordinator {
    pub fn builder(source: Arc<dyn FormSource>, renderer: Arc<dyn Renderer>) -> FormBuilder {
        FormBuilder {
            source,
            renderer,
            config: FormConfig::default(),
            sink: Arc::new(LogSink),
        }
    }

    /// The configuration the form was built with.
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Field state
    // -------------------------------------------------------------------------

    /// Current lifecycle status of a field.
    pub fn status(&self, name: &str) -> FieldStatus {
        self.states
            .read()
            .ok()
            .and_then(|states| states.get(name).map(|s| s.status))
            .unwrap_or_default()
    }

    /// Errors of the last published pass for a field.
    pub fn errors(&self, name: &str) -> Vec<String> {
        self.states
            .read()
            .ok()
            .and_then(|states| states.get(name).map(|s| s.errors.clone()))
            .unwrap_or_default()
    }

    pub fn has_errors(&self, name: &str) -> bool {
        !self.errors(name).is_empty()
    }

    /// Start a pass: assign it the next generation and mark the field busy.
    fn begin(&self, name: &str) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(name.to_string()).or_default();
        state.generation = generation;
        state.status = FieldStatus::Validating;
        generation
    }

    fn is_current(&self, name: &str, generation: u64) -> bool {
        self.states
            .read()
            .map(|states| states.get(name).map(|s| s.generation) == Some(generation))
            .unwrap_or(false)
    }

    /// Publish a verdict if its pass is still the latest for the field.
    fn finish(&self, verdict: &FieldVerdict, generation: u64) -> bool {
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        match states.get_mut(&verdict.name) {
            Some(state) if state.generation == generation => {
                state.status = verdict.status();
                state.errors = verdict.errors.clone();
                true
            }
            _ => false,
        }
    }

    fn queue(&self, name: &str) -> Arc<AsyncMutex<()>> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    async fn enter(&self, name: &str) -> Option<OwnedMutexGuard<()>> {
        match self.config.overlap {
            OverlapPolicy::Latest => None,
            OverlapPolicy::Queue => Some(self.queue(name).lock_owned().await),
        }
    }

    fn validator(&self, name: &str) -> FieldValidator<'_> {
        FieldValidator::new(self.catalog, self.sink.as_ref())
            .with_custom(self.config.validators.get(name))
            .with_success(self.config.success_messages.get(name))
    }

    /// Run one pass for a field and publish it if it is still current.
    ///
    /// `read` is called after any queued pass ahead of this one finished.
    /// Publishing renders the first error and, with `with_success`, the
    /// success message.
    async fn run_pass<F>(&self, name: &str, read: F, with_success: bool) -> Option<FieldVerdict>
    where
        F: FnOnce() -> Vec<FieldSnapshot> + Send,
    {
        let _turn = self.enter(name).await;

        let snapshots = read();
        if snapshots.is_empty() {
            self.sink.report(&FormError::missing(name));
            return None;
        }

        let generation = self.begin(name);
        log::debug!("[form] validating '{}' (generation {})", name, generation);

        let verdict = self
            .validator(name)
            .validate_group(name, &snapshots, |partial| {
                if self.is_current(name, generation) {
                    self.renderer
                        .render_error(name, partial.first().map(String::as_str));
                }
            })
            .await;

        if self.finish(&verdict, generation) {
            self.renderer.render_error(name, verdict.first_error());
            if with_success {
                self.renderer
                    .render_success(name, verdict.success.as_deref());
            }
        } else {
            log::debug!(
                "[form] discarding stale result for '{}' (generation {})",
                name,
                generation
            );
        }

        Some(verdict)
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Re-read and validate one field, then render its error and success.
    ///
    /// Returns `None` when no field carries `name`.
    pub async fn validate_field(&self, name: &str) -> Option<FieldVerdict> {
        let source = Arc::clone(&self.source);
        self.run_pass(name, move || group(&source.snapshots(), name), true)
            .await
    }

    /// Validate every field in document order.
    pub async fn validate_all(&self) -> FormResult {
        self.evaluate_all().await.0
    }

    async fn evaluate_all(&self) -> (FormResult, Vec<FieldVerdict>) {
        let snapshots = self.source.snapshots();
        let mut result = FormResult {
            status: true,
            ..Default::default()
        };
        let mut verdicts = Vec::new();

        for name in names(&snapshots) {
            let members = group(&snapshots, &name);
            let Some(verdict) = self.run_pass(&name, || members.clone(), false).await else {
                continue;
            };

            if verdict.has_errors() {
                result.status = false;
                result.errors.push(FieldErrors {
                    name: name.clone(),
                    errors: verdict.errors.clone(),
                });
            } else if let Some(value) = submitted_value(&members) {
                let value = match self.config.modifiers.get(&name) {
                    Some(modifier) => value.map_text(|v| modifier.apply(v)),
                    None => value,
                };
                result.data.insert(name.clone(), value);
            }

            verdicts.push(verdict);
        }

        (result, verdicts)
    }

    // -------------------------------------------------------------------------
    // Submit
    // -------------------------------------------------------------------------

    /// Register the submit handler, replacing any previous one.
    pub fn on_submit<F>(&self, handler: F)
    where
        F: Fn(&FormResult) + Send + Sync + 'static,
    {
        *self
            .submit_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Validate the whole form and hand the result to the submit handler.
    ///
    /// An invalid form focuses its first invalid field. A valid form first
    /// clears every success indicator and then renders the current ones.
    pub async fn submit(&self) -> FormResult {
        let (result, verdicts) = self.evaluate_all().await;

        match result.first_invalid() {
            Some(first) => self.renderer.focus(first),
            None => {
                for verdict in &verdicts {
                    self.renderer.render_success(&verdict.name, None);
                }
                for verdict in &verdicts {
                    if let Some(message) = verdict.success.as_deref() {
                        self.renderer.render_success(&verdict.name, Some(message));
                    }
                }
            }
        }

        let handler = self
            .submit_handler
            .read()
            .ok()
            .and_then(|handler| handler.clone());
        if let Some(handler) = handler {
            handler(&result);
        }

        result
    }

    // -------------------------------------------------------------------------
    // Watch
    // -------------------------------------------------------------------------

    /// Observe a field: `on_change` runs now and after every mutation event
    /// for `name`, once per field carrying the name.
    pub async fn watch<F>(&self, name: &str, on_change: F)
    where
        F: Fn(&WatchData) + Send + Sync + 'static,
    {
        let members = group(&self.source.snapshots(), name);
        if members.is_empty() {
            self.sink.report(&FormError::missing(name));
            return;
        }

        let handler: WatchHandler = Arc::new(on_change);
        self.watchers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .push(Arc::clone(&handler));

        for snapshot in &members {
            let data = self.watch_data(snapshot).await;
            handler(&data);
        }
    }

    async fn notify_watchers(&self, name: &str) {
        let handlers = self
            .watchers
            .read()
            .ok()
            .and_then(|watchers| watchers.get(name).cloned())
            .unwrap_or_default();
        if handlers.is_empty() {
            return;
        }

        for snapshot in group(&self.source.snapshots(), name) {
            let data = self.watch_data(&snapshot).await;
            for handler in &handlers {
                handler(&data);
            }
        }
    }

    async fn watch_data(&self, snapshot: &FieldSnapshot) -> WatchData {
        let errors = match self.validator(&snapshot.name).validate(snapshot).await {
            Ok(errors) => errors,
            Err(error) => {
                self.sink.report(&error);
                vec![error.to_string()]
            }
        };

        WatchData {
            errors,
            value: snapshot.text().to_string(),
            checked: snapshot.kind.is_checkable().then(|| snapshot.is_checked()),
        }
    }

    // -------------------------------------------------------------------------
    // Reset
    // -------------------------------------------------------------------------

    /// Rewrite field values. Does not validate or touch rendered feedback.
    pub fn reset(&self, mode: ResetMode) {
        match mode {
            ResetMode::Defaults => self.apply_defaults(),
            ResetMode::Blank => {
                for name in names(&self.source.snapshots()) {
                    self.source.apply(&name, &Target::All, &FieldUpdate::Clear);
                }
            }
        }
    }

    /// Remove every error and success rendering and forget field state.
    pub fn clear(&self) {
        for name in names(&self.source.snapshots()) {
            self.renderer.render_error(&name, None);
            self.renderer.render_success(&name, None);
        }

        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        for state in states.values_mut() {
            // Any pass still running for this field becomes stale.
            state.generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.status = FieldStatus::Pristine;
            state.errors.clear();
        }
    }

    fn apply_defaults(&self) {
        let snapshots = self.source.snapshots();

        for (name, default) in &self.config.defaults {
            let members = group(&snapshots, name);
            let Some(first) = members.first() else {
                self.sink.report(&FormError::missing(name));
                continue;
            };

            let (target, update) = default_update(first.kind, default, &members);
            self.source.apply(name, &target, &update);
        }
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Dispatch an event from the input boundary.
    pub async fn handle_event(&self, event: FormEvent) {
        match event {
            FormEvent::Input(name) | FormEvent::Change(name) => {
                self.validate_field(&name).await;
                self.notify_watchers(&name).await;
            }
            FormEvent::Submit => {
                self.submit().await;
            }
            FormEvent::Reset => {
                self.clear();
                self.reset(ResetMode::Defaults);
                self.source.attach_events();
            }
        }
    }

    /// Detach the input boundary's listeners.
    pub fn detach(&self) {
        self.source.detach_events();
    }

    /// Current submittable value of every field, without modifiers.
    pub fn serialize(&self) -> BTreeMap<String, FieldValue> {
        let snapshots = self.source.snapshots();
        names(&snapshots)
            .into_iter()
            .filter_map(|name| {
                let value = submitted_value(&group(&snapshots, &name))?;
                Some((name, value))
            })
            .collect()
    }
}

/// Distinct field names in first-appearance order.
fn names(snapshots: &[FieldSnapshot]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for snapshot in snapshots {
        if !names.contains(&snapshot.name) {
            names.push(snapshot.name.clone());
        }
    }
    names
}

fn group(snapshots: &[FieldSnapshot], name: &str) -> Vec<FieldSnapshot> {
    snapshots.iter().filter(|s| s.name == name).cloned().collect()
}

/// The value a field group submits.
///
/// Checkbox groups submit their checked option values, radio groups the
/// checked option (nothing when none is checked), file inputs every file.
fn submitted_value(members: &[FieldSnapshot]) -> Option<FieldValue> {
    let first = members.first()?;

    match first.kind {
        FieldKind::Checkbox => Some(FieldValue::List(
            members
                .iter()
                .filter(|s| s.is_checked())
                .map(|s| s.text().to_string())
                .collect(),
        )),
        FieldKind::Radio => members
            .iter()
            .find(|s| s.is_checked())
            .map(|s| FieldValue::Text(s.text().to_string())),
        FieldKind::File => Some(FieldValue::Files(
            members
                .iter()
                .flat_map(|s| match &s.value {
                    FieldValue::Files(files) => files.clone(),
                    _ => Vec::new(),
                })
                .collect(),
        )),
        _ => Some(first.value.clone()),
    }
}

/// Translate a declared default into a write on the field group.
fn default_update(
    kind: FieldKind,
    default: &DefaultValue,
    members: &[FieldSnapshot],
) -> (Target, FieldUpdate) {
    let has_option = |value: &str| members.iter().any(|s| s.text() == value);

    match (kind, default) {
        (FieldKind::Checkbox, DefaultValue::Option { value, checked }) => {
            let target = if has_option(value) {
                Target::Option(value.clone())
            } else {
                Target::All
            };
            (target, FieldUpdate::Checked(*checked))
        }
        (FieldKind::Checkbox, DefaultValue::Checked(checked)) => {
            (Target::First, FieldUpdate::Checked(*checked))
        }
        (FieldKind::Checkbox, DefaultValue::Text(text)) => {
            (Target::First, FieldUpdate::Checked(!text.is_empty()))
        }
        (FieldKind::Radio, default) => {
            let (value, fallback) = match default {
                DefaultValue::Option { value, checked } => (value.clone(), *checked),
                DefaultValue::Text(text) => (text.clone(), false),
                DefaultValue::Checked(checked) => (checked.to_string(), false),
            };
            if has_option(&value) {
                (Target::Option(value), FieldUpdate::Checked(true))
            } else {
                (Target::First, FieldUpdate::Checked(fallback))
            }
        }
        (_, default) => {
            let text = match default {
                DefaultValue::Text(text) => text.clone(),
                DefaultValue::Checked(checked) => checked.to_string(),
                DefaultValue::Option { value, .. } => value.clone(),
            };
            (Target::First, FieldUpdate::Value(FieldValue::Text(text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileRef;

    #[test]
    fn test_names_keep_first_appearance_order() {
        let snapshots = vec![
            FieldSnapshot::new("b", FieldKind::Radio),
            FieldSnapshot::new("a", FieldKind::Text),
            FieldSnapshot::new("b", FieldKind::Radio),
        ];
        assert_eq!(names(&snapshots), vec!["b", "a"]);
    }

    #[test]
    fn test_submitted_value_shapes() {
        let boxes = [
            FieldSnapshot::new("tags", FieldKind::Checkbox).value("a").checked(true),
            FieldSnapshot::new("tags", FieldKind::Checkbox).value("b"),
            FieldSnapshot::new("tags", FieldKind::Checkbox).value("c").checked(true),
        ];
        assert_eq!(
            submitted_value(&boxes),
            Some(FieldValue::List(vec!["a".into(), "c".into()]))
        );

        let radios = [
            FieldSnapshot::new("size", FieldKind::Radio).value("s"),
            FieldSnapshot::new("size", FieldKind::Radio).value("m"),
        ];
        assert_eq!(submitted_value(&radios), None);

        let file = [FieldSnapshot::new("cv", FieldKind::File)
            .value(FieldValue::Files(vec![FileRef::new("cv.pdf")]))];
        assert_eq!(
            submitted_value(&file),
            Some(FieldValue::Files(vec![FileRef::new("cv.pdf")]))
        );
    }

    #[test]
    fn test_default_update_checkbox_option() {
        let boxes = [
            FieldSnapshot::new("news", FieldKind::Checkbox).value("daily"),
            FieldSnapshot::new("news", FieldKind::Checkbox).value("weekly"),
        ];
        let matched = DefaultValue::Option {
            value: "weekly".into(),
            checked: true,
        };
        assert_eq!(
            default_update(FieldKind::Checkbox, &matched, &boxes),
            (Target::Option("weekly".into()), FieldUpdate::Checked(true))
        );

        let unmatched = DefaultValue::Option {
            value: "monthly".into(),
            checked: true,
        };
        assert_eq!(
            default_update(FieldKind::Checkbox, &unmatched, &boxes),
            (Target::All, FieldUpdate::Checked(true))
        );
    }

    #[test]
    fn test_default_update_radio_fallback() {
        let radios = [FieldSnapshot::new("size", FieldKind::Radio).value("s")];
        assert_eq!(
            default_update(FieldKind::Radio, &DefaultValue::from("s"), &radios),
            (Target::Option("s".into()), FieldUpdate::Checked(true))
        );
        assert_eq!(
            default_update(FieldKind::Radio, &DefaultValue::from("xl"), &radios),
            (Target::First, FieldUpdate::Checked(false))
        );
    }

    #[test]
    fn test_default_update_text() {
        let text = [FieldSnapshot::new("country", FieldKind::Select)];
        assert_eq!(
            default_update(FieldKind::Select, &DefaultValue::from("BE"), &text),
            (Target::First, FieldUpdate::Value(FieldValue::from("BE")))
        );
    }

    #[test]
    fn test_form_result_lookup() {
        let result = FormResult {
            status: false,
            data: BTreeMap::new(),
            errors: vec![FieldErrors {
                name: "age".into(),
                errors: vec!["too young".into()],
            }],
        };
        assert_eq!(result.first_invalid(), Some("age"));
        assert_eq!(result.errors_for("age"), Some(&["too young".to_string()][..]));
        assert_eq!(result.errors_for("name"), None);
    }
}
