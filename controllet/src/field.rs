//! Validation of a single field: built-in rules followed by custom rules.

use serde::Serialize;

use crate::catalog::MessageCatalog;
use crate::custom::{CustomValidator, SuccessMessage};
use crate::error::{DiagnosticSink, FormError};
use crate::pipeline::CustomPipeline;
use crate::rules::AttributeEvaluator;
use crate::snapshot::FieldSnapshot;

/// Lifecycle of a field's validation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    /// Never validated.
    #[default]
    Pristine,
    /// A pass is running; the previous result is still displayed.
    Validating,
    Valid,
    Invalid,
}

/// Outcome of validating one field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldVerdict {
    pub name: String,
    /// Errors in evaluation order.
    pub errors: Vec<String>,
    /// Success message when the field is eligible for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

impl FieldVerdict {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The message a renderer shows: only the first error.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    pub fn status(&self) -> FieldStatus {
        if self.has_errors() {
            FieldStatus::Invalid
        } else {
            FieldStatus::Valid
        }
    }
}

/// Composes the attribute evaluator and the custom pipeline for one field.
#[derive(Clone, Copy)]
pub struct FieldValidator<'a> {
    evaluator: AttributeEvaluator,
    custom: Option<&'a CustomValidator>,
    success: Option<&'a SuccessMessage>,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> FieldValidator<'a> {
    pub fn new(catalog: MessageCatalog, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            evaluator: AttributeEvaluator::new(catalog),
            custom: None,
            success: None,
            sink,
        }
    }

    /// Attach the field's custom rules.
    pub fn with_custom(mut self, custom: Option<&'a CustomValidator>) -> Self {
        self.custom = custom;
        self
    }

    /// Attach the field's success message.
    pub fn with_success(mut self, success: Option<&'a SuccessMessage>) -> Self {
        self.success = success;
        self
    }

    /// Validate one snapshot.
    pub async fn validate(&self, snapshot: &FieldSnapshot) -> Result<Vec<String>, FormError> {
        self.validate_with_progress(snapshot, |_| {}).await
    }

    /// Validate one snapshot, forwarding partial custom-rule progress.
    ///
    /// Readonly and disabled snapshots are skipped entirely, custom rules
    /// included.
    pub async fn validate_with_progress<P>(
        &self,
        snapshot: &FieldSnapshot,
        progress: P,
    ) -> Result<Vec<String>, FormError>
    where
        P: FnMut(&[String]) + Send,
    {
        if snapshot.is_skipped() {
            return Ok(Vec::new());
        }

        let errors = self.evaluator.evaluate(snapshot)?;

        match self.custom {
            Some(custom) => Ok(CustomPipeline::new(self.sink)
                .run_with_progress(snapshot, custom, errors, progress)
                .await),
            None => Ok(errors),
        }
    }

    /// Validate every snapshot sharing one name and merge the results.
    ///
    /// Errors are concatenated in document order with repeated messages
    /// dropped. An invalid `pattern` is reported to the sink and recorded as
    /// the field's error so the field never passes silently.
    pub async fn validate_group<P>(
        &self,
        name: &str,
        snapshots: &[FieldSnapshot],
        mut progress: P,
    ) -> FieldVerdict
    where
        P: FnMut(&[String]) + Send,
    {
        let mut errors: Vec<String> = Vec::new();

        for snapshot in snapshots {
            let settled = errors.clone();
            let result = self
                .validate_with_progress(snapshot, |partial| {
                    progress(&merge(settled.clone(), partial));
                })
                .await;

            let snapshot_errors = match result {
                Ok(snapshot_errors) => snapshot_errors,
                Err(error) => {
                    self.sink.report(&error);
                    vec![error.to_string()]
                }
            };
            errors = merge(errors, &snapshot_errors);
        }

        let success = if errors.is_empty() {
            self.success_message(snapshots)
        } else {
            None
        };

        FieldVerdict {
            name: name.to_string(),
            errors,
            success,
        }
    }

    /// Success message when a caller-declared condition holds for any member.
    fn success_message(&self, snapshots: &[FieldSnapshot]) -> Option<String> {
        let success = self.success?;
        snapshots
            .iter()
            .any(|snapshot| success.applies(snapshot))
            .then(|| success.message.clone())
    }
}

fn merge(mut errors: Vec<String>, more: &[String]) -> Vec<String> {
    for error in more {
        if !errors.contains(error) {
            errors.push(error.clone());
        }
    }
    errors
}
