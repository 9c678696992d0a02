//! Declarative form validation.
//!
//! Fields are read as [`FieldSnapshot`](snapshot::FieldSnapshot)s. Each one is
//! checked against its constraint attributes (`required`, `min`, `max`,
//! `minlength`, `maxlength`, `pattern`) and then against caller-supplied
//! custom rules, which may be asynchronous and always run in declaration
//! order. The [`FormCoordinator`](form::FormCoordinator) aggregates the
//! per-field verdicts into a [`FormResult`](form::FormResult) and drives a
//! [`Renderer`](adapter::Renderer) for error, success and focus feedback.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use controllet::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let source = Arc::new(MemoryForm::new(vec![
//!     FieldSnapshot::new("age", FieldKind::Number).value("15").attr("min", "18"),
//! ]));
//! let form = FormCoordinator::builder(source, Arc::new(RecordingRenderer::default())).build();
//!
//! let result = form.validate_all().await;
//! assert_eq!(
//!     result.errors_for("age").unwrap(),
//!     ["Value must be greater than or equal to 18"]
//! );
//! # });
//! ```

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod custom;
pub mod error;
pub mod field;
pub mod form;
pub mod numeric;
pub mod pipeline;
pub mod rules;
pub mod snapshot;

pub use error::FormError;
pub use form::{FormCoordinator, FormResult};

pub mod prelude {
    pub use crate::adapter::{
        FieldUpdate, FormSource, MemoryForm, RecordingRenderer, RenderCall, Renderer, Target,
    };
    pub use crate::catalog::{Locale, MessageCatalog, MessageKind};
    pub use crate::config::{ClassNames, DefaultValue, FormConfig, Modifier, OverlapPolicy};
    pub use crate::custom::{Condition, CustomValidator, SuccessMessage, Validation};
    pub use crate::error::{DiagnosticSink, FormError, LogSink, MemorySink};
    pub use crate::field::{FieldStatus, FieldValidator, FieldVerdict};
    pub use crate::form::{
        FieldErrors, FormBuilder, FormCoordinator, FormEvent, FormResult, ResetMode, WatchData,
    };
    pub use crate::snapshot::{Attribute, FieldKind, FieldSnapshot, FieldValue, FileRef};
}
