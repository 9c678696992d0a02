//! Caller-supplied validation rules and success messages.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BoxError;
use crate::snapshot::FieldSnapshot;

/// Type alias for boxed futures used in async validation.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type ConditionFn = dyn Fn(&FieldSnapshot) -> BoxFuture<'static, Result<bool, BoxError>> + Send + Sync;

/// A possibly asynchronous, possibly fallible predicate over a snapshot.
///
/// `Ok(true)` passes, `Ok(false)` fails the rule, and `Err` means the
/// condition itself crashed.
#[derive(Clone)]
pub struct Condition(Arc<ConditionFn>);

impl Condition {
    /// Wrap a function that already returns a boxed future.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&FieldSnapshot) -> BoxFuture<'static, Result<bool, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wrap a synchronous predicate.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&FieldSnapshot) -> bool + Send + Sync + 'static,
    {
        Self::from_fn(move |snapshot| {
            let valid = f(snapshot);
            Box::pin(async move { Ok(valid) })
        })
    }

    /// Wrap a synchronous predicate that may fail.
    pub fn try_sync<F, E>(f: F) -> Self
    where
        F: Fn(&FieldSnapshot) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::from_fn(move |snapshot| {
            let result = f(snapshot).map_err(Into::into);
            Box::pin(async move { result })
        })
    }

    /// Wrap an asynchronous predicate.
    ///
    /// The future receives its own copy of the snapshot.
    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(FieldSnapshot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::from_fn(move |snapshot| {
            let fut = f(snapshot.clone());
            Box::pin(async move { Ok(fut.await) })
        })
    }

    /// Wrap an asynchronous predicate that may fail.
    pub fn try_asynchronous<F, Fut, E>(f: F) -> Self
    where
        F: Fn(FieldSnapshot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::from_fn(move |snapshot| {
            let fut = f(snapshot.clone());
            Box::pin(async move { fut.await.map_err(Into::into) })
        })
    }

    /// Start evaluating the condition.
    pub fn check(&self, snapshot: &FieldSnapshot) -> BoxFuture<'static, Result<bool, BoxError>> {
        (self.0)(snapshot)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

/// One custom rule: the message recorded when its condition fails.
#[derive(Debug, Clone)]
pub struct Validation {
    pub error_message: String,
    pub condition: Condition,
}

impl Validation {
    pub fn new(error_message: impl Into<String>, condition: Condition) -> Self {
        Self {
            error_message: error_message.into(),
            condition,
        }
    }

    /// Rule backed by a synchronous predicate.
    pub fn sync<F>(error_message: impl Into<String>, f: F) -> Self
    where
        F: Fn(&FieldSnapshot) -> bool + Send + Sync + 'static,
    {
        Self::new(error_message, Condition::sync(f))
    }

    /// Rule backed by an asynchronous predicate.
    pub fn asynchronous<F, Fut>(error_message: impl Into<String>, f: F) -> Self
    where
        F: Fn(FieldSnapshot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::new(error_message, Condition::asynchronous(f))
    }

    /// Require a valid email address. An empty value passes.
    pub fn email(error_message: impl Into<String>) -> Self {
        Self::sync(error_message, |snapshot| {
            let value = snapshot.text().trim();
            value.is_empty() || email_address::EmailAddress::is_valid(value)
        })
    }
}

/// Custom rules for one field.
///
/// # Example
///
/// ```
/// use controllet::custom::{CustomValidator, Validation};
///
/// let username = CustomValidator::new()
///     .rule(Validation::sync("Too short", |s| s.text().len() >= 3))
///     .rule(Validation::asynchronous("Already taken", |s| async move {
///         s.text() != "admin"
///     }));
/// assert_eq!(username.validations.len(), 2);
/// assert!(!username.override_builtin);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CustomValidator {
    /// Discard the built-in errors before the custom rules run.
    pub override_builtin: bool,
    /// Rules, evaluated in order.
    pub validations: Vec<Validation>,
}

impl CustomValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace rather than append to built-in errors.
    pub fn override_builtin(mut self) -> Self {
        self.override_builtin = true;
        self
    }

    /// Append a rule.
    pub fn rule(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }
}

/// Message shown when a field passes and its condition holds.
#[derive(Clone)]
pub struct SuccessMessage {
    pub message: String,
    condition: Arc<dyn Fn(&FieldSnapshot) -> bool + Send + Sync>,
}

impl SuccessMessage {
    pub fn new<F>(message: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&FieldSnapshot) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            condition: Arc::new(condition),
        }
    }

    /// Success message shown whenever the field is valid.
    pub fn always(message: impl Into<String>) -> Self {
        Self::new(message, |_| true)
    }

    /// Evaluate the condition.
    pub fn applies(&self, snapshot: &FieldSnapshot) -> bool {
        (self.condition)(snapshot)
    }
}

impl fmt::Debug for SuccessMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuccessMessage")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}
