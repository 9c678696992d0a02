//! Sequential execution of custom validation rules.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::custom::{CustomValidator, Validation};
use crate::error::{BoxError, DiagnosticSink, FormError, extract_panic_message};
use crate::snapshot::FieldSnapshot;

/// Runs a field's custom rules one after another.
///
/// Each condition is awaited to completion before the next starts, so the
/// resulting error order always equals the declaration order. A condition
/// that returns an error or panics is reported to the sink as
/// [`FormError::ValidatorCrashed`] and contributes no message.
#[derive(Clone, Copy)]
pub struct CustomPipeline<'a> {
    sink: &'a dyn DiagnosticSink,
}

impl<'a> CustomPipeline<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self { sink }
    }

    /// Run the rules, seeded with the errors accumulated so far.
    pub async fn run(
        &self,
        snapshot: &FieldSnapshot,
        custom: &CustomValidator,
        current: Vec<String>,
    ) -> Vec<String> {
        self.run_with_progress(snapshot, custom, current, |_| {}).await
    }

    /// Run the rules, calling `progress` with the partial error list after
    /// every rule settles.
    pub async fn run_with_progress<P>(
        &self,
        snapshot: &FieldSnapshot,
        custom: &CustomValidator,
        current: Vec<String>,
        mut progress: P,
    ) -> Vec<String>
    where
        P: FnMut(&[String]) + Send,
    {
        let mut errors = if custom.override_builtin {
            Vec::new()
        } else {
            current
        };

        for (index, validation) in custom.validations.iter().enumerate() {
            match check(validation, snapshot).await {
                Ok(true) => {}
                Ok(false) => errors.push(validation.error_message.clone()),
                Err(cause) => {
                    self.sink
                        .report(&FormError::crashed(&snapshot.name, index, cause.to_string()));
                }
            }

            progress(&errors);
        }

        errors
    }
}

/// Evaluate one condition, turning panics into errors.
async fn check(validation: &Validation, snapshot: &FieldSnapshot) -> Result<bool, BoxError> {
    let future = std::panic::catch_unwind(AssertUnwindSafe(|| {
        validation.condition.check(snapshot)
    }))
    .map_err(|panic| BoxError::from(extract_panic_message(&panic)))?;

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(extract_panic_message(&panic).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::custom::Condition;
    use crate::error::MemorySink;
    use crate::snapshot::FieldKind;

    fn username(value: &str) -> FieldSnapshot {
        FieldSnapshot::new("username", FieldKind::Text).value(value)
    }

    fn delayed(message: &str, millis: u64) -> Validation {
        Validation::asynchronous(message, move |_| async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            false
        })
    }

    #[tokio::test]
    async fn test_async_failure_appends_message() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new()
            .rule(Validation::asynchronous("taken", |_| async { false }));

        let errors = CustomPipeline::new(&sink)
            .run(&username("bob"), &custom, Vec::new())
            .await;

        assert_eq!(errors, vec!["taken".to_string()]);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_appends_to_current_errors() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new().rule(Validation::sync("custom", |_| false));

        let errors = CustomPipeline::new(&sink)
            .run(&username(""), &custom, vec!["builtin".to_string()])
            .await;

        assert_eq!(errors, vec!["builtin".to_string(), "custom".to_string()]);
    }

    #[tokio::test]
    async fn test_override_discards_current_errors() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new()
            .override_builtin()
            .rule(Validation::sync("custom", |_| true));

        let errors = CustomPipeline::new(&sink)
            .run(&username(""), &custom, vec!["builtin".to_string()])
            .await;

        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_override_with_no_rules_still_clears() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new().override_builtin();

        let errors = CustomPipeline::new(&sink)
            .run(&username(""), &custom, vec!["builtin".to_string()])
            .await;

        assert!(errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_follows_declaration_not_resolution() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new()
            .rule(delayed("first", 30))
            .rule(delayed("second", 20))
            .rule(delayed("third", 1));

        let errors = CustomPipeline::new(&sink)
            .run(&username("x"), &custom, Vec::new())
            .await;

        assert_eq!(errors, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_error_is_reported_and_skipped() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new()
            .rule(Validation::sync("before", |_| false))
            .rule(Validation::new(
                "never shown",
                Condition::try_asynchronous(|_| async { Err::<bool, _>("backend down") }),
            ))
            .rule(Validation::sync("after", |_| false));

        let errors = CustomPipeline::new(&sink)
            .run(&username("x"), &custom, Vec::new())
            .await;

        assert_eq!(errors, vec!["before", "after"]);
        assert_eq!(sink.crashed(), vec![("username".to_string(), 1)]);
        assert!(sink.reports()[0].contains("backend down"));
    }

    #[tokio::test]
    async fn test_panicking_conditions_are_contained() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new()
            .rule(Validation::sync("sync panic", |s| {
                if s.text() == "x" {
                    panic!("sync boom");
                }
                false
            }))
            .rule(Validation::asynchronous("async panic", |s| async move {
                if s.text() == "x" {
                    panic!("async boom");
                }
                false
            }))
            .rule(Validation::sync("survivor", |_| false));

        let errors = CustomPipeline::new(&sink)
            .run(&username("x"), &custom, Vec::new())
            .await;

        assert_eq!(errors, vec!["survivor"]);
        assert_eq!(
            sink.crashed(),
            vec![("username".to_string(), 0), ("username".to_string(), 1)]
        );
        let reports = sink.reports();
        assert!(reports[0].contains("sync boom"));
        assert!(reports[1].contains("async boom"));
    }

    #[tokio::test]
    async fn test_progress_after_every_rule() {
        let sink = MemorySink::new();
        let custom = CustomValidator::new()
            .rule(Validation::sync("a", |_| false))
            .rule(Validation::new(
                "crash",
                Condition::try_sync(|_| Err::<bool, _>("invalid state")),
            ))
            .rule(Validation::sync("c", |_| true));

        let mut seen = Vec::new();
        CustomPipeline::new(&sink)
            .run_with_progress(&username("x"), &custom, Vec::new(), |errors| {
                seen.push(errors.to_vec())
            })
            .await;

        assert_eq!(
            seen,
            vec![
                vec!["a".to_string()],
                vec!["a".to_string()],
                vec!["a".to_string()],
            ]
        );
    }
}
