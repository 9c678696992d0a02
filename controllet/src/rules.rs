//! Built-in constraints read from field attributes.

use fancy_regex::Regex;

use crate::catalog::{MessageCatalog, MessageKind};
use crate::error::FormError;
use crate::numeric::{parse_float, parse_int};
use crate::snapshot::FieldSnapshot;

/// A recognized constraint attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRule {
    Min,
    Max,
    MinLength,
    MaxLength,
    Pattern,
}

impl AttributeRule {
    /// Match an attribute name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        const RULES: [(&str, AttributeRule); 5] = [
            ("min", AttributeRule::Min),
            ("max", AttributeRule::Max),
            ("minlength", AttributeRule::MinLength),
            ("maxlength", AttributeRule::MaxLength),
            ("pattern", AttributeRule::Pattern),
        ];
        RULES
            .iter()
            .find(|(rule_name, _)| rule_name.eq_ignore_ascii_case(name))
            .map(|&(_, rule)| rule)
    }
}

/// Evaluates `required` and the attribute rules against one snapshot.
///
/// # Example
///
/// ```
/// use controllet::catalog::MessageCatalog;
/// use controllet::rules::AttributeEvaluator;
/// use controllet::snapshot::{FieldKind, FieldSnapshot};
///
/// let evaluator = AttributeEvaluator::new(MessageCatalog::default());
/// let age = FieldSnapshot::new("age", FieldKind::Number).value("15").attr("min", "18");
/// assert_eq!(
///     evaluator.evaluate(&age).unwrap(),
///     vec!["Value must be greater than or equal to 18".to_string()]
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeEvaluator {
    catalog: MessageCatalog,
}

impl AttributeEvaluator {
    pub fn new(catalog: MessageCatalog) -> Self {
        Self { catalog }
    }

    /// Errors for the snapshot in evaluation order.
    ///
    /// `required` comes first, then each recognized attribute in declaration
    /// order. Readonly and disabled fields produce nothing. A malformed
    /// `pattern` aborts with [`FormError::InvalidPattern`].
    pub fn evaluate(&self, snapshot: &FieldSnapshot) -> Result<Vec<String>, FormError> {
        let mut errors = Vec::new();

        if snapshot.is_skipped() {
            return Ok(errors);
        }

        let value = snapshot.text().trim();

        if !snapshot.kind.is_checkable() && snapshot.has_attribute("required") && value.is_empty()
        {
            errors.push(self.catalog.message(MessageKind::Required));
        }

        for attr in &snapshot.attributes {
            let Some(rule) = AttributeRule::from_name(&attr.name) else {
                continue;
            };
            let threshold = attr.value.as_str();

            let error = match rule {
                AttributeRule::Min | AttributeRule::Max => {
                    self.check_range(rule, snapshot.text(), threshold)
                }
                AttributeRule::MinLength | AttributeRule::MaxLength => {
                    self.check_length(rule, value, threshold)
                }
                AttributeRule::Pattern => self.check_pattern(snapshot, value, threshold)?,
            };

            errors.extend(error);
        }

        Ok(errors)
    }

    fn check_range(&self, rule: AttributeRule, raw: &str, threshold: &str) -> Option<String> {
        let value = parse_float(raw)?;
        let bound = parse_float(threshold)?;

        match rule {
            AttributeRule::Min if value < bound => {
                Some(self.catalog.format(MessageKind::Min, threshold))
            }
            AttributeRule::Max if value > bound => {
                Some(self.catalog.format(MessageKind::Max, threshold))
            }
            _ => None,
        }
    }

    fn check_length(&self, rule: AttributeRule, value: &str, threshold: &str) -> Option<String> {
        let bound = parse_int(threshold)?;
        let length = value.chars().count() as f64;

        match rule {
            AttributeRule::MinLength if length < bound => {
                Some(self.catalog.format(MessageKind::MinLength, threshold))
            }
            AttributeRule::MaxLength if length > bound => {
                Some(self.catalog.format(MessageKind::MaxLength, threshold))
            }
            _ => None,
        }
    }

    fn check_pattern(
        &self,
        snapshot: &FieldSnapshot,
        value: &str,
        pattern: &str,
    ) -> Result<Option<String>, FormError> {
        if pattern.is_empty() {
            return Ok(None);
        }

        let re = compile_pattern(pattern)
            .map_err(|source| FormError::invalid_pattern(&snapshot.name, pattern, source))?;

        // An empty value is left to `required`.
        if value.is_empty() {
            return Ok(None);
        }

        let matched = re.is_match(value).unwrap_or_else(|e| {
            log::warn!(
                "[rules] pattern `{}` on '{}' gave up: {}",
                pattern,
                snapshot.name,
                e
            );
            false
        });

        if matched {
            Ok(None)
        } else {
            Ok(Some(self.catalog.message(MessageKind::Pattern)))
        }
    }
}

/// Compile a pattern attribute so it must match the whole value.
///
/// Look-around and backreferences are supported. The pattern is checked on
/// its own first so error positions refer to the caller's text.
pub fn compile_pattern(pattern: &str) -> Result<Regex, fancy_regex::Error> {
    Regex::new(pattern)?;
    Regex::new(&format!("^(?:{pattern})$"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Locale;
    use crate::snapshot::FieldKind;

    fn evaluate(snapshot: &FieldSnapshot) -> Vec<String> {
        AttributeEvaluator::default().evaluate(snapshot).unwrap()
    }

    fn text(value: &str) -> FieldSnapshot {
        FieldSnapshot::new("field", FieldKind::Text).value(value)
    }

    #[test]
    fn test_required_empty_after_trim() {
        let errors = evaluate(&text("   ").flag("required"));
        assert_eq!(errors, vec!["This field is required".to_string()]);
    }

    #[test]
    fn test_required_filled() {
        assert!(evaluate(&text("x").flag("required")).is_empty());
    }

    #[test]
    fn test_required_is_first_even_when_declared_last() {
        let snapshot = text("").attr("minlength", "3").flag("required");
        let errors = evaluate(&snapshot);
        assert_eq!(errors[0], "This field is required");
        assert_eq!(errors[1], "Minimum 3 characters are required");
    }

    #[test]
    fn test_required_ignored_for_checkable() {
        let snapshot = FieldSnapshot::new("terms", FieldKind::Checkbox).flag("required");
        assert!(evaluate(&snapshot).is_empty());
    }

    #[test]
    fn test_min_max_bounds_are_inclusive() {
        assert!(evaluate(&text("18").attr("min", "18")).is_empty());
        assert!(evaluate(&text("65").attr("max", "65")).is_empty());
        assert_eq!(
            evaluate(&text("66").attr("max", "65")),
            vec!["Value must be less than or equal to 65".to_string()]
        );
    }

    #[test]
    fn test_min_max_skip_non_numeric() {
        assert!(evaluate(&text("abc").attr("min", "18").attr("max", "1")).is_empty());
        assert!(evaluate(&text("5").attr("min", "lots")).is_empty());
    }

    #[test]
    fn test_threshold_interpolated_verbatim() {
        assert_eq!(
            evaluate(&text("1").attr("min", "2.50")),
            vec!["Value must be greater than or equal to 2.50".to_string()]
        );
    }

    #[test]
    fn test_length_uses_trimmed_value() {
        assert_eq!(
            evaluate(&text("  ab  ").attr("minlength", "3")),
            vec!["Minimum 3 characters are required".to_string()]
        );
        assert_eq!(
            evaluate(&text("abcd").attr("maxLength", "3")),
            vec!["Maximum 3 characters allowed".to_string()]
        );
        assert!(evaluate(&text("héé").attr("maxlength", "3")).is_empty());
    }

    #[test]
    fn test_declaration_order() {
        let snapshot = text("abcdefgh")
            .attr("pattern", "[0-9]+")
            .attr("maxlength", "4");
        assert_eq!(
            evaluate(&snapshot),
            vec![
                "Invalid pattern".to_string(),
                "Maximum 4 characters allowed".to_string()
            ]
        );
    }

    #[test]
    fn test_pattern_must_match_whole_value() {
        assert!(evaluate(&text("12345").attr("pattern", "[0-9]+")).is_empty());
        assert_eq!(
            evaluate(&text("12a45").attr("pattern", "[0-9]+")),
            vec!["Invalid pattern".to_string()]
        );
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let snapshot = text("x").attr("pattern", "([a-z");
        let result = AttributeEvaluator::default().evaluate(&snapshot);
        assert!(matches!(
            result,
            Err(FormError::InvalidPattern { ref field, ref pattern, .. })
                if field == "field" && pattern == "([a-z"
        ));
    }

    #[test]
    fn test_pattern_with_look_ahead() {
        let password = |value: &str| {
            FieldSnapshot::new("pw", FieldKind::Password)
                .value(value)
                .attr("pattern", r"(?=.*\d).{8,}")
        };
        assert!(evaluate(&password("abc12345")).is_empty());
        assert_eq!(
            evaluate(&password("abcdefgh")),
            vec!["Invalid pattern".to_string()]
        );
    }

    #[test]
    fn test_pattern_with_backreference() {
        assert!(evaluate(&text("abab").attr("pattern", r"(ab)\1")).is_empty());
        assert_eq!(
            evaluate(&text("abba").attr("pattern", r"(ab)\1")),
            vec!["Invalid pattern".to_string()]
        );
    }

    #[test]
    fn test_invalid_pattern_message_names_caller_pattern() {
        let snapshot = text("x").attr("pattern", "(?=x");
        let error = AttributeEvaluator::default().evaluate(&snapshot).unwrap_err();
        let message = error.to_string();

        assert!(message.contains("`(?=x`"), "{message}");
        assert!(!message.contains("^(?:"), "{message}");
        assert!(!message.contains('\n'), "{message}");
    }

    #[test]
    fn test_length_counts_chars() {
        // Two emoji are two characters, not four UTF-16 units.
        assert!(evaluate(&text("😀😀").attr("maxlength", "2")).is_empty());
        assert_eq!(
            evaluate(&text("😀😀").attr("minlength", "3")),
            vec!["Minimum 3 characters are required".to_string()]
        );
    }

    #[test]
    fn test_unrecognized_attributes_ignored() {
        assert!(evaluate(&text("").attr("placeholder", "x").attr("step", "2")).is_empty());
    }

    #[test]
    fn test_readonly_and_disabled_skip() {
        assert!(evaluate(&text("").flag("required").readonly()).is_empty());
        assert!(evaluate(&text("").flag("required").disabled()).is_empty());
    }

    #[test]
    fn test_localized_messages() {
        let evaluator = AttributeEvaluator::new(MessageCatalog::new(Locale::FrFr));
        let errors = evaluator.evaluate(&text("").flag("required")).unwrap();
        assert_eq!(errors, vec!["Ce champ est requis".to_string()]);
    }
}
