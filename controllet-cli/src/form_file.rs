//! JSON form descriptions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use controllet::prelude::*;
use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// A form as read from disk.
///
/// ```json
/// {
///   "locale": "en-US",
///   "fields": [
///     { "name": "email", "type": "email", "value": "",
///       "attributes": [{ "name": "required", "value": "" }] }
///   ],
///   "defaults": { "country": "BE" }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormFile {
    pub locale: Locale,
    pub fields: Vec<FieldSnapshot>,
    pub defaults: BTreeMap<String, DefaultValue>,
    pub classes: ClassNames,
}

impl FormFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| CliError::read(path, e))?;
        let form: Self = serde_json::from_str(&text).map_err(|e| CliError::parse(path, e))?;
        log::debug!(
            "[cli] loaded {} field(s) from {}",
            form.fields.len(),
            path.display()
        );
        Ok(form)
    }

    /// Build a coordinator over an in-memory copy of the fields.
    pub fn into_form(
        self,
        locale: Option<Locale>,
    ) -> (FormCoordinator, Arc<RecordingRenderer>) {
        let mut config = FormConfig::new()
            .locale(locale.unwrap_or(self.locale))
            .classes(self.classes);
        for (name, value) in self.defaults {
            config = config.default_value(name, value);
        }

        let source = Arc::new(MemoryForm::new(self.fields));
        let renderer = Arc::new(RecordingRenderer::default());
        let form = FormCoordinator::builder(source, renderer.clone())
            .config(config)
            .build();
        (form, renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_file() {
        let form: FormFile = serde_json::from_str(
            r#"{
                "locale": "fr-FR",
                "fields": [
                    { "name": "age", "type": "number", "value": "15",
                      "attributes": [{ "name": "min", "value": "18" }] },
                    { "name": "terms", "type": "checkbox", "value": "yes" }
                ],
                "defaults": { "terms": true }
            }"#,
        )
        .unwrap();

        assert_eq!(form.locale, Locale::FrFr);
        assert_eq!(form.fields.len(), 2);
        assert_eq!(form.fields[0].attribute("min"), Some("18"));
        assert_eq!(form.fields[1].kind, FieldKind::Checkbox);
        assert_eq!(form.defaults.get("terms"), Some(&DefaultValue::Checked(true)));
    }

    #[tokio::test]
    async fn test_locale_override() {
        let form: FormFile = serde_json::from_str(
            r#"{ "fields": [{ "name": "age", "value": "15",
                 "attributes": [{ "name": "min", "value": "18" }] }] }"#,
        )
        .unwrap();

        let (form, _renderer) = form.into_form(Some(Locale::FrFr));
        let result = form.validate_all().await;

        assert_eq!(
            result.errors_for("age").unwrap(),
            ["La valeur doit être supérieure ou égale à 18"]
        );
    }
}
