//! Locale-keyed message templates for the built-in constraints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// Placeholder replaced by the constraint threshold.
const PLACEHOLDER: &str = "{0}";

/// Supported message locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    /// American English (default).
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    /// French.
    #[serde(rename = "fr-FR")]
    FrFr,
}

impl Locale {
    /// All supported locales.
    pub const ALL: [Locale; 2] = [Locale::EnUs, Locale::FrFr];

    /// The BCP 47 tag for this locale.
    pub fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::FrFr => "fr-FR",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormError::UnknownLocale(s.to_string()))
    }
}

/// Kind of built-in constraint message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Required,
    MinLength,
    MaxLength,
    Numeric,
    Min,
    Max,
    Pattern,
}

/// Message templates for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTable {
    pub required: &'static str,
    pub min_length: &'static str,
    pub max_length: &'static str,
    pub numeric: &'static str,
    pub min: &'static str,
    pub max: &'static str,
    pub pattern: &'static str,
}

const EN_US: MessageTable = MessageTable {
    required: "This field is required",
    min_length: "Minimum {0} characters are required",
    max_length: "Maximum {0} characters allowed",
    numeric: "Please enter a valid number",
    min: "Value must be greater than or equal to {0}",
    max: "Value must be less than or equal to {0}",
    pattern: "Invalid pattern",
};

const FR_FR: MessageTable = MessageTable {
    required: "Ce champ est requis",
    min_length: "Un minimum de {0} caractères est requis",
    max_length: "Un maximum de {0} caractères est autorisé",
    numeric: "Veuillez entrer un nombre valide",
    min: "La valeur doit être supérieure ou égale à {0}",
    max: "La valeur doit être inférieure ou égale à {0}",
    pattern: "Modèle invalide",
};

/// Immutable message lookup selected once per form.
///
/// # Example
///
/// ```
/// use controllet::catalog::{Locale, MessageCatalog, MessageKind};
///
/// let catalog = MessageCatalog::new(Locale::EnUs);
/// assert_eq!(
///     catalog.format(MessageKind::Min, "18"),
///     "Value must be greater than or equal to 18"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCatalog {
    locale: Locale,
    table: &'static MessageTable,
}

impl MessageCatalog {
    /// Creates the catalog for a locale.
    pub fn new(locale: Locale) -> Self {
        let table = match locale {
            Locale::EnUs => &EN_US,
            Locale::FrFr => &FR_FR,
        };
        Self { locale, table }
    }

    /// The locale this catalog was built for.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// The raw template for a message kind.
    pub fn template(&self, kind: MessageKind) -> &'static str {
        match kind {
            MessageKind::Required => self.table.required,
            MessageKind::MinLength => self.table.min_length,
            MessageKind::MaxLength => self.table.max_length,
            MessageKind::Numeric => self.table.numeric,
            MessageKind::Min => self.table.min,
            MessageKind::Max => self.table.max,
            MessageKind::Pattern => self.table.pattern,
        }
    }

    /// Returns the template with its first `{0}` replaced by `arg`.
    ///
    /// The argument is inserted verbatim.
    pub fn format(&self, kind: MessageKind, arg: &str) -> String {
        self.template(kind).replacen(PLACEHOLDER, arg, 1)
    }

    /// Returns a template that takes no argument.
    pub fn message(&self, kind: MessageKind) -> String {
        self.template(kind).to_string()
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_str() {
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::EnUs);
        assert_eq!("fr-fr".parse::<Locale>().unwrap(), Locale::FrFr);
        assert!(matches!(
            "de-DE".parse::<Locale>(),
            Err(FormError::UnknownLocale(tag)) if tag == "de-DE"
        ));
    }

    #[test]
    fn test_format_keeps_threshold_literal() {
        let catalog = MessageCatalog::new(Locale::EnUs);
        assert_eq!(
            catalog.format(MessageKind::MinLength, "08"),
            "Minimum 08 characters are required"
        );
        assert_eq!(
            catalog.format(MessageKind::Max, "1e3"),
            "Value must be less than or equal to 1e3"
        );
    }

    #[test]
    fn test_french_table() {
        let catalog = MessageCatalog::new(Locale::FrFr);
        assert_eq!(catalog.message(MessageKind::Required), "Ce champ est requis");
        assert_eq!(catalog.message(MessageKind::Pattern), "Modèle invalide");
    }

    #[test]
    fn test_every_argument_template_has_placeholder() {
        for locale in Locale::ALL {
            let catalog = MessageCatalog::new(locale);
            for kind in [
                MessageKind::MinLength,
                MessageKind::MaxLength,
                MessageKind::Min,
                MessageKind::Max,
            ] {
                assert!(catalog.template(kind).contains(PLACEHOLDER), "{locale} {kind:?}");
            }
        }
    }

    #[test]
    fn test_default_is_en_us() {
        assert_eq!(MessageCatalog::default().locale(), Locale::EnUs);
    }
}
