//! The preferences document: `domain -> key -> typed value`.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Recorded preference values, grouped by domain.
pub type Defaults = BTreeMap<String, BTreeMap<String, DefaultValue>>;

/// Domain written by `--global`.
pub const GLOBAL_DOMAIN: &str = "NSGlobalDomain";

/// A typed preference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// `-bool`
    Bool(bool),
    /// `-int`
    Int(i64),
    /// `-float`
    Float(f64),
    /// `-string`
    String(String),
}

impl DefaultValue {
    /// Interpret a raw command-line value.
    ///
    /// `y`, `yes`, `true` (any case) become `true` and `n`, `no`, `false`
    /// become `false`.  Otherwise the text is parsed as JSON: numbers keep
    /// their integer or float type and quoted strings are unquoted.
    /// Anything else is kept verbatim as a string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" => return Self::Bool(true),
            "n" | "no" | "false" => return Self::Bool(false),
            _ => {}
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Number(n)) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::String(raw.to_string())),
            Ok(serde_json::Value::String(s)) => Self::String(s),
            _ => Self::String(raw.to_string()),
        }
    }

    /// Type flag understood by `defaults write`.
    #[must_use]
    pub const fn type_flag(&self) -> &'static str {
        match self {
            Self::Bool(_) => "-bool",
            Self::Int(_) => "-int",
            Self::Float(_) => "-float",
            Self::String(_) => "-string",
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn yes_no_normalization_is_case_insensitive() {
        for raw in ["YES", "yes", "Y", "true", "True"] {
            assert_eq!(DefaultValue::parse(raw), DefaultValue::Bool(true), "{raw}");
        }
        for raw in ["NO", "n", "FALSE", "false"] {
            assert_eq!(DefaultValue::parse(raw), DefaultValue::Bool(false), "{raw}");
        }
    }

    #[test]
    fn numbers_keep_their_type() {
        assert_eq!(DefaultValue::parse("42"), DefaultValue::Int(42));
        assert_eq!(DefaultValue::parse("-3"), DefaultValue::Int(-3));
        assert_eq!(DefaultValue::parse("0.5"), DefaultValue::Float(0.5));
    }

    #[test]
    fn strings_fall_through() {
        assert_eq!(
            DefaultValue::parse("\"quoted\""),
            DefaultValue::String("quoted".to_string())
        );
        assert_eq!(
            DefaultValue::parse("Yesterday"),
            DefaultValue::String("Yesterday".to_string())
        );
        assert_eq!(
            DefaultValue::parse("~/Pictures"),
            DefaultValue::String("~/Pictures".to_string())
        );
    }

    #[test]
    fn type_flags() {
        assert_eq!(DefaultValue::Bool(true).type_flag(), "-bool");
        assert_eq!(DefaultValue::Int(1).type_flag(), "-int");
        assert_eq!(DefaultValue::Float(1.5).type_flag(), "-float");
        assert_eq!(DefaultValue::String("x".to_string()).type_flag(), "-string");
    }

    #[test]
    fn display_matches_defaults_cli() {
        assert_eq!(DefaultValue::Bool(false).to_string(), "false");
        assert_eq!(DefaultValue::Float(0.25).to_string(), "0.25");
    }

    #[test]
    fn document_round_trips_through_toml() {
        let mut doc = Defaults::new();
        doc.entry("com.apple.dock".to_string())
            .or_default()
            .insert("autohide".to_string(), DefaultValue::Bool(true));
        doc.entry("com.apple.dock".to_string())
            .or_default()
            .insert("tilesize".to_string(), DefaultValue::Int(36));
        let text = toml::to_string_pretty(&doc).unwrap();
        let back: Defaults = toml::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }
}
