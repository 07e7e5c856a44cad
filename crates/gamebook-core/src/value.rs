//! Story values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value held by a story variable or produced by an expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. Integers are numbers too.
    Number(f64),
    /// A string.
    Text(String),
    /// An ordered sequence.
    List(Vec<Value>),
}

impl Value {
    /// Truthiness as story authors expect it: `null`, `false`, `0`, `NaN` and
    /// `""` are false, everything else is true.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::Text(value) => !value.is_empty(),
            Self::List(_) => true,
        }
    }

    /// Numeric conversion; text that is not a number becomes `NaN`.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Bool(value) => f64::from(u8::from(*value)),
            Self::Number(value) => *value,
            Self::Text(text) => parse_number(text),
            Self::List(items) => match items.as_slice() {
                [] => 0.0,
                [only] => only.to_number(),
                _ => f64::NAN,
            },
        }
    }

    /// Whether this is `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Parses text the way a reader would read a number: surrounding whitespace
/// is ignored, blank text is zero, anything else unparseable is `NaN`.
#[must_use]
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.chars().any(char::is_alphabetic) && !trimmed.contains(['e', 'E']) => f64::NAN,
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Parses a leading integer, ignoring trailing garbage: `"3 gold"` is `3`.
#[must_use]
pub fn parse_leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    trimmed[..digits_start + digits].parse().ok()
}

/// Formats a number without a trailing `.0` for whole values.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if value == 0.0 {
        "0".to_owned()
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::Text(text) => f.write_str(text),
            Self::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_null() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }

    #[test]
    fn test_number_conversion() {
        assert!((Value::from(" 12 ").to_number() - 12.0).abs() < f64::EPSILON);
        assert!(Value::from("twelve").to_number().is_nan());
        assert!((Value::from(true).to_number() - 1.0).abs() < f64::EPSILON);
        assert!(Value::Null.to_number().abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_matches_author_expectations() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(
            Value::from(vec![Value::from("sword"), Value::from(2.0)]).to_string(),
            "sword,2"
        );
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(parse_leading_integer("3 gold"), Some(3));
        assert_eq!(parse_leading_integer(" -2"), Some(-2));
        assert_eq!(parse_leading_integer("gold"), None);
    }

    #[test]
    fn test_json_round_trip_keeps_shapes() {
        let value = Value::from(vec![Value::from(1.0), Value::from("a"), Value::Null, Value::from(true)]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
