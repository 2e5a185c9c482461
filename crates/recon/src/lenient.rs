//! Parse-or-default deserializers for extracted line fields.
//!
//! Extraction services hand over numbers as JSON numbers, as strings with
//! currency decoration, or not at all. Anything that does not yield a finite
//! number becomes `None`; the engine then reads it as zero.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce an optional number to a finite `f64`, zero otherwise.
pub fn num(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Parse a financial number string:
/// - Strip `$`, commas, whitespace
/// - Handle `(123.45)` → `-123.45`
/// - Returns None if non-numeric characters remain after stripping
pub fn parse_amount(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            _ => return None,
        }
    }

    let value: f64 = cleaned.parse().ok()?;
    let value = if is_negative { -value } else { value };
    value.is_finite().then_some(value)
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn text_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

pub(crate) fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_number(deserializer).map(num)
}

pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(text_from_value))
}

/// Required identifier that may arrive as a JSON number (`"id": 17`).
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    text_from_value(value)
        .ok_or_else(|| serde::de::Error::custom("expected a string or number identifier"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_coerces_missing_and_non_finite() {
        assert_eq!(num(None), 0.0);
        assert_eq!(num(Some(f64::NAN)), 0.0);
        assert_eq!(num(Some(f64::INFINITY)), 0.0);
        assert_eq!(num(Some(-2.5)), -2.5);
    }

    #[test]
    fn parse_amount_handles_decoration() {
        assert_eq!(parse_amount("2.50"), Some(2.5));
        assert_eq!(parse_amount(" $1,234.50 "), Some(1234.5));
        assert_eq!(parse_amount("(12.00)"), Some(-12.0));
        assert_eq!(parse_amount("-3"), Some(-3.0));
    }

    #[test]
    fn parse_amount_rejects_text() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("12kg"), None);
        assert_eq!(parse_amount("(-5)"), None);
    }

    #[test]
    fn number_from_value_variants() {
        assert_eq!(number_from_value(&serde_json::json!(4)), Some(4.0));
        assert_eq!(number_from_value(&serde_json::json!("4.25")), Some(4.25));
        assert_eq!(number_from_value(&serde_json::json!(true)), None);
        assert_eq!(number_from_value(&Value::Null), None);
    }
}
