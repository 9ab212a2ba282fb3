//! Lenient numeric parsing for backend payloads.
//!
//! The statistics backend is not consistent about number encoding: the same
//! field can arrive as a JSON number, a locale-formatted string
//! (`"14,671.7"`, `"3 544.81"`), an empty string or `null`. Everything that
//! should be a number goes through [`normalize_number`] before it reaches a
//! view model.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a loosely-typed JSON value into a finite number.
///
/// Returns `None` for `null`, booleans, arrays, objects, blank strings and
/// anything that does not parse to a finite `f64`.
pub fn normalize_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite()),
        Value::String(raw) => normalize_str(raw),
        _ => None,
    }
}

/// String flavour of [`normalize_number`]: drops whitespace and thousands
/// separators, then parses.
pub fn normalize_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Deserialize an optional numeric field through [`normalize_number`].
///
/// Use with `#[serde(default, deserialize_with = "lenient")]`; unparseable
/// values become `None` instead of failing the whole payload.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(normalize_number))
}

/// Deserialize an identifier that may be encoded as a string or a number
/// (product codes show up as both `"2701"` and `2701`).
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                Ok((value as i64).to_string())
            } else {
                Ok(value.to_string())
            }
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

/// Round half-up toward positive infinity, matching how the dashboard has
/// always rounded monthly counts (`-2.5` becomes `-2`, `2.5` becomes `3`).
pub fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

/// Render a number with comma thousands separators and at most
/// `max_fraction_digits` fraction digits (trailing zeros trimmed).
pub fn format_grouped(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }

    let rendered = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((int_part, frac)) => (int_part, frac.trim_end_matches('0')),
        None => (rendered.as_str(), ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    let digits = int_part.len();
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (digits - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|ch| ch == '0') && frac_part.is_empty();
    let mut out = String::new();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_spaces_and_commas() {
        assert_eq!(normalize_str("3 544.81"), Some(3544.81));
        assert_eq!(normalize_str("14,671.7"), Some(14671.7));
        assert_eq!(normalize_str("\u{a0}1\u{a0}000 "), Some(1000.0));
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert_eq!(normalize_str(""), None);
        assert_eq!(normalize_str("   "), None);
        assert_eq!(normalize_str("abc"), None);
        assert_eq!(normalize_str("NaN"), None);
        assert_eq!(normalize_str("inf"), None);
    }

    #[test]
    fn normalizes_json_values() {
        assert_eq!(normalize_number(&json!(12.5)), Some(12.5));
        assert_eq!(normalize_number(&json!("1,234.5")), Some(1234.5));
        assert_eq!(normalize_number(&Value::Null), None);
        assert_eq!(normalize_number(&json!(true)), None);
        assert_eq!(normalize_number(&json!([1])), None);
        assert_eq!(normalize_number(&json!({"v": 1})), None);
    }

    #[test]
    fn lenient_fields_default_to_none() {
        #[derive(Deserialize)]
        struct Amounts {
            #[serde(default, deserialize_with = "lenient")]
            a: Option<f64>,
            #[serde(default, deserialize_with = "lenient")]
            b: Option<f64>,
            #[serde(default, deserialize_with = "lenient")]
            c: Option<f64>,
        }

        let row: Amounts = serde_json::from_value(json!({"a": "2 000", "b": "n/a"})).unwrap();
        assert_eq!(row.a, Some(2000.0));
        assert_eq!(row.b, None);
        assert_eq!(row.c, None);
    }

    #[test]
    fn codes_accept_numbers() {
        #[derive(Deserialize)]
        struct Coded {
            #[serde(deserialize_with = "string_or_number")]
            code: String,
        }

        let from_number: Coded = serde_json::from_value(json!({"code": 2701})).unwrap();
        let from_string: Coded = serde_json::from_value(json!({"code": " 2709 "})).unwrap();
        assert_eq!(from_number.code, "2701");
        assert_eq!(from_string.code, "2709");
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_half_up(1234.5), 1235);
        assert_eq!(round_half_up(1234.49), 1234);
        assert_eq!(round_half_up(-2.5), -2);
    }

    #[test]
    fn rounding_is_exact_near_the_edges() {
        assert_eq!(round_half_up(0.49999999999999994), 0);
        assert_eq!(round_half_up(-0.5), 0);
        let odd = 9_007_199_254_740_991.0;
        assert_eq!(round_half_up(odd), 9_007_199_254_740_991);
        assert_eq!(round_half_up(4_503_599_627_370_497.0), 4_503_599_627_370_497);
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_grouped(14671.72, 1), "14,671.7");
        assert_eq!(format_grouped(1_234_567.0, 1), "1,234,567");
        assert_eq!(format_grouped(999.99, 1), "1,000");
        assert_eq!(format_grouped(-4.0, 2), "-4");
        assert_eq!(format_grouped(-0.01, 1), "0");
        assert_eq!(format_grouped(512.0, 0), "512");
    }
}
