//! Headline KPIs.
//!
//! The backend sends these mostly ready-made. The one transform is the
//! relative change: `yoy_pct` arrives in percentage points and the cards
//! expect a fraction, so `-4.42` becomes `-0.0442`. Entries that already
//! carry `change` are fractions and pass through untouched.

use serde::Deserialize;
use serde_json::Value;

use super::ShapeError;
use crate::domain::numeric::{format_grouped, lenient, normalize_number};
use crate::domain::Metric;

const DATASET: &str = "metrics";
const ENVELOPE_KEYS: [&str; 3] = ["metrics", "data", "items"];
/// Fraction digits kept when the backend sends a raw number as the value.
const VALUE_FRACTION_DIGITS: usize = 1;

#[derive(Debug, Deserialize)]
struct MetricDto {
    title: String,
    #[serde(default)]
    value: Value,
    #[serde(default, deserialize_with = "lenient")]
    change: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    yoy_pct: Option<f64>,
}

impl From<MetricDto> for Metric {
    fn from(dto: MetricDto) -> Self {
        let formatted_value = match &dto.value {
            Value::String(text) => text.clone(),
            other => normalize_number(other)
                .map(|number| format_grouped(number, VALUE_FRACTION_DIGITS))
                .unwrap_or_default(),
        };
        let relative_change = dto
            .change
            .or_else(|| dto.yoy_pct.map(|pct| pct / 100.0))
            .unwrap_or(0.0);

        Metric {
            title: dto.title,
            formatted_value,
            relative_change,
        }
    }
}

pub fn build(payload: Value) -> Result<Vec<Metric>, ShapeError> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(mut map) => {
            let inner = ENVELOPE_KEYS
                .iter()
                .find_map(|key| map.remove(*key).filter(Value::is_array));
            match inner {
                Some(Value::Array(entries)) => entries,
                _ => return Err(ShapeError::unrecognized(DATASET, &Value::Object(map))),
            }
        }
        other => return Err(ShapeError::unrecognized(DATASET, &other)),
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<MetricDto>(entry).ok())
        .map(Metric::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yoy_percentage_points_become_fractions() {
        let payload = json!([{"title": "Нийт экспорт", "value": 14671.72, "yoy_pct": -4.42}]);
        let metrics = build(payload).unwrap();
        assert_eq!(metrics[0].formatted_value, "14,671.7");
        assert!((metrics[0].relative_change - (-0.0442)).abs() < 1e-12);
    }

    #[test]
    fn ready_metrics_pass_through() {
        let payload = json!([
            {"title": "Ам.долларын ханш", "value": "3,450.25", "change": 0.025},
            {"title": "Static", "value": "", "change": 0}
        ]);
        let metrics = build(payload).unwrap();
        assert_eq!(
            metrics[0],
            Metric {
                title: "Ам.долларын ханш".into(),
                formatted_value: "3,450.25".into(),
                relative_change: 0.025,
            }
        );
        assert_eq!(metrics[1].relative_change, 0.0);
    }

    #[test]
    fn change_string_is_normalized() {
        let payload = json!({"metrics": [{"title": "Import", "value": null, "yoy_pct": "12.5"}]});
        let metrics = build(payload).unwrap();
        assert_eq!(metrics[0].formatted_value, "");
        assert!((metrics[0].relative_change - 0.125).abs() < 1e-12);
    }

    #[test]
    fn entries_without_title_are_dropped() {
        let payload = json!({"data": [{"value": 1}, {"title": "Kept", "value": 2}]});
        let metrics = build(payload).unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].formatted_value, "2");
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(build(json!({"metrics": "nope"})).is_err());
        assert!(build(Value::Null).is_err());
    }
}
