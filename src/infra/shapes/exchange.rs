//! Exchange trading totals → per-commodity share of combined tonnage.

use serde::Deserialize;
use serde_json::Value;

use super::{label_from, ShapeError};
use crate::domain::numeric::lenient;
use crate::domain::units::{to_base_units, DEFAULT_UNIT_LABEL};
use crate::domain::ExchangeShare;

const DATASET: &str = "exchange timeline";

/// Text fields stay raw so a wrong-typed label never costs the entry its
/// tonnage.
#[derive(Debug, Deserialize)]
struct CommodityDto {
    #[serde(default)]
    key: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    total_scaled: Option<f64>,
    #[serde(default)]
    unit_scaled: Option<Value>,
}

impl CommodityDto {
    fn key(&self) -> String {
        self.key.as_ref().and_then(label_from).unwrap_or_default()
    }

    fn name(&self) -> Option<String> {
        self.name
            .as_ref()
            .and_then(label_from)
            .filter(|name| !name.trim().is_empty())
    }

    fn unit(&self) -> String {
        self.unit_scaled
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .unwrap_or(DEFAULT_UNIT_LABEL)
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeTimelineDto {
    #[serde(default)]
    commodities: Option<Vec<Value>>,
}

pub fn build(payload: Value) -> Result<Vec<ExchangeShare>, ShapeError> {
    let commodities = decode(payload)?;
    Ok(compute_shares(commodities))
}

fn decode(payload: Value) -> Result<Vec<CommodityDto>, ShapeError> {
    let entries = match payload {
        // Shape B: bare commodity list.
        Value::Array(entries) => entries,
        Value::Object(ref map) if map.contains_key("commodities") => {
            // Shape A: {"commodities": [...]}.
            serde_json::from_value::<ExchangeTimelineDto>(payload.clone())
                .map_err(|_| ShapeError::unrecognized(DATASET, &payload))?
                .commodities
                .unwrap_or_default()
        }
        Value::Object(mut map) => {
            // Shape C: {"data": ...} or {"items": ...} around A or B.
            let inner = map
                .remove("data")
                .or_else(|| map.remove("items"))
                .filter(|inner| inner.is_array() || inner.get("commodities").is_some());
            match inner {
                Some(inner) => return decode(inner),
                None => return Err(ShapeError::unrecognized(DATASET, &Value::Object(map))),
            }
        }
        other => return Err(ShapeError::unrecognized(DATASET, &other)),
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<CommodityDto>(entry).ok())
        .collect())
}

fn compute_shares(commodities: Vec<CommodityDto>) -> Vec<ExchangeShare> {
    let scaled: Vec<(f64, String)> = commodities
        .iter()
        .map(|commodity| (commodity.total_scaled.unwrap_or(0.0), commodity.unit()))
        .collect();

    let bases: Vec<f64> = scaled
        .iter()
        .map(|(value, unit)| to_base_units(*value, unit))
        .collect();
    let total_base: f64 = bases.iter().sum();

    commodities
        .into_iter()
        .zip(scaled)
        .zip(bases)
        .map(|((commodity, (value, unit)), base)| {
            let share = if total_base > 0.0 { base / total_base } else { 0.0 };
            let key = commodity.key();
            let name = commodity.name().unwrap_or_else(|| key.clone());
            ExchangeShare {
                key,
                name,
                value,
                unit: unit.clone(),
                share,
                display_value: value,
                display_unit: unit,
            }
        })
        .collect()
}
