//! Products timeline → monthly series points.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{object_envelope, object_rows, ShapeError};
use crate::config::default_product_codes;
use crate::domain::numeric::{normalize_number, round_half_up, string_or_number};
use crate::domain::MonthlyPoint;

const DATASET: &str = "products timeline";

#[derive(Debug, Default, Deserialize)]
struct ProductsTimelineDto {
    #[serde(default)]
    products: Option<Vec<Value>>,
    #[serde(default)]
    monthly: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ProductCodeDto {
    #[serde(deserialize_with = "string_or_number")]
    code: String,
}

pub fn build(payload: Value) -> Result<Vec<MonthlyPoint>, ShapeError> {
    let timeline = decode(payload)?;

    let codes = match timeline.products {
        Some(products) => products
            .into_iter()
            .filter_map(|product| serde_json::from_value::<ProductCodeDto>(product).ok())
            .map(|product| product.code)
            .collect(),
        None => default_product_codes(),
    };
    let rows = object_rows(timeline.monthly.unwrap_or_default());

    let mut points = Vec::new();
    for row in &rows {
        let Some(period) = row_period(row) else {
            continue;
        };
        let date = format!("{period}-01");

        for code in &codes {
            let Some(value) = row.get(code).and_then(normalize_number) else {
                continue;
            };
            points.push(MonthlyPoint {
                date: date.clone(),
                series_key: code.clone(),
                count: round_half_up(value),
            });
        }
    }

    Ok(points)
}

fn decode(payload: Value) -> Result<ProductsTimelineDto, ShapeError> {
    match payload {
        // Shape C: rows without the product list.
        Value::Array(rows) => Ok(ProductsTimelineDto {
            products: None,
            monthly: Some(rows),
        }),
        Value::Object(ref map) => {
            // Shape B: {"data": {...}}.
            if let Some(inner) = object_envelope(map, &["products", "monthly"]) {
                return serde_json::from_value(inner.clone())
                    .map_err(|_| ShapeError::unrecognized(DATASET, inner));
            }
            // Shape A: {"products": [...], "monthly": [...]}.
            serde_json::from_value(payload.clone())
                .map_err(|_| ShapeError::unrecognized(DATASET, &payload))
        }
        other => Err(ShapeError::unrecognized(DATASET, &other)),
    }
}

/// `period` when present, otherwise `year` plus zero-padded `month`.
fn row_period(row: &Map<String, Value>) -> Option<String> {
    let explicit = row
        .get("period")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|period| !period.is_empty());
    if let Some(period) = explicit {
        return Some(period.to_string());
    }

    let year = row.get("year").and_then(normalize_number)?;
    let month = row.get("month").and_then(normalize_number)?;
    Some(format!("{}-{:02}", year as i64, month as i64))
}
