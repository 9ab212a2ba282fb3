//! Latest coking coal prices, passed through structurally.

use serde::Deserialize;
use serde_json::Value;

use super::{label_from, object_envelope, ShapeError};
use crate::domain::numeric::lenient;
use crate::domain::{CoalItem, CoalLatest};

const DATASET: &str = "coal latest";

#[derive(Debug, Deserialize)]
struct CoalLatestDto {
    #[serde(default)]
    date: Value,
    #[serde(default)]
    items: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct CoalItemDto {
    name: String,
    #[serde(default, deserialize_with = "lenient")]
    latest: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    prev_year: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    yoy_pct: Option<f64>,
}

pub fn build(payload: Value) -> Result<CoalLatest, ShapeError> {
    let Value::Object(ref map) = payload else {
        return Err(ShapeError::unrecognized(DATASET, &payload));
    };

    let target = object_envelope(map, &["date", "items"]).unwrap_or(&payload);
    let dto: CoalLatestDto = serde_json::from_value(target.clone())
        .map_err(|_| ShapeError::unrecognized(DATASET, target))?;

    let items = dto
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| serde_json::from_value::<CoalItemDto>(item).ok())
        .map(|item| CoalItem {
            name: item.name,
            latest: item.latest,
            prev_year: item.prev_year,
            yoy_pct: item.yoy_pct,
        })
        .collect();

    Ok(CoalLatest {
        date: label_from(&dto.date).unwrap_or_default(),
        items,
    })
}
