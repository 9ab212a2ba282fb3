//! Year-to-date export total.

use serde::Deserialize;
use serde_json::Value;

use super::{object_envelope, ShapeError};
use crate::domain::numeric::lenient;

const DATASET: &str = "export total";

/// Backend shape: `{date, export_this_year, export_prev_same_day, yoy_pct}`.
#[derive(Debug, Deserialize)]
struct ExportTotalDto {
    #[serde(default, deserialize_with = "lenient")]
    export_this_year: Option<f64>,
}

pub fn build(payload: Value) -> Result<Option<f64>, ShapeError> {
    let Value::Object(ref map) = payload else {
        return Err(ShapeError::unrecognized(DATASET, &payload));
    };

    let target = object_envelope(map, &["export_this_year"]).unwrap_or(&payload);
    serde_json::from_value::<ExportTotalDto>(target.clone())
        .map(|dto| dto.export_this_year)
        .map_err(|_| ShapeError::unrecognized(DATASET, target))
}
