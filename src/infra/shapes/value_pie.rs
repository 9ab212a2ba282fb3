//! Products value by month → export value pie.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{label_from, object_envelope, object_rows, ShapeError};
use crate::config::product_name;
use crate::domain::numeric::{lenient, normalize_number, string_or_number};
use crate::domain::PieSlice;

const DATASET: &str = "products value";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValuePieFragment {
    pub slices: Vec<PieSlice>,
    pub year_label: String,
    /// Export total some backend versions embed in this payload; used only
    /// when the dedicated export total call fails.
    pub embedded_export_total: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PieSliceDto {
    #[serde(deserialize_with = "string_or_number")]
    name: String,
    #[serde(default, deserialize_with = "lenient")]
    value: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    ton: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    share: Option<f64>,
}

/// List fields stay raw and are only read when they are arrays.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductsValueDto {
    #[serde(default)]
    products: Option<Value>,
    #[serde(default)]
    monthly: Option<Value>,
    #[serde(default)]
    year_label: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    export_total: Option<f64>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    #[serde(deserialize_with = "string_or_number")]
    code: String,
    #[serde(default)]
    name: Option<Value>,
}

pub fn build(payload: Value) -> Result<ValuePieFragment, ShapeError> {
    match payload {
        // Shape A: already the final slice list.
        Value::Array(entries) => Ok(ValuePieFragment {
            slices: decode_slices(entries),
            ..ValuePieFragment::default()
        }),
        Value::Object(ref map) => {
            // Shape C: {"data": {...}} around shape B.
            if let Some(inner) = object_envelope(map, &["products", "monthly", "yearLabel"]) {
                let dto = serde_json::from_value(inner.clone())
                    .map_err(|_| ShapeError::unrecognized(DATASET, inner))?;
                return Ok(from_monthly(dto));
            }
            // Shape B: {"products", "monthly", "yearLabel"?, "data"?}.
            let dto = serde_json::from_value(payload.clone())
                .map_err(|_| ShapeError::unrecognized(DATASET, &payload))?;
            Ok(from_monthly(dto))
        }
        other => Err(ShapeError::unrecognized(DATASET, &other)),
    }
}

fn from_monthly(dto: ProductsValueDto) -> ValuePieFragment {
    let rows = object_rows(array(dto.monthly).unwrap_or_default());
    let last_row = rows.last();
    let year_label = year_label(dto.year_label.as_ref(), last_row);

    let slices = match (array(dto.data), last_row) {
        (Some(ready), _) => decode_slices(ready),
        (None, Some(row)) => slices_from_row(array(dto.products).unwrap_or_default(), row),
        (None, None) => Vec::new(),
    };

    ValuePieFragment {
        slices,
        year_label,
        embedded_export_total: dto.export_total,
    }
}

fn array(value: Option<Value>) -> Option<Vec<Value>> {
    match value {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Explicit label, else the last row's year, else its period, else empty.
fn year_label(explicit: Option<&Value>, last_row: Option<&Map<String, Value>>) -> String {
    explicit
        .and_then(label_from)
        .or_else(|| last_row.and_then(|row| row.get("year")).and_then(label_from))
        .or_else(|| last_row.and_then(|row| row.get("period")).and_then(label_from))
        .unwrap_or_default()
}

/// One slice per product, read from the most recent row.
fn slices_from_row(products: Vec<Value>, row: &Map<String, Value>) -> Vec<PieSlice> {
    products
        .into_iter()
        .filter_map(|product| serde_json::from_value::<ProductDto>(product).ok())
        .filter_map(|product| {
            let value = row.get(&product.code).and_then(normalize_number)?;
            let name = product
                .name
                .as_ref()
                .and_then(label_from)
                .filter(|name| !name.trim().is_empty())
                .or_else(|| product_name(&product.code).map(str::to_string))
                .unwrap_or(product.code);
            Some(PieSlice {
                name,
                value,
                ton: None,
                share: None,
            })
        })
        .collect()
}

fn decode_slices(entries: Vec<Value>) -> Vec<PieSlice> {
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<PieSliceDto>(entry).ok())
        .filter_map(|dto| {
            Some(PieSlice {
                name: dto.name,
                value: dto.value?,
                ton: dto.ton,
                share: dto.share,
            })
        })
        .collect()
}
