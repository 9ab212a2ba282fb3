use serde::{Deserialize, Serialize};

/// Unified data contract handed to the presentation layer.
///
/// Every section defaults independently: a failed upstream call leaves its
/// own section empty and never invalidates the others.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub metrics: Option<Vec<Metric>>,
    pub monthly_series: Vec<MonthlyPoint>,
    pub value_pie: ValuePie,
    pub exchange_shares: Option<Vec<ExchangeShare>>,
    pub coal_latest: Option<CoalLatest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

/// Headline KPI. `relative_change` is a fraction: `-0.0442` means -4.42%.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub title: String,
    pub formatted_value: String,
    pub relative_change: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    /// First day of the period, `YYYY-MM-01`.
    pub date: String,
    /// Product code the count belongs to.
    pub series_key: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuePie {
    pub slices: Vec<PieSlice>,
    pub year_label: String,
    pub export_total: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ton: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeShare {
    pub key: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    /// Fraction of the combined base-unit quantity, 0..=1.
    pub share: f64,
    pub display_value: f64,
    pub display_unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoalLatest {
    pub date: String,
    pub items: Vec<CoalItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoalItem {
    pub name: String,
    pub latest: Option<f64>,
    pub prev_year: Option<f64>,
    pub yoy_pct: Option<f64>,
}

/// Observability only. Never cache this or treat it as stable data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub base_url: String,
    pub total_elapsed_ms: u64,
    pub endpoints: Vec<EndpointDiagnostic>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDiagnostic {
    pub endpoint: String,
    pub url: String,
    pub ok: bool,
    /// `success`, `timeout`, `http_error`, `parse_error` or `network_error`.
    pub status: String,
    pub attempts: u32,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DashboardView {
    /// True when no section carries any data.
    pub fn is_empty(&self) -> bool {
        self.metrics.as_ref().map_or(true, |m| m.is_empty())
            && self.monthly_series.is_empty()
            && self.value_pie.slices.is_empty()
            && self.value_pie.export_total.is_none()
            && self.exchange_shares.as_ref().map_or(true, |s| s.is_empty())
            && self.coal_latest.is_none()
    }
}
