//! Dashboard view model and the pure helpers around it.

pub mod app_state;
pub mod numeric;
pub mod series;
pub mod units;
pub mod view;

pub use app_state::{AppState, PersistedState};
pub use view::{
    CoalItem, CoalLatest, DashboardView, DebugInfo, EndpointDiagnostic, ExchangeShare, Metric,
    MonthlyPoint, PieSlice, ValuePie,
};
