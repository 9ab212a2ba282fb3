pub mod dashboard;
pub mod diagnostics;

pub use dashboard::DashboardPage;
pub use diagnostics::DiagnosticsPage;
