//! Class names shared across views. The rules live in `assets/main.css`.

// ============================================
// LAYOUT
// ============================================

pub const PANEL: &str = "panel";
pub const PANEL_HEADER: &str = "panel-header";
pub const PANEL_TITLE: &str = "panel-title";
pub const KPI_GRID: &str = "kpi-grid";
pub const MUTED: &str = "muted";
pub const NOTICE: &str = "notice";

// ============================================
// CONTROLS
// ============================================

pub const BUTTON: &str = "btn";
pub const INPUT: &str = "input";

pub fn nav_button(active: bool) -> &'static str {
    if active {
        "nav-btn nav-btn-active"
    } else {
        "nav-btn"
    }
}

// ============================================
// TABLES
// ============================================

pub const TABLE: &str = "data-table";
pub const NUMERIC_CELL: &str = "num";
pub const BAR_TRACK: &str = "bar-track";
pub const BAR_FILL: &str = "bar-fill";

pub fn status_badge(ok: bool) -> &'static str {
    if ok {
        "badge badge-ok"
    } else {
        "badge badge-fail"
    }
}

// ============================================
// TRENDS
// ============================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Flat => "•",
        }
    }
}

pub fn trend_class(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "trend trend-up",
        Trend::Down => "trend trend-down",
        Trend::Flat => "trend",
    }
}
