pub mod kpi_card;
pub mod series_table;
pub mod share_table;
pub mod toast;
