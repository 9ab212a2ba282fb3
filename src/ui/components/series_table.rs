use dioxus::prelude::*;

use crate::config::{product_name, DEFAULT_PRODUCTS};
use crate::domain::numeric::format_grouped;
use crate::domain::MonthlyPoint;
use crate::ui::theme;

/// Monthly points pivoted into one row per month and one column per product.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesGrid {
    pub codes: Vec<String>,
    pub rows: Vec<SeriesGridRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesGridRow {
    pub date: String,
    pub counts: Vec<Option<i64>>,
}

/// Known products keep their usual column order; unknown codes follow in
/// the order they first appear. Rows are sorted by date.
pub fn pivot(points: &[MonthlyPoint]) -> SeriesGrid {
    let mut codes: Vec<String> = DEFAULT_PRODUCTS
        .iter()
        .filter(|product| points.iter().any(|point| point.series_key == product.code))
        .map(|product| product.code.to_string())
        .collect();
    for point in points {
        if !codes.contains(&point.series_key) {
            codes.push(point.series_key.clone());
        }
    }

    let mut dates: Vec<&str> = points.iter().map(|point| point.date.as_str()).collect();
    dates.sort_unstable();
    dates.dedup();

    let rows = dates
        .into_iter()
        .map(|date| SeriesGridRow {
            date: date.to_string(),
            counts: codes
                .iter()
                .map(|code| {
                    points
                        .iter()
                        .find(|point| point.date == date && &point.series_key == code)
                        .map(|point| point.count)
                })
                .collect(),
        })
        .collect();

    SeriesGrid { codes, rows }
}

#[component]
pub fn SeriesTable(points: Vec<MonthlyPoint>) -> Element {
    let grid = pivot(&points);
    if grid.rows.is_empty() {
        return rsx! {
            p { class: "{theme::MUTED}", "No monthly data in the selected range." }
        };
    }

    let headers = grid
        .codes
        .iter()
        .map(|code| product_name(code).unwrap_or(code.as_str()).to_string())
        .collect::<Vec<_>>();
    let rows = grid
        .rows
        .into_iter()
        .map(|row| {
            let month = row.date.get(..7).unwrap_or(&row.date).to_string();
            let cells = row
                .counts
                .into_iter()
                .map(|count| count.map_or_else(|| "—".to_string(), |c| format_grouped(c as f64, 0)))
                .collect::<Vec<_>>();
            (month, cells)
        })
        .collect::<Vec<_>>();

    rsx! {
        table {
            class: "{theme::TABLE}",
            thead {
                tr {
                    th { "Month" }
                    for header in headers {
                        th { class: "{theme::NUMERIC_CELL}", "{header}" }
                    }
                }
            }
            tbody {
                for (month, cells) in rows {
                    tr {
                        td { "{month}" }
                        for cell in cells {
                            td { class: "{theme::NUMERIC_CELL}", "{cell}" }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, key: &str, count: i64) -> MonthlyPoint {
        MonthlyPoint {
            date: date.into(),
            series_key: key.into(),
            count,
        }
    }

    #[test]
    fn pivots_by_month_and_product() {
        let points = [
            point("2025-02-01", "2701", 20),
            point("2025-01-01", "9999", 5),
            point("2025-01-01", "2701", 10),
            point("2025-01-01", "2603", 3),
        ];
        let grid = pivot(&points);

        assert_eq!(grid.codes, ["2603", "2701", "9999"]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0].date, "2025-01-01");
        assert_eq!(grid.rows[0].counts, [Some(3), Some(10), Some(5)]);
        assert_eq!(grid.rows[1].counts, [None, Some(20), None]);
    }

    #[test]
    fn empty_points_give_empty_grid() {
        let grid = pivot(&[]);
        assert!(grid.codes.is_empty());
        assert!(grid.rows.is_empty());
    }
}
