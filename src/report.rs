//! Data-quality reporting over the finished output table.

use std::fmt;

use tracing::info;

use crate::models::{PointTable, ResolvedRecord, RESOLVED_COLUMNS};

/// Missing values in one output column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReport {
    pub column: String,
    pub missing: usize,
    pub total: usize,
}

impl ColumnReport {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.missing as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for ColumnReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<20} : {:>6} ({:.2}%)",
            self.column,
            self.missing,
            self.percentage()
        )
    }
}

/// Null count and percentage for every output column, passthrough
/// columns included. Blank input cells count as missing; the coordinate
/// columns count every cell that did not parse as a number.
#[derive(Debug, Clone, Default)]
pub struct MissingValueReport {
    pub columns: Vec<ColumnReport>,
}

impl MissingValueReport {
    pub fn build(
        table: &PointTable,
        resolved: &[ResolvedRecord],
        coordinate_fields: [&str; 2],
        postal_column: &str,
    ) -> Self {
        let [latitude_field, longitude_field] = coordinate_fields;
        let total = table.len();
        let mut columns = Vec::with_capacity(table.headers.len() + RESOLVED_COLUMNS.len() + 1);

        for (idx, header) in table.headers.iter().enumerate() {
            let records = table.records.iter();
            let missing = match header.trim() {
                h if h == latitude_field => records.filter(|r| r.latitude.is_none()).count(),
                h if h == longitude_field => records.filter(|r| r.longitude.is_none()).count(),
                _ => records
                    .filter(|r| r.fields.get(idx).map_or(true, |v| v.trim().is_empty()))
                    .count(),
            };
            columns.push(ColumnReport {
                column: header.clone(),
                missing,
                total,
            });
        }

        let mut names: Vec<&str> = RESOLVED_COLUMNS.to_vec();
        names.push(postal_column);
        for (idx, name) in names.into_iter().enumerate() {
            let missing = resolved.iter().filter(|r| r.values()[idx].is_none()).count();
            columns.push(ColumnReport {
                column: name.to_string(),
                missing,
                total,
            });
        }

        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn log(&self) {
        info!("Missing values per column:");
        for column in &self.columns {
            info!("  {}", column);
        }
    }
}
