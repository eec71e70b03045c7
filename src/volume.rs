//! Shipment volume aggregation.
//!
//! Turns the rows of the order table into validated `BoxRecord`s and sums
//! their volume in m³. Rows that cannot be read are skipped, never reported
//! as errors; only a table that is empty or lacks a dimension column is
//! rejected as a whole.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use serde_json::Value;
use utoipa::ToSchema;

use crate::model::BoxRecord;
use crate::types::Volumetric;

/// Columns that must be present in the order table.
pub const REQUIRED_COLUMNS: [&str; 3] = ["length", "width", "height"];

/// A raw row of the order table as sent by the dashboard.
///
/// Each cell may be a number, a numeric string, `null` or missing.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[schema(example = json!({ "length": 100, "width": "50", "height": 60.0, "quantity": 2 }))]
pub struct BoxRow {
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub length: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub width: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub height: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<u64>)]
    pub quantity: Option<Value>,
}

impl BoxRow {
    /// Convenience constructor for fully numeric rows.
    #[allow(dead_code)]
    pub fn numeric(length: f64, width: f64, height: f64, quantity: Option<u64>) -> Self {
        Self {
            length: Some(json!(length)),
            width: Some(json!(width)),
            height: Some(json!(height)),
            quantity: quantity.map(|q| json!(q)),
        }
    }

    fn column(&self, name: &str) -> Option<&Value> {
        match name {
            "length" => self.length.as_ref(),
            "width" => self.width.as_ref(),
            "height" => self.height.as_ref(),
            "quantity" => self.quantity.as_ref(),
            _ => None,
        }
    }

    /// Coerces the row into a `BoxRecord`.
    ///
    /// Returns `None` when a dimension is missing, non-numeric or not
    /// positive, or when a given quantity is not a non-negative whole number.
    /// A missing quantity counts as one box.
    pub fn to_record(&self) -> Option<BoxRecord> {
        let length = coerce_number(self.length.as_ref()?)?;
        let width = coerce_number(self.width.as_ref()?)?;
        let height = coerce_number(self.height.as_ref()?)?;
        let quantity = match self.quantity.as_ref() {
            None | Some(Value::Null) => BoxRecord::DEFAULT_QUANTITY,
            Some(value) => coerce_quantity(value)?,
        };
        BoxRecord::new(length, width, height, quantity)
    }
}

/// Lenient numeric conversion: numbers pass, numeric strings are parsed,
/// everything else is non-numeric.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn coerce_quantity(value: &Value) -> Option<u64> {
    let number = coerce_number(value)?;
    if number < 0.0 || number.fract() != 0.0 || number > u64::MAX as f64 {
        return None;
    }
    Some(number as u64)
}

/// Reasons the order table is rejected before any computation.
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    Empty,
    MissingColumns(Vec<&'static str>),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Empty => write!(f, "Order table contains no rows"),
            TableError::MissingColumns(columns) => {
                write!(f, "Order table is missing column(s): {}", columns.join(", "))
            }
        }
    }
}

impl std::error::Error for TableError {}

/// Rejects empty tables and tables where a dimension column has no value in any row.
pub fn check_table_columns(rows: &[BoxRow]) -> Result<(), TableError> {
    if rows.is_empty() {
        return Err(TableError::Empty);
    }

    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| {
            rows.iter()
                .all(|row| matches!(row.column(column), None | Some(Value::Null)))
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TableError::MissingColumns(missing))
    }
}

/// Total volume of validated records in m³.
pub fn aggregate_volume(records: &[BoxRecord]) -> f64 {
    records.iter().map(Volumetric::volume_m3).sum()
}

/// An accepted row with its computed volumes.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BoxLine {
    /// Position of the row in the submitted table (0-based).
    pub row: usize,
    pub record: BoxRecord,
    pub unit_volume_m3: f64,
    pub total_volume_m3: f64,
}

/// Result of reading the whole order table.
#[derive(Clone, Debug)]
pub struct ShipmentSummary {
    pub lines: Vec<BoxLine>,
    pub dropped_rows: usize,
    pub required_volume: f64,
}

impl ShipmentSummary {
    pub fn accepted_rows(&self) -> usize {
        self.lines.len()
    }

    pub fn records(&self) -> Vec<BoxRecord> {
        self.lines.iter().map(|line| line.record).collect()
    }
}

/// Coerces every row, drops unreadable ones and sums the rest.
pub fn summarize_rows(rows: &[BoxRow]) -> ShipmentSummary {
    let mut lines = Vec::with_capacity(rows.len());
    let mut dropped_rows = 0;

    for (row, raw) in rows.iter().enumerate() {
        match raw.to_record() {
            Some(record) => lines.push(BoxLine {
                row,
                record,
                unit_volume_m3: record.unit_volume_m3(),
                total_volume_m3: record.total_volume_m3(),
            }),
            None => dropped_rows += 1,
        }
    }

    let mut summary = ShipmentSummary {
        lines,
        dropped_rows,
        required_volume: 0.0,
    };
    summary.required_volume = aggregate_volume(&summary.records());
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn empty_input_has_zero_volume() {
        assert_eq!(aggregate_volume(&[]), 0.0);
        let summary = summarize_rows(&[]);
        assert_eq!(summary.required_volume, 0.0);
        assert_eq!(summary.accepted_rows(), 0);
        assert_eq!(summary.dropped_rows, 0);
    }

    #[test]
    fn single_row_contributes_quantity_times_unit_volume() {
        let summary = summarize_rows(&[BoxRow::numeric(100.0, 50.0, 60.0, Some(2))]);
        assert!((summary.required_volume - 0.6).abs() < EPS);
        assert!((summary.lines[0].unit_volume_m3 - 0.3).abs() < EPS);
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let summary = summarize_rows(&[BoxRow::numeric(100.0, 100.0, 100.0, None)]);
        assert_eq!(summary.lines[0].record.quantity, 1);
        assert!((summary.required_volume - 1.0).abs() < EPS);

        let null_quantity: BoxRow = serde_json::from_value(json!({
            "length": 100, "width": 100, "height": 100, "quantity": null
        }))
        .unwrap();
        assert_eq!(null_quantity.to_record().unwrap().quantity, 1);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let row: BoxRow = serde_json::from_value(json!({
            "length": " 100 ", "width": "50", "height": "60.0", "quantity": "2"
        }))
        .unwrap();
        let record = row.to_record().expect("numeric strings should be accepted");
        assert!((record.total_volume_m3() - 0.6).abs() < EPS);
    }

    #[test]
    fn non_numeric_rows_do_not_contribute() {
        let rows: Vec<BoxRow> = serde_json::from_value(json!([
            { "length": 100, "width": 50, "height": 60, "quantity": 2 },
            { "length": "abc", "width": 50, "height": 60, "quantity": 2 },
            { "length": 100, "width": true, "height": 60 },
            { "length": 100, "width": 50, "height": 60, "quantity": "many" },
            { "length": 100, "height": 60 },
            { "length": 100, "width": 50, "height": [60] }
        ]))
        .unwrap();

        let summary = summarize_rows(&rows);
        assert_eq!(summary.accepted_rows(), 1);
        assert_eq!(summary.dropped_rows, 5);
        assert_eq!(summary.lines[0].row, 0);
        assert!((summary.required_volume - 0.6).abs() < EPS);
    }

    #[test]
    fn invalid_quantities_are_dropped() {
        for quantity in [json!(-1), json!(1.5), json!("NaN"), json!("inf")] {
            let row = BoxRow {
                quantity: Some(quantity.clone()),
                ..BoxRow::numeric(10.0, 10.0, 10.0, None)
            };
            assert!(row.to_record().is_none(), "quantity {} accepted", quantity);
        }
    }

    #[test]
    fn zero_quantity_is_kept_without_volume() {
        let summary = summarize_rows(&[BoxRow::numeric(100.0, 100.0, 100.0, Some(0))]);
        assert_eq!(summary.accepted_rows(), 1);
        assert_eq!(summary.required_volume, 0.0);
    }

    #[test]
    fn non_positive_dimensions_are_dropped() {
        let summary = summarize_rows(&[
            BoxRow::numeric(0.0, 10.0, 10.0, Some(1)),
            BoxRow::numeric(10.0, -10.0, 10.0, Some(1)),
        ]);
        assert_eq!(summary.dropped_rows, 2);
        assert_eq!(summary.required_volume, 0.0);
    }

    #[test]
    fn volume_is_sum_over_valid_rows() {
        let rows = vec![
            BoxRow::numeric(120.0, 80.0, 100.0, Some(10)),
            BoxRow::numeric(60.0, 40.0, 40.0, Some(25)),
            BoxRow::default(),
        ];
        let summary = summarize_rows(&rows);
        let expected = 0.96 * 10.0 + 0.096 * 25.0;
        assert!((summary.required_volume - expected).abs() < EPS);
        assert!(summary.required_volume >= 0.0);
        assert_eq!(summary.records().len(), 2);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(check_table_columns(&[]), Err(TableError::Empty));
    }

    #[test]
    fn table_without_dimension_column_is_rejected() {
        let rows: Vec<BoxRow> = serde_json::from_value(json!([
            { "length": 100, "width": 50, "quantity": 2 },
            { "length": 10, "width": 5, "height": null }
        ]))
        .unwrap();
        assert_eq!(
            check_table_columns(&rows),
            Err(TableError::MissingColumns(vec!["height"]))
        );
    }

    #[test]
    fn table_without_quantity_column_is_accepted() {
        let rows = vec![BoxRow::numeric(10.0, 10.0, 10.0, None)];
        assert!(check_table_columns(&rows).is_ok());
    }

    #[test]
    fn table_error_messages_name_columns() {
        let err = TableError::MissingColumns(vec!["width", "height"]);
        assert_eq!(
            err.to_string(),
            "Order table is missing column(s): width, height"
        );
    }
}
