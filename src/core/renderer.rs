use crate::domain::model::{
    Preview, PreviewTable, ProcessedResult, RenderedResult, ResultSummary, Row,
};
use crate::utils::format::format_length;
use serde_json::Value;

pub const PREVIEW_ROW_LIMIT: usize = 10;
pub const NO_DATA_PLACEHOLDER: &str = "No data to display";

pub fn render(result: &ProcessedResult) -> RenderedResult {
    RenderedResult {
        summary: summarize(result),
        preview: preview(&result.rows),
    }
}

/// Absent numeric fields count as zero.
pub fn summarize(result: &ProcessedResult) -> ResultSummary {
    ResultSummary {
        total_rows: result.rows.len(),
        material_types: result.material_types.unwrap_or(0),
        cutting_groups: result.max_cutting_id.unwrap_or(0),
        total_length: result.total_length.unwrap_or(0.0),
    }
}

/// First rows only. Columns come from the first row, in its key order; a
/// later row missing one of them gets an empty cell, extra keys are ignored.
pub fn preview(rows: &[Row]) -> Preview {
    let first = match rows.first() {
        Some(first) => first,
        None => return Preview::NoData,
    };

    let columns: Vec<String> = first.keys().cloned().collect();
    let body = rows
        .iter()
        .take(PREVIEW_ROW_LIMIT)
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map(format_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Preview::Table(PreviewTable {
        columns,
        rows: body,
    })
}

pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl ResultSummary {
    pub fn total_length_label(&self) -> String {
        format_length(self.total_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_from(value: serde_json::Value) -> ProcessedResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summary_from_payload() {
        let result = result_from(json!({
            "rows": [{"a": 1}],
            "materialTypes": 1,
            "maxCuttingId": 2,
            "totalLength": 150.5
        }));

        let summary = summarize(&result);
        assert_eq!(summary.total_rows, 1);
        assert_eq!(summary.material_types, 1);
        assert_eq!(summary.cutting_groups, 2);
        assert_eq!(summary.total_length_label(), "150.5mm");
    }

    #[test]
    fn test_preview_is_bounded() {
        let rows: Vec<serde_json::Value> = (0..15).map(|i| json!({"id": i})).collect();
        let result = result_from(json!({ "rows": rows }));

        let rendered = render(&result);
        assert_eq!(rendered.summary.total_rows, 15);
        match rendered.preview {
            Preview::Table(table) => {
                assert_eq!(table.rows.len(), PREVIEW_ROW_LIMIT);
                assert_eq!(table.rows[9], vec!["9".to_string()]);
            }
            Preview::NoData => panic!("expected a table"),
        }
    }

    #[test]
    fn test_empty_rows_render_placeholder_and_zeroes() {
        let rendered = render(&result_from(json!({"rows": []})));

        assert_eq!(rendered.preview, Preview::NoData);
        assert_eq!(rendered.summary.total_rows, 0);
        assert_eq!(rendered.summary.material_types, 0);
        assert_eq!(rendered.summary.cutting_groups, 0);
        assert_eq!(rendered.summary.total_length, 0.0);
        assert_eq!(rendered.summary.total_length_label(), "0.0mm");
    }

    #[test]
    fn test_columns_follow_first_row() {
        let result = result_from(json!({
            "rows": [
                {"Material": "HMST82-01", "Length": 1200, "Cutting ID": 1},
                {"Length": 900.5, "Extra": true},
                {"Material": null, "Length": 300, "Cutting ID": 2}
            ]
        }));

        match preview(&result.rows) {
            Preview::Table(table) => {
                assert_eq!(table.columns, vec!["Material", "Length", "Cutting ID"]);
                assert_eq!(table.rows[0], vec!["HMST82-01", "1200", "1"]);
                assert_eq!(table.rows[1], vec!["", "900.5", ""]);
                assert_eq!(table.rows[2], vec!["", "300", "2"]);
            }
            Preview::NoData => panic!("expected a table"),
        }
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&json!(null)), "");
        assert_eq!(format_cell(&json!("text")), "text");
        assert_eq!(format_cell(&json!(false)), "false");
        assert_eq!(format_cell(&json!(2.5)), "2.5");
    }
}
