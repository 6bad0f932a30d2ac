//! Projection of a processed [`DataFrame`] into the JSON preview returned to callers.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};

use crate::types::{column_labels, dtype_name};

/// Number of leading rows included in a preview.
pub const PREVIEW_ROWS: usize = 10;

/// Days from 0001-01-01 (day 1 of the common era) to 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Summary of an uploaded table: shape, inferred dtypes and the first rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewReport {
    /// Row count after cleaning.
    pub rows: usize,
    /// Column labels in order.
    pub columns: Vec<String>,
    /// Column label -> dtype name.
    pub dtypes: Map<String, JsonValue>,
    /// Up to [`PREVIEW_ROWS`] rows, each a column label -> scalar object.
    pub preview: Vec<Map<String, JsonValue>>,
    /// Validation diagnostics. Nothing produces any yet.
    pub warnings: Vec<String>,
}

/// Project `df` into a [`PreviewReport`] holding at most `n` preview rows.
pub fn preview(df: &DataFrame, n: usize) -> PolarsResult<PreviewReport> {
    let columns = column_labels(df);

    let dtypes = df
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), JsonValue::String(dtype_name(c.dtype()))))
        .collect();

    let head = df.head(Some(n));
    let series: Vec<&Series> = head.columns().iter().map(|c| c.as_materialized_series()).collect();
    let preview = (0..head.height())
        .map(|row| {
            columns
                .iter()
                .zip(&series)
                .map(|(label, s)| Ok((label.clone(), to_json_scalar(s.get(row)?))))
                .collect::<PolarsResult<Map<String, JsonValue>>>()
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    Ok(PreviewReport {
        rows: df.height(),
        columns,
        dtypes,
        preview,
        warnings: Vec::new(),
    })
}

/// Convert one cell to a plain JSON scalar.
///
/// Missing values and non-finite floats become `null`; dates and date-times become ISO-8601
/// strings. Anything else is sent as its display text.
pub fn to_json_scalar(value: AnyValue<'_>) -> JsonValue {
    match value {
        AnyValue::Null => JsonValue::Null,
        AnyValue::Boolean(v) => JsonValue::Bool(v),
        AnyValue::Int8(v) => v.into(),
        AnyValue::Int16(v) => v.into(),
        AnyValue::Int32(v) => v.into(),
        AnyValue::Int64(v) => v.into(),
        AnyValue::UInt8(v) => v.into(),
        AnyValue::UInt16(v) => v.into(),
        AnyValue::UInt32(v) => v.into(),
        AnyValue::UInt64(v) => v.into(),
        AnyValue::Float32(v) => float(f64::from(v)),
        AnyValue::Float64(v) => float(v),
        AnyValue::String(s) => JsonValue::String(s.to_string()),
        AnyValue::StringOwned(s) => JsonValue::String(s.to_string()),
        AnyValue::Datetime(v, unit, _) => datetime(v, unit).map_or(JsonValue::Null, |ts| {
            JsonValue::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        AnyValue::Date(days) => days
            .checked_add(UNIX_EPOCH_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map_or(JsonValue::Null, |d| JsonValue::String(d.format("%Y-%m-%d").to_string())),
        other => JsonValue::String(other.to_string()),
    }
}

fn float(v: f64) -> JsonValue {
    Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}

fn datetime(v: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let ts = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
    };
    ts.map(|ts| ts.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbers(n: i64) -> DataFrame {
        df!("n" => (0..n).collect::<Vec<i64>>()).unwrap()
    }

    #[test]
    fn preview_is_capped_and_ordered() {
        let report = preview(&numbers(25), PREVIEW_ROWS).unwrap();
        assert_eq!(report.rows, 25);
        assert_eq!(report.preview.len(), 10);
        assert_eq!(report.preview[0]["n"], json!(0));
        assert_eq!(report.preview[9]["n"], json!(9));
    }

    #[test]
    fn preview_shorter_than_cap_has_every_row() {
        let report = preview(&numbers(3), PREVIEW_ROWS).unwrap();
        assert_eq!(report.preview.len(), 3);
    }

    #[test]
    fn empty_frame_previews_as_empty() {
        let report = preview(&DataFrame::empty(), PREVIEW_ROWS).unwrap();
        assert_eq!(report.rows, 0);
        assert!(report.columns.is_empty() && report.dtypes.is_empty() && report.preview.is_empty());
    }

    #[test]
    fn scalars_are_unwrapped() {
        assert_eq!(to_json_scalar(AnyValue::Null), JsonValue::Null);
        assert_eq!(to_json_scalar(AnyValue::Int64(2)), json!(2));
        assert_eq!(to_json_scalar(AnyValue::UInt32(7)), json!(7));
        assert_eq!(to_json_scalar(AnyValue::Float64(4.1)), json!(4.1));
        assert_eq!(to_json_scalar(AnyValue::Float64(f64::NAN)), JsonValue::Null);
        assert_eq!(to_json_scalar(AnyValue::Float64(f64::INFINITY)), JsonValue::Null);
        assert_eq!(to_json_scalar(AnyValue::Boolean(true)), json!(true));
        assert_eq!(to_json_scalar(AnyValue::String("x")), json!("x"));
        assert_eq!(to_json_scalar(AnyValue::Date(19_737)), json!("2024-01-15"));
    }

    #[test]
    fn datetimes_are_iso_strings() {
        // 2024-01-15T08:30:00 UTC
        let secs = 1_705_307_400i64;
        assert_eq!(
            to_json_scalar(AnyValue::Datetime(secs * 1_000_000_000, TimeUnit::Nanoseconds, None)),
            json!("2024-01-15T08:30:00")
        );
        assert_eq!(
            to_json_scalar(AnyValue::Datetime(secs * 1_000 + 250, TimeUnit::Milliseconds, None)),
            json!("2024-01-15T08:30:00.250")
        );
    }

    #[test]
    fn report_serializes_in_column_order() {
        let df = df!("zeit" => [1i64], "wert" => [3.5f64]).unwrap();
        let body = serde_json::to_string(&preview(&df, PREVIEW_ROWS).unwrap()).unwrap();
        assert_eq!(
            body,
            r#"{"rows":1,"columns":["zeit","wert"],"dtypes":{"zeit":"i64","wert":"f64"},"preview":[{"zeit":1,"wert":3.5}],"warnings":[]}"#
        );
    }
}
