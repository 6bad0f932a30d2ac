use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::error::{IngestionError, IngestionResult};

use super::header_labels;

/// How to choose the sheet when ingesting a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExcelSheetSelection {
    /// Ingest the first sheet (default).
    #[default]
    First,
    /// Ingest a single named sheet.
    Sheet(String),
}

/// Options for decoding a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelOptions {
    /// Which sheet to read.
    pub sheet: ExcelSheetSelection,
    /// 1-based sheet row holding the column labels. Rows above it are skipped.
    pub header_row: usize,
}

impl Default for ExcelOptions {
    fn default() -> Self {
        Self {
            sheet: ExcelSheetSelection::First,
            header_row: 1,
        }
    }
}

/// Ingest an uploaded workbook (`.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`) into a [`DataFrame`].
///
/// Behavior:
/// - Picks the selected sheet, or the first sheet in the workbook
/// - Skips `header_row - 1` sheet rows and uses the next one as the header row
/// - Builds one typed column per header cell from the cells below it
/// - An empty sheet read from its first row is an empty frame
pub fn ingest_excel_from_bytes(bytes: &[u8], options: &ExcelOptions) -> IngestionResult<DataFrame> {
    if options.header_row == 0 {
        return Err(IngestionError::InvalidLayout {
            message: "header row is 1-based and must be at least 1".to_string(),
        });
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names();

    let sheet = match &options.sheet {
        ExcelSheetSelection::First => {
            sheet_names
                .first()
                .cloned()
                .ok_or_else(|| IngestionError::InvalidLayout {
                    message: "workbook has no sheets".to_string(),
                })?
        }
        ExcelSheetSelection::Sheet(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(IngestionError::InvalidLayout {
                    message: format!("sheet '{name}' not found. sheets={sheet_names:?}"),
                });
            }
            name.clone()
        }
    };

    let range = workbook.worksheet_range(&sheet)?;
    ingest_sheet_range(&sheet, &range, options.header_row)
}

fn ingest_sheet_range(sheet: &str, range: &Range<Data>, header_row: usize) -> IngestionResult<DataFrame> {
    // The range only covers the used area; keep row offsets relative to the sheet itself.
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let rows: Vec<&[Data]> = range.rows().collect();
    let end = first_row + rows.len();

    if rows.is_empty() && header_row == 1 {
        return Ok(DataFrame::empty());
    }

    let header_idx = header_row - 1;
    if header_idx >= end {
        return Err(IngestionError::InvalidLayout {
            message: format!("sheet '{sheet}' has {end} rows, header row {header_row} is past the end"),
        });
    }

    let width = range.width();
    let header_cells = row_at(&rows, first_row, header_idx);
    let labels = header_labels(
        (0..width)
            .map(|c| header_cells.get(c).map(cell_text).unwrap_or_default())
            .collect(),
    );

    let body: Vec<&[Data]> = (header_idx + 1..end).map(|idx| row_at(&rows, first_row, idx)).collect();
    let columns = labels
        .iter()
        .enumerate()
        .map(|(c, label)| {
            let cells: Vec<&Data> = body.iter().map(|row| row.get(c).unwrap_or(&Data::Empty)).collect();
            cells_to_series(label, &cells)
        })
        .collect::<PolarsResult<Vec<Series>>>()?;
    Ok(DataFrame::new_infer_height(columns.into_iter().map(Column::from).collect())
        .expect("could not create DataFrame from iterator"))
}

/// Sheet row `idx`, or an empty row when it lies outside the used range.
fn row_at<'a>(rows: &[&'a [Data]], first_row: usize, idx: usize) -> &'a [Data] {
    idx.checked_sub(first_row)
        .and_then(|i| rows.get(i).copied())
        .unwrap_or(&[])
}

/// Storage kind of a workbook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Empty,
    Int,
    Float,
    Bool,
    DateTime,
    Text,
}

impl CellKind {
    fn of(c: &Data) -> Self {
        match c {
            Data::Empty => Self::Empty,
            Data::String(s) if s.is_empty() => Self::Empty,
            Data::Int(_) => Self::Int,
            Data::Float(f) if is_integral(*f) => Self::Int,
            Data::Float(_) => Self::Float,
            Data::Bool(_) => Self::Bool,
            Data::DateTime(_) | Data::DateTimeIso(_) if cell_datetime(c).is_some() => Self::DateTime,
            _ => Self::Text,
        }
    }

    /// Kind of a column holding cells of both kinds.
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Empty, k) | (k, Self::Empty) => k,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Self::Float,
            _ => Self::Text,
        }
    }
}

/// Build a typed column from the cells under one header cell.
///
/// Whole numbers are `i64`, other numbers `f64`, date cells `datetime[ns]`; a column mixing
/// kinds holds each cell's text.
fn cells_to_series(name: &str, cells: &[&Data]) -> PolarsResult<Series> {
    let name = PlSmallStr::from(name);
    let kind = cells
        .iter()
        .map(|c| CellKind::of(c))
        .fold(CellKind::Empty, CellKind::merge);

    let series = match kind {
        CellKind::Empty => Series::full_null(name, cells.len(), &DataType::String),
        CellKind::Int => Series::new(name, cells.iter().map(|c| cell_i64(c)).collect::<Vec<_>>()),
        CellKind::Float => Series::new(name, cells.iter().map(|c| cell_f64(c)).collect::<Vec<_>>()),
        CellKind::Bool => Series::new(name, cells.iter().map(|c| cell_bool(c)).collect::<Vec<_>>()),
        CellKind::DateTime => {
            let nanos: Vec<Option<i64>> = cells
                .iter()
                .map(|c| cell_datetime(c).and_then(|ts| ts.and_utc().timestamp_nanos_opt()))
                .collect();
            Series::new(name, nanos).cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))?
        }
        CellKind::Text => Series::new(
            name,
            cells
                .iter()
                .map(|c| match CellKind::of(c) {
                    CellKind::Empty => None,
                    _ => Some(cell_text(c)),
                })
                .collect::<Vec<_>>(),
        ),
    };
    Ok(series)
}

fn cell_i64(c: &Data) -> Option<i64> {
    match c {
        Data::Int(i) => Some(*i),
        Data::Float(f) if is_integral(*f) => Some(*f as i64),
        _ => None,
    }
}

fn cell_f64(c: &Data) -> Option<f64> {
    match c {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

fn cell_bool(c: &Data) -> Option<bool> {
    match c {
        Data::Bool(b) => Some(*b),
        _ => None,
    }
}

fn cell_datetime(c: &Data) -> Option<NaiveDateTime> {
    match c {
        Data::DateTime(dt) if dt.is_datetime() => dt.as_datetime(),
        Data::DateTimeIso(s) => parse_iso_datetime(s),
        _ => None,
    }
}

/// Display text of a cell, used for header labels and mixed columns.
fn cell_text(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if is_integral(*f) => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(_) => match cell_datetime(c) {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => c.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn is_integral(f: f64) -> bool {
    // Beyond 2^53 floats stop representing every integer.
    f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(cells: &[Data]) -> Series {
        let refs: Vec<&Data> = cells.iter().collect();
        cells_to_series("c", &refs).unwrap()
    }

    #[test]
    fn whole_floats_make_an_integer_column() {
        let s = series(&[Data::Float(2.0), Data::Int(3), Data::Empty]);
        assert_eq!(s.dtype(), &DataType::Int64);
        assert_eq!(s.null_count(), 1);
    }

    #[test]
    fn fractional_floats_widen_the_column() {
        let s = series(&[Data::Float(2.0), Data::Float(2.5)]);
        assert_eq!(s.dtype(), &DataType::Float64);
        assert_eq!(series(&[Data::Float(1e300)]).dtype(), &DataType::Float64);
    }

    #[test]
    fn empty_cells_are_null() {
        let s = series(&[Data::Empty, Data::String(String::new())]);
        assert_eq!(s.null_count(), 2);
    }

    #[test]
    fn mixed_cells_keep_their_text() {
        let s = series(&[Data::Float(1.5), Data::String("n/a".to_string()), Data::Bool(true)]);
        assert_eq!(s.dtype(), &DataType::String);
        let values: Vec<Option<&str>> = s.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("1.5"), Some("n/a"), Some("True")]);
    }

    #[test]
    fn iso_datetimes_are_parsed() {
        let s = series(&[
            Data::DateTimeIso("2024-03-01T12:30:00".to_string()),
            Data::DateTimeIso("2024-03-02".to_string()),
        ]);
        assert_eq!(s.dtype(), &DataType::Datetime(TimeUnit::Nanoseconds, None));
        assert_eq!(s.null_count(), 0);
    }

    #[test]
    fn header_text_follows_scalar_text() {
        assert_eq!(cell_text(&Data::Float(2024.0)), "2024");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Bool(true)), "True");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
