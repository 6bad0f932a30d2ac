//! CSV ingestion implementation.

use std::borrow::Cow;
use std::io::Cursor;

use encoding_rs::Encoding;
use polars::prelude::*;

use crate::error::{IngestionError, IngestionResult};
use crate::types::relabel_columns;

use super::header_labels;

/// Tokens that read as a missing value in delimited text.
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Options for decoding delimited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter (single byte).
    pub delimiter: u8,
    /// Text encoding label, e.g. `utf-8`, `latin1`, `windows-1252`, `utf-16le`.
    pub encoding: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: "utf-8".to_string(),
        }
    }
}

/// Ingest an uploaded CSV file into a [`DataFrame`].
///
/// Rules:
///
/// - bytes are decoded with `options.encoding` first (a leading BOM is dropped)
/// - the first record is the header row; blank labels become `Unnamed: {i}`, repeats get `.1`
/// - [`MISSING_MARKERS`] read as nulls
/// - column types are inferred by the engine over every row
pub fn ingest_csv_from_bytes(bytes: &[u8], options: &CsvOptions) -> IngestionResult<DataFrame> {
    let text = decode_text(bytes, &options.encoding)?;
    ingest_csv_from_str(&text, options.delimiter)
}

/// Ingest already-decoded CSV text.
pub fn ingest_csv_from_str(text: &str, delimiter: u8) -> IngestionResult<DataFrame> {
    let labels = read_header(text, delimiter)?;

    let null_values = NullValues::AllColumns(MISSING_MARKERS.iter().map(|m| PlSmallStr::from(*m)).collect());
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_null_values(Some(null_values)),
        )
        .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
        .finish()?;

    if df.width() != labels.len() {
        return Err(IngestionError::InvalidLayout {
            message: format!("header has {} fields, decoded {} columns", labels.len(), df.width()),
        });
    }
    relabel_columns(&mut df, labels)?;
    Ok(df)
}

/// Header labels of the first record, made unique.
fn read_header(text: &str, delimiter: u8) -> IngestionResult<Vec<String>> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = match rdr.records().next() {
        Some(record) => record?,
        None => ::csv::StringRecord::new(),
    };
    if header.is_empty() {
        return Err(IngestionError::InvalidLayout {
            message: "no columns to parse from file".to_string(),
        });
    }
    Ok(header_labels(header.iter().map(str::to_owned).collect()))
}

/// Decode `bytes` using a WHATWG encoding label.
///
/// Unknown labels and byte sequences that are malformed for the encoding are errors; nothing is
/// silently replaced.
pub fn decode_text<'a>(bytes: &'a [u8], label: &str) -> IngestionResult<Cow<'a, str>> {
    let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| IngestionError::Encoding {
        message: format!("unknown encoding '{label}'"),
    })?;

    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(IngestionError::Encoding {
            message: format!("input is not valid {}", encoding.name()),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> DataFrame {
        ingest_csv_from_str(text, b',').unwrap()
    }

    #[test]
    fn decode_text_strips_utf8_bom() {
        let text = decode_text(b"\xEF\xBB\xBFa,b", "utf-8").unwrap();
        assert_eq!(text, "a,b");
    }

    #[test]
    fn decode_text_rejects_unknown_labels() {
        let err = decode_text(b"a", "no-such-charset").unwrap_err();
        assert!(err.to_string().contains("unknown encoding"));
    }

    #[test]
    fn decode_text_rejects_invalid_utf8() {
        let err = decode_text(b"caf\xe9", "utf-8").unwrap_err();
        assert!(matches!(err, IngestionError::Encoding { .. }));
    }

    #[test]
    fn decode_text_latin1() {
        assert_eq!(decode_text(b"caf\xe9", "latin1").unwrap(), "café");
    }

    #[test]
    fn missing_markers_are_null() {
        let df = read("a,b\n1,x\nNA,\n#N/A,null\n");
        assert_eq!(df.column("a").unwrap().null_count(), 2);
        assert_eq!(df.column("b").unwrap().null_count(), 2);
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn header_only_columns_are_text() {
        let df = read("name,age\n");
        assert_eq!(df.height(), 0);
        assert_eq!(df.column("name").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn duplicate_headers_are_mangled() {
        let df = read("a,,a\n1,2,3\n");
        assert_eq!(crate::types::column_labels(&df), vec!["a", "Unnamed: 1", "a.1"]);
    }

    #[test]
    fn semicolon_delimiter() {
        let df = ingest_csv_from_str("x;y\n1;2\n", b';').unwrap();
        assert_eq!(df.shape(), (1, 2));
    }
}
