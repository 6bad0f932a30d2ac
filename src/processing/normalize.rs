//! Column label normalization.

use polars::prelude::{DataFrame, PolarsResult};

use crate::types::{column_labels, relabel_columns};

/// Canonical form of a column label: trimmed, lowercased, spaces replaced by underscores.
///
/// Only the space character is replaced; tabs and other whitespace inside the label are kept.
pub fn normalize_column_name(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Returns `df` with every column label normalized.
///
/// Labels that collide after normalization (e.g. `"Wert"` and `"wert "`) stay unique: the later
/// column gets a `.1` suffix.
pub fn normalize_columns(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let labels = column_labels(&df)
        .iter()
        .map(|label| normalize_column_name(label))
        .collect();
    relabel_columns(&mut df, labels)?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn trims_lowercases_and_underscores() {
        assert_eq!(normalize_column_name("  Messung Nr 1 "), "messung_nr_1");
        assert_eq!(normalize_column_name("Zeit"), "zeit");
        assert_eq!(normalize_column_name("Unnamed: 2"), "unnamed:_2");
        assert_eq!(normalize_column_name(""), "");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_column_name(" A  B ");
        assert_eq!(once, "a__b");
        assert_eq!(normalize_column_name(&once), once);
    }

    #[test]
    fn renames_every_column_and_keeps_types() {
        let df = df!("Zeit" => [1i64, 2], " Wert " => [3.5f64, 4.1]).unwrap();
        let out = normalize_columns(df).unwrap();
        assert_eq!(column_labels(&out), vec!["zeit", "wert"]);
        assert_eq!(out.column("wert").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn collisions_after_normalizing_are_suffixed() {
        let df = df!("Wert" => [1i64], "wert " => [2i64]).unwrap();
        let out = normalize_columns(df).unwrap();
        assert_eq!(column_labels(&out), vec!["wert", "wert.1"]);
    }

    #[test]
    fn empty_frame_is_fine() {
        let out = normalize_columns(DataFrame::empty()).unwrap();
        assert_eq!(out.width(), 0);
    }
}
