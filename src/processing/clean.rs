//! Removal of fully-empty rows.

use polars::prelude::*;

/// Returns `df` without the rows in which every column is null.
///
/// Rows with at least one value are kept unchanged and in their original order. A frame has no
/// row index, so the survivors are simply positions `0..n`.
pub fn drop_empty_rows(df: DataFrame) -> PolarsResult<DataFrame> {
    if df.width() == 0 {
        return Ok(df);
    }
    let keep = df
        .columns()
        .iter()
        .fold(BooleanChunked::full("keep".into(), false, df.height()), |keep, column| {
            &keep | &column.as_materialized_series().is_not_null()
        });
    if keep.all() {
        return Ok(df);
    }
    df.filter(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_only_rows_where_every_cell_is_null() {
        let df = df!(
            "a" => [Some(1.0f64), None, None, Some(f64::NAN), Some(2.0)],
            "b" => [Some("x"), None, Some("y"), None, None],
        )
        .unwrap();

        let out = drop_empty_rows(df).unwrap();
        let expected = df!(
            "a" => [Some(1.0f64), None, Some(f64::NAN), Some(2.0)],
            "b" => [Some("x"), Some("y"), None, None],
        )
        .unwrap();
        assert_eq!(out.shape(), (4, 2));
        let b = |df: &DataFrame| df.column("b").unwrap().as_materialized_series().clone();
        assert!(b(&out).equals_missing(&b(&expected)));
        assert_eq!(out.column("a").unwrap().dtype(), &DataType::Float64);
        assert_eq!(out.column("a").unwrap().null_count(), 1);
    }

    #[test]
    fn keeps_empty_string_cells() {
        let df = df!("a" => [None::<i64>], "b" => [Some("")]).unwrap();
        assert_eq!(drop_empty_rows(df).unwrap().height(), 1);
    }

    #[test]
    fn all_null_frame_becomes_empty() {
        let df = df!("a" => [None::<i64>, None], "b" => [None::<&str>, None]).unwrap();
        let out = drop_empty_rows(df).unwrap();
        assert_eq!(out.shape(), (0, 2));
    }
}
