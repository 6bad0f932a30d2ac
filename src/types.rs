//! Column labels and dtype names of the decoded table.
//!
//! Uploads are decoded into a [`polars::prelude::DataFrame`]. Column types are inferred once by
//! the readers and carried unchanged through processing; the dtype names reported to callers are
//! the engine's own (`i64`, `f64`, `str`, `bool`, `datetime[ns]`, ...).

use std::collections::HashSet;

use polars::prelude::{DataFrame, DataType, PolarsResult};

/// Engine name of a column type, as reported in the `dtypes` map.
pub fn dtype_name(data_type: &DataType) -> String {
    data_type.to_string()
}

/// Column labels of `df` in order.
pub fn column_labels(df: &DataFrame) -> Vec<String> {
    df.get_column_names().into_iter().map(|name| name.to_string()).collect()
}

/// Replace every column label of `df`, keeping order and types.
///
/// Labels that collide are made unique with [`mangle_duplicate_names`] first.
pub fn relabel_columns(df: &mut DataFrame, labels: Vec<String>) -> PolarsResult<()> {
    df.set_column_names(&mangle_duplicate_names(labels))
}

/// Make labels unique: the first occurrence keeps its name, later ones get `.1`, `.2`, ...
/// (skipping suffixes that are already taken).
pub fn mangle_duplicate_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .map(|name| {
            let candidate = unique_label(&name, &seen);
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// `name`, or the first of `name.1`, `name.2`, ... not in `taken`.
pub fn unique_label(name: &str, taken: &HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let mut n = 0;
    while taken.contains(&candidate) {
        n += 1;
        candidate = format!("{name}.{n}");
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn dtype_names_come_from_the_engine() {
        assert_eq!(dtype_name(&DataType::Int64), "i64");
        assert_eq!(dtype_name(&DataType::Float64), "f64");
        assert_eq!(dtype_name(&DataType::String), "str");
        assert_eq!(dtype_name(&DataType::Boolean), "bool");
        assert_eq!(
            dtype_name(&DataType::Datetime(TimeUnit::Nanoseconds, None)),
            "datetime[ns]"
        );
    }

    #[test]
    fn mangle_keeps_first_and_suffixes_repeats() {
        assert_eq!(
            mangle_duplicate_names(owned(&["a", "b", "a", "a"])),
            vec!["a", "b", "a.1", "a.2"]
        );
    }

    #[test]
    fn mangle_skips_taken_suffixes() {
        assert_eq!(
            mangle_duplicate_names(owned(&["a", "a.1", "a"])),
            vec!["a", "a.1", "a.2"]
        );
    }

    #[test]
    fn relabel_keeps_types_and_dedupes() {
        let mut df = df!("A" => [1i64, 2], "a" => ["x", "y"]).unwrap();
        relabel_columns(&mut df, owned(&["a", "a"])).unwrap();
        assert_eq!(column_labels(&df), vec!["a", "a.1"]);
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("a.1").unwrap().dtype(), &DataType::String);
    }
}
