//! Caller-supplied column renames of unknown direction.
//!
//! Callers send either `{physical_name: logical_name}` or `{logical_name: physical_name}`. The
//! resolver first reads the mapping as `key -> value`; only if no key names an existing column
//! does it read it as `value -> key`. When both readings match, the forward one wins.

use std::collections::HashSet;

use polars::prelude::{DataFrame, PolarsResult};
use serde_json::Value as JsonValue;

use crate::error::MappingError;
use crate::types::{column_labels, unique_label};

/// Ordered list of `(a, b)` pairs from the mapping parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    entries: Vec<(String, String)>,
}

impl ColumnMapping {
    /// Create a mapping from pairs, keeping their order.
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Parse the JSON object sent as the `mapping` request parameter.
    ///
    /// Keys keep the caller's order. String values are taken as-is; any other JSON value is
    /// converted to its JSON text (`1`, `true`, `null`).
    pub fn from_json_str(raw: &str) -> Result<Self, MappingError> {
        match serde_json::from_str::<JsonValue>(raw)? {
            JsonValue::Object(map) => Ok(Self::new(
                map.into_iter()
                    .map(|(k, v)| {
                        let v = match v {
                            JsonValue::String(s) => s,
                            other => other.to_string(),
                        };
                        (k, v)
                    })
                    .collect(),
            )),
            other => Err(MappingError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    /// The `(a, b)` pairs in caller order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Returns true if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ColumnMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Which reading of the mapping matched the columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingDirection {
    /// Entries read as `key -> value`.
    Forward,
    /// Entries read as `value -> key`.
    Reversed,
}

/// Renames to apply, all taken from one reading of the mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    /// The reading that produced the renames.
    pub direction: MappingDirection,
    /// `(existing_label, new_label)` pairs, one per existing label.
    pub renames: Vec<(String, String)>,
}

impl RenamePlan {
    /// New label for `label`, if the plan renames it.
    pub fn target_of(&self, label: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(src, _)| src == label)
            .map(|(_, dst)| dst.as_str())
    }
}

/// Decide which renames `mapping` asks for against the column `labels`.
///
/// Returns `None` when the mapping is empty or neither reading names an existing column. Entries
/// whose source is not a column are dropped. If several entries rename the same column, the last
/// one wins.
pub fn resolve_mapping(labels: &[String], mapping: &ColumnMapping) -> Option<RenamePlan> {
    let forward = collect_renames(labels, mapping.entries().iter().map(|(a, b)| (a, b)));
    if !forward.is_empty() {
        return Some(RenamePlan {
            direction: MappingDirection::Forward,
            renames: forward,
        });
    }

    let reversed = collect_renames(labels, mapping.entries().iter().map(|(a, b)| (b, a)));
    if !reversed.is_empty() {
        return Some(RenamePlan {
            direction: MappingDirection::Reversed,
            renames: reversed,
        });
    }

    None
}

fn collect_renames<'a, I>(labels: &[String], pairs: I) -> Vec<(String, String)>
where
    I: Iterator<Item = (&'a String, &'a String)>,
{
    let mut renames: Vec<(String, String)> = Vec::new();
    for (src, dst) in pairs.filter(|(src, _)| labels.contains(src)) {
        match renames.iter_mut().find(|(existing, _)| existing == src) {
            Some(entry) => entry.1 = dst.clone(),
            None => renames.push((src.clone(), dst.clone())),
        }
    }
    renames
}

/// Returns `df` with the renames resolved from `mapping` applied.
///
/// All renames apply at once, so a mapping can swap two labels. Columns the plan leaves alone
/// keep their labels; a renamed column whose target is already taken gets a `.1`, `.2`, ...
/// suffix instead.
pub fn apply_mapping(mut df: DataFrame, mapping: &ColumnMapping) -> PolarsResult<DataFrame> {
    let labels = column_labels(&df);
    let Some(plan) = resolve_mapping(&labels, mapping) else {
        if !mapping.is_empty() {
            tracing::debug!(entries = mapping.entries().len(), "mapping matched no columns");
        }
        return Ok(df);
    };

    tracing::debug!(direction = ?plan.direction, renames = ?plan.renames, "applying column mapping");
    let mut taken: HashSet<String> = labels
        .iter()
        .filter(|label| plan.target_of(label).is_none())
        .cloned()
        .collect();
    let relabeled: Vec<String> = labels
        .iter()
        .map(|label| match plan.target_of(label) {
            Some(target) => {
                let label = unique_label(target, &taken);
                taken.insert(label.clone());
                label
            }
            None => label.clone(),
        })
        .collect();
    df.set_column_names(&relabeled)?;
    Ok(df)
}
