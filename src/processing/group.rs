//! Similarity grouping of loaded tables.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::DataSet;

/// A loaded table together with the logical name of the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable {
    pub name: String,
    pub table: DataSet,
}

impl NamedTable {
    pub fn new(name: impl Into<String>, table: DataSet) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// Tables that end up under one key of the result mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityGroup {
    /// Unique key (`name`, `name#2`, `name#3`, ...).
    pub name: String,
    /// Member tables in discovery order.
    pub tables: Vec<DataSet>,
}

// Numeric and timestamp suffixes used by exports that split one dataset across files.
static SIMILAR_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[_\- ]?(?:\d{4}-\d{2}-\d{2}(?:[ T_]\d{2}[:\-]\d{2}[:\-]\d{2})?|\d+))+$")
        .expect("static regex is valid")
});

/// The logical name under which a file is grouped when joining similar files.
///
/// Trailing counters and timestamps are stripped: `orders1`, `orders_2`, `orders_2024-01-31`,
/// `orders_2024-01-31 10:00:00` and `orders_20240131100000` all become `orders`. A name that
/// consists only of such a suffix is kept unchanged.
pub fn similar_name(name: &str) -> String {
    let stripped = SIMILAR_SUFFIX.replace(name, "");
    if stripped.is_empty() {
        name.to_string()
    } else {
        stripped.into_owned()
    }
}

/// Partition `entries` into similarity groups.
///
/// Groups are returned in creation order. When `join_similar` is true, each entry joins the
/// first existing group with the same [`similar_name`] whose accumulated column set is equal
/// to, a subset of, or a superset of the entry's column set; otherwise it starts a new group.
/// When `join_similar` is false every entry is its own group under its original name.
///
/// The assignment is greedy and depends on the order of `entries`. Keys are made unique by
/// appending `#2`, `#3`, ... (skipping any key already in use).
pub fn group(entries: Vec<NamedTable>, join_similar: bool) -> Vec<SimilarityGroup> {
    let mut groups: Vec<SimilarityGroup> = Vec::new();
    let mut columns: Vec<HashSet<String>> = Vec::new();
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();

    for entry in entries {
        let base = if join_similar {
            similar_name(&entry.name)
        } else {
            entry.name
        };
        let cols: HashSet<String> = entry.table.schema.field_names().map(str::to_string).collect();

        if join_similar {
            let candidates = by_name.get(&base).map(Vec::as_slice).unwrap_or_default();
            if let Some(&gi) = candidates.iter().find(|&&gi| compatible(&columns[gi], &cols)) {
                columns[gi].extend(cols);
                groups[gi].tables.push(entry.table);
                continue;
            }
        }

        let key = unique_key(&base, &taken);
        taken.insert(key.clone());
        by_name.entry(base).or_default().push(groups.len());
        columns.push(cols);
        groups.push(SimilarityGroup {
            name: key,
            tables: vec![entry.table],
        });
    }

    groups
}

fn compatible(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    a.is_subset(b) || b.is_subset(a)
}

fn unique_key(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}#{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
