use std::collections::HashSet;
use thiserror::Error;

/// Errors related to column layout validation.
#[derive(Error, Debug)]
pub enum ColumnError {
    #[error("The columns of your input data {incoming:?} are not a subset of the columns of the existing tab {existing:?}.")]
    NotSubset { incoming: Vec<String>, existing: Vec<String> },

    #[error("You have duplicate column headers in your GSheet")]
    DuplicateHeaders(Vec<String>),
}

/// Checks that every incoming column also exists among the existing columns.
pub fn check_subset(incoming: &[String], existing: &[String]) -> Result<(), ColumnError> {
    let known: HashSet<&str> = existing.iter().map(String::as_str).collect();
    if incoming.iter().all(|column| known.contains(column.as_str())) {
        Ok(())
    } else {
        Err(ColumnError::NotSubset {
            incoming: incoming.to_vec(),
            existing: existing.to_vec(),
        })
    }
}

/// Fails with the repeated names if a header row contains any name twice.
/// Blank header cells count as a name: two blanks in one header are a duplicate.
pub fn check_unique(header: &[String]) -> Result<(), ColumnError> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in header {
        if !seen.insert(name.as_str()) && !duplicates.contains(name) {
            duplicates.push(name.to_owned());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ColumnError::DuplicateHeaders(duplicates))
    }
}

/// Orders `columns` by their position in `reference`.
/// Names missing from the reference keep their relative order after the referenced ones.
pub fn reorder(columns: &[String], reference: &[String]) -> Vec<String> {
    let present: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let referenced: HashSet<&str> = reference.iter().map(String::as_str).collect();
    reference
        .iter()
        .filter(|name| present.contains(name.as_str()))
        .chain(columns.iter().filter(|name| !referenced.contains(name.as_str())))
        .cloned()
        .collect()
}

/// Appends names from `extra` not yet present in `base`, preserving first appearance.
pub(crate) fn union(base: &[String], extra: &[String]) -> Vec<String> {
    let mut columns = base.to_vec();
    for name in extra {
        if !columns.contains(name) {
            columns.push(name.to_owned());
        }
    }
    columns
}
