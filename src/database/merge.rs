//! Merge strategies that reconcile an incoming table with the existing contents of a tab.

use crate::database::column::{check_subset, union, ColumnError};
use crate::database::table::{Key, Table, Value};
use log::info;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use thiserror::Error;

/// Errors raised while merging tables.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Unsupported Type: {0} ")]
    UnsupportedType(String),

    #[error("You need a Primary_Key to do {0}")]
    MissingPrimaryKey(Strategy),

    #[error("Primary_Key '{key}' is not a column of the existing tab {columns:?}")]
    UnknownPrimaryKey { key: String, columns: Vec<String> },

    #[error("{0}")]
    ColumnError(#[from] ColumnError),
}

/// How an incoming table is combined with the existing one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Replace the existing contents entirely
    Overwrite,
    /// Existing rows followed by every incoming row
    AppendAll,
    /// Existing rows followed by incoming rows with a new primary key
    AppendUniques,
    /// Incoming and existing rows deduplicated by primary key, existing values winning
    CombineUniques,
}

impl Strategy {
    /// Returns the canonical request spelling of the strategy.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::Overwrite => "Overwrite",
            Strategy::AppendAll => "Append_All",
            Strategy::AppendUniques => "Append_Uniques",
            Strategy::CombineUniques => "Combine_Uniques",
        }
    }

    /// Parses a strategy name case-insensitively.
    pub fn parse(name: &str) -> Result<Self, MergeError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "OVERWRITE" => Ok(Strategy::Overwrite),
            "APPEND_ALL" => Ok(Strategy::AppendAll),
            "APPEND_UNIQUES" => Ok(Strategy::AppendUniques),
            "COMBINE_UNIQUES" => Ok(Strategy::CombineUniques),
            _ => Err(MergeError::UnsupportedType(name.to_owned())),
        }
    }

    /// Returns true if the strategy compares rows by primary key.
    pub const fn needs_primary_key(&self) -> bool {
        matches!(self, Strategy::AppendUniques | Strategy::CombineUniques)
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a merge: the table to write and a summary of what happened.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The table changed and should be written back
    Updated { table: Table, message: String },
    /// Nothing to add; the existing table is returned untouched
    Unchanged { table: Table, message: String },
}

impl Outcome {
    pub fn table(&self) -> &Table {
        match self {
            Outcome::Updated { table, .. } | Outcome::Unchanged { table, .. } => table,
        }
    }

    pub fn into_table(self) -> Table {
        match self {
            Outcome::Updated { table, .. } | Outcome::Unchanged { table, .. } => table,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Updated { message, .. } | Outcome::Unchanged { message, .. } => message,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Outcome::Unchanged { .. })
    }
}

/// Merges `incoming` into `existing` with the given strategy.
///
/// Non-overwrite strategies require the incoming columns to be a subset of the
/// existing ones, and the uniques strategies require a primary key that names an
/// existing column. Neither input is modified.
pub fn merge(
    strategy: Strategy,
    incoming: &Table,
    existing: &Table,
    primary_key: Option<&str>,
) -> Result<Outcome, MergeError> {
    if strategy == Strategy::Overwrite {
        return Ok(overwrite(incoming));
    }
    check_subset(incoming.columns(), existing.columns())?;

    match strategy {
        Strategy::Overwrite => Ok(overwrite(incoming)),
        Strategy::AppendAll => Ok(append_all(incoming, existing)),
        Strategy::AppendUniques => {
            let key = require_key(strategy, existing, primary_key)?;
            Ok(append_uniques(incoming, existing, key))
        }
        Strategy::CombineUniques => {
            let key = require_key(strategy, existing, primary_key)?;
            Ok(combine_uniques(incoming, existing, key))
        }
    }
}

fn require_key<'a>(strategy: Strategy, existing: &Table, primary_key: Option<&'a str>) -> Result<&'a str, MergeError> {
    let key = primary_key.ok_or(MergeError::MissingPrimaryKey(strategy))?;
    if existing.column_index(key).is_none() {
        Err(MergeError::UnknownPrimaryKey {
            key: key.to_owned(),
            columns: existing.columns().to_vec(),
        })?;
    }
    Ok(key)
}

fn overwrite(incoming: &Table) -> Outcome {
    info!("~ Overwriting with {} rows. ~", incoming.row_count());
    Outcome::Updated {
        table: incoming.to_owned(),
        message: "Overwritten successfully.".to_owned(),
    }
}

fn append_all(incoming: &Table, existing: &Table) -> Outcome {
    let columns = union(existing.columns(), incoming.columns());
    let rows = (0..existing.row_count())
        .map(|row| existing.row_as(row, &columns))
        .chain((0..incoming.row_count()).map(|row| incoming.row_as(row, &columns)))
        .collect();

    let message = format!("Matching columns. {} new rows added.", incoming.row_count());
    info!("~ {message} ~");
    Outcome::Updated {
        table: Table::from_parts(columns, rows),
        message,
    }
}

/// Uniqueness is decided by the primary key alone, not by whole-row equality.
fn append_uniques(incoming: &Table, existing: &Table, key: &str) -> Outcome {
    let columns = union(existing.columns(), incoming.columns());
    let known: HashSet<Key> = existing
        .column(key)
        .map(|values| values.map(Value::key).collect())
        .unwrap_or_default();

    let net_new = (0..incoming.row_count())
        .map(|row| incoming.row_as(row, &columns))
        .filter(|row| !known.contains(&key_of(row, &columns, key)))
        .collect();
    let net_new = deduplicate(net_new, &columns, key);

    if net_new.is_empty() {
        let message = "Matching columns. No unique rows to add.".to_owned();
        info!("~ {message} ~");
        return Outcome::Unchanged {
            table: existing.to_owned(),
            message,
        };
    }

    let message = format!("Matching columns. {} Unique rows added.", net_new.len());
    info!("~ {message} ~");
    let rows = (0..existing.row_count())
        .map(|row| existing.row_as(row, &columns))
        .chain(net_new)
        .collect();
    Outcome::Updated {
        table: Table::from_parts(columns, rows),
        message,
    }
}

/// Existing rows are concatenated after incoming ones, so on a key collision the
/// existing values are the last occurrence and win.
fn combine_uniques(incoming: &Table, existing: &Table, key: &str) -> Outcome {
    let columns = union(incoming.columns(), existing.columns());
    let rows = (0..incoming.row_count())
        .map(|row| incoming.row_as(row, &columns))
        .chain((0..existing.row_count()).map(|row| existing.row_as(row, &columns)))
        .collect();
    let rows = deduplicate(rows, &columns, key);

    let message = "Matching columns. Existing sheet deduplicated and unique rows added.".to_owned();
    info!("~ {message} ~");
    Outcome::Updated {
        table: Table::from_parts(columns, rows),
        message,
    }
}

fn key_of(row: &[Value], columns: &[String], key: &str) -> Key {
    columns
        .iter()
        .position(|column| column == key)
        .map(|col| row[col].key())
        .unwrap_or(Key::Null)
}

/// Collapses rows sharing a primary key. Each kept row stays at the position of its
/// key's first occurrence and carries the values of its key's last occurrence.
fn deduplicate(rows: Vec<Vec<Value>>, columns: &[String], key: &str) -> Vec<Vec<Value>> {
    let mut slots: HashMap<Key, usize> = HashMap::new();
    let mut kept: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
    for row in rows {
        let identity = key_of(&row, columns, key);
        match slots.get(&identity) {
            Some(&slot) => kept[slot] = row,
            None => {
                slots.insert(identity, kept.len());
                kept.push(row);
            }
        }
    }
    kept
}
