//! Conversion between JSON row lists (one object per row, keyed by column name)
//! and [`Table`] values.

use crate::database::table::{Table, Value, ValueError};
use serde_json::Value as Json;
use thiserror::Error;

/// One row keyed by column name, in column order.
pub type Record = serde_json::Map<String, Json>;

/// Errors raised while decoding JSON rows.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Expected a list of rows but found {0}")]
    NotAList(&'static str),

    #[error("Row {0} is not a mapping of column names to values")]
    NotAMapping(usize),

    #[error("{0}")]
    ValueError(#[from] ValueError),
}

/// Converts a JSON scalar to a cell value. Arrays and objects keep their JSON text.
pub fn from_json(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(value) => Value::Bool(*value),
        Json::Number(number) => number
            .as_i64()
            .map(Value::Int)
            .or_else(|| number.as_f64().map(Value::Float))
            .unwrap_or_default(),
        Json::String(text) => Value::Str(text.to_owned()),
        Json::Array(_) | Json::Object(_) => Value::Str(value.to_string()),
    }
}

/// Converts a cell value to JSON. NaN becomes null.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(value) => Json::Bool(*value),
        Value::Int(value) => Json::from(*value),
        Value::Float(value) => serde_json::Number::from_f64(*value)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Str(text) => Json::String(text.to_owned()),
    }
}

/// Builds a table from records. Columns appear in order of first appearance across
/// all records; a key missing from a record reads as null.
pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<Table, BridgeError> {
    let records: Vec<&Record> = records.into_iter().collect();
    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for name in record.keys() {
            if !columns.contains(name) {
                columns.push(name.to_owned());
            }
        }
    }
    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|name| record.get(name).map(from_json).unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(Table::from_rows(columns, rows)?)
}

/// Decodes a JSON array of objects into a table.
pub fn from_json_rows(value: &Json) -> Result<Table, BridgeError> {
    let rows = match value {
        Json::Array(rows) => rows,
        Json::Null => return Err(BridgeError::NotAList("null")),
        Json::Bool(_) => return Err(BridgeError::NotAList("a boolean")),
        Json::Number(_) => return Err(BridgeError::NotAList("a number")),
        Json::String(_) => return Err(BridgeError::NotAList("a string")),
        Json::Object(_) => return Err(BridgeError::NotAList("a mapping")),
    };
    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| row.as_object().ok_or(BridgeError::NotAMapping(index)))
        .collect::<Result<Vec<_>, _>>()?;
    from_records(records)
}

/// Encodes a table as one record per row.
pub fn to_records(table: &Table) -> Vec<Record> {
    table
        .rows()
        .iter()
        .map(|row| {
            table
                .columns()
                .iter()
                .zip(row)
                .map(|(name, value)| (name.to_owned(), to_json(value)))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(from_json(&json!(null)), Value::Null);
        assert_eq!(from_json(&json!(3)), Value::Int(3));
        assert_eq!(from_json(&json!(2.5)), Value::Float(2.5));
        assert_eq!(from_json(&json!(true)), Value::Bool(true));
        assert_eq!(from_json(&json!("x")), Value::from("x"));
        assert_eq!(from_json(&json!([1, 2])), Value::from("[1,2]"));
    }

    #[test]
    fn test_rows_union_columns_in_first_appearance_order() {
        let table = from_json_rows(&json!([
            {"b": 1, "a": "x"},
            {"a": "y", "c": null},
        ]))
        .unwrap();

        assert_eq!(table.columns(), &["b".to_owned(), "a".to_owned(), "c".to_owned()]);
        assert_eq!(table.rows()[0], vec![Value::Int(1), Value::from("x"), Value::Null]);
        assert_eq!(table.rows()[1], vec![Value::Null, Value::from("y"), Value::Null]);
    }

    #[test]
    fn test_rows_rejects_bad_shapes() {
        assert!(matches!(from_json_rows(&json!({"a": 1})), Err(BridgeError::NotAList("a mapping"))));
        assert!(matches!(from_json_rows(&json!([{"a": 1}, 2])), Err(BridgeError::NotAMapping(1))));
    }

    #[test]
    fn test_empty_rows() {
        let table = from_json_rows(&json!([])).unwrap();
        assert!(table.is_empty());
        assert!(to_records(&table).is_empty());
    }

    #[test]
    fn test_to_records() {
        let table = Table::from_rows(
            ["id", "score"],
            vec![vec![Value::Int(1), Value::Float(f64::NAN)]],
        )
        .unwrap();
        let records = to_records(&table);
        assert_eq!(Json::Object(records[0].clone()), json!({"id": 1, "score": null}));
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["id", "score"]);
    }
}
