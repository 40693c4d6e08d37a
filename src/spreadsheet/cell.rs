use crate::database::table::Value;
use crate::spreadsheet::reference::index_to_reference;
use std::fmt::Display;

/// Renders a value as the text entered into a spreadsheet cell.
///
/// Nulls become empty text and floats keep their round-trippable form. Text starting
/// with an apostrophe, or with `=` when formulas are not allowed, is prefixed with an
/// apostrophe so the spreadsheet stores it literally.
pub fn serialize(value: &Value, allow_formulas: bool) -> String {
    let text = value.to_string();
    if text.starts_with('\'') || (!allow_formulas && text.starts_with('=')) {
        format!("'{text}")
    } else {
        text
    }
}

/// A single cell write: 1-based position and the entered text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellUpdate {
    /// Row number (1-based)
    pub row: usize,
    /// Column number (1-based)
    pub col: usize,
    /// Text entered into the cell
    pub value: String,
}

impl CellUpdate {
    /// Returns the A1-style cell reference (e.g., "A1", "B2").
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }
}

impl Display for CellUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={:?}", self.reference(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_null_is_empty() {
        assert_eq!(serialize(&Value::Null, true), "");
        assert_eq!(serialize(&Value::Null, false), "");
        assert_eq!(serialize(&Value::Float(f64::NAN), false), "");
    }

    #[test]
    fn serialize_float_round_trips() {
        assert_eq!(serialize(&Value::Float(1.0), true), "1.0");
        assert_eq!(serialize(&Value::Float(0.1), true), "0.1");
        assert_eq!(serialize(&Value::Float(-2.5), true), "-2.5");
        assert_eq!(serialize(&Value::Float(1e20), true).parse::<f64>().unwrap(), 1e20);
    }

    #[test]
    fn serialize_natural_forms() {
        assert_eq!(serialize(&Value::Int(7), true), "7");
        assert_eq!(serialize(&Value::Bool(false), true), "false");
        assert_eq!(serialize(&Value::from("plain"), true), "plain");
    }

    #[test]
    fn serialize_escapes_formulas_only_when_disallowed() {
        let formula = Value::from("=SUM(A1:A3)");
        assert_eq!(serialize(&formula, true), "=SUM(A1:A3)");
        assert_eq!(serialize(&formula, false), "'=SUM(A1:A3)");
    }

    #[test]
    fn serialize_always_escapes_leading_apostrophe() {
        assert_eq!(serialize(&Value::from("'quoted"), true), "''quoted");
        assert_eq!(serialize(&Value::from("'quoted"), false), "''quoted");
    }

    #[test]
    fn cell_update_reference() {
        let update = CellUpdate { row: 2, col: 28, value: "x".to_owned() };
        assert_eq!(update.reference(), "AB2");
        assert_eq!(update.to_string(), "AB2=\"x\"");
    }
}
