//! In-process spreadsheet store.
//!
//! Cells hold the text entered into them. Reading a tab interprets that text the way
//! a spreadsheet displays it: a leading apostrophe marks literal text, numbers and
//! booleans are parsed, and blank cells read as null.

use crate::bridge::{to_json, Record};
use crate::database::table::Value;
use crate::spreadsheet::cell::CellUpdate;
use crate::spreadsheet::{SheetStore, SpreadsheetError, Worksheet};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Grid = Vec<Vec<String>>;

/// Handle to one spreadsheet held by a [`MemoryStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryBook {
    tabs: Rc<RefCell<IndexMap<String, Rc<RefCell<Grid>>>>>,
}

/// Handle to one tab of a [`MemoryBook`]. Writes are visible through every handle.
#[derive(Clone, Debug)]
pub struct MemoryTab {
    title: String,
    grid: Rc<RefCell<Grid>>,
}

/// Spreadsheets keyed by spreadsheet key, shared by all handles it hands out.
#[derive(Debug, Default)]
pub struct MemoryStore {
    books: RefCell<HashMap<String, MemoryBook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the spreadsheet with the given key, creating it if needed.
    pub fn add_spreadsheet(&self, key: &str) -> MemoryBook {
        self.books
            .borrow_mut()
            .entry(key.to_owned())
            .or_default()
            .to_owned()
    }

    /// Replaces a tab's contents with rows of entered text, creating the tab if needed.
    pub fn set_tab(&self, key: &str, tab: &str, rows: &[&[&str]]) {
        let book = self.add_spreadsheet(key);
        let grid: Grid = rows
            .iter()
            .map(|row| row.iter().map(|text| text.to_string()).collect())
            .collect();
        book.tabs
            .borrow_mut()
            .insert(tab.to_owned(), Rc::new(RefCell::new(grid)));
    }

    /// Returns a copy of a tab's entered text, if the tab exists.
    pub fn grid(&self, key: &str, tab: &str) -> Option<Vec<Vec<String>>> {
        let books = self.books.borrow();
        let tabs = books.get(key)?.tabs.borrow();
        let grid = tabs.get(tab)?.borrow().to_owned();
        Some(grid)
    }
}

impl SheetStore for MemoryStore {
    type Book = MemoryBook;
    type Tab = MemoryTab;

    fn open(&self, key: &str) -> anyhow::Result<(MemoryBook, Vec<String>)> {
        let book = self
            .books
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| SpreadsheetError::SpreadsheetNotFound(key.to_owned()))?;
        let names = book.tabs.borrow().keys().cloned().collect();
        Ok((book, names))
    }

    fn get_tab(&self, book: &MemoryBook, name: &str) -> anyhow::Result<(MemoryTab, Vec<Record>)> {
        let grid = book
            .tabs
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| SpreadsheetError::TabNotFound { tab: name.to_owned() })?;
        let records = records(&grid.borrow());
        Ok((
            MemoryTab {
                title: name.to_owned(),
                grid,
            },
            records,
        ))
    }

    fn create_tab(&self, book: &MemoryBook, name: &str, rows: usize, cols: usize) -> anyhow::Result<MemoryTab> {
        let mut tabs = book.tabs.borrow_mut();
        if tabs.contains_key(name) {
            Err(SpreadsheetError::TabExists { tab: name.to_owned() })?;
        }
        let grid = Rc::new(RefCell::new(vec![vec![String::new(); cols]; rows]));
        tabs.insert(name.to_owned(), grid.clone());
        Ok(MemoryTab {
            title: name.to_owned(),
            grid,
        })
    }
}

impl Worksheet for MemoryTab {
    fn title(&self) -> String {
        self.title.to_owned()
    }

    /// Trailing blank cells are trimmed, as spreadsheet value APIs do.
    fn header_row(&self) -> anyhow::Result<Vec<String>> {
        let grid = self.grid.borrow();
        let mut header = grid.first().cloned().unwrap_or_default();
        while header.last().is_some_and(|text| text.is_empty()) {
            header.pop();
        }
        Ok(header)
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        for row in self.grid.borrow_mut().iter_mut() {
            row.iter_mut().for_each(String::clear);
        }
        Ok(())
    }

    fn resize(&mut self, rows: usize, cols: usize) -> anyhow::Result<()> {
        let mut grid = self.grid.borrow_mut();
        grid.resize_with(rows, Vec::new);
        for row in grid.iter_mut() {
            row.resize(cols, String::new());
        }
        Ok(())
    }

    /// The grid grows to fit cells beyond its current size and stays rectangular.
    fn update_cells(&mut self, cells: &[CellUpdate]) -> anyhow::Result<()> {
        let mut grid = self.grid.borrow_mut();
        for cell in cells {
            if grid.len() < cell.row {
                let width = grid.first().map(Vec::len).unwrap_or_default();
                grid.resize_with(cell.row, || vec![String::new(); width]);
            }
            let row = &mut grid[cell.row - 1];
            if row.len() < cell.col {
                row.resize(cell.col, String::new());
            }
            row[cell.col - 1] = cell.value.to_owned();
        }
        let width = grid.iter().map(Vec::len).max().unwrap_or_default();
        for row in grid.iter_mut() {
            row.resize(width, String::new());
        }
        Ok(())
    }
}

/// Interprets entered text as the value a spreadsheet would display.
pub fn interpret(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    if let Some(literal) = text.strip_prefix('\'') {
        return Value::Str(literal.to_owned());
    }
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(value) = text.parse::<i64>() {
        return Value::Int(value);
    }
    let numeric = text
        .chars()
        .all(|char| char.is_ascii_digit() || matches!(char, '.' | '-' | '+' | 'e' | 'E'));
    match text.parse::<f64>() {
        Ok(value) if numeric && value.is_finite() => Value::Float(value),
        _ => Value::Str(text.to_owned()),
    }
}

/// Converts a grid to rows keyed by the header row's text.
fn records(grid: &Grid) -> Vec<Record> {
    let Some((header, rows)) = grid.split_first() else {
        return Vec::new();
    };
    let width = header.iter().rposition(|name| !name.is_empty()).map_or(0, |last| last + 1);
    if width == 0 {
        return Vec::new();
    }
    rows.iter()
        .map(|row| {
            header[..width]
                .iter()
                .enumerate()
                .map(|(col, name)| {
                    let text = row.get(col).map(String::as_str).unwrap_or_default();
                    (name.to_owned(), to_json(&interpret(text)))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpret() {
        assert_eq!(interpret(""), Value::Null);
        assert_eq!(interpret("'=1+1"), Value::from("=1+1"));
        assert_eq!(interpret("''x"), Value::from("'x"));
        assert_eq!(interpret("TRUE"), Value::Bool(true));
        assert_eq!(interpret("42"), Value::Int(42));
        assert_eq!(interpret("1.0"), Value::Float(1.0));
        assert_eq!(interpret("1e3"), Value::Float(1000.0));
        assert_eq!(interpret("inf"), Value::from("inf"));
        assert_eq!(interpret("NaN"), Value::from("NaN"));
        assert_eq!(interpret("ann"), Value::from("ann"));
    }

    #[test]
    fn test_open_and_read_tab() {
        let store = MemoryStore::new();
        store.set_tab("book", "people", &[&["id", "name", ""], &["1", "ann"], &["", "", ""]]);

        let (book, tabs) = store.open("book").unwrap();
        assert_eq!(tabs, vec!["people"]);

        let (tab, records) = store.get_tab(&book, "people").unwrap();
        assert_eq!(tab.title(), "people");
        assert_eq!(tab.header_row().unwrap(), vec!["id", "name"]);
        assert_eq!(records.len(), 2);
        assert_eq!(serde_json::Value::Object(records[0].clone()), json!({"id": 1, "name": "ann"}));
        assert_eq!(serde_json::Value::Object(records[1].clone()), json!({"id": null, "name": null}));
    }

    #[test]
    fn test_missing_spreadsheet_and_tab() {
        let store = MemoryStore::new();
        assert!(store.open("nope").is_err());

        let book = store.add_spreadsheet("book");
        let error = store.get_tab(&book, "missing").unwrap_err();
        assert_eq!(error.to_string(), "Tab 'missing' not found in spreadsheet");
    }

    #[test]
    fn test_create_resize_and_update() {
        let store = MemoryStore::new();
        let book = store.add_spreadsheet("book");
        let mut tab = store.create_tab(&book, "new", 1, 1).unwrap();
        assert!(store.create_tab(&book, "new", 1, 1).is_err());

        tab.update_cells(&[
            CellUpdate { row: 1, col: 1, value: "a".to_owned() },
            CellUpdate { row: 2, col: 2, value: "b".to_owned() },
        ])
        .unwrap();
        assert_eq!(store.grid("book", "new").unwrap(), vec![vec!["a", ""], vec!["", "b"]]);

        tab.resize(1, 1).unwrap();
        assert_eq!(store.grid("book", "new").unwrap(), vec![vec!["a"]]);

        tab.clear().unwrap();
        assert_eq!(store.grid("book", "new").unwrap(), vec![vec![""]]);
    }
}
