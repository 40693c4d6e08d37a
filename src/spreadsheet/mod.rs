//! # Spreadsheet Module
//!
//! The external spreadsheet store as seen by this crate: traits for opening a
//! spreadsheet, fetching and creating tabs and writing cells, plus the cell
//! serializer and table writer built on top of them.
//!
//! Implementations decide how rows are fetched and how entered text is
//! interpreted. [`memory::MemoryStore`] keeps everything in process.
use crate::bridge::Record;
use crate::spreadsheet::cell::CellUpdate;
use thiserror::Error;

pub mod cell;
pub mod memory;
pub mod reference;
pub mod writer;

/// Errors reported by spreadsheet store implementations.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// No spreadsheet with the given key
    #[error("Spreadsheet '{0}' not found")]
    SpreadsheetNotFound(String),

    /// The spreadsheet has no tab with the given name
    #[error("Tab '{tab}' not found in spreadsheet")]
    TabNotFound { tab: String },

    /// A tab with the given name already exists
    #[error("Tab '{tab}' already exists")]
    TabExists { tab: String },
}

/// A single tab that can be inspected and written.
pub trait Worksheet {
    /// Returns the tab name.
    fn title(&self) -> String;

    /// Returns the raw text of the tab's first row, interior blank cells included.
    fn header_row(&self) -> anyhow::Result<Vec<String>>;

    /// Erases every cell value.
    fn clear(&mut self) -> anyhow::Result<()>;

    /// Sets the grid to exactly `rows` by `cols`, discarding anything outside.
    fn resize(&mut self, rows: usize, cols: usize) -> anyhow::Result<()>;

    /// Enters a batch of cell values as if typed by a user.
    fn update_cells(&mut self, cells: &[CellUpdate]) -> anyhow::Result<()>;
}

/// Access to spreadsheets and their tabs.
pub trait SheetStore {
    /// Handle to an opened spreadsheet
    type Book;
    /// Handle to one tab of a spreadsheet
    type Tab: Worksheet;

    /// Opens a spreadsheet by key, returning it with the names of its tabs.
    fn open(&self, key: &str) -> anyhow::Result<(Self::Book, Vec<String>)>;

    /// Fetches a tab and its rows keyed by header name.
    fn get_tab(&self, book: &Self::Book, name: &str) -> anyhow::Result<(Self::Tab, Vec<Record>)>;

    /// Adds a new tab sized `rows` by `cols`.
    fn create_tab(&self, book: &Self::Book, name: &str, rows: usize, cols: usize) -> anyhow::Result<Self::Tab>;
}
