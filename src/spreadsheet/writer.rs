//! Projection of a table onto a worksheet grid as a batch of cell updates.

use crate::database::table::{Table, Value};
use crate::spreadsheet::cell::{serialize, CellUpdate};
use crate::spreadsheet::reference::Origin;
use crate::spreadsheet::Worksheet;
use log::debug;

/// Layout options for writing a table to a worksheet.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteOptions {
    /// Top-left cell of the written block
    pub origin: Origin,
    /// Write the row position as an extra leading column
    pub include_index: bool,
    /// Write column names as a header row
    pub include_header: bool,
    /// Let text starting with `=` be entered as a formula
    pub allow_formulas: bool,
    /// Resize the worksheet to exactly the footprint before writing.
    /// Anything outside the footprint is lost.
    pub resize: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            origin: Origin::default(),
            include_index: false,
            include_header: true,
            allow_formulas: true,
            resize: false,
        }
    }
}

/// Rows and columns a written table occupies, header and index included.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    pub rows: usize,
    pub cols: usize,
}

/// The cell updates for one table, in write order.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub footprint: Footprint,
    pub updates: Vec<CellUpdate>,
}

impl Projection {
    /// Returns true if there is nothing to send to the worksheet.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// What a write sent to the worksheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The projection had no cells; no batch was sent
    Empty,
    /// A batch of this many cells was sent
    Written { cells: usize },
}

/// Computes the footprint and cell updates for `table` without touching a worksheet.
pub fn project(table: &Table, options: &WriteOptions) -> Projection {
    let footprint = Footprint {
        rows: table.row_count() + usize::from(options.include_header),
        cols: table.column_count() + usize::from(options.include_index),
    };
    let mut updates = Vec::with_capacity(footprint.rows * footprint.cols);
    let mut row = options.origin.row;
    let mut push_row = |row: usize, values: Vec<String>| {
        for (offset, value) in values.into_iter().enumerate() {
            updates.push(CellUpdate {
                row,
                col: options.origin.col + offset,
                value,
            });
        }
    };

    if options.include_header {
        let index_name = table.index_name.as_deref().unwrap_or_default();
        let names = options
            .include_index
            .then_some(index_name)
            .into_iter()
            .chain(table.columns().iter().map(String::as_str))
            .map(|name| serialize(&Value::from(name), options.allow_formulas));
        push_row(row, names.collect());
        row += 1;
    }

    for (position, values) in table.rows().iter().enumerate() {
        let index = Value::Int(position as i64);
        let cells = options
            .include_index
            .then_some(&index)
            .into_iter()
            .chain(values.iter())
            .map(|value| serialize(value, options.allow_formulas));
        push_row(row + position, cells.collect());
    }

    Projection { footprint, updates }
}

/// Writes `table` to the worksheet, resizing first when requested.
/// An empty projection leaves the worksheet untouched, size included.
pub fn write<W>(worksheet: &mut W, table: &Table, options: &WriteOptions) -> anyhow::Result<WriteOutcome>
where
    W: Worksheet + ?Sized,
{
    let projection = project(table, options);
    if projection.is_empty() {
        debug!("No updates to perform on worksheet.");
        return Ok(WriteOutcome::Empty);
    }
    if options.resize {
        worksheet.resize(projection.footprint.rows, projection.footprint.cols)?;
    }

    let cells = projection.updates.len();
    debug!("{cells} cell updates to send");
    worksheet.update_cells(&projection.updates)?;
    Ok(WriteOutcome::Written { cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::memory::MemoryStore;
    use crate::spreadsheet::SheetStore;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        Table::from_rows(
            ["name", "score"],
            vec![
                vec![Value::from("ann"), Value::Float(1.5)],
                vec![Value::from("=bob"), Value::Null],
                vec![Value::from("cy"), Value::Int(3)],
            ],
        )
        .unwrap()
    }

    fn cell(row: usize, col: usize, value: &str) -> CellUpdate {
        CellUpdate { row, col, value: value.to_owned() }
    }

    #[test]
    fn project_header_footprint() {
        let projection = project(&sample(), &WriteOptions::default());

        assert_eq!(projection.footprint, Footprint { rows: 4, cols: 2 });
        assert_eq!(projection.updates.len(), 8);
        assert_eq!(projection.updates[0], cell(1, 1, "name"));
        assert_eq!(projection.updates[1], cell(1, 2, "score"));
        assert_eq!(projection.updates[2], cell(2, 1, "ann"));
        assert_eq!(projection.updates[3], cell(2, 2, "1.5"));
        assert_eq!(projection.updates[5], cell(3, 2, ""));
        assert_eq!(projection.updates[7], cell(4, 2, "3"));
    }

    #[test]
    fn project_with_index_and_origin() {
        let mut table = sample();
        table.index_name = Some("idx".to_owned());
        let options = WriteOptions {
            origin: Origin::try_from("B3").unwrap(),
            include_index: true,
            allow_formulas: false,
            ..WriteOptions::default()
        };
        let projection = project(&table, &options);

        assert_eq!(projection.footprint, Footprint { rows: 4, cols: 3 });
        assert_eq!(&projection.updates[..3], &[cell(3, 2, "idx"), cell(3, 3, "name"), cell(3, 4, "score")]);
        assert_eq!(&projection.updates[6..9], &[cell(5, 2, "1"), cell(5, 3, "'=bob"), cell(5, 4, "")]);
    }

    #[test]
    fn project_without_header() {
        let options = WriteOptions {
            include_header: false,
            ..WriteOptions::default()
        };
        let projection = project(&sample(), &options);

        assert_eq!(projection.footprint, Footprint { rows: 3, cols: 2 });
        assert_eq!(projection.updates[0], cell(1, 1, "ann"));
    }

    #[test]
    fn project_empty_table() {
        let projection = project(&Table::default(), &WriteOptions::default());
        assert!(projection.is_empty());
        assert_eq!(projection.footprint, Footprint { rows: 1, cols: 0 });
    }

    /// Records every call a writer makes.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Worksheet for Recorder {
        fn title(&self) -> String {
            "recorder".to_owned()
        }

        fn header_row(&self) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn clear(&mut self) -> anyhow::Result<()> {
            self.calls.push("clear".to_owned());
            Ok(())
        }

        fn resize(&mut self, rows: usize, cols: usize) -> anyhow::Result<()> {
            self.calls.push(format!("resize {rows}x{cols}"));
            Ok(())
        }

        fn update_cells(&mut self, cells: &[CellUpdate]) -> anyhow::Result<()> {
            self.calls.push(format!("update {}", cells.len()));
            Ok(())
        }
    }

    #[test]
    fn write_empty_table_sends_nothing() {
        let options = WriteOptions {
            resize: true,
            ..WriteOptions::default()
        };
        let mut recorder = Recorder::default();
        let outcome = write(&mut recorder, &Table::default(), &options).unwrap();

        assert_eq!(outcome, WriteOutcome::Empty);
        assert!(recorder.calls.is_empty());

        let store = MemoryStore::new();
        let book = store.add_spreadsheet("book");
        let mut tab = store.create_tab(&book, "t", 2, 2).unwrap();
        assert_eq!(write(&mut tab, &Table::default(), &options).unwrap(), WriteOutcome::Empty);
        assert_eq!(store.grid("book", "t").unwrap(), vec![vec![""; 2]; 2]);
    }

    #[test]
    fn write_sends_one_batch() {
        let mut recorder = Recorder::default();
        let outcome = write(&mut recorder, &sample(), &WriteOptions::default()).unwrap();

        assert_eq!(outcome, WriteOutcome::Written { cells: 8 });
        assert_eq!(recorder.calls, vec!["update 8"]);

        let store = MemoryStore::new();
        let book = store.add_spreadsheet("book");
        let mut tab = store.create_tab(&book, "t", 1, 1).unwrap();
        write(&mut tab, &sample(), &WriteOptions::default()).unwrap();
        assert_eq!(
            store.grid("book", "t").unwrap(),
            vec![
                vec!["name", "score"],
                vec!["ann", "1.5"],
                vec!["=bob", ""],
                vec!["cy", "3"],
            ]
        );
    }

    #[test]
    fn write_resizes_to_footprint() {
        let options = WriteOptions {
            resize: true,
            ..WriteOptions::default()
        };
        let mut recorder = Recorder::default();
        write(&mut recorder, &sample(), &options).unwrap();
        assert_eq!(recorder.calls, vec!["resize 4x2", "update 8"]);

        let store = MemoryStore::new();
        store.set_tab("book", "t", &[&["x", "x", "x"], &["x", "x", "x"], &["x", "x", "x"], &["x", "x", "x"], &["x", "x", "x"]]);
        let (book, _) = store.open("book").unwrap();
        let (mut tab, _) = store.get_tab(&book, "t").unwrap();
        let outcome = write(&mut tab, &sample(), &options).unwrap();

        assert_eq!(outcome, WriteOutcome::Written { cells: 8 });
        let grid = store.grid("book", "t").unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|row| row.len() == 2));
        assert_eq!(grid[3], vec!["cy", "3"]);
    }
}
