use crate::database::column::reorder;
use crate::database::table::{Table, Value};
use log::info;

/// Optional clean-up steps applied to a table before it is written or returned.
///
/// Steps run in a fixed order: empty rows, then empty columns, then column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostProcess {
    /// Drop rows in which every value is null
    pub drop_empty_rows: bool,
    /// Drop columns in which every value is null
    pub drop_empty_columns: bool,
    /// Reference column order to restore, taken before any column was dropped
    pub column_order: Option<Vec<String>>,
}

impl PostProcess {
    pub fn apply(&self, table: Table) -> Table {
        let mut table = table;
        if self.drop_empty_rows {
            table = drop_empty_rows(table);
        }
        if self.drop_empty_columns {
            table = drop_empty_columns(table);
        }
        if let Some(reference) = &self.column_order {
            table = order_columns(table, reference);
        }
        table
    }
}

/// Removes rows whose values are all null. Empty strings count as data.
pub fn drop_empty_rows(table: Table) -> Table {
    let before = table.row_count();
    let table = table.retain_rows(|row| !row.iter().all(Value::is_null));
    info!("~ {} empty rows dropped. ~", before - table.row_count());
    table
}

/// Removes columns whose values are all null, including columns of a table without rows.
pub fn drop_empty_columns(table: Table) -> Table {
    let kept: Vec<String> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(col, _)| !table.rows().iter().all(|row| row[*col].is_null()))
        .map(|(_, name)| name.to_owned())
        .collect();
    info!("~ {} empty columns dropped. ~", table.column_count() - kept.len());
    table.select(&kept)
}

/// Lays columns out in reference order; see [`reorder`] for names outside the reference.
pub fn order_columns(table: Table, reference: &[String]) -> Table {
    let ordered = reorder(table.columns(), reference);
    if ordered.as_slice() == table.columns() {
        table
    } else {
        table.select(&ordered)
    }
}
