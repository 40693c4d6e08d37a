//! The write operation: merge request rows into a tab and write the result back.

use crate::bridge::{from_records, Record};
use crate::database::column::check_unique;
use crate::database::merge::{merge, Strategy};
use crate::database::prune::PostProcess;
use crate::database::table::Table;
use crate::error::{ResultMessage, SheetSyncError};
use crate::handler::response::OK;
use crate::handler::{Request, Response, WriteParams};
use crate::spreadsheet::writer::{self, WriteOptions};
use crate::spreadsheet::{SheetStore, Worksheet};
use log::info;
use serde_json::Value as Json;

/// State of the target tab before the write.
enum Target {
    /// The tab did not exist and was just created
    Created,
    /// The tab exists but has no header row
    Blank,
    /// The tab's contents are discarded by an overwrite, so they are not decoded
    Replaced,
    /// The tab holds a table
    Existing(Table),
}

/// Runs a write request and answers with 200 on success, 422 for request problems
/// and 500 for store failures.
pub fn handle_write<S: SheetStore + ?Sized>(store: &S, event: &Json) -> Response {
    let request = Request::from_event(event);
    match write_sheet(store, &request) {
        Ok(message) => Response::message(message, OK),
        Err(error) => Response::message(error.to_string(), error.status()),
    }
}

/// Writes the request's rows to its tab and returns the success message.
pub fn write_sheet<S: SheetStore + ?Sized>(store: &S, request: &Request) -> Result<String, SheetSyncError> {
    let params = WriteParams::try_from(request)?;
    let WriteParams {
        data,
        gsheet,
        tab: name,
        strategy,
        ..
    } = &params;

    let (book, tabs) = store
        .open(gsheet)
        .map_err(SheetSyncError::from)
        .with_prefix(&format!("Could not open spreadsheet '{gsheet}'"))?;

    let (mut tab, target) = if tabs.contains(name) {
        let (tab, records) = store.get_tab(&book, name)?;
        let header = tab.header_row()?;
        if header.iter().all(String::is_empty) {
            (tab, Target::Blank)
        } else if *strategy == Strategy::Overwrite {
            (tab, Target::Replaced)
        } else {
            check_unique(&header)?;
            let existing = existing_table(&header, &records)?;
            (tab, Target::Existing(existing))
        }
    } else {
        info!("Tab name not found. Making new tab: {name}.");
        let rows = (data.row_count() + 1).max(1);
        let cols = data.column_count().max(1);
        (store.create_tab(&book, name, rows, cols)?, Target::Created)
    };

    let post = PostProcess {
        drop_empty_rows: params.drop_empty_rows,
        drop_empty_columns: params.drop_empty_columns,
        column_order: None,
    };
    let options = WriteOptions {
        resize: params.resize,
        ..WriteOptions::default()
    };

    let existing = match target {
        Target::Existing(existing) => existing,
        target => {
            let message = match (strategy, target) {
                (Strategy::Overwrite, _) => "Overwrite successful",
                (_, Target::Blank) => "Tab was empty; write successful",
                _ => "New tab created; write successful",
            };
            if *strategy != Strategy::Overwrite {
                info!("Did an overwrite even though you wanted {strategy} because the tab had no existing data");
            }
            let table = post.apply(data.to_owned());
            tab.clear()?;
            writer::write(&mut tab, &table, &options)?;
            return Ok(message.to_owned());
        }
    };

    let outcome = merge(*strategy, data, &existing, params.primary_key.as_deref())?;
    if outcome.is_unchanged() {
        return Ok(outcome.message().to_owned());
    }

    let post = PostProcess {
        column_order: params
            .maintain_column_order
            .then(|| existing.columns().to_vec()),
        ..post
    };
    let table = post.apply(outcome.into_table());
    writer::write(&mut tab, &table, &options)?;
    Ok(format!("{strategy} successful"))
}

/// Builds the tab's current table. A tab with a header but no rows still has columns.
fn existing_table(header: &[String], records: &[Record]) -> Result<Table, SheetSyncError> {
    let table = from_records(records)?;
    if table.column_count() > 0 {
        return Ok(table);
    }
    Ok(Table::new(header.iter().filter(|name| !name.is_empty()).cloned())?)
}
