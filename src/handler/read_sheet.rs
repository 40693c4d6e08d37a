//! The read operation: fetch a tab as a list of rows.

use crate::bridge::{from_records, to_records, Record};
use crate::database::column::check_unique;
use crate::database::prune::PostProcess;
use crate::error::{ResultMessage, SheetSyncError};
use crate::handler::response::OK;
use crate::handler::{ReadParams, Request, Response};
use crate::spreadsheet::{SheetStore, Worksheet};
use log::{info, warn};
use serde_json::Value as Json;

/// Runs a read request and answers with the tab's rows.
pub fn handle_read<S: SheetStore + ?Sized>(store: &S, event: &Json) -> Response {
    let request = Request::from_event(event);
    match read_sheet(store, &request) {
        Ok(records) => Response::records(records, OK),
        Err(error) => Response::message(error.to_string(), error.status()),
    }
}

/// Reads the requested tab, applying the requested pruning.
pub fn read_sheet<S: SheetStore + ?Sized>(store: &S, request: &Request) -> Result<Vec<Record>, SheetSyncError> {
    let params = ReadParams::try_from(request)?;
    let (book, _) = store
        .open(&params.gsheet)
        .map_err(SheetSyncError::from)
        .with_prefix(&format!("Could not open spreadsheet '{}'", params.gsheet))?;
    let (tab, records) = store.get_tab(&book, &params.tab)?;

    let header = tab.header_row()?;
    if let Err(error) = check_unique(&header) {
        warn!("{error}: {header:?}");
        Err(error)?;
    }

    let table = from_records(&records)?;
    let table = PostProcess {
        drop_empty_rows: params.drop_empty_rows,
        drop_empty_columns: params.drop_empty_columns,
        column_order: None,
    }
    .apply(table);
    info!("Read {} rows from tab '{}'", table.row_count(), tab.title());
    Ok(to_records(&table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::memory::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.set_tab(
            "book",
            "people",
            &[
                &["id", "name", "note"],
                &["1", "ann", ""],
                &["", "", ""],
                &["2", "'007", ""],
            ],
        );
        store
    }

    #[test]
    fn test_read_all_rows() {
        let response = handle_read(&store(), &json!({"gsheet": "book", "tab": "people"}));

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.data_value(),
            Some(json!([
                {"id": 1, "name": "ann", "note": null},
                {"id": null, "name": null, "note": null},
                {"id": 2, "name": "007", "note": null},
            ]))
        );
    }

    #[test]
    fn test_read_pruned() {
        let response = handle_read(
            &store(),
            &json!({
                "queryStringParameters": {
                    "gsheet": "book",
                    "tab": "people",
                    "drop_empty_rows": "true",
                    "drop_empty_columns": "true",
                },
            }),
        );

        assert_eq!(
            response.data_value(),
            Some(json!([{"id": 1, "name": "ann"}, {"id": 2, "name": "007"}]))
        );
    }

    #[test]
    fn test_duplicate_headers() {
        let store = store();
        store.set_tab("book", "dupes", &[&["id", "id"], &["1", "2"]]);
        let response = handle_read(&store, &json!({"Gsheet": "book", "Tab": "dupes"}));

        assert_eq!(response.status_code, 422);
        assert_eq!(
            response.data_value(),
            Some(json!("You have duplicate column headers in your GSheet"))
        );
    }

    #[test]
    fn test_repeated_blank_headers() {
        let store = store();
        store.set_tab("book", "gaps", &[&["a", "", "", "c"], &["1", "x", "y", "2"]]);
        let response = handle_read(&store, &json!({"Gsheet": "book", "Tab": "gaps"}));

        assert_eq!(response.status_code, 422);

        store.set_tab("book", "gap", &[&["a", "", "c"], &["1", "x", "2"]]);
        let response = handle_read(&store, &json!({"Gsheet": "book", "Tab": "gap"}));
        assert_eq!(response.data_value(), Some(json!([{"a": 1, "": "x", "c": 2}])));
    }

    #[test]
    fn test_missing_tab_and_params() {
        let response = handle_read(&store(), &json!({"Gsheet": "book", "Tab": "nope"}));
        assert_eq!(response.status_code, 500);
        assert_eq!(response.data_value(), Some(json!("Tab 'nope' not found in spreadsheet")));

        let response = handle_read(&store(), &json!({"Gsheet": "book"}));
        assert_eq!(response.status_code, 422);
    }
}
