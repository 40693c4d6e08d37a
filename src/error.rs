use crate::handler::response::{INTERNAL_ERROR, UNPROCESSABLE};
use thiserror::Error;

/// Main error type for the sheet sync crate.
/// Aggregates errors from the table, spreadsheet and handler modules and from collaborators.
#[derive(Error, Debug)]
pub enum SheetSyncError {
    #[error("{0}")]
    WithContextError(String),

    /// Failures reported by store, blob or invocation collaborators
    #[error("{0}")]
    AnyhowError(#[from] anyhow::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Table module errors
    #[error("{0}")]
    ValueError(#[from] crate::database::table::ValueError),

    #[error("{0}")]
    ColumnError(#[from] crate::database::column::ColumnError),

    #[error("{0}")]
    MergeError(#[from] crate::database::merge::MergeError),

    #[error("{0}")]
    BridgeError(#[from] crate::bridge::BridgeError),

    // Spreadsheet module errors
    #[error("{0}")]
    ReferenceError(#[from] crate::spreadsheet::reference::ReferenceError),

    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Handler module errors
    #[error("{0}")]
    ParamError(#[from] crate::handler::ParamError),
}

impl SheetSyncError {
    /// Returns the response status for this error: 422 for anything the caller can
    /// fix by changing the request, 500 otherwise.
    pub fn status(&self) -> u16 {
        match self {
            SheetSyncError::ValueError(_)
            | SheetSyncError::ColumnError(_)
            | SheetSyncError::MergeError(_)
            | SheetSyncError::BridgeError(_)
            | SheetSyncError::ReferenceError(_)
            | SheetSyncError::ParamError(_) => UNPROCESSABLE,
            SheetSyncError::WithContextError(_)
            | SheetSyncError::AnyhowError(_)
            | SheetSyncError::JsonError(_)
            | SheetSyncError::SpreadsheetError(_) => INTERNAL_ERROR,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetSyncError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetSyncError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::ColumnError;
    use crate::handler::ParamError;

    #[test]
    fn test_status_mapping() {
        let error = SheetSyncError::from(ParamError::MissingParams(vec!["Tab".to_owned()]));
        assert_eq!(error.status(), 422);

        let error = SheetSyncError::from(ColumnError::DuplicateHeaders(vec!["id".to_owned()]));
        assert_eq!(error.status(), 422);

        let error = SheetSyncError::from(anyhow::anyhow!("store unavailable"));
        assert_eq!(error.status(), 500);
    }

    #[test]
    fn test_with_prefix() {
        let result: Result<(), SheetSyncError> = Err(anyhow::anyhow!("timeout").into());
        let error = result.with_prefix("Open spreadsheet failed").unwrap_err();
        assert_eq!(error.to_string(), "Open spreadsheet failed: timeout");
        assert_eq!(error.status(), 500);
    }
}
