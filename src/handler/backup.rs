//! Scheduled backup of one tab to blob storage.

use crate::handler::invoke::{call, InvocationType, Invoker};
use crate::handler::response::{ACCEPTED, INTERNAL_ERROR, OK};
use crate::handler::{ParamError, Response};
use log::info;
use serde_json::{json, Value as Json};

pub const DEFAULT_READ_FUNCTION: &str = "s3-sync-cron-prod-gsheet-read";

/// Which tab to back up and where the read operation lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupConfig {
    /// Spreadsheet key (`GSHEET_ID`)
    pub gsheet: String,
    /// Tab name (`GSHEET_TAB`)
    pub tab: String,
    /// Account the backup bucket belongs to (`AWS_ACCOUNT_ID`)
    pub account_id: String,
    /// Function serving the read operation (`GSHEET_READ_FUNCTION`)
    pub read_function: String,
}

impl BackupConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ParamError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through `lookup`, reporting every missing variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ParamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |name: &str| {
            lookup(name).filter(|value| !value.is_empty()).unwrap_or_else(|| {
                missing.push(name.to_owned());
                String::new()
            })
        };
        let gsheet = require("GSHEET_ID");
        let tab = require("GSHEET_TAB");
        let account_id = require("AWS_ACCOUNT_ID");
        if !missing.is_empty() {
            Err(ParamError::MissingEnvironment(missing))?;
        }

        let read_function = lookup("GSHEET_READ_FUNCTION")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_READ_FUNCTION.to_owned());
        Ok(BackupConfig {
            gsheet,
            tab,
            account_id,
            read_function,
        })
    }

    pub fn bucket(&self) -> String {
        format!("gsheet-backup-bucket-{}-1", self.account_id)
    }

    pub fn object_key(&self) -> String {
        format!("AutoSync GSheet: {}.csv", self.gsheet)
    }

    /// Request sent to the read operation.
    pub fn read_request(&self) -> Json {
        json!({
            "Gsheet": self.gsheet,
            "Tab": self.tab,
            "Drop_Empty_Rows": true,
            "Drop_Empty_Columns": true,
            "Source": "Lambda: S3 Sync",
        })
    }
}

/// Object storage for backups.
pub trait BlobStore {
    /// Stores `body` under `bucket`/`key` and returns the storage status code.
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> anyhow::Result<u16>;
}

/// What a backup run did.
#[derive(Clone, Debug, PartialEq)]
pub enum BackupOutcome {
    /// The read failed; nothing was stored
    Skipped { status: u16, message: Option<Json> },
    /// The rows were stored
    Stored { status: u16, bytes: usize },
}

/// Reads the configured tab and stores its rows as JSON.
pub fn sync_backup<I, B>(config: &BackupConfig, invoker: &I, blobs: &B) -> anyhow::Result<BackupOutcome>
where
    I: Invoker + ?Sized,
    B: BlobStore + ?Sized,
{
    let (data, status) = call(
        invoker,
        &config.read_function,
        &config.read_request(),
        InvocationType::RequestResponse,
    );
    info!("Status code of data fetch from GSheet is {status}");
    if status != OK && status != ACCEPTED {
        return Ok(BackupOutcome::Skipped { status, message: data });
    }

    let body = serde_json::to_vec(&data.unwrap_or(Json::Null))?;
    let bytes = body.len();
    let status = blobs.put(&config.bucket(), &config.object_key(), body)?;
    info!("Status code of S3 Write is {status}");
    Ok(BackupOutcome::Stored { status, bytes })
}

/// Runs a backup and reports it as a response.
pub fn handle_backup<I, B>(config: &BackupConfig, invoker: &I, blobs: &B) -> Response
where
    I: Invoker + ?Sized,
    B: BlobStore + ?Sized,
{
    match sync_backup(config, invoker, blobs) {
        Ok(BackupOutcome::Stored { status, bytes }) => Response::message(
            format!("Stored {bytes} bytes at {}/{}", config.bucket(), config.object_key()),
            status,
        ),
        Ok(BackupOutcome::Skipped { status, message }) => {
            let reason = match message {
                Some(Json::String(text)) => text,
                Some(other) => other.to_string(),
                None => "no response".to_owned(),
            };
            Response::message(format!("Backup skipped: {reason}"), status)
        }
        Err(error) => Response::message(format!("Backup failed: {error}"), INTERNAL_ERROR),
    }
}
