//! # Sheet Sync
//!
//! Keeps tabs of an external spreadsheet in sync with row data sent by request.
//! Incoming rows are merged with a tab's existing contents and written back as a
//! batch of cell updates; tabs can be read back as rows and backed up to blob
//! storage.
//!
//! ## Merge Strategies
//!
//! - `Overwrite`: replace the tab's contents
//! - `Append_All`: add every incoming row after the existing ones
//! - `Append_Uniques`: add incoming rows whose primary key is not already present
//! - `Combine_Uniques`: union of incoming and existing rows, one per primary key,
//!   existing values winning
//!
//! ## Operations
//!
//! - [`handler::write_sheet::handle_write`]: merge and write rows to a tab
//! - [`handler::read_sheet::handle_read`]: read a tab as rows
//! - [`handler::backup::handle_backup`]: copy a tab's rows to blob storage
//!
//! Every operation answers with a [`handler::Response`] carrying a status code and a
//! JSON body; failures never escape as panics or errors. The spreadsheet, blob storage
//! and function invocation are reached through the [`spreadsheet::SheetStore`],
//! [`handler::backup::BlobStore`] and [`handler::invoke::Invoker`] traits.
//!
//! Logging goes through the `log` facade; the host installs a logger.

pub mod bridge;
pub mod database;
pub mod error;
pub mod handler;
pub mod spreadsheet;

mod helpers;

pub use crate::database::merge::{merge, Outcome, Strategy};
pub use crate::database::table::{Table, Value};
pub use crate::error::SheetSyncError;
pub use crate::handler::{Request, Response};
