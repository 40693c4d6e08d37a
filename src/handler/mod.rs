//! # Request Handler Module
//!
//! Entry points for the write, read and backup operations. Each handler turns a raw
//! JSON request into a typed parameter struct, runs the operation against the
//! collaborators it is given, and always answers with a [`Response`].
use crate::bridge::from_json_rows;
use crate::database::merge::{MergeError, Strategy};
use crate::database::table::Table;
use crate::handler::ParamError::{InvalidParameter, MissingParams};
use crate::helpers::key::spreadsheet_key;
use crate::helpers::string::normalize_key;
use indexmap::IndexMap;
use log::info;
use serde_json::Value as Json;
use thiserror::Error;
use url::form_urlencoded;

pub mod backup;
pub mod invoke;
pub mod read_sheet;
pub mod response;
pub mod write_sheet;

pub use response::Response;

/// Errors raised while validating request parameters.
#[derive(Error, Debug)]
pub enum ParamError {
    /// Required parameters absent from the request, in declaration order
    #[error("Missing required params {0:?}")]
    MissingParams(Vec<String>),

    /// A parameter is present but unusable
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// Required environment variables are not set
    #[error("Missing environment variables {0:?}")]
    MissingEnvironment(Vec<String>),

    #[error("{0}")]
    MergeError(#[from] MergeError),
}

/// A request with flattened transport fields and canonical keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    params: IndexMap<String, Json>,
}

impl Request {
    /// Normalizes a raw request object.
    ///
    /// A form-encoded `body` (POST), else `queryStringParameters` (GET), else `query`
    /// (async GET) is merged over the top-level fields. Keys are then title-cased,
    /// trimmed and have spaces replaced by underscores; the string `"false"` becomes
    /// boolean false.
    pub fn from_event(event: &Json) -> Self {
        let mut fields: IndexMap<String, Json> = event
            .as_object()
            .map(|object| object.iter().map(|(key, value)| (key.to_owned(), value.to_owned())).collect())
            .unwrap_or_default();

        let body = event.get("body").and_then(Json::as_str).filter(|body| !body.is_empty());
        if let Some(body) = body {
            for (key, value) in form_urlencoded::parse(body.as_bytes()) {
                fields.insert(key.into_owned(), Json::String(value.into_owned()));
            }
        } else if let Some(query) = nonempty_object(event, "queryStringParameters") {
            fields.extend(query.iter().map(|(key, value)| (key.to_owned(), value.to_owned())));
        } else if let Some(query) = nonempty_object(event, "query") {
            fields.extend(query.iter().map(|(key, value)| (key.to_owned(), value.to_owned())));
        }

        let mut params = IndexMap::with_capacity(fields.len());
        for (key, value) in fields {
            let value = match value {
                Json::String(text) if text == "false" => Json::Bool(false),
                value => value,
            };
            params.insert(normalize_key(&key), value);
        }
        Request { params }
    }

    /// Returns the value of a canonical key.
    pub fn get(&self, name: &str) -> Option<&Json> {
        self.params.get(name)
    }

    /// Fails with every listed name that the request lacks.
    pub fn require(&self, names: &[&str]) -> Result<(), ParamError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !self.params.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingParams(missing))
        }
    }

    /// Logs which of the recognized parameters were supplied.
    fn log_params(&self, required: &[&str], optional: &[&str]) {
        let recognized: Vec<&str> = self
            .params
            .keys()
            .map(String::as_str)
            .filter(|key| required.contains(key) || optional.contains(key))
            .collect();
        let found: Vec<&&str> = optional.iter().filter(|name| self.params.contains_key(**name)).collect();
        info!("Total params: {recognized:?}");
        info!("Found optional params: {found:?}");
    }
}

fn nonempty_object<'a>(event: &'a Json, name: &str) -> Option<&'a serde_json::Map<String, Json>> {
    event.get(name).and_then(Json::as_object).filter(|object| !object.is_empty())
}

// Named parameter handling traits and implementations

/// A named request parameter with its own decoding rules.
///
/// `read` returns `Ok(None)` when the parameter is absent and an error when it is
/// present but cannot be decoded.
pub trait NamedParam<T> {
    /// Canonical parameter name
    fn name() -> &'static str;

    /// Extracts and decodes the parameter from a request
    fn read(request: &Request) -> Result<Option<T>, ParamError>;

    /// Builds the error for a present but unusable value
    fn invalid(message: impl Into<String>) -> ParamError {
        InvalidParameter {
            name: Self::name().to_owned(),
            message: message.into(),
        }
    }
}

/// Rows to write
pub struct DataParam;

/// Spreadsheet key or URL
pub struct GsheetParam;

/// Tab name
pub struct TabParam;

/// Merge strategy
pub struct TypeParam;

/// Resize the tab to the written table
pub struct ResizeParam;

/// Drop rows with no values
pub struct DropEmptyRowsParam;

/// Drop columns with no values
pub struct DropEmptyColumnsParam;

/// Column identifying a record
pub struct PrimaryKeyParam;

/// Keep the existing tab's column order
pub struct MaintainColumnOrderParam;

impl NamedParam<Table> for DataParam {
    fn name() -> &'static str {
        "Data"
    }

    /// Accepts a list of row objects, or a string holding one as JSON.
    fn read(request: &Request) -> Result<Option<Table>, ParamError> {
        let Some(value) = request.get(Self::name()) else {
            return Ok(None);
        };
        let decoded;
        let rows = match value {
            Json::String(text) => {
                decoded = serde_json::from_str::<Json>(text).map_err(|error| Self::invalid(error.to_string()))?;
                &decoded
            }
            value => value,
        };
        from_json_rows(rows)
            .map(Some)
            .map_err(|error| Self::invalid(error.to_string()))
    }
}

impl NamedParam<String> for GsheetParam {
    fn name() -> &'static str {
        "Gsheet"
    }

    fn read(request: &Request) -> Result<Option<String>, ParamError> {
        let Some(text) = read_text(request, Self::name())? else {
            return Ok(None);
        };
        spreadsheet_key(&text)
            .map(Some)
            .ok_or_else(|| Self::invalid(format!("'{text}' is not a spreadsheet key or URL")))
    }
}

impl NamedParam<String> for TabParam {
    fn name() -> &'static str {
        "Tab"
    }

    fn read(request: &Request) -> Result<Option<String>, ParamError> {
        read_text(request, Self::name())
    }
}

impl NamedParam<Strategy> for TypeParam {
    fn name() -> &'static str {
        "Type"
    }

    fn read(request: &Request) -> Result<Option<Strategy>, ParamError> {
        let Some(text) = read_text(request, Self::name())? else {
            return Ok(None);
        };
        Ok(Some(Strategy::parse(&text)?))
    }
}

impl NamedParam<String> for PrimaryKeyParam {
    fn name() -> &'static str {
        "Primary_Key"
    }

    fn read(request: &Request) -> Result<Option<String>, ParamError> {
        read_text(request, Self::name())
    }
}

impl NamedParam<bool> for ResizeParam {
    fn name() -> &'static str {
        "Resize"
    }

    fn read(request: &Request) -> Result<Option<bool>, ParamError> {
        read_flag::<Self>(request)
    }
}

impl NamedParam<bool> for DropEmptyRowsParam {
    fn name() -> &'static str {
        "Drop_Empty_Rows"
    }

    fn read(request: &Request) -> Result<Option<bool>, ParamError> {
        read_flag::<Self>(request)
    }
}

impl NamedParam<bool> for DropEmptyColumnsParam {
    fn name() -> &'static str {
        "Drop_Empty_Columns"
    }

    fn read(request: &Request) -> Result<Option<bool>, ParamError> {
        read_flag::<Self>(request)
    }
}

impl NamedParam<bool> for MaintainColumnOrderParam {
    fn name() -> &'static str {
        "Maintain_Column_Order"
    }

    fn read(request: &Request) -> Result<Option<bool>, ParamError> {
        read_flag::<Self>(request)
    }
}

/// Reads a text parameter; numbers are accepted in their JSON text form.
fn read_text(request: &Request, name: &str) -> Result<Option<String>, ParamError> {
    match request.get(name) {
        None => Ok(None),
        Some(Json::String(text)) => Ok(Some(text.to_owned())),
        Some(Json::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(InvalidParameter {
            name: name.to_owned(),
            message: format!("expected text but found {other}"),
        }),
    }
}

/// Reads a flag. Text is matched case-insensitively against true/false spellings.
fn read_flag<P: NamedParam<bool>>(request: &Request) -> Result<Option<bool>, ParamError> {
    match request.get(P::name()) {
        None => Ok(None),
        Some(Json::Null) => Ok(Some(false)),
        Some(Json::Bool(flag)) => Ok(Some(*flag)),
        Some(Json::Number(number)) => Ok(Some(number.as_f64().is_some_and(|number| number != 0.0))),
        Some(Json::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(Some(true)),
            "false" | "f" | "no" | "n" | "0" | "" => Ok(Some(false)),
            _ => Err(P::invalid(format!("'{text}' is not a boolean"))),
        },
        Some(other) => Err(P::invalid(format!("expected a boolean but found {other}"))),
    }
}

/// Parameters of the write operation.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteParams {
    /// Rows to write
    pub data: Table,
    /// Spreadsheet key
    pub gsheet: String,
    /// Tab name
    pub tab: String,
    /// Merge strategy
    pub strategy: Strategy,
    /// Resize the tab to the written table (default: true)
    pub resize: bool,
    /// Drop rows with no values (default: false)
    pub drop_empty_rows: bool,
    /// Drop columns with no values (default: false)
    pub drop_empty_columns: bool,
    /// Column identifying a record, needed by the uniques strategies
    pub primary_key: Option<String>,
    /// Restore the existing tab's column order after merging (default: false)
    pub maintain_column_order: bool,
}

impl WriteParams {
    pub const REQUIRED: [&'static str; 4] = ["Data", "Gsheet", "Tab", "Type"];
    pub const OPTIONAL: [&'static str; 5] = [
        "Resize",
        "Drop_Empty_Rows",
        "Drop_Empty_Columns",
        "Primary_Key",
        "Maintain_Column_Order",
    ];
}

impl TryFrom<&Request> for WriteParams {
    type Error = ParamError;

    fn try_from(request: &Request) -> Result<Self, Self::Error> {
        request.log_params(&Self::REQUIRED, &Self::OPTIONAL);
        request.require(&Self::REQUIRED)?;
        Ok(WriteParams {
            data: required::<DataParam, _>(request)?,
            gsheet: required::<GsheetParam, _>(request)?,
            tab: required::<TabParam, _>(request)?,
            strategy: required::<TypeParam, _>(request)?,
            resize: ResizeParam::read(request)?.unwrap_or(true),
            drop_empty_rows: DropEmptyRowsParam::read(request)?.unwrap_or(false),
            drop_empty_columns: DropEmptyColumnsParam::read(request)?.unwrap_or(false),
            primary_key: PrimaryKeyParam::read(request)?,
            maintain_column_order: MaintainColumnOrderParam::read(request)?.unwrap_or(false),
        })
    }
}

/// Parameters of the read operation.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadParams {
    /// Spreadsheet key
    pub gsheet: String,
    /// Tab name
    pub tab: String,
    /// Drop rows with no values (default: false)
    pub drop_empty_rows: bool,
    /// Drop columns with no values (default: false)
    pub drop_empty_columns: bool,
}

impl ReadParams {
    pub const REQUIRED: [&'static str; 2] = ["Gsheet", "Tab"];
    pub const OPTIONAL: [&'static str; 2] = ["Drop_Empty_Columns", "Drop_Empty_Rows"];
}

impl TryFrom<&Request> for ReadParams {
    type Error = ParamError;

    fn try_from(request: &Request) -> Result<Self, Self::Error> {
        request.log_params(&Self::REQUIRED, &Self::OPTIONAL);
        request.require(&Self::REQUIRED)?;
        Ok(ReadParams {
            gsheet: required::<GsheetParam, _>(request)?,
            tab: required::<TabParam, _>(request)?,
            drop_empty_rows: DropEmptyRowsParam::read(request)?.unwrap_or(false),
            drop_empty_columns: DropEmptyColumnsParam::read(request)?.unwrap_or(false),
        })
    }
}

/// Reads a parameter already known to be present.
fn required<P: NamedParam<T>, T>(request: &Request) -> Result<T, ParamError> {
    P::read(request)?.ok_or_else(|| MissingParams(vec![P::name().to_owned()]))
}
