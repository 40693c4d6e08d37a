//! Calling one operation from another through a function invoker, and interpreting
//! the raw reply.

use crate::handler::read_sheet::handle_read;
use crate::handler::response::{ACCEPTED, INTERNAL_ERROR};
use crate::handler::write_sheet::handle_write;
use crate::spreadsheet::SheetStore;
use anyhow::anyhow;
use log::{info, warn};
use serde_json::Value as Json;
use std::collections::HashMap;

pub const NO_RESPONSE: &str = "Unknown error: no json_response. Called lambda may have timed out.";

/// How a function is invoked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvocationType {
    /// Wait for the function and receive its response payload
    RequestResponse,
    /// Queue the function and receive only a status
    Event,
}

impl InvocationType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvocationType::RequestResponse => "RequestResponse",
            InvocationType::Event => "Event",
        }
    }
}

/// What an invoker hands back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Raw response payload of a synchronous call
    Payload(Vec<u8>),
    /// Status of an asynchronous call
    Status(u16),
}

/// Runs a named function with a JSON payload.
pub trait Invoker {
    fn invoke(&self, function: &str, payload: &Json, mode: InvocationType) -> anyhow::Result<Reply>;
}

/// Invokes `function` and reduces its reply to `(data, status)`.
///
/// Asynchronous calls yield no data. Failures of the call itself, empty replies and
/// replies carrying `errorMessage` yield a message with status 500. Otherwise the
/// response envelope is unpacked: `body.error.message` if present, else `body.data`,
/// with the envelope's status code.
pub fn call<I: Invoker + ?Sized>(
    invoker: &I,
    function: &str,
    params: &Json,
    mode: InvocationType,
) -> (Option<Json>, u16) {
    info!("Invoking {function} ({})", mode.as_str());
    let reply = match invoker.invoke(function, params, mode) {
        Ok(reply) => reply,
        Err(error) => {
            warn!("Invocation of {function} failed: {error}");
            return (Some(Json::String(error.to_string())), INTERNAL_ERROR);
        }
    };

    let payload = match (mode, reply) {
        (InvocationType::Event, Reply::Status(status)) => return (None, status),
        (InvocationType::Event, Reply::Payload(_)) => return (None, ACCEPTED),
        (InvocationType::RequestResponse, Reply::Status(status)) => {
            warn!("{function} answered a synchronous call with status {status} only");
            return (Some(Json::String(NO_RESPONSE.to_owned())), INTERNAL_ERROR);
        }
        (InvocationType::RequestResponse, Reply::Payload(payload)) => payload,
    };

    match interpret(&payload) {
        Ok(result) => result,
        Err(error) => {
            warn!("Could not interpret reply of {function}: {error}");
            (Some(Json::String(error.to_string())), INTERNAL_ERROR)
        }
    }
}

/// Unpacks a synchronous reply payload.
fn interpret(payload: &[u8]) -> anyhow::Result<(Option<Json>, u16)> {
    let response: Json = if payload.iter().all(u8::is_ascii_whitespace) {
        Json::Null
    } else {
        serde_json::from_slice(payload)?
    };
    if is_falsy(&response) {
        return Ok((Some(Json::String(NO_RESPONSE.to_owned())), INTERNAL_ERROR));
    }
    if let Some(message) = response.get("errorMessage").filter(|message| !is_falsy(message)) {
        return Ok((Some(message.to_owned()), INTERNAL_ERROR));
    }

    let status = match response.get("statusCode") {
        Some(Json::Number(number)) => number.as_u64(),
        Some(Json::String(text)) => text.trim().parse().ok(),
        _ => None,
    }
    .and_then(|status| u16::try_from(status).ok())
    .ok_or_else(|| anyhow!("Reply has no valid statusCode"))?;

    let body = match response.get("body") {
        Some(Json::String(text)) => serde_json::from_str(text)?,
        Some(body) => body.to_owned(),
        None => Err(anyhow!("Reply has no body"))?,
    };
    if let Some(message) = body.get("error").filter(|error| !is_falsy(error)) {
        let message = message.get("message").cloned().unwrap_or(Json::Null);
        return Ok((Some(message), status));
    }
    let data = body
        .get("data")
        .cloned()
        .ok_or_else(|| anyhow!("Reply body has no data"))?;
    Ok((Some(data), status))
}

/// Null, false, zero and empty values.
fn is_falsy(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::Bool(flag) => !flag,
        Json::Number(number) => number.as_f64() == Some(0.0),
        Json::String(text) => text.is_empty(),
        Json::Array(items) => items.is_empty(),
        Json::Object(fields) => fields.is_empty(),
    }
}

/// Operations a [`LocalInvoker`] can route to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// Invoker that runs the read and write operations in process against a store.
pub struct LocalInvoker<'a, S: ?Sized> {
    store: &'a S,
    routes: HashMap<String, Operation>,
}

impl<'a, S: SheetStore + ?Sized> LocalInvoker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        LocalInvoker {
            store,
            routes: HashMap::new(),
        }
    }

    /// Registers a function name for an operation.
    pub fn route(mut self, function: impl Into<String>, operation: Operation) -> Self {
        self.routes.insert(function.into(), operation);
        self
    }
}

impl<S: SheetStore + ?Sized> Invoker for LocalInvoker<'_, S> {
    fn invoke(&self, function: &str, payload: &Json, mode: InvocationType) -> anyhow::Result<Reply> {
        let operation = self
            .routes
            .get(function)
            .ok_or_else(|| anyhow!("Function not found: {function}"))?;
        let response = match operation {
            Operation::Read => handle_read(self.store, payload),
            Operation::Write => handle_write(self.store, payload),
        };
        match mode {
            InvocationType::Event => Ok(Reply::Status(ACCEPTED)),
            InvocationType::RequestResponse => Ok(Reply::Payload(serde_json::to_vec(&response)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::memory::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Canned(Vec<u8>);

    impl Invoker for Canned {
        fn invoke(&self, _: &str, _: &Json, mode: InvocationType) -> anyhow::Result<Reply> {
            match mode {
                InvocationType::Event => Ok(Reply::Status(202)),
                InvocationType::RequestResponse => Ok(Reply::Payload(self.0.to_owned())),
            }
        }
    }

    fn sync(payload: &str) -> (Option<Json>, u16) {
        call(&Canned(payload.as_bytes().to_vec()), "f", &json!({}), InvocationType::RequestResponse)
    }

    #[test]
    fn test_async_call() {
        assert_eq!(call(&Canned(Vec::new()), "f", &json!({}), InvocationType::Event), (None, 202));
    }

    #[test]
    fn test_empty_replies() {
        let expected = (
            Some(json!("Unknown error: no json_response. Called lambda may have timed out.")),
            500,
        );
        assert_eq!(sync(""), expected);
        assert_eq!(sync("null"), expected);
        assert_eq!(sync("{}"), expected);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            sync(r#"{"errorMessage": "Task timed out"}"#),
            (Some(json!("Task timed out")), 500)
        );
    }

    #[test]
    fn test_body_error() {
        let payload = json!({
            "statusCode": 422,
            "body": json!({"error": {"message": "bad input"}}).to_string(),
        });
        assert_eq!(sync(&payload.to_string()), (Some(json!("bad input")), 422));
    }

    #[test]
    fn test_body_data() {
        let payload = json!({
            "statusCode": "200",
            "body": json!({"data": [{"id": 1}]}).to_string(),
        });
        assert_eq!(sync(&payload.to_string()), (Some(json!([{"id": 1}])), 200));
    }

    #[test]
    fn test_malformed_reply() {
        let (data, status) = sync(r#"{"body": "{}"}"#);
        assert_eq!(status, 500);
        assert_eq!(data, Some(json!("Reply has no valid statusCode")));
    }

    #[test]
    fn test_local_invoker() {
        let store = MemoryStore::new();
        store.set_tab("book", "people", &[&["id"], &["1"]]);
        let invoker = LocalInvoker::new(&store)
            .route("gsheet-read", Operation::Read)
            .route("gsheet-write", Operation::Write);

        let params = json!({"Gsheet": "book", "Tab": "people"});
        let result = call(&invoker, "gsheet-read", &params, InvocationType::RequestResponse);
        assert_eq!(result, (Some(json!([{"id": 1}])), 200));

        let params = json!({"Gsheet": "book", "Tab": "people", "Type": "Append_All", "Data": [{"id": 2}]});
        assert_eq!(call(&invoker, "gsheet-write", &params, InvocationType::Event), (None, 202));
        assert_eq!(store.grid("book", "people").unwrap(), vec![vec!["id"], vec!["1"], vec!["2"]]);

        let (data, status) = call(&invoker, "missing", &params, InvocationType::RequestResponse);
        assert_eq!(status, 500);
        assert_eq!(data, Some(json!("Function not found: missing")));
    }
}
