use crate::bridge::Record;
use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value as Json};
use std::collections::BTreeMap;

pub const OK: u16 = 200;
pub const ACCEPTED: u16 = 202;
pub const UNPROCESSABLE: u16 = 422;
pub const INTERNAL_ERROR: u16 = 500;

/// Response envelope: a status code and a JSON body of the form `{"data": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON text of `{"data": <message or rows>}`
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl Response {
    /// Wraps arbitrary JSON data.
    pub fn data(data: Json, status_code: u16) -> Self {
        Response {
            status_code,
            body: json!({ "data": data }).to_string(),
            headers: BTreeMap::from([("Content-Type".to_owned(), "application/json".to_owned())]),
        }
    }

    /// Wraps a message, logging it at warn for failures and info otherwise.
    pub fn message(message: impl Into<String>, status_code: u16) -> Self {
        let message = message.into();
        if status_code >= 400 {
            warn!("{message}");
        } else {
            info!("{message}");
        }
        Self::data(Json::String(message), status_code)
    }

    /// Wraps a list of rows.
    pub fn records(records: Vec<Record>, status_code: u16) -> Self {
        Self::data(Json::Array(records.into_iter().map(Json::Object).collect()), status_code)
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decodes the `data` field of the body.
    pub fn data_value(&self) -> Option<Json> {
        let mut body: Json = serde_json::from_str(&self.body).ok()?;
        body.get_mut("data").map(Json::take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_envelope() {
        let response = Response::message("Overwrite successful", OK);
        assert!(response.is_success());
        assert_eq!(response.body, r#"{"data":"Overwrite successful"}"#);
        assert_eq!(response.data_value(), Some(json!("Overwrite successful")));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "statusCode": 200,
                "body": "{\"data\":\"Overwrite successful\"}",
                "headers": {"Content-Type": "application/json"},
            })
        );
    }

    #[test]
    fn test_records_envelope() {
        let record: Record = serde_json::from_value(json!({"id": 1})).unwrap();
        let response = Response::records(vec![record], OK);
        assert_eq!(response.data_value(), Some(json!([{"id": 1}])));
        assert!(!Response::message("bad", UNPROCESSABLE).is_success());
    }
}
