use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Message returned once a download has been written to disk.
pub const DOWNLOAD_DONE: &str = "Download Done.";

/// Message returned for uploads the API acknowledged without a body.
pub const REQUEST_PROCESSED: &str = "Request Processed.";

/// Status line and headers of the response that produced an outcome.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseMeta {
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// What a successful action hands back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Literal confirmation, e.g. [`DOWNLOAD_DONE`]
    Message { message: String },
    /// Decoded response body
    Decoded(Value),
}

impl Payload {
    pub(crate) fn message(text: &str) -> Self {
        Payload::Message {
            message: text.to_owned(),
        }
    }

    /// The confirmation text, if this payload is a literal message
    pub fn as_message(&self) -> Option<&str> {
        match self {
            Payload::Message { message } => Some(message),
            Payload::Decoded(_) => None,
        }
    }

    /// The decoded value, if the body was decoded
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Decoded(value) => Some(value),
            Payload::Message { .. } => None,
        }
    }

    /// Convert into a JSON value; messages become `{"message": ...}`
    pub fn into_value(self) -> Value {
        match self {
            Payload::Message { message } => serde_json::json!({ "message": message }),
            Payload::Decoded(value) => value,
        }
    }
}

/// Successful result of one NetStorage action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    meta: ResponseMeta,
    payload: Payload,
}

impl ActionOutcome {
    pub(crate) fn new(meta: ResponseMeta, payload: Payload) -> Self {
        Self { meta, payload }
    }

    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    /// Shorthand for `meta().status()`
    pub fn status(&self) -> StatusCode {
        self.meta.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_parts(self) -> (ResponseMeta, Payload) {
        (self.meta, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_payload() {
        let payload = Payload::message(DOWNLOAD_DONE);
        assert_eq!(payload.as_message(), Some("Download Done."));
        assert!(payload.as_value().is_none());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"message": "Download Done."})
        );
        assert_eq!(payload.into_value(), json!({"message": "Download Done."}));
    }

    #[test]
    fn test_decoded_payload() {
        let payload = Payload::Decoded(json!({"stat": {}}));
        assert!(payload.as_message().is_none());
        assert_eq!(payload.as_value(), Some(&json!({"stat": {}})));
    }

    #[test]
    fn test_outcome_parts() {
        let outcome = ActionOutcome::new(
            ResponseMeta::new(StatusCode::OK, HeaderMap::new()),
            Payload::message(REQUEST_PROCESSED),
        );
        assert_eq!(outcome.status(), StatusCode::OK);
        let (meta, payload) = outcome.into_parts();
        assert_eq!(meta.status(), StatusCode::OK);
        assert_eq!(payload.as_message(), Some("Request Processed."));
    }
}
