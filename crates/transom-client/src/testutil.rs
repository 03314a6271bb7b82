//! Shared test utilities and fixtures.

use serde_json::{Value, json};

use crate::session::SESSION_HEADER;
use crate::transport::{HttpRequest, HttpResponse};

/// A 2xx daemon answer wrapping `arguments` in a success envelope.
pub(crate) fn ok_response(arguments: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: json!({"result": "success", "arguments": arguments}).to_string(),
    }
}

/// A daemon answer whose `result` carries an error message.
pub(crate) fn error_response(message: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: json!({"result": message}).to_string(),
    }
}

/// The daemon's 409 token rejection, carrying the replacement token.
pub(crate) fn conflict_response(token: &str) -> HttpResponse {
    HttpResponse {
        status: 409,
        headers: vec![(SESSION_HEADER.to_string(), token.to_string())],
        body: String::new(),
    }
}

/// A bare HTTP status with no useful body.
pub(crate) fn status_response(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: String::new(),
    }
}

/// Decode a captured request body as JSON.
pub(crate) fn body_json(request: &HttpRequest) -> Value {
    serde_json::from_str(&request.body).expect("request body is not JSON")
}

/// The session token header attached to a captured request, if any.
pub(crate) fn session_header(request: &HttpRequest) -> Option<&str> {
    request
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(SESSION_HEADER))
        .map(|(_, value)| value.as_str())
}

/// A daemon-shaped torrent object for `torrent-get` answers.
pub(crate) fn torrent_json(id: i64, name: &str, hash: &str) -> Value {
    json!({
        "id": id,
        "hashString": hash,
        "name": name,
        "status": 4,
        "downloadDir": "/downloads",
        "percentDone": 0.5,
        "totalSize": 1000,
        "downloadedEver": 500,
        "rateDownload": 2048,
        "rateUpload": 128,
        "eta": 60,
        "error": 0,
        "errorString": ""
    })
}
