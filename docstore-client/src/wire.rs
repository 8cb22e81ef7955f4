//! Request plumbing over the `opensearch` transport.
//!
//! Every call goes through [`Wire::send`] with an explicit method and path so
//! that both typed (`/{index}/{type}/{id}`) and typeless (`/{index}/_doc/{id}`)
//! layouts can be expressed against the same transport.

use crate::error::Reason;
use docstore_log::debug;
use opensearch::{
    OpenSearch,
    http::{Method, headers::HeaderMap},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Characters left as-is inside a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',')
    .remove(b'*');

/// Build a request path from raw segments, percent-encoding each one.
///
/// Empty, `.` and `..` segments are refused. URL resolution drops or climbs
/// over them (`%2E` and `%2E%2E` included), which would address a different
/// resource than the one named.
pub(crate) fn path<'a>(
    segments: impl IntoIterator<Item = &'a str>,
) -> std::result::Result<String, Reason> {
    let mut path = String::new();
    for segment in segments {
        if matches!(segment, "" | "." | "..") {
            return Err(Reason::message(format!(
                "{:?} is not addressable as a path segment",
                segment
            )));
        }
        path.push('/');
        path.extend(utf8_percent_encode(segment, SEGMENT));
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok(path)
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub(crate) struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Decode the body.
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, Reason> {
        serde_json::from_str(&self.body).map_err(|e| {
            Reason::with_status(self.status, format!("undecodable response: {}", e))
        })
    }

    /// The store's explanation for a non-success reply.
    ///
    /// Understands both the structured `{"error": {"type", "reason"}}` shape
    /// and the plain `{"error": "TypeException[msg]"}` string of old releases.
    pub fn reason(&self) -> Reason {
        let mut reason = Reason {
            status: Some(self.status),
            error_type: None,
            message: String::new(),
        };

        match serde_json::from_str::<Value>(&self.body) {
            Ok(body) => match &body["error"] {
                Value::Object(error) => {
                    // Root cause is more specific when present.
                    let cause = error
                        .get("root_cause")
                        .and_then(|c| c.get(0))
                        .and_then(Value::as_object)
                        .unwrap_or(error);
                    reason.error_type = cause
                        .get("type")
                        .or_else(|| error.get("type"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    reason.message = cause
                        .get("reason")
                        .or_else(|| error.get("reason"))
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string();
                }
                Value::String(text) => {
                    if let Some((kind, _)) = text.split_once('[') {
                        reason.error_type = Some(kind.trim().to_string());
                    }
                    reason.message = text.clone();
                }
                _ => {
                    reason.message = if self.body.is_empty() {
                        format!("HTTP {}", self.status)
                    } else {
                        self.body.clone()
                    };
                }
            },
            Err(_) => {
                reason.message = if self.body.is_empty() {
                    format!("HTTP {}", self.status)
                } else {
                    self.body.clone()
                };
            }
        }

        reason
    }

    /// The store's error type, lower-cased and normalised to snake_case, so
    /// that `IndexAlreadyExistsException` and `index_already_exists_exception`
    /// compare equal.
    pub fn error_type(&self) -> Option<String> {
        self.reason().error_type.map(|t| normalize_error_type(&t))
    }
}

fn normalize_error_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for (i, c) in raw.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// One endpoint's transport plus the URL it talks to.
#[derive(Clone)]
pub(crate) struct Wire {
    client: OpenSearch,
    endpoint: String,
}

impl Wire {
    pub fn new(client: OpenSearch, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and read the whole response.
    ///
    /// An `Err` means no HTTP response was obtained at all.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
        timeout: Option<Duration>,
    ) -> std::result::Result<Reply, opensearch::Error> {
        debug!("{:?} {}{}", method, self.endpoint, path);

        let query_string: Option<&[(&str, &str)]> =
            if query.is_empty() { None } else { Some(query) };

        let response = self
            .client
            .send(method, path, HeaderMap::new(), query_string, body, timeout)
            .await?;

        let status = response.status_code().as_u16();
        let body = response.text().await?;

        debug!("{} {} -> {}", self.endpoint, path, status);

        Ok(Reply { status, body })
    }
}
