//! Error types for document store operations.

use std::fmt;
use thiserror::Error;

/// The operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Connection handshake.
    Connect,
    /// Liveness check.
    Ping,
    /// Collection existence check.
    CollectionExists,
    /// Collection creation.
    CreateCollection,
    /// Collection removal.
    DeleteCollection,
    /// Collection settings/mapping lookup.
    GetCollection,
    /// Document insert or replace.
    PutDocument,
    /// Document point lookup.
    GetDocument,
    /// Document removal.
    DeleteDocument,
    /// Scripted document update.
    UpdateDocument,
    /// Flush of buffered writes.
    Flush,
    /// Refresh of the searchable view.
    Refresh,
    /// Query execution.
    Search,
    /// Match counting.
    Count,
}

impl Operation {
    /// Short snake_case name, as used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Ping => "ping",
            Operation::CollectionExists => "collection_exists",
            Operation::CreateCollection => "create_collection",
            Operation::DeleteCollection => "delete_collection",
            Operation::GetCollection => "get_collection",
            Operation::PutDocument => "put_document",
            Operation::GetDocument => "get_document",
            Operation::DeleteDocument => "delete_document",
            Operation::UpdateDocument => "update_document",
            Operation::Flush => "flush",
            Operation::Refresh => "refresh",
            Operation::Search => "search",
            Operation::Count => "count",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an operation was aimed at: a collection, optionally narrowed to a
/// schema name and a document id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// Collection (index) name.
    pub collection: Option<String>,
    /// Schema (mapping type) name.
    pub schema: Option<String>,
    /// Document id.
    pub id: Option<String>,
}

impl Target {
    /// Target a whole collection.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            ..Self::default()
        }
    }

    /// Target a single document.
    pub fn document(
        collection: impl Into<String>,
        schema: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            collection: Some(collection.into()),
            schema: Some(schema.into()),
            id: Some(id.into()),
        }
    }

    /// Target a schema inside a collection (no id yet).
    pub fn schema(collection: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            schema: Some(schema.into()),
            id: None,
        }
    }

    /// The cluster itself.
    pub fn cluster() -> Self {
        Self::default()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.collection, &self.schema, &self.id]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();

        if parts.is_empty() {
            f.write_str("<cluster>")
        } else {
            f.write_str(&parts.join("/"))
        }
    }
}

/// Failure details reported by the store (or by the transport).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reason {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// The store's error type, e.g. `index_already_exists_exception`.
    pub error_type: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl Reason {
    /// A reason with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// A reason carrying an HTTP status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            error_type: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.error_type) {
            (Some(status), Some(kind)) => write!(f, "[{status} {kind}] {}", self.message),
            (Some(status), None) => write!(f, "[{status}] {}", self.message),
            (None, Some(kind)) => write!(f, "[{kind}] {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Six-way classification of [`DocStoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store unreachable, handshake failed, or client closed.
    Connection,
    /// Collection declare/drop problem.
    Schema,
    /// Index or update failure.
    Write,
    /// Lookup failure other than not-found.
    Read,
    /// Malformed or unexecutable search.
    Query,
    /// Operating on something absent where absence is not a valid outcome.
    NotFound,
}

/// Document store error type.
#[derive(Error, Debug)]
pub enum DocStoreError {
    /// The store could not be reached, or the client is disconnected.
    #[error("connection error during {operation} ({endpoint}): {reason}")]
    Connection {
        /// Operation in flight.
        operation: Operation,
        /// Endpoint(s) involved.
        endpoint: String,
        /// Failure details.
        reason: Reason,
    },

    /// Collection declare/drop failure.
    #[error("schema error during {operation} on {target}: {reason}")]
    Schema {
        /// Operation in flight.
        operation: Operation,
        /// Collection involved.
        target: Target,
        /// Failure details.
        reason: Reason,
    },

    /// Index, update or flush failure.
    #[error("write error during {operation} on {target}: {reason}")]
    Write {
        /// Operation in flight.
        operation: Operation,
        /// Document or collection involved.
        target: Target,
        /// Failure details.
        reason: Reason,
    },

    /// Lookup failure.
    #[error("read error during {operation} on {target}: {reason}")]
    Read {
        /// Operation in flight.
        operation: Operation,
        /// Document or collection involved.
        target: Target,
        /// Failure details.
        reason: Reason,
    },

    /// Search failure.
    #[error("query error during {operation} on {target}: {reason}")]
    Query {
        /// Operation in flight.
        operation: Operation,
        /// Collection(s) searched.
        target: Target,
        /// Failure details.
        reason: Reason,
    },

    /// Missing collection or document.
    #[error("not found during {operation}: {target}")]
    NotFound {
        /// Operation in flight.
        operation: Operation,
        /// What was missing.
        target: Target,
    },
}

impl DocStoreError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocStoreError::Connection { .. } => ErrorKind::Connection,
            DocStoreError::Schema { .. } => ErrorKind::Schema,
            DocStoreError::Write { .. } => ErrorKind::Write,
            DocStoreError::Read { .. } => ErrorKind::Read,
            DocStoreError::Query { .. } => ErrorKind::Query,
            DocStoreError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// The operation that failed.
    pub fn operation(&self) -> Operation {
        match self {
            DocStoreError::Connection { operation, .. }
            | DocStoreError::Schema { operation, .. }
            | DocStoreError::Write { operation, .. }
            | DocStoreError::Read { operation, .. }
            | DocStoreError::Query { operation, .. }
            | DocStoreError::NotFound { operation, .. } => *operation,
        }
    }

    /// The target of the failed operation, if it had one.
    pub fn target(&self) -> Option<&Target> {
        match self {
            DocStoreError::Connection { .. } => None,
            DocStoreError::Schema { target, .. }
            | DocStoreError::Write { target, .. }
            | DocStoreError::Read { target, .. }
            | DocStoreError::Query { target, .. }
            | DocStoreError::NotFound { target, .. } => Some(target),
        }
    }

    /// HTTP status reported by the store, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DocStoreError::Connection { reason, .. }
            | DocStoreError::Schema { reason, .. }
            | DocStoreError::Write { reason, .. }
            | DocStoreError::Read { reason, .. }
            | DocStoreError::Query { reason, .. } => reason.status,
            DocStoreError::NotFound { .. } => Some(404),
        }
    }

    /// Build the error of `kind` for `operation` on `target`.
    ///
    /// `NotFound` ignores the reason; `Connection` uses the target as the
    /// endpoint description.
    pub(crate) fn classify(
        kind: ErrorKind,
        operation: Operation,
        target: Target,
        reason: Reason,
    ) -> Self {
        match kind {
            ErrorKind::Connection => DocStoreError::Connection {
                operation,
                endpoint: target.to_string(),
                reason,
            },
            ErrorKind::Schema => DocStoreError::Schema {
                operation,
                target,
                reason,
            },
            ErrorKind::Write => DocStoreError::Write {
                operation,
                target,
                reason,
            },
            ErrorKind::Read => DocStoreError::Read {
                operation,
                target,
                reason,
            },
            ErrorKind::Query => DocStoreError::Query {
                operation,
                target,
                reason,
            },
            ErrorKind::NotFound => DocStoreError::NotFound { operation, target },
        }
    }
}

/// Result type alias for document store operations.
pub type Result<T> = std::result::Result<T, DocStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        assert_eq!(Target::cluster().to_string(), "<cluster>");
        assert_eq!(Target::collection("twitter").to_string(), "twitter");
        assert_eq!(
            Target::document("twitter", "tweet", "1").to_string(),
            "twitter/tweet/1"
        );
    }

    #[test]
    fn test_reason_display() {
        let reason = Reason {
            status: Some(400),
            error_type: Some("index_already_exists_exception".to_string()),
            message: "already exists".to_string(),
        };
        assert_eq!(
            reason.to_string(),
            "[400 index_already_exists_exception] already exists"
        );
        assert_eq!(Reason::message("boom").to_string(), "boom");
    }

    #[test]
    fn test_error_carries_context() {
        let err = DocStoreError::classify(
            ErrorKind::Write,
            Operation::PutDocument,
            Target::document("twitter", "tweet", "1"),
            Reason::with_status(500, "shard failure"),
        );

        assert_eq!(err.kind(), ErrorKind::Write);
        assert_eq!(err.operation(), Operation::PutDocument);
        assert_eq!(err.status(), Some(500));

        let display = err.to_string();
        assert!(display.contains("put_document"));
        assert!(display.contains("twitter/tweet/1"));
        assert!(display.contains("shard failure"));
    }

    #[test]
    fn test_not_found_classification() {
        let err = DocStoreError::classify(
            ErrorKind::NotFound,
            Operation::DeleteCollection,
            Target::collection("missing"),
            Reason::message("ignored"),
        );

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.target(), Some(&Target::collection("missing")));
    }
}
