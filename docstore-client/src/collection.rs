//! Collection (index) lifecycle.

use crate::{
    client::{DocStoreClient, decode, refused},
    error::{DocStoreError, ErrorKind, Operation, Reason, Result, Target},
    schema::SchemaDefinition,
    wire,
};
use docstore_log::{debug, info, warn};
use opensearch::http::Method;
use serde::Deserialize;
use serde_json::Value;

/// Whether a structural change was confirmed by every participating node.
///
/// `false` is a degraded outcome, not a failure: the change was accepted
/// but not confirmed within the store's timeout.
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Acknowledged {
    /// Cluster-wide confirmation.
    #[serde(default)]
    pub acknowledged: bool,
    /// Whether the required shard copies started (newer stores only).
    #[serde(default)]
    pub shards_acknowledged: Option<bool>,
}

impl Acknowledged {
    /// Whether the change was confirmed.
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }
}

/// Collection lifecycle operations, from [`DocStoreClient::collections`].
#[derive(Clone, Debug)]
pub struct Collections {
    client: DocStoreClient,
}

impl Collections {
    pub(crate) fn new(client: DocStoreClient) -> Self {
        Self { client }
    }

    /// Check if a collection exists.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let op = Operation::CollectionExists;
        debug!("Checking if collection exists: {}", name);

        let path = wire::path([name])
            .map_err(refused(ErrorKind::Schema, op, &Target::collection(name)))?;
        let reply = self
            .client
            .request(op, Method::Head, &path, &[], None)
            .await?;

        match reply.status {
            200..=299 => Ok(true),
            404 => Ok(false),
            _ => Err(DocStoreError::Connection {
                operation: op,
                endpoint: self.client.endpoint().to_string(),
                reason: Reason::with_status(reply.status, format!("unexpected reply for {}", name)),
            }),
        }
    }

    /// Create a collection. Fails if it already exists.
    pub async fn create(&self, name: &str, schema: &SchemaDefinition) -> Result<Acknowledged> {
        let op = Operation::CreateCollection;
        let target = Target::collection(name);
        info!("Creating collection: {}", name);

        let body = schema
            .render(&self.client.version())
            .map_err(|message| DocStoreError::Schema {
                operation: op,
                target: target.clone(),
                reason: Reason::message(message),
            })?;

        let path = wire::path([name]).map_err(refused(ErrorKind::Schema, op, &target))?;
        let reply = self
            .client
            .request(op, Method::Put, &path, &[], Some(body))
            .await?;

        if !reply.is_success() {
            let reason = reply.reason();
            if reply
                .error_type()
                .is_some_and(|t| t.contains("already_exists"))
            {
                return Err(DocStoreError::Schema {
                    operation: op,
                    target,
                    reason: Reason {
                        message: format!("collection already exists: {}", reason.message),
                        ..reason
                    },
                });
            }
            return Err(DocStoreError::classify(ErrorKind::Schema, op, target, reason));
        }

        let ack: Acknowledged = decode(&reply, ErrorKind::Schema, op, &target)?;
        if !ack.is_acknowledged() {
            warn!("Creation of collection {} was not acknowledged", name);
        }
        Ok(ack)
    }

    /// Delete a collection and every document in it.
    pub async fn delete(&self, name: &str) -> Result<Acknowledged> {
        let op = Operation::DeleteCollection;
        let target = Target::collection(name);
        info!("Deleting collection: {}", name);

        let path = wire::path([name]).map_err(refused(ErrorKind::Schema, op, &target))?;
        let reply = self
            .client
            .request(op, Method::Delete, &path, &[], None)
            .await?;

        if !reply.is_success() {
            return Err(self.client.reject(ErrorKind::Schema, op, target, &reply));
        }

        let ack: Acknowledged = decode(&reply, ErrorKind::Schema, op, &target)?;
        if !ack.is_acknowledged() {
            warn!("Deletion of collection {} was not acknowledged", name);
        }
        Ok(ack)
    }

    /// Get a collection's settings and mappings as returned by the store.
    pub async fn get(&self, name: &str) -> Result<Value> {
        let op = Operation::GetCollection;
        let target = Target::collection(name);
        debug!("Getting collection: {}", name);

        let path = wire::path([name]).map_err(refused(ErrorKind::Read, op, &target))?;
        let reply = self
            .client
            .request(op, Method::Get, &path, &[], None)
            .await?;

        if !reply.is_success() {
            return Err(self.client.reject(ErrorKind::Read, op, target, &reply));
        }

        let body: Value = decode(&reply, ErrorKind::Read, op, &target)?;
        // Keyed by the concrete name, which differs when `name` is an alias.
        match body {
            Value::Object(map) if map.len() == 1 => {
                Ok(map.into_iter().next().map(|(_, v)| v).unwrap_or_default())
            }
            Value::Object(mut map) => Ok(map.remove(name).unwrap_or(Value::Object(map))),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledged_shapes() {
        let legacy: Acknowledged = serde_json::from_str(r#"{"acknowledged":true}"#).unwrap();
        assert!(legacy.is_acknowledged());
        assert_eq!(legacy.shards_acknowledged, None);

        let modern: Acknowledged = serde_json::from_str(
            r#"{"acknowledged":false,"shards_acknowledged":false,"index":"twitter"}"#,
        )
        .unwrap();
        assert!(!modern.is_acknowledged());
        assert_eq!(modern.shards_acknowledged, Some(false));
    }
}
