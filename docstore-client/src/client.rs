//! Document store client implementation.

use crate::{
    collection::Collections,
    config::ClientConfig,
    document::{DeleteResult, GetResponse, GetResult, PutResult, WriteResponse},
    error::{DocStoreError, ErrorKind, Operation, Reason, Result, Target},
    search::SearchBuilder,
    update::UpdateBuilder,
    version::{Distribution, ProtocolVersion},
    wire::{self, Reply, Wire},
};
use docstore_log::{debug, error, info, warn};
use opensearch::{
    OpenSearch,
    http::{
        Method, Url,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Usable.
    Connected,
    /// Closed explicitly or after a transport failure; every call fails.
    Disconnected,
}

/// Node information returned by the liveness handshake.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeInfo {
    /// Node name.
    #[serde(default)]
    pub name: Option<String>,
    /// Cluster name.
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// Version details.
    pub version: VersionInfo,
    /// Marketing line.
    #[serde(default)]
    pub tagline: Option<String>,
}

/// Version details of a node.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VersionInfo {
    /// Version number, e.g. `7.10.2`.
    pub number: String,
    /// `opensearch` on OpenSearch nodes; absent on Elasticsearch.
    #[serde(default)]
    pub distribution: Option<String>,
    /// Bundled Lucene version.
    #[serde(default)]
    pub lucene_version: Option<String>,
    /// Build hash.
    #[serde(default)]
    pub build_hash: Option<String>,
}

impl NodeInfo {
    /// The wire dialect this node speaks, if its version is parseable.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        let distribution = match self.version.distribution.as_deref() {
            Some(d) if d.eq_ignore_ascii_case("opensearch") => Distribution::OpenSearch,
            _ => Distribution::Elasticsearch,
        };
        ProtocolVersion::parse(&self.version.number, distribution)
    }
}

/// Result of [`DocStoreClient::ping`].
#[derive(Debug, Clone)]
pub struct PingResult {
    /// HTTP status code of the reply.
    pub status: u16,
    /// Node information.
    pub info: NodeInfo,
}

struct Inner {
    wire: Wire,
    config: ClientConfig,
    version: ProtocolVersion,
    connected: AtomicBool,
}

/// Client for a REST/JSON document store.
///
/// Cheap to clone; clones share one transport and one connection state.
#[derive(Clone)]
pub struct DocStoreClient {
    inner: Arc<Inner>,
}

impl DocStoreClient {
    /// Connect to the first reachable endpoint in `config`.
    ///
    /// With health-checking on, each endpoint gets a `GET /` handshake bounded
    /// by the connect timeout, and the version it reports selects the wire
    /// dialect. With it off, the first endpoint is taken on trust.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        info!("Connecting document store client to: {:?}", config.urls);

        if config.urls.is_empty() {
            return Err(connect_error("<none>", Reason::message("no endpoints configured")));
        }

        if !config.healthcheck {
            let url = &config.urls[0];
            let wire = build_wire(url, &config)
                .map_err(|reason| connect_error(url, Reason::message(reason)))?;
            let version = config.assumed_version.unwrap_or_default();
            info!("Using {} without handshake, assuming version {}", url, version);
            return Ok(Self::from_parts(wire, config, version));
        }

        let mut failures = Vec::new();
        for url in &config.urls {
            let wire = match build_wire(url, &config) {
                Ok(wire) => wire,
                Err(reason) => {
                    warn!("Skipping endpoint {}: {}", url, reason);
                    failures.push(format!("{}: {}", url, reason));
                    continue;
                }
            };

            match handshake(&wire, config.connect_timeout).await {
                Ok(node) => {
                    let version = node.protocol_version().unwrap_or_else(|| {
                        warn!(
                            "Unrecognised version {:?} from {}, assuming {}",
                            node.version.number,
                            url,
                            ProtocolVersion::LATEST
                        );
                        ProtocolVersion::LATEST
                    });
                    info!(
                        "Connected to {} (cluster {}), protocol {}",
                        url,
                        node.cluster_name.as_deref().unwrap_or("?"),
                        version
                    );
                    return Ok(Self::from_parts(wire, config, version));
                }
                Err(reason) => {
                    warn!("Endpoint {} failed handshake: {}", url, reason);
                    failures.push(format!("{}: {}", url, reason));
                }
            }
        }

        Err(connect_error(
            &config.urls.join(", "),
            Reason::message(failures.join("; ")),
        ))
    }

    fn from_parts(wire: Wire, config: ClientConfig, version: ProtocolVersion) -> Self {
        Self {
            inner: Arc::new(Inner {
                wire,
                config,
                version,
                connected: AtomicBool::new(true),
            }),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The endpoint in use.
    pub fn endpoint(&self) -> &str {
        self.inner.wire.endpoint()
    }

    /// The protocol version negotiated at connect time.
    pub fn version(&self) -> ProtocolVersion {
        self.inner.version
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        if self.inner.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Disconnect. Every later call on this client or its clones fails with
    /// a connection error.
    pub fn close(&self) {
        if self.inner.connected.swap(false, Ordering::SeqCst) {
            info!("Closed document store client for {}", self.endpoint());
        }
    }

    /// Collection lifecycle operations.
    pub fn collections(&self) -> Collections {
        Collections::new(self.clone())
    }

    /// Start a search over `collection`.
    pub fn search(&self, collection: impl Into<String>) -> SearchBuilder {
        SearchBuilder::new(self.clone()).collection(collection)
    }

    /// Start a scripted or partial update of one document.
    pub fn update_document(
        &self,
        collection: impl Into<String>,
        schema: impl Into<String>,
        id: impl Into<String>,
    ) -> UpdateBuilder {
        UpdateBuilder::new(self.clone(), collection.into(), schema.into(), id.into())
    }

    // =========================================================================
    // Cluster
    // =========================================================================

    /// Check that the store answers and report its version.
    pub async fn ping(&self) -> Result<PingResult> {
        let reply = self
            .request(Operation::Ping, Method::Get, "/", &[], None)
            .await?;

        if !reply.is_success() {
            return Err(DocStoreError::Connection {
                operation: Operation::Ping,
                endpoint: self.endpoint().to_string(),
                reason: reply.reason(),
            });
        }

        let info: NodeInfo = reply.json().map_err(|reason| DocStoreError::Connection {
            operation: Operation::Ping,
            endpoint: self.endpoint().to_string(),
            reason,
        })?;

        Ok(PingResult {
            status: reply.status,
            info,
        })
    }

    /// Ask a specific endpoint for its version number.
    ///
    /// Uses a one-off transport with this client's credentials; the
    /// client's own connection state is not involved.
    pub async fn server_version(&self, url: &str) -> Result<String> {
        self.ensure_connected(Operation::Ping)?;

        let wire = build_wire(url, &self.inner.config)
            .map_err(|reason| connect_error(url, Reason::message(reason)))?;
        let node = handshake(&wire, self.inner.config.connect_timeout)
            .await
            .map_err(|reason| DocStoreError::Connection {
                operation: Operation::Ping,
                endpoint: url.to_string(),
                reason,
            })?;

        Ok(node.version.number)
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Insert or fully replace a document from a structured record.
    pub async fn put_document<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        schema: &str,
        id: &str,
        doc: &T,
    ) -> Result<PutResult> {
        let body = serde_json::to_string(doc).map_err(|e| DocStoreError::Write {
            operation: Operation::PutDocument,
            target: Target::document(collection, schema, id),
            reason: Reason::message(format!("cannot serialise document: {}", e)),
        })?;
        self.write_document(collection, schema, Some(id), body).await
    }

    /// Insert or fully replace a document from a pre-serialised payload,
    /// forwarded unmodified.
    pub async fn put_raw_document(
        &self,
        collection: &str,
        schema: &str,
        id: &str,
        raw: impl Into<String>,
    ) -> Result<PutResult> {
        self.write_document(collection, schema, Some(id), raw.into())
            .await
    }

    /// Insert a document under a store-assigned id.
    pub async fn add_document<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        schema: &str,
        doc: &T,
    ) -> Result<PutResult> {
        let body = serde_json::to_string(doc).map_err(|e| DocStoreError::Write {
            operation: Operation::PutDocument,
            target: Target::schema(collection, schema),
            reason: Reason::message(format!("cannot serialise document: {}", e)),
        })?;
        self.write_document(collection, schema, None, body).await
    }

    async fn write_document(
        &self,
        collection: &str,
        schema: &str,
        id: Option<&str>,
        body: String,
    ) -> Result<PutResult> {
        let op = Operation::PutDocument;
        let target = match id {
            Some(id) => Target::document(collection, schema, id),
            None => Target::schema(collection, schema),
        };
        debug!("Indexing document {} ({} bytes)", target, body.len());

        let (method, path) = match id {
            Some(id) => (Method::Put, self.document_path(collection, schema, id)),
            None => (Method::Post, self.schema_path(collection, schema)),
        };
        let path = path.map_err(refused(ErrorKind::Write, op, &target))?;

        let reply = self.request(op, method, &path, &[], Some(body)).await?;
        if !reply.is_success() {
            return Err(self.reject(ErrorKind::Write, op, target, &reply));
        }

        let response: WriteResponse = decode(&reply, ErrorKind::Write, op, &target)?;
        let version = response
            .required_version(reply.status)
            .map_err(refused(ErrorKind::Write, op, &target))?;
        let created = response.created();

        Ok(PutResult {
            id: response
                .id
                .or_else(|| id.map(str::to_string))
                .unwrap_or_default(),
            collection: response.index.unwrap_or_else(|| collection.to_string()),
            schema: self.reported_schema(response.doc_type, schema),
            version,
            created,
        })
    }

    /// Look a document up by id. Absence is reported via `found == false`.
    pub async fn get_document(
        &self,
        collection: &str,
        schema: &str,
        id: &str,
    ) -> Result<GetResult> {
        let op = Operation::GetDocument;
        let target = Target::document(collection, schema, id);
        debug!("Getting document {}", target);

        let path = self
            .document_path(collection, schema, id)
            .map_err(refused(ErrorKind::Read, op, &target))?;
        let reply = self.request(op, Method::Get, &path, &[], None).await?;

        if !reply.is_success() && !(reply.is_not_found() && !has_error(&reply)) {
            return Err(self.reject(ErrorKind::Read, op, target, &reply));
        }

        let response: GetResponse = decode(&reply, ErrorKind::Read, op, &target)?;

        Ok(GetResult {
            collection: collection.to_string(),
            schema: self.reported_schema(response.doc_type, schema),
            id: response.id.unwrap_or_else(|| id.to_string()),
            found: response.found,
            version: response.version.filter(|_| response.found),
            source: response.source.filter(|_| response.found),
        })
    }

    /// Remove a document. Absence is reported via `found == false`.
    pub async fn delete_document(
        &self,
        collection: &str,
        schema: &str,
        id: &str,
    ) -> Result<DeleteResult> {
        let op = Operation::DeleteDocument;
        let target = Target::document(collection, schema, id);
        debug!("Deleting document {}", target);

        let path = self
            .document_path(collection, schema, id)
            .map_err(refused(ErrorKind::Write, op, &target))?;
        let reply = self.request(op, Method::Delete, &path, &[], None).await?;

        if !reply.is_success() && !(reply.is_not_found() && !has_error(&reply)) {
            return Err(self.reject(ErrorKind::Write, op, target, &reply));
        }

        let response: WriteResponse = decode(&reply, ErrorKind::Write, op, &target)?;

        Ok(DeleteResult {
            id: response.id.clone().unwrap_or_else(|| id.to_string()),
            found: reply.is_success() && response.found(),
            version: response.version,
        })
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Commit buffered writes and make them visible to reads and searches.
    pub async fn flush(&self, collection: &str) -> Result<ShardsAck> {
        let op = Operation::Flush;
        let target = Target::collection(collection);
        debug!("Flushing collection {}", collection);

        let path = wire::path([collection, "_flush"])
            .map_err(refused(ErrorKind::Write, op, &target))?;
        let reply = self.request(op, Method::Post, &path, &[], None).await?;
        if !reply.is_success() {
            return Err(self.reject(ErrorKind::Write, op, target, &reply));
        }
        let flushed = decode::<ShardsEnvelope>(&reply, ErrorKind::Write, op, &target)?.shards;

        let refreshed = self.refresh(collection).await?;

        Ok(ShardsAck {
            total: flushed.total.max(refreshed.total),
            successful: flushed.successful.min(refreshed.successful),
            failed: flushed.failed.max(refreshed.failed),
        })
    }

    /// Make recent writes searchable without a commit.
    pub async fn refresh(&self, collection: &str) -> Result<ShardsAck> {
        let op = Operation::Refresh;
        let target = Target::collection(collection);
        debug!("Refreshing collection {}", collection);

        let path = wire::path([collection, "_refresh"])
            .map_err(refused(ErrorKind::Write, op, &target))?;
        let reply = self.request(op, Method::Post, &path, &[], None).await?;
        if !reply.is_success() {
            return Err(self.reject(ErrorKind::Write, op, target, &reply));
        }

        Ok(decode::<ShardsEnvelope>(&reply, ErrorKind::Write, op, &target)?.shards)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Path of one document for the negotiated dialect.
    pub(crate) fn document_path(
        &self,
        collection: &str,
        schema: &str,
        id: &str,
    ) -> std::result::Result<String, Reason> {
        if self.inner.version.uses_mapping_types() {
            wire::path([collection, schema, id])
        } else {
            wire::path([collection, "_doc", id])
        }
    }

    /// Path that accepts store-assigned ids.
    pub(crate) fn schema_path(
        &self,
        collection: &str,
        schema: &str,
    ) -> std::result::Result<String, Reason> {
        if self.inner.version.uses_mapping_types() {
            wire::path([collection, schema])
        } else {
            wire::path([collection, "_doc"])
        }
    }

    /// Schema name to report back to the caller.
    ///
    /// Typeless stores answer `_doc` (or nothing); the requested name is
    /// what the caller addressed.
    fn reported_schema(&self, reported: Option<String>, requested: &str) -> String {
        match reported {
            Some(schema) if self.inner.version.uses_mapping_types() => schema,
            _ => requested.to_string(),
        }
    }

    fn ensure_connected(&self, operation: Operation) -> Result<()> {
        match self.state() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Disconnected => Err(DocStoreError::Connection {
                operation,
                endpoint: self.endpoint().to_string(),
                reason: Reason::message("client is disconnected"),
            }),
        }
    }

    /// Send a request on the active endpoint.
    ///
    /// Only transport failures are errors here; any HTTP status comes back
    /// as a [`Reply`]. A timeout fails the call alone; any other transport
    /// failure disconnects the client.
    pub(crate) async fn request(
        &self,
        operation: Operation,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<Reply> {
        self.ensure_connected(operation)?;

        match self.inner.wire.send(method, path, query, body, None).await {
            Ok(reply) => Ok(reply),
            Err(e) if e.is_timeout() => {
                warn!(
                    "Request timed out during {} on {}: {}",
                    operation,
                    self.endpoint(),
                    e
                );
                Err(DocStoreError::Connection {
                    operation,
                    endpoint: self.endpoint().to_string(),
                    reason: Reason::message(e.to_string()),
                })
            }
            Err(e) => {
                error!(
                    "Transport failure during {} on {}: {}",
                    operation,
                    self.endpoint(),
                    e
                );
                self.inner.connected.store(false, Ordering::SeqCst);
                Err(DocStoreError::Connection {
                    operation,
                    endpoint: self.endpoint().to_string(),
                    reason: Reason::message(e.to_string()),
                })
            }
        }
    }

    /// Turn a non-success reply into an error of `kind`, or `NotFound` when
    /// the store reports a missing collection or document.
    pub(crate) fn reject(
        &self,
        kind: ErrorKind,
        operation: Operation,
        target: Target,
        reply: &Reply,
    ) -> DocStoreError {
        if reply.is_not_found() {
            let target = match reply.error_type().as_deref() {
                Some(t) if t.contains("index_not_found") || t.contains("index_missing") => {
                    Target {
                        collection: target.collection,
                        ..Target::default()
                    }
                }
                _ => target,
            };
            return DocStoreError::NotFound { operation, target };
        }

        DocStoreError::classify(kind, operation, target, reply.reason())
    }
}

impl std::fmt::Debug for DocStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocStoreClient")
            .field("endpoint", &self.endpoint())
            .field("version", &self.inner.version)
            .field("state", &self.state())
            .finish()
    }
}

/// Shard-level outcome of flush and refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ShardsAck {
    /// Shards addressed.
    #[serde(default)]
    pub total: u32,
    /// Shards that succeeded.
    #[serde(default)]
    pub successful: u32,
    /// Shards that failed.
    #[serde(default)]
    pub failed: u32,
}

impl ShardsAck {
    /// Whether every addressed shard succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.successful >= self.total
    }
}

#[derive(Deserialize)]
struct ShardsEnvelope {
    #[serde(rename = "_shards", default)]
    shards: ShardsAck,
}

/// Decode a reply body, classifying failures as `kind`.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    reply: &Reply,
    kind: ErrorKind,
    operation: Operation,
    target: &Target,
) -> Result<T> {
    reply
        .json()
        .map_err(|reason| DocStoreError::classify(kind, operation, target.clone(), reason))
}

/// Turn a locally detected problem into the error of `kind`.
pub(crate) fn refused(
    kind: ErrorKind,
    operation: Operation,
    target: &Target,
) -> impl FnOnce(Reason) -> DocStoreError + '_ {
    move |reason| DocStoreError::classify(kind, operation, target.clone(), reason)
}

/// Whether a reply carries an `error` object rather than a normal body.
fn has_error(reply: &Reply) -> bool {
    reply.reason().error_type.is_some()
}

fn connect_error(endpoint: &str, reason: Reason) -> DocStoreError {
    DocStoreError::Connection {
        operation: Operation::Connect,
        endpoint: endpoint.to_string(),
        reason,
    }
}

/// Build a transport for one endpoint.
fn build_wire(url: &str, config: &ClientConfig) -> std::result::Result<Wire, String> {
    let parsed = Url::parse(url).map_err(|e| format!("invalid URL: {}", e))?;

    let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(parsed))
        .timeout(config.request_timeout)
        .disable_proxy();

    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder = builder.auth(opensearch::auth::Credentials::Basic(
            user.clone(),
            pass.clone(),
        ));
    }

    let transport = builder.build().map_err(|e| e.to_string())?;
    Ok(Wire::new(OpenSearch::new(transport), url))
}

/// `GET /`, with the whole exchange (body read included) bounded by `timeout`.
async fn handshake(wire: &Wire, timeout: Duration) -> std::result::Result<NodeInfo, Reason> {
    let reply = tokio::time::timeout(timeout, wire.send(Method::Get, "/", &[], None, Some(timeout)))
        .await
        .map_err(|_| Reason::message(format!("no answer within {:?}", timeout)))?
        .map_err(|e| Reason::message(e.to_string()))?;

    if !reply.is_success() {
        return Err(reply.reason());
    }

    reply.json()
}
