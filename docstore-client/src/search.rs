//! Search builder and results.

use crate::{
    client::{DocStoreClient, decode, refused},
    error::{ErrorKind, Operation, Reason, Result, Target},
    query::Query,
    wire,
};
use docstore_log::debug;
use opensearch::http::Method;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value, json, value::RawValue};
use std::collections::HashMap;

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Search builder for constructing and executing searches.
#[derive(Clone, Debug)]
pub struct SearchBuilder {
    client: DocStoreClient,
    collections: Vec<String>,
    schemas: Vec<String>,
    query: Option<Query>,
    from: Option<u64>,
    size: Option<u64>,
    sort: Vec<Value>,
    source_includes: Option<Vec<String>>,
    source_excludes: Option<Vec<String>>,
    pretty: bool,
    track_total_hits: Option<bool>,
}

impl SearchBuilder {
    pub(crate) fn new(client: DocStoreClient) -> Self {
        Self {
            client,
            collections: Vec::new(),
            schemas: Vec::new(),
            query: None,
            from: None,
            size: None,
            sort: Vec::new(),
            source_includes: None,
            source_excludes: None,
            pretty: false,
            track_total_hits: None,
        }
    }

    /// Add a collection to search.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collections.push(collection.into());
        self
    }

    /// Restrict to a schema name. Ignored by stores without mapping types.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schemas.push(schema.into());
        self
    }

    /// Set the query. Without one, every document matches.
    pub fn query(mut self, query: impl Into<Query>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Zero-based offset of the first hit returned.
    pub fn from(mut self, from: u64) -> Self {
        self.from = Some(from);
        self
    }

    /// Maximum number of hits returned.
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sort by `field`, ascending or descending.
    pub fn sort(self, field: impl Into<String>, ascending: bool) -> Self {
        let order = if ascending {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };
        self.sort_by(field, order)
    }

    /// Sort by `field`.
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        let field: String = field.into();
        self.sort.push(json!({ field: { "order": order.as_str() } }));
        self
    }

    /// Sort by relevance.
    pub fn sort_by_score(self, order: SortOrder) -> Self {
        self.sort_by("_score", order)
    }

    /// Include only specific fields in each hit's source.
    pub fn source_includes(mut self, fields: Vec<String>) -> Self {
        self.source_includes = Some(fields);
        self
    }

    /// Exclude specific fields from each hit's source.
    pub fn source_excludes(mut self, fields: Vec<String>) -> Self {
        self.source_excludes = Some(fields);
        self
    }

    /// Ask the store to pretty-print its response.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Count all matches exactly rather than stopping at the store's cap.
    /// Only sent to stores that report `{value, relation}` totals.
    pub fn track_total_hits(mut self, track: bool) -> Self {
        self.track_total_hits = Some(track);
        self
    }

    fn query_json(&self) -> Value {
        self.query
            .as_ref()
            .map(Query::to_json)
            .unwrap_or_else(|| Query::MatchAll.to_json())
    }

    fn build_body(&self) -> Value {
        let mut body = Map::new();

        body.insert("query".to_string(), self.query_json());

        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        if !self.sort.is_empty() {
            body.insert("sort".to_string(), Value::Array(self.sort.clone()));
        }

        let mut source = Map::new();
        if let Some(includes) = &self.source_includes {
            source.insert("includes".to_string(), json!(includes));
        }
        if let Some(excludes) = &self.source_excludes {
            source.insert("excludes".to_string(), json!(excludes));
        }
        if !source.is_empty() {
            body.insert("_source".to_string(), Value::Object(source));
        }

        if let Some(track) = self.track_total_hits {
            if !self.client.version().reports_bare_total() {
                body.insert("track_total_hits".to_string(), json!(track));
            }
        }

        Value::Object(body)
    }

    fn path(&self, endpoint: &str) -> std::result::Result<String, Reason> {
        let collections = self.collections.join(",");
        if !self.schemas.is_empty() && self.client.version().uses_mapping_types() {
            wire::path([collections.as_str(), self.schemas.join(",").as_str(), endpoint])
        } else {
            if !self.schemas.is_empty() {
                debug!("Ignoring schema filter {:?} on a typeless store", self.schemas);
            }
            wire::path([collections.as_str(), endpoint])
        }
    }

    fn target(&self) -> Target {
        Target {
            collection: Some(self.collections.join(",")),
            schema: (!self.schemas.is_empty()).then(|| self.schemas.join(",")),
            id: None,
        }
    }

    /// Execute the search.
    pub async fn execute(self) -> Result<SearchResult> {
        let op = Operation::Search;
        let target = self.target();
        let path = self
            .path("_search")
            .map_err(refused(ErrorKind::Query, op, &target))?;
        let body = self.build_body();

        debug!("Searching {}: {}", target, body);

        let query: &[(&str, &str)] = if self.pretty { &[("pretty", "true")] } else { &[] };
        let reply = self
            .client
            .request(op, Method::Post, &path, query, Some(body.to_string()))
            .await?;

        if !reply.is_success() {
            return Err(self.client.reject(ErrorKind::Query, op, target, &reply));
        }

        let response: SearchResponse = decode(&reply, ErrorKind::Query, op, &target)?;
        let (total, total_relation) = resolve_total(response.hits.total);
        if total.is_none() {
            debug!("Store reported no total for {}", target);
        }

        Ok(SearchResult {
            took_ms: response.took,
            timed_out: response.timed_out,
            total,
            total_relation,
            max_score: response.hits.max_score,
            hits: response.hits.hits,
        })
    }

    /// Count matching documents without fetching them.
    pub async fn count(self) -> Result<u64> {
        let op = Operation::Count;
        let target = self.target();
        let path = self
            .path("_count")
            .map_err(refused(ErrorKind::Query, op, &target))?;
        let body = json!({ "query": self.query_json() });

        let reply = self
            .client
            .request(op, Method::Post, &path, &[], Some(body.to_string()))
            .await?;

        if !reply.is_success() {
            return Err(self.client.reject(ErrorKind::Query, op, target, &reply));
        }

        let response: CountResponse = decode(&reply, ErrorKind::Query, op, &target)?;
        Ok(response.count)
    }
}

/// Whether the total is exact or a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    /// Exact count.
    #[default]
    Eq,
    /// At least this many.
    Gte,
}

/// One matching document.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    /// Collection the hit came from.
    #[serde(rename = "_index")]
    pub collection: String,
    /// Schema name, on stores that report one.
    #[serde(rename = "_type", default)]
    pub schema: Option<String>,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score; absent when sorting by a field.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Sort values, when sorted.
    #[serde(default)]
    pub sort: Option<Vec<Value>>,
    /// Highlighted fragments per field.
    #[serde(default)]
    pub highlight: Option<HashMap<String, Vec<String>>>,
    /// Stored document, undecoded.
    #[serde(rename = "_source", default)]
    pub source: Option<Box<RawValue>>,
}

impl Hit {
    /// Decode this hit's document into the caller's record type.
    pub fn source_as<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.source
            .as_deref()
            .map(|raw| serde_json::from_str(raw.get()))
            .transpose()
    }
}

/// Search result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Execution time reported by the store, in milliseconds.
    pub took_ms: u64,
    /// Whether the store cut the search short.
    pub timed_out: bool,
    /// Total matching documents, independent of `from`/`size`.
    ///
    /// `None` when the store did not count, e.g. after
    /// `track_total_hits(false)`.
    pub total: Option<u64>,
    /// Whether `total` is exact. `Gte` when no total was reported.
    pub total_relation: TotalRelation,
    /// Highest score among the hits.
    pub max_score: Option<f64>,
    /// The requested window of hits, in order.
    pub hits: Vec<Hit>,
}

impl SearchResult {
    /// Total matching documents, if the store counted them.
    pub fn total_hits(&self) -> Option<u64> {
        self.total
    }

    /// Number of hits in this window.
    pub fn hits_len(&self) -> usize {
        self.hits.len()
    }

    /// Decode every hit's document, in order.
    ///
    /// Fails on the first hit that does not decode; hits without a source
    /// are skipped.
    pub fn sources<T: DeserializeOwned>(&self) -> serde_json::Result<Vec<T>> {
        let mut docs = Vec::with_capacity(self.hits.len());
        for hit in &self.hits {
            if let Some(doc) = hit.source_as()? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TotalRepr {
    Bare(u64),
    Tracked { value: u64, relation: TotalRelation },
}

/// The hit count never stands in for a missing total.
fn resolve_total(total: Option<TotalRepr>) -> (Option<u64>, TotalRelation) {
    match total {
        Some(TotalRepr::Bare(n)) => (Some(n), TotalRelation::Eq),
        Some(TotalRepr::Tracked { value, relation }) => (Some(value), relation),
        None => (None, TotalRelation::Gte),
    }
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Option<TotalRepr>,
    #[serde(default)]
    max_score: Option<f64>,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    timed_out: bool,
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}
