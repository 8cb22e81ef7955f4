//! Client for REST/JSON document stores (Elasticsearch and OpenSearch).
//!
//! This crate provides a typed client with support for:
//! - Collection lifecycle (exists, create with schema, delete)
//! - Document put/get/delete/update, structured or raw JSON
//! - Flush and refresh for read-your-writes visibility
//! - Search with a small query DSL, sorting and pagination
//! - Protocol negotiation across store versions
//!
//! # Example
//!
//! ```rust,no_run
//! use docstore_client::{ClientConfig, DocStoreClient, Query};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Tweet {
//!     user: String,
//!     message: String,
//!     retweets: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DocStoreClient::connect(ClientConfig::new("http://localhost:9200")).await?;
//!
//!     let tweet = Tweet {
//!         user: "olivere".to_string(),
//!         message: "Take Five".to_string(),
//!         retweets: 0,
//!     };
//!     client.put_document("twitter", "tweet", "1", &tweet).await?;
//!     client.flush("twitter").await?;
//!
//!     let result = client
//!         .search("twitter")
//!         .query(Query::term("user", "olivere"))
//!         .sort("user", true)
//!         .size(10)
//!         .execute()
//!         .await?;
//!
//!     for tweet in result.sources::<Tweet>()? {
//!         println!("{}: {}", tweet.user, tweet.message);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod collection;
mod config;
mod document;
mod error;
mod query;
mod schema;
mod search;
mod update;
mod version;
mod wire;

pub use client::{ConnectionState, DocStoreClient, NodeInfo, PingResult, ShardsAck, VersionInfo};
pub use collection::{Acknowledged, Collections};
pub use config::{ClientConfig, DEFAULT_URL};
pub use document::{DeleteResult, GeoPoint, GetResult, PutResult, SuggestField};
pub use error::{DocStoreError, ErrorKind, Operation, Reason, Result, Target};
pub use query::{BoolQuery, MatchQuery, Query, RangeQuery, TermQuery};
pub use schema::{CollectionSettings, FieldType, Mapping, MappingField, SchemaDefinition};
pub use search::{Hit, SearchBuilder, SearchResult, SortOrder, TotalRelation};
pub use update::{Script, UpdateBuilder, UpdateResult};
pub use version::{Distribution, ProtocolVersion, ScriptStyle};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ClientConfig, CollectionSettings, DocStoreClient, DocStoreError, GeoPoint, Mapping,
        MappingField, Query, Result, SchemaDefinition, Script, SuggestField,
    };
}
