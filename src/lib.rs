// Docstore - A typed client for Elasticsearch and OpenSearch document stores
//
// This library bundles the store client with the logging facade it reports
// through, so applications depend on a single crate.

// Re-export the client
pub use docstore_client::*;

// Re-export logging
pub use docstore_log;

/// Prelude for common imports.
///
/// ```rust,no_run
/// use docstore::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     docstore_log::init();
///     let client = DocStoreClient::connect(ClientConfig::default()).await?;
///     let hits = client
///         .search("twitter")
///         .query(Query::term("user", "olivere"))
///         .execute()
///         .await?;
///     info!("{:?} hits", hits.total_hits());
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use docstore_client::prelude::*;
    pub use docstore_client::{ErrorKind, ProtocolVersion, SearchResult, SortOrder};
    pub use docstore_log::{debug, error, info, trace, warn};
}
