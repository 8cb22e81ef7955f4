//! The twitter walkthrough, step by step.

use crate::error::{DemoError, DemoResult};
use crate::tweet::{TWEET_SCHEMA, Tweet};
use docstore_client::{
    DocStoreClient, Distribution, ProtocolVersion, Query, Script, UpdateResult,
};
use docstore_log::{debug, info};
use serde_json::json;
use std::io::Write;

/// What a completed run observed.
#[derive(Debug, Clone)]
pub struct Report {
    /// Version number the store reported.
    pub server_version: String,
    /// Total matches of the term search, when the store counted them.
    pub total_hits: Option<u64>,
    /// Tweets returned by the term search, in order.
    pub tweets: Vec<Tweet>,
    /// Outcome of the retweet update.
    pub update: UpdateResult,
}

/// Script that bumps `retweets` by the `num` parameter.
///
/// Pre-5.0 Elasticsearch binds parameters as bare variables; later stores
/// only expose them under `params`.
pub fn retweet_script(version: ProtocolVersion) -> Script {
    let source = if version.distribution == Distribution::Elasticsearch && version.major < 5 {
        "ctx._source.retweets += num"
    } else {
        "ctx._source.retweets += params.num"
    };
    Script::new(source).param("num", 1)
}

/// Run the walkthrough against `collection`, narrating to `out`.
///
/// The collection is dropped and recreated if it already exists.
pub async fn run<W: Write>(
    client: &DocStoreClient,
    collection: &str,
    out: &mut W,
) -> DemoResult<Report> {
    // Liveness and version.
    let ping = client.ping().await?;
    writeln!(
        out,
        "Store returned with code {} and version {}",
        ping.status, ping.info.version.number
    )?;

    let server_version = client.server_version(client.endpoint()).await?;
    writeln!(out, "Store version {}", server_version)?;

    // Fresh collection.
    let collections = client.collections();
    if collections.exists(collection).await? {
        writeln!(
            out,
            "The {} collection already exists. Deleting it now.",
            collection
        )?;
        if !collections.delete(collection).await?.is_acknowledged() {
            writeln!(out, "Not acknowledged")?;
        }
    }

    if !collections
        .create(collection, &Tweet::schema())
        .await?
        .is_acknowledged()
    {
        writeln!(out, "Not acknowledged")?;
    }

    if !collections.exists(collection).await? {
        writeln!(out, "Collection {} does not exist.", collection)?;
    }

    // One structured document, one raw.
    let tweet1 = Tweet::new("olivere", "Take Five");
    let put1 = client
        .put_document(collection, TWEET_SCHEMA, "1", &tweet1)
        .await?;
    writeln!(
        out,
        "Indexed tweet {} to collection {}, schema {}",
        put1.id, put1.collection, put1.schema
    )?;

    let tweet2 = r#"{"user" : "olivere", "message" : "It's a Raggy Waltz"}"#;
    let put2 = client
        .put_raw_document(collection, TWEET_SCHEMA, "2", tweet2)
        .await?;
    writeln!(
        out,
        "Indexed tweet {} to collection {}, schema {}",
        put2.id, put2.collection, put2.schema
    )?;

    // Point lookup.
    let get = client.get_document(collection, TWEET_SCHEMA, "1").await?;
    if get.found {
        writeln!(
            out,
            "Got document {} in version {} from collection {}, schema {}",
            get.id,
            get.version.unwrap_or_default(),
            get.collection,
            get.schema
        )?;
        if let Some(tweet) = get
            .source_as::<Tweet>()
            .map_err(|source| DemoError::Decode {
                id: get.id.clone(),
                source,
            })?
        {
            writeln!(out, "Tweet by {}: {}", tweet.user, tweet.message)?;
        }
    }

    // Searches only see flushed writes.
    let flushed = client.flush(collection).await?;
    debug!("Flush reached {}/{} shards", flushed.successful, flushed.total);

    let result = client
        .search(collection)
        .query(Query::term("user", "olivere"))
        .sort("user", true)
        .from(0)
        .size(10)
        .pretty(true)
        .execute()
        .await?;

    writeln!(out, "Query took {} milliseconds", result.took_ms)?;

    // Lenient pass: hits that fail to decode are skipped.
    for tweet in result
        .hits
        .iter()
        .filter_map(|hit| hit.source_as::<Tweet>().ok().flatten())
    {
        writeln!(out, "Tweet by {}: {}", tweet.user, tweet.message)?;
    }
    match result.total_hits() {
        Some(total) => writeln!(out, "Found a total of {} tweets", total)?,
        None => writeln!(out, "Found at least {} tweets", result.hits_len())?,
    }

    // Strict pass: any undecodable hit aborts the run.
    let mut tweets = Vec::with_capacity(result.hits_len());
    if result.hits_len() > 0 {
        for hit in &result.hits {
            let tweet = hit
                .source_as::<Tweet>()
                .map_err(|source| DemoError::Decode {
                    id: hit.id.clone(),
                    source,
                })?;
            if let Some(tweet) = tweet {
                writeln!(out, "Tweet by {}: {}", tweet.user, tweet.message)?;
                tweets.push(tweet);
            }
        }
    } else {
        writeln!(out, "Found no tweets.")?;
    }

    // Bump the retweet counter, creating the document if it vanished.
    let update = client
        .update_document(collection, TWEET_SCHEMA, "1")
        .script(retweet_script(client.version()))
        .upsert(&json!({ "retweets": 0 }))
        .execute()
        .await?;
    writeln!(
        out,
        "New version of tweet {:?} is now {}",
        update.id, update.version
    )?;

    info!("Walkthrough finished against {}", client.endpoint());

    Ok(Report {
        server_version,
        total_hits: result.total,
        tweets,
        update,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_client::ScriptStyle;

    #[test]
    fn test_script_per_dialect() {
        let legacy = retweet_script(ProtocolVersion::elasticsearch(1, 7, 5));
        assert_eq!(legacy.source, "ctx._source.retweets += num");
        assert_eq!(legacy.params["num"], 1);

        let modern = retweet_script(ProtocolVersion::elasticsearch(6, 8, 0));
        assert_eq!(modern.source, "ctx._source.retweets += params.num");

        let opensearch = retweet_script(ProtocolVersion::opensearch(1, 3, 0));
        let body = opensearch.to_json(ScriptStyle::Source);
        assert_eq!(body["script"]["source"], "ctx._source.retweets += params.num");
    }
}
