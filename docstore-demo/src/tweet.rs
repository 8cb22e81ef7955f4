//! The record type stored by the walkthrough.

use chrono::{DateTime, Utc};
use docstore_client::{
    CollectionSettings, GeoPoint, Mapping, MappingField, SchemaDefinition, SuggestField,
};
use serde::{Deserialize, Serialize};

/// Schema name tweets are stored under.
pub const TWEET_SCHEMA: &str = "tweet";

/// A tweet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    /// Author.
    pub user: String,
    /// Text, retained verbatim by the store.
    pub message: String,
    /// Retweet counter.
    #[serde(default)]
    pub retweets: i64,
    /// Image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Hashtags, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Where it was sent from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Autocompletion input.
    #[serde(default, rename = "suggest_field", skip_serializing_if = "Option::is_none")]
    pub suggest: Option<SuggestField>,
}

impl Tweet {
    /// A bare tweet with no retweets.
    pub fn new(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Collection schema for tweets: one shard, no replicas.
    pub fn schema() -> SchemaDefinition {
        SchemaDefinition::new()
            .settings(CollectionSettings::new().shards(1).replicas(0))
            .mapping(
                TWEET_SCHEMA,
                Mapping::new()
                    .field("user", MappingField::keyword())
                    .field("message", MappingField::text().stored())
                    .field("image", MappingField::keyword())
                    .field("created", MappingField::date())
                    .field("tags", MappingField::keyword())
                    .field("location", MappingField::geo_point())
                    .field("suggest_field", MappingField::completion()),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_client::ProtocolVersion;
    use serde_json::{Value, json};

    #[test]
    fn test_minimal_tweet_serialization() {
        let value = serde_json::to_value(Tweet::new("olivere", "Take Five")).unwrap();
        assert_eq!(
            value,
            json!({"user": "olivere", "message": "Take Five", "retweets": 0})
        );
    }

    #[test]
    fn test_raw_tweet_without_counter() {
        let tweet: Tweet =
            serde_json::from_str(r#"{"user" : "olivere", "message" : "It's a Raggy Waltz"}"#)
                .unwrap();
        assert_eq!(tweet.retweets, 0);
        assert!(tweet.tags.is_empty());
    }

    #[test]
    fn test_full_tweet_fields() {
        let tweet: Tweet = serde_json::from_value(json!({
            "user": "olivere",
            "message": "Welcome to Golang and Elasticsearch.",
            "retweets": 3,
            "created": "2014-01-18T23:59:58Z",
            "tags": ["golang", "elasticsearch"],
            "location": "41.12,-71.34",
            "suggest_field": {"input": ["Golang", "Elasticsearch"]}
        }))
        .unwrap();

        assert_eq!(tweet.location, Some(GeoPoint::new(41.12, -71.34)));
        assert_eq!(tweet.tags, vec!["golang", "elasticsearch"]);
        assert!(tweet.created.is_some());
        assert_eq!(tweet.suggest.unwrap().input.len(), 2);
    }

    #[test]
    fn test_schema_renders_for_legacy_store() {
        let body: Value = serde_json::from_str(
            &Tweet::schema()
                .render(&ProtocolVersion::elasticsearch(1, 7, 5))
                .unwrap(),
        )
        .unwrap();

        assert_eq!(body["settings"]["number_of_shards"], 1);
        assert_eq!(body["settings"]["number_of_replicas"], 0);
        let props = &body["mappings"]["tweet"]["properties"];
        assert_eq!(props["message"]["type"], "string");
        assert_eq!(props["message"]["store"], true);
        assert_eq!(props["location"]["type"], "geo_point");
    }
}
