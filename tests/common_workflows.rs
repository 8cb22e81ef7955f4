//! Integration tests for common docstore workflows
//!
//! These tests cover the pieces an application wires together before it
//! talks to a store: configuration, schemas, queries and error handling.

use docstore::prelude::*;
use docstore::{
    BoolQuery, Distribution, FieldType, Operation, RangeQuery, ScriptStyle, Target,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ========== Configuration ==========

#[test]
fn test_config_builder_chain() {
    let config = ClientConfig::new("https://search.internal:9200")
        .with_basic_auth("elastic", "changeme")
        .with_connect_timeout(Duration::from_secs(2))
        .with_request_timeout(Duration::from_secs(5))
        .with_healthcheck(false)
        .with_assumed_version(ProtocolVersion::opensearch(2, 11, 0));

    assert_eq!(config.urls, vec!["https://search.internal:9200".to_string()]);
    assert_eq!(config.username.as_deref(), Some("elastic"));
    assert_eq!(config.connect_timeout, Duration::from_secs(2));
    assert!(!config.healthcheck);
    assert_eq!(
        config.assumed_version.map(|v| v.distribution),
        Some(Distribution::OpenSearch)
    );
}

#[test]
fn test_cluster_config_keeps_order() {
    let config = ClientConfig::cluster(vec![
        "http://a:9200".to_string(),
        "http://b:9200".to_string(),
    ]);
    assert_eq!(config.urls[0], "http://a:9200");
    assert_eq!(config.urls[1], "http://b:9200");
    assert!(config.healthcheck);
}

// ========== Protocol versions ==========

#[test]
fn test_version_dialects() {
    let legacy = ProtocolVersion::parse("1.7.5", Distribution::Elasticsearch).unwrap();
    assert!(legacy.uses_mapping_types());
    assert!(legacy.uses_string_fields());
    assert_eq!(legacy.script_style(), ScriptStyle::Flat);

    let typeless = ProtocolVersion::parse("7.10.2", Distribution::Elasticsearch).unwrap();
    assert!(!typeless.uses_mapping_types());
    assert!(!typeless.reports_bare_total());
    assert_eq!(typeless.script_style(), ScriptStyle::Source);

    assert!(ProtocolVersion::parse("not-a-version", Distribution::Elasticsearch).is_none());
}

// ========== Schemas ==========

fn tweet_schema() -> SchemaDefinition {
    SchemaDefinition::new()
        .settings(CollectionSettings::new().shards(1).replicas(0))
        .mapping(
            "tweet",
            Mapping::new()
                .field("user", MappingField::keyword())
                .field("message", MappingField::text().stored())
                .field("location", MappingField::geo_point()),
        )
}

#[test]
fn test_schema_renders_per_dialect() {
    let schema = tweet_schema();

    let legacy: serde_json::Value = serde_json::from_str(
        &schema
            .render(&ProtocolVersion::elasticsearch(1, 7, 5))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(legacy["settings"]["number_of_shards"], 1);
    assert_eq!(
        legacy["mappings"]["tweet"]["properties"]["message"],
        json!({"type": "string", "store": true})
    );
    assert_eq!(
        legacy["mappings"]["tweet"]["properties"]["user"]["index"],
        "not_analyzed"
    );

    let modern: serde_json::Value = serde_json::from_str(
        &schema
            .render(&ProtocolVersion::opensearch(2, 11, 0))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(
        modern["mappings"]["properties"]["user"],
        json!({"type": "keyword"})
    );
    assert_eq!(
        modern["mappings"]["properties"]["location"]["type"],
        FieldType::GeoPoint.as_str()
    );
}

#[test]
fn test_typeless_store_rejects_two_mappings() {
    let schema = tweet_schema().mapping("user", Mapping::new());
    let err = schema
        .render(&ProtocolVersion::elasticsearch(7, 10, 2))
        .unwrap_err();
    assert!(err.contains("one mapping"));
}

#[test]
fn test_raw_schema_passes_through() {
    let body = r#"{"settings":{"number_of_shards":3}}"#;
    let schema = SchemaDefinition::raw(body);
    assert!(schema.is_raw());
    assert_eq!(schema.render(&ProtocolVersion::LATEST).unwrap(), body);
}

// ========== Queries ==========

#[test]
fn test_compound_query() {
    let query: Query = BoolQuery::new()
        .must(Query::term("user", "olivere"))
        .filter(RangeQuery::new("retweets").gte(10))
        .must_not(Query::exists("image"))
        .into();

    let rendered = query.to_json();
    assert_eq!(rendered["bool"]["must"][0], json!({"term": {"user": "olivere"}}));
    assert_eq!(rendered["bool"]["filter"][0]["range"]["retweets"]["gte"], 10);
    assert_eq!(rendered["bool"]["must_not"][0], json!({"exists": {"field": "image"}}));
}

// ========== Scripts ==========

#[test]
fn test_script_body_layouts() {
    let script = Script::new("ctx._source.retweets += params.num").param("num", 1);

    let flat = script.to_json(ScriptStyle::Flat);
    assert_eq!(flat["script"], "ctx._source.retweets += params.num");
    assert_eq!(flat["params"]["num"], 1);

    let inline = script.to_json(ScriptStyle::Inline);
    assert_eq!(inline["script"]["inline"], "ctx._source.retweets += params.num");

    let source = script.to_json(ScriptStyle::Source);
    assert_eq!(source["script"]["params"]["num"], 1);
}

// ========== Errors ==========

#[test]
fn test_target_display() {
    assert_eq!(Target::document("twitter", "tweet", "1").to_string(), "twitter/tweet/1");
    assert_eq!(Target::collection("twitter").to_string(), "twitter");
    assert_eq!(Target::cluster().to_string(), "<cluster>");
}

#[tokio::test]
async fn test_missing_document_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/twitter/_doc/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "_index": "twitter", "_type": "_doc", "_id": "404", "found": false
        })))
        .mount(&server)
        .await;

    let client = DocStoreClient::connect(
        ClientConfig::new(server.uri())
            .with_healthcheck(false)
            .with_assumed_version(ProtocolVersion::elasticsearch(7, 10, 2)),
    )
    .await
    .unwrap();

    let get = client.get_document("twitter", "tweet", "404").await.unwrap();
    assert!(!get.found);
    assert!(get.source_as::<serde_json::Value>().unwrap().is_none());
}

#[tokio::test]
async fn test_error_classification_through_facade() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "index_not_found_exception", "reason": "no such index [gone]"},
            "status": 404
        })))
        .mount(&server)
        .await;

    let client = DocStoreClient::connect(ClientConfig::new(server.uri()).with_healthcheck(false))
        .await
        .unwrap();

    let err: DocStoreError = client.collections().delete("gone").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.operation(), Operation::DeleteCollection);
    assert_eq!(err.target(), Some(&Target::collection("gone")));
    assert_eq!(err.status(), Some(404));
}

// ========== Logging ==========

#[test]
fn test_log_level_round_trip() {
    use docstore::docstore_log::{Level, set_level, current_level};

    set_level(Level::Warn);
    assert_eq!(current_level(), Level::Warn);
    set_level(Level::Info);
    assert_eq!(current_level(), Level::Info);
}
