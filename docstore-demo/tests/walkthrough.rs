//! End-to-end runs of the walkthrough against emulated stores.

use docstore_client::{ClientConfig, DocStoreClient, ErrorKind};
use docstore_demo::{DemoError, run};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tweet_hit(index: &str, doc_type: Option<&str>, id: &str, message: &str) -> serde_json::Value {
    let mut hit = json!({
        "_index": index,
        "_id": id,
        "_score": null,
        "_source": {"user": "olivere", "message": message},
        "sort": ["olivere"]
    });
    if let Some(doc_type) = doc_type {
        hit["_type"] = json!(doc_type);
    }
    hit
}

async fn mount_root(server: &MockServer, number: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "name": "Tyger Tiger",
            "cluster_name": "elasticsearch",
            "version": {"number": number, "lucene_version": "4.10.4"},
            "tagline": "You Know, for Search"
        })))
        .mount(server)
        .await;
}

async fn mount_visibility(server: &MockServer) {
    let shards = json!({"_shards": {"total": 1, "successful": 1, "failed": 0}});
    Mock::given(method("POST"))
        .and(path("/twitter/_flush"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shards.clone()))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/twitter/_refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shards))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount a 1.x store that does not have the collection yet.
async fn mount_legacy_store(server: &MockServer) {
    mount_root(server, "1.7.5").await;

    Mock::given(method("HEAD"))
        .and(path("/twitter"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/twitter"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/twitter"))
        .and(body_partial_json(json!({
            "settings": {"number_of_shards": 1, "number_of_replicas": 0},
            "mappings": {"tweet": {"properties": {"message": {"type": "string", "store": true}}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(server)
        .await;

    for (id, message) in [("1", "Take Five"), ("2", "It's a Raggy Waltz")] {
        Mock::given(method("PUT"))
            .and(path(format!("/twitter/tweet/{id}")))
            .and(body_partial_json(json!({"user": "olivere", "message": message})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "_index": "twitter", "_type": "tweet", "_id": id, "_version": 1, "created": true
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/twitter/tweet/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_index": "twitter", "_type": "tweet", "_id": "1", "_version": 1, "found": true,
            "_source": {"user": "olivere", "message": "Take Five", "retweets": 0}
        })))
        .mount(server)
        .await;

    mount_visibility(server).await;

    Mock::given(method("POST"))
        .and(path("/twitter/_search"))
        .and(query_param("pretty", "true"))
        .and(body_partial_json(json!({
            "query": {"term": {"user": "olivere"}},
            "from": 0,
            "size": 10,
            "sort": [{"user": {"order": "asc"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 3,
            "timed_out": false,
            "_shards": {"total": 1, "successful": 1, "failed": 0},
            "hits": {
                "total": 2,
                "max_score": null,
                "hits": [
                    tweet_hit("twitter", Some("tweet"), "1", "Take Five"),
                    tweet_hit("twitter", Some("tweet"), "2", "It's a Raggy Waltz")
                ]
            }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/twitter/tweet/1/_update"))
        .and(body_partial_json(json!({
            "script": "ctx._source.retweets += num",
            "params": {"num": 1},
            "upsert": {"retweets": 0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_index": "twitter", "_type": "tweet", "_id": "1", "_version": 2, "created": false
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_walkthrough_on_legacy_store() {
    let server = MockServer::start().await;
    mount_legacy_store(&server).await;

    let client = DocStoreClient::connect(ClientConfig::new(server.uri()))
        .await
        .unwrap();
    let mut out = Vec::new();
    let report = run(&client, "twitter", &mut out).await.unwrap();

    assert_eq!(report.server_version, "1.7.5");
    assert_eq!(report.total_hits, Some(2));
    assert_eq!(report.tweets.len(), 2);
    assert_eq!(report.tweets[0].message, "Take Five");
    assert_eq!(report.update.version, 2);
    assert!(!report.update.created);

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Store returned with code 200 and version 1.7.5"));
    assert!(out.contains("Indexed tweet 1 to collection twitter, schema tweet"));
    assert!(out.contains("Got document 1 in version 1 from collection twitter, schema tweet"));
    assert!(out.contains("Tweet by olivere: It's a Raggy Waltz"));
    assert!(out.contains("Found a total of 2 tweets"));
    assert!(out.contains("New version of tweet \"1\" is now 2"));
    assert!(!out.contains("already exists"));
}

#[tokio::test]
async fn test_walkthrough_on_typeless_store_recreates_collection() {
    let server = MockServer::start().await;
    mount_root(&server, "7.10.2").await;

    Mock::given(method("HEAD"))
        .and(path("/twitter"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/twitter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": false})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/twitter"))
        .and(body_partial_json(json!({
            "mappings": {"properties": {"user": {"type": "keyword"}, "message": {"type": "text"}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "acknowledged": true, "shards_acknowledged": true, "index": "twitter"
        })))
        .expect(1)
        .mount(&server)
        .await;

    for id in ["1", "2"] {
        Mock::given(method("PUT"))
            .and(path(format!("/twitter/_doc/{id}")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "_index": "twitter", "_type": "_doc", "_id": id, "_version": 1, "result": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/twitter/_doc/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_index": "twitter", "_type": "_doc", "_id": "1", "_version": 1, "_seq_no": 0,
            "_primary_term": 1, "found": true,
            "_source": {"user": "olivere", "message": "Take Five", "retweets": 0}
        })))
        .mount(&server)
        .await;

    mount_visibility(&server).await;

    Mock::given(method("POST"))
        .and(path("/twitter/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": {"value": 1, "relation": "eq"},
                "max_score": null,
                "hits": [tweet_hit("twitter", Some("_doc"), "1", "Take Five")]
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/twitter/_update/1"))
        .and(body_partial_json(json!({
            "script": {"source": "ctx._source.retweets += params.num", "params": {"num": 1}},
            "upsert": {"retweets": 0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_index": "twitter", "_type": "_doc", "_id": "1", "_version": 2, "result": "updated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DocStoreClient::connect(ClientConfig::new(server.uri()))
        .await
        .unwrap();
    let mut out = Vec::new();
    let report = run(&client, "twitter", &mut out).await.unwrap();

    assert_eq!(report.total_hits, Some(1));
    assert_eq!(report.update.version, 2);
    assert_eq!(report.update.result.as_deref(), Some("updated"));

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("The twitter collection already exists. Deleting it now."));
    assert!(out.contains("Not acknowledged"));
    assert!(out.contains("Indexed tweet 1 to collection twitter, schema tweet"));
    assert!(out.contains("Got document 1 in version 1 from collection twitter, schema tweet"));
    assert!(!out.contains("schema _doc"));
}

#[tokio::test]
async fn test_walkthrough_stops_on_rejected_schema() {
    let server = MockServer::start().await;
    mount_root(&server, "7.10.2").await;

    Mock::given(method("HEAD"))
        .and(path("/twitter"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/twitter"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "root_cause": [{"type": "mapper_parsing_exception", "reason": "No handler for type [string]"}],
                "type": "mapper_parsing_exception",
                "reason": "Failed to parse mapping [_doc]"
            },
            "status": 400
        })))
        .mount(&server)
        .await;

    let client = DocStoreClient::connect(ClientConfig::new(server.uri()))
        .await
        .unwrap();
    let mut out = Vec::new();
    let err = run(&client, "twitter", &mut out).await.unwrap_err();

    match err {
        DemoError::Store(e) => {
            assert_eq!(e.kind(), ErrorKind::Schema);
            assert_eq!(e.status(), Some(400));
        }
        other => panic!("expected store error, got {other:?}"),
    }
    assert!(!String::from_utf8(out).unwrap().contains("Indexed tweet"));
}
