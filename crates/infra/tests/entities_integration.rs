//! Integration tests for entity operations against a mocked broker
//!
//! **Coverage:**
//! - Search pagination: unbounded and capped limits across 1000-entity pages
//! - Absence: 404 on get, search, count and silent writes
//! - Request shape: type tags, tenant headers, hierarchical and per-call scopes
//! - Validation before I/O: no request reaches the broker

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use ngsi_domain::{AttributeSet, BatchAction, Entity, EntityQuery, NgsiError, ServicePath};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{broker, init_tracing, received_header, room_page};

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn search_without_limit_walks_every_page() {
    init_tracing();
    let server = MockServer::start().await;

    for (offset, count) in [(0, 1000), (1000, 1000), (2000, 500)] {
        Mock::given(method("GET"))
            .and(path("/v2/entities"))
            .and(query_param("offset", offset.to_string()))
            .and(query_param("limit", "1000"))
            .and(query_param("options", "count"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("fiware-total-count", "2500")
                    .set_body_json(room_page(offset, count)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let entities = broker(&server).search(&EntityQuery::new().entity_type("Room")).await.unwrap();

    assert_eq!(entities.len(), 2500);
    assert_eq!(entities[0].id, "urn:Room:0");
    assert_eq!(entities[2499].id, "urn:Room:2499");
}

#[tokio::test]
async fn search_with_limit_stops_at_the_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "1000"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("fiware-total-count", "5000")
                .set_body_json(room_page(0, 1000)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .and(query_param("offset", "1000"))
        .and(query_param("limit", "200"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("fiware-total-count", "5000")
                .set_body_json(room_page(1000, 200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let entities = broker(&server).search(&EntityQuery::new().limit(1200)).await.unwrap();
    assert_eq!(entities.len(), 1200);
}

#[tokio::test]
async fn search_stops_on_short_page() {
    let server = MockServer::start().await;

    // The broker over-reports the total; a short page still ends the walk.
    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("fiware-total-count", "9000")
                .set_body_json(room_page(0, 3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let entities = broker(&server).search(&EntityQuery::new()).await.unwrap();
    assert_eq!(entities.len(), 3);
}

#[tokio::test]
async fn search_forwards_filters_and_key_values() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .and(query_param("type", "Room"))
        .and(query_param("q", "temperature>20"))
        .and(query_param("georel", "near;maxDistance:500"))
        .and(query_param("geometry", "point"))
        .and(query_param("coords", "40.4,-3.7"))
        .and(query_param("options", "count,keyValues"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("fiware-total-count", "1")
                .set_body_json(json!([{"id": "r1", "type": "Room", "temperature": 23}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = EntityQuery::new()
        .entity_type("Room")
        .query("temperature>20")
        .geo("near;maxDistance:500", "point", "40.4,-3.7")
        .key_values(true);
    let entities = broker(&server).search(&query).await.unwrap();

    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].raw_attribute("temperature"), Some(&json!(23)));
}

#[tokio::test]
async fn search_not_found_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let entities = broker(&server).search(&EntityQuery::new()).await.unwrap();
    assert!(entities.is_empty());
}

#[tokio::test]
async fn hierarchical_search_extends_configured_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("fiware-total-count", "0")
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = broker(&server)
        .with_service("smartcity")
        .with_service_path(ServicePath::parse("/parks").unwrap());
    client.search(&EntityQuery::new().hierarchical(true)).await.unwrap();

    assert_eq!(received_header(&server, "fiware-servicepath").await.as_deref(), Some("/parks/#"));
    assert_eq!(received_header(&server, "fiware-service").await.as_deref(), Some("smartcity"));
}

#[tokio::test]
async fn invalid_queries_fail_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = broker(&server);

    let hierarchical =
        EntityQuery::new().geo("coveredBy", "polygon", "0,0;0,1;1,1;0,0").hierarchical(true);
    assert!(client.search(&hierarchical).await.unwrap_err().is_validation());
    assert!(client.count(&hierarchical).await.unwrap_err().is_validation());

    let partial_geo = EntityQuery { georel: Some("near".into()), ..EntityQuery::new() };
    assert!(client.search(&partial_geo).await.unwrap_err().is_validation());
}

// ============================================================================
// Get / Count
// ============================================================================

#[tokio::test]
async fn get_returns_entity_or_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/entities/urn%3ARoom%3A1"))
        .and(query_param("type", "Room"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "urn:Room:1",
            "type": "Room",
            "temperature": {"value": 21.5, "type": "Float", "metadata": {}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/entities/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "NotFound",
            "description": "The requested entity has not been found. Check type and id"
        })))
        .mount(&server)
        .await;

    let client = broker(&server);

    let entity = client.get("urn:Room:1", Some("Room"), false, None).await.unwrap().unwrap();
    assert_eq!(entity.entity_type, "Room");
    let temperature = entity.attribute("temperature").unwrap();
    assert_eq!(temperature.value, json!(21.5));

    assert!(client.get("missing", None, false, None).await.unwrap().is_none());
}

#[tokio::test]
async fn count_reads_total_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .and(query_param("type", "Room"))
        .and(query_param("options", "count"))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("fiware-total-count", "42")
                .set_body_json(room_page(0, 1)),
        )
        .mount(&server)
        .await;

    let total = broker(&server).count(&EntityQuery::new().entity_type("Room")).await.unwrap();
    assert_eq!(total, 42);
}

#[tokio::test]
async fn count_not_found_is_zero_and_missing_header_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("type", "Ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("type", "Room"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = broker(&server);
    assert_eq!(client.count(&EntityQuery::new().entity_type("Ghost")).await.unwrap(), 0);

    let err = client.count(&EntityQuery::new().entity_type("Room")).await.unwrap_err();
    assert!(matches!(err, NgsiError::Decode(_)));
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn create_sends_inferred_type_tags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/entities"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "id": "urn:Room:7",
            "type": "Room",
            "temperature": {"value": 21.5, "type": "Float"},
            "floor": {"value": 2, "type": "Integer"},
            "name": {"value": "Lab", "type": "Text"},
            "open": {"value": true, "type": "Bool"}
        })))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Location", "/v2/entities/urn:Room:7"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let attributes = AttributeSet::new()
        .with_value("temperature", 21.5)
        .with_value("floor", 2)
        .with_value("name", "Lab")
        .with_value("open", true);

    broker(&server).create("urn:Room:7", "Room", &attributes, None).await.unwrap();
}

#[tokio::test]
async fn scoped_writes_replace_the_configured_service_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/entities"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Location", "/v2/entities/urn:Room:7"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/entities/urn%3ARoom%3A7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let client = broker(&server).with_service_path(ServicePath::parse("/a").unwrap());
    let garden = ServicePath::parse("/b").unwrap();

    client.create("urn:Room:7", "Room", &AttributeSet::new(), Some(&garden)).await.unwrap();
    assert_eq!(received_header(&server, "fiware-servicepath").await.as_deref(), Some("/b"));

    client.delete("urn:Room:7", None, false, Some(&garden)).await.unwrap();
    assert_eq!(received_header(&server, "fiware-servicepath").await.as_deref(), Some("/b"));

    client.delete("urn:Room:7", None, false, None).await.unwrap();
    assert_eq!(received_header(&server, "fiware-servicepath").await.as_deref(), Some("/a"));
}

#[tokio::test]
async fn create_conflict_surfaces_broker_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/entities"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "Unprocessable",
            "description": "Already Exists"
        })))
        .mount(&server)
        .await;

    let err = broker(&server)
        .create("urn:Room:7", "Room", &AttributeSet::new(), None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert!(err.to_string().contains("Already Exists"));
}

#[tokio::test]
async fn patch_and_update_use_attrs_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v2/entities/urn%3ARoom%3A1/attrs"))
        .and(body_json(json!({"temperature": {"value": 19, "type": "Integer"}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/entities/urn%3ARoom%3A1/attrs"))
        .and(query_param("type", "Room"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = broker(&server);
    let attributes = AttributeSet::new().with_value("temperature", 19);
    client.patch("urn:Room:1", None, &attributes, false, None).await.unwrap();
    client.update("urn:Room:1", Some("Room"), &attributes, false, None).await.unwrap();
}

#[tokio::test]
async fn silent_writes_ignore_missing_entities() {
    let server = MockServer::start().await;
    Mock::given(path("/v2/entities/ghost/attrs"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/entities/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = broker(&server);
    let attributes = AttributeSet::new().with_value("temperature", 19);

    client.patch("ghost", None, &attributes, true, None).await.unwrap();
    client.delete("ghost", None, true, None).await.unwrap();

    let err = client.patch("ghost", None, &attributes, false, None).await.unwrap_err();
    assert!(err.is_not_found());
    let err = client.delete("ghost", None, false, None).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_attribute_targets_single_attribute() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/entities/urn%3ARoom%3A1/attrs/temperature"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    broker(&server).delete_attribute("urn:Room:1", None, "temperature", None).await.unwrap();
}

#[tokio::test]
async fn batch_update_posts_action_and_entities() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/op/update"))
        .and(body_json(json!({
            "actionType": "append",
            "entities": [
                {"id": "r1", "type": "Room", "temperature": {"value": 20, "type": "Integer"}},
                {"id": "r2", "type": "Room"}
            ]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let entities = vec![
        Entity::with_attributes("r1", "Room", AttributeSet::new().with_value("temperature", 20)),
        Entity::new("r2", "Room"),
    ];
    broker(&server).batch_update(BatchAction::Append, entities, None).await.unwrap();
}
