//! Integration tests for resource operations.
//!
//! These tests drive the generic [`Resource`] handle against a mock server:
//! filtered listing, simple versus raw views, error classification, bulk
//! operations, dirty tracking and body-encoded queries.

use std::time::Duration;

use cms_client::rest::{
    resources, FilterOperator, FilterSpec, ListParams, OrderSpec, PageSpec, QueryError,
    ResourceError, TrackedResource,
};
use cms_client::{ApiToken, BaseUrl, ClientConfig, JobPollPolicy, RestClient, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RestClient {
    let config = ClientConfig::builder()
        .api_token(ApiToken::new("test-token").unwrap())
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .retry_policy(RetryPolicy {
            default_rate_limit_wait: Duration::from_millis(10),
            backoff_base: Duration::from_millis(5),
            ..RetryPolicy::default()
        })
        .job_poll_policy(JobPollPolicy {
            initial_interval: Duration::from_millis(10),
            factor: 1.0,
            max_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(2),
        })
        .build()
        .unwrap();
    RestClient::new(&config).unwrap()
}

fn upload(id: &str, size: u64) -> Value {
    json!({
        "id": id,
        "type": "upload",
        "attributes": {"filename": format!("{id}.png"), "size": size, "is_image": true},
        "relationships": {
            "upload_collection": {"data": {"type": "upload_collection", "id": "c1"}}
        }
    })
}

fn large_images() -> FilterSpec {
    FilterSpec::new()
        .field("type", FilterOperator::Eq, "image")
        .field("size", FilterOperator::Gt, 1_048_576)
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_filtered_listing_pages_through_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .and(query_param("filter[type][eq]", "image"))
        .and(query_param("filter[size][gt]", "1048576"))
        .and(query_param("page[offset]", "0"))
        .and(query_param("page[limit]", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [upload("1", 2_000_000), upload("3", 3_000_000)],
            "meta": {"total_count": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .and(query_param("filter[type][eq]", "image"))
        .and(query_param("page[offset]", "2"))
        .and(query_param("page[limit]", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [upload("4", 4_000_000)],
            "meta": {"total_count": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let uploads = client.uploads();
    let params = ListParams::new()
        .filter(large_images())
        .page(PageSpec::offset(0, 2));

    let first = assert_ok!(uploads.list_page(&params).await);
    let ids: Vec<&str> = first.iter().map(|u| u["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["1", "3"]);
    assert_eq!(first.total_count(), Some(3));
    assert!(first.has_next_page());

    let next = first.next_page().unwrap();
    let second = assert_ok!(uploads.list_page(&params.clone().page(next)).await);
    let ids: Vec<&str> = second.iter().map(|u| u["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["4"]);
    assert!(!second.has_next_page());
}

#[tokio::test]
async fn test_simple_and_raw_views_agree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [upload("1", 10)],
            "meta": {"total_count": 1}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = ListParams::new();

    let simple = assert_ok!(client.uploads().list(&params).await);
    assert_eq!(simple.len(), 1);
    assert_eq!(simple[0]["id"], "1");
    assert_eq!(simple[0]["type"], "upload");
    assert_eq!(simple[0]["filename"], "1.png");
    assert_eq!(simple[0]["upload_collection"], "c1");
    assert!(simple[0].get("meta").is_none());

    let raw = assert_ok!(client.uploads().raw_list(&params).await);
    assert_eq!(raw.total_count(), Some(1));
    assert_eq!(raw.entities().len(), 1);
    assert_eq!(raw.entities()[0].id, "1");
    assert_eq!(raw.simple_data(), Value::Array(simple));
}

#[tokio::test]
async fn test_list_without_page_sends_no_page_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webhooks"))
        .and(query_param("order_by", "name_ASC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = ListParams::new().order(assert_ok!(OrderSpec::parse("name")));

    let webhooks = assert_ok!(client.webhooks().list(&params).await);
    assert!(webhooks.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].url.as_str().contains("page"));
}

#[tokio::test]
async fn test_nested_resource_uses_parent_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item-types/44/fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "f1", "type": "field", "attributes": {"api_key": "title"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fields/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "f1", "type": "field", "attributes": {"api_key": "title"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let fields = client.fields("44");

    let all = assert_ok!(fields.list(&ListParams::new()).await);
    assert_eq!(all[0]["api_key"], "title");

    let one = assert_ok!(fields.find("f1").await);
    assert_eq!(one["id"], "f1");
}

#[tokio::test]
async fn test_typed_records_deserialize() {
    #[derive(Debug, Deserialize)]
    struct Upload {
        id: String,
        filename: String,
        size: u64,
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads/9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": upload("9", 77)})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let record: Upload = assert_ok!(client.uploads().typed::<Upload>().find("9").await);

    assert_eq!(record.id, "9");
    assert_eq!(record.filename, "9.png");
    assert_eq!(record.size, 77);
}

// ============================================================================
// Validation before any request
// ============================================================================

#[tokio::test]
async fn test_invalid_query_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let too_big = ListParams::new().page(PageSpec::offset(0, 501));
    let error = assert_err!(client.uploads().list(&too_big).await);
    assert!(matches!(
        error,
        ResourceError::Query(QueryError::PageLimitExceeded { limit: 501, max: 500 })
    ));

    let bad_filter = FilterSpec::from_json(&json!({"size": {"bigger_than": 5}}));
    assert!(matches!(
        bad_filter,
        Err(QueryError::InvalidFilterOperator { ref field, .. }) if field == "size"
    ));

    let wrong_style = ListParams::new().page(PageSpec::cursor("abc", None));
    let error = assert_err!(client.uploads().list_page(&wrong_style).await);
    assert!(matches!(
        error,
        ResourceError::Query(QueryError::PaginationMismatch { expected: "offset" })
    ));
}

#[tokio::test]
async fn test_unsupported_operation_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let error = assert_err!(client.environments().create(&json!({"id": "sandbox"})).await);
    assert!(matches!(
        error,
        ResourceError::UnsupportedOperation {
            resource: "Environment",
            operation: "create"
        }
    ));

    let error = assert_err!(client.search_results().bulk_destroy(&["1"]).await);
    assert!(matches!(error, ResourceError::UnsupportedOperation { .. }));
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn test_create_validation_failure_lists_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-filters"))
        .respond_with(
            ResponseTemplate::new(422)
                .insert_header("X-Request-Id", "req-422")
                .set_body_json(json!({
                    "errors": [{
                        "source": {"pointer": "/data/attributes/name"},
                        "detail": "can't be blank"
                    }]
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let error = assert_err!(
        client
            .upload_filters()
            .create(&json!({"name": "", "filter": {}}))
            .await
    );

    assert!(matches!(error, ResourceError::ValidationFailed { .. }));
    assert_eq!(error.status(), Some(422));
    assert_eq!(error.request_id(), Some("req-422"));
    let fields = error.field_errors().unwrap();
    assert_eq!(fields["name"], vec!["can't be blank".to_string()]);
}

#[tokio::test]
async fn test_destroy_missing_record_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/webhooks/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "data": [{"id": "e", "type": "api_error", "attributes": {"code": "NOT_FOUND"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let error = assert_err!(client.webhooks().destroy("nope").await);
    match &error {
        ResourceError::NotFound { resource, id, .. } => {
            assert_eq!(*resource, "Webhook");
            assert_eq!(id.as_deref(), Some("nope"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(error.to_string().contains("nope"));
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "data": [{
                "id": "e",
                "type": "api_error",
                "attributes": {"code": "INVALID_AUTHORIZATION_HEADER"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let error = assert_err!(client.items().list(&ListParams::new()).await);
    assert!(matches!(error, ResourceError::Unauthorized(_)));
    assert_eq!(error.error_code(), Some("INVALID_AUTHORIZATION_HEADER"));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_stale_version_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/7"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "data": [{"id": "e", "type": "api_error", "attributes": {"code": "STALE_ITEM_VERSION"}}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let error = assert_err!(client.items().update("7", &json!({"title": "x"})).await);
    assert!(matches!(error, ResourceError::Conflict(_)));
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_sends_json_api_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({
            "data": {
                "type": "item",
                "attributes": {"title": "Hello"},
                "relationships": {
                    "item_type": {"data": {"type": "item_type", "id": "44"}}
                }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "id": "7",
                "type": "item",
                "attributes": {"title": "Hello"},
                "relationships": {"item_type": {"data": {"type": "item_type", "id": "44"}}}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let created = assert_ok!(
        client
            .items()
            .create(&json!({"title": "Hello", "item_type": "44"}))
            .await
    );
    assert_eq!(created["id"], "7");
    assert_eq!(created["item_type"], "44");
}

#[tokio::test]
async fn test_accepted_create_waits_for_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/item-types"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"id": "job-1", "type": "job"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job-results/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "job-1",
                "type": "job_result",
                "attributes": {
                    "status": 201,
                    "payload": {
                        "data": {"id": "m1", "type": "item_type", "attributes": {"name": "Post"}}
                    }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let model = assert_ok!(client.item_types().create(&json!({"name": "Post"})).await);
    assert_eq!(model["id"], "m1");
    assert_eq!(model["name"], "Post");
}

#[tokio::test]
async fn test_bulk_destroy_returns_job_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uploads/bulk/destroy"))
        .and(body_json(json!({
            "data": {
                "type": "upload_bulk_destroy_operation",
                "attributes": {},
                "relationships": {
                    "uploads": {
                        "data": [
                            {"type": "upload", "id": "1"},
                            {"type": "upload", "id": "2"}
                        ]
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"id": "job-9", "type": "job"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let job = assert_ok!(client.uploads().bulk_destroy(&["1", "2"]).await);
    assert_eq!(job.id, "job-9");
}

#[tokio::test]
async fn test_resend_posts_to_action_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook_calls/c1/resend_webhook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_ok!(client.webhook_calls().resend("c1").await);
}

#[tokio::test]
async fn test_save_changes_sends_only_changed_attributes() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        title: String,
        body: String,
    }

    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/7"))
        .and(body_json(json!({
            "data": {"type": "item", "id": "7", "attributes": {"title": "New"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "7",
                "type": "item",
                "attributes": {"title": "New", "body": "unchanged"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = client.items().typed::<Item>();

    let mut tracked = TrackedResource::from_existing(Item {
        id: "7".to_string(),
        title: "Old".to_string(),
        body: "unchanged".to_string(),
    });

    // Nothing changed yet: no request.
    assert_ok!(items.save_changes("7", &mut tracked).await);

    tracked.title = "New".to_string();
    assert!(tracked.is_dirty());
    assert_ok!(items.save_changes("7", &mut tracked).await);

    assert!(!tracked.is_dirty());
    assert_eq!(tracked.title, "New");
}

// ============================================================================
// Body-encoded queries
// ============================================================================

#[tokio::test]
async fn test_audit_log_query_is_sent_as_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audit-log-events/query"))
        .and(body_json(json!({
            "data": {
                "type": "audit_log_query",
                "attributes": {
                    "filter": {"action_name": {"eq": "items.publish"}},
                    "page": {"limit": 10}
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "ev1",
                "type": "audit_log_event",
                "attributes": {"action_name": "items.publish"}
            }],
            "meta": {"next_token": "tok-2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = ListParams::new()
        .filter(FilterSpec::new().equals("action_name", "items.publish"))
        .page(PageSpec::first(Some(10)));

    let page = assert_ok!(client.audit_log_events().list_page(&params).await);

    assert_eq!(page.len(), 1);
    assert_eq!(page.next_token(), Some("tok-2"));
    assert!(matches!(
        page.next_page(),
        Some(PageSpec::Cursor { ref cursor, limit: Some(10) }) if cursor.as_deref() == Some("tok-2")
    ));
}

#[tokio::test]
async fn test_custom_descriptor_through_generic_factory() {
    use cms_client::clients::HttpMethod;
    use cms_client::rest::{ResourceDescriptor, ResourceOperation, ResourcePath};

    const MENU_PATHS: &[ResourcePath] = &[ResourcePath::new(
        HttpMethod::Get,
        ResourceOperation::List,
        &[],
        "menu-items",
    )];
    static MENU_ITEMS: ResourceDescriptor =
        ResourceDescriptor::new("MenuItem", "menu_item", "menu_items", MENU_PATHS);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/menu-items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "m", "type": "menu_item", "attributes": {"label": "Home"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = assert_ok!(client.resource::<Value>(&MENU_ITEMS).list(&ListParams::new()).await);

    assert_eq!(records[0]["label"], "Home");
    assert!(resources::ALL.iter().all(|d| d.name != "MenuItem"));
}
