//! Integration tests for waiting on asynchronous jobs.

use std::time::{Duration, Instant};

use cms_client::rest::ResourceError;
use cms_client::{ApiToken, BaseUrl, ClientConfig, JobHandle, JobPollPolicy, RestClient};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RestClient {
    let config = ClientConfig::builder()
        .api_token(ApiToken::new("test-token").unwrap())
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();
    RestClient::new(&config).unwrap()
}

fn fast_polling(timeout: Duration) -> JobPollPolicy {
    JobPollPolicy {
        initial_interval: Duration::from_millis(10),
        factor: 2.0,
        max_interval: Duration::from_millis(40),
        timeout,
    }
}

fn pending() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "pending"}))
}

#[tokio::test]
async fn test_wait_polls_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job-results/j1"))
        .respond_with(pending())
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job-results/j1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "result": {"deleted": 3}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let result = assert_ok!(
        client
            .wait_for_job_with(&JobHandle::new("j1"), &fast_polling(Duration::from_secs(5)), None)
            .await
    );
    assert_eq!(result, json!({"deleted": 3}));
}

#[tokio::test]
async fn test_unpublished_result_counts_as_pending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job-results/j2"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job-results/j2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "j2",
                "type": "job_result",
                "attributes": {"status": 200, "payload": {"data": []}}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let result = assert_ok!(
        client
            .wait_for_job_with(&JobHandle::new("j2"), &fast_polling(Duration::from_secs(5)), None)
            .await
    );
    assert_eq!(result, json!({"data": []}));
}

#[tokio::test]
async fn test_failed_job_reports_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job-results/j3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "failed", "error": "x"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let error = assert_err!(
        client
            .wait_for_job_with(&JobHandle::new("j3"), &fast_polling(Duration::from_secs(5)), None)
            .await
    );
    match error {
        ResourceError::JobFailed { reason, payload } => {
            assert_eq!(reason, "x");
            assert_eq!(payload["status"], "failed");
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wait_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job-results/j4"))
        .respond_with(pending())
        .mount(&server)
        .await;

    let client = client_for(&server);

    let started = Instant::now();
    let error = assert_err!(
        client
            .wait_for_job_with(
                &JobHandle::new("j4"),
                &fast_polling(Duration::from_millis(100)),
                None
            )
            .await
    );

    match error {
        ResourceError::JobTimeout { job_id, elapsed } => {
            assert_eq!(job_id, "j4");
            assert!(elapsed >= Duration::from_millis(100));
        }
        other => panic!("expected JobTimeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_wait_can_be_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job-results/j5"))
        .respond_with(pending())
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let error = assert_err!(
        client
            .wait_for_job_with(
                &JobHandle::new("j5"),
                &fast_polling(Duration::from_secs(30)),
                Some(token)
            )
            .await
    );
    assert!(matches!(error, ResourceError::Cancelled));
}

#[tokio::test]
async fn test_bulk_destroy_then_wait() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items/bulk/destroy"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({"data": {"id": "j6", "type": "job"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job-results/j6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "j6", "type": "job_result", "attributes": {"status": 200, "payload": {}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let job = assert_ok!(client.items().bulk_destroy(&["1", "2", "3"]).await);
    assert_ok!(client.wait_for_job(&job).await);
}
