use serde_json::json;
use terminus_api::{ApiError, ApiTransport, HYDRATE_OPERATION_LOGS, Session, TerminusClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> TerminusClient {
    let base_url = format!("{}/api/", server.uri());
    TerminusClient::new(&base_url, Some(Session::new("test-session", "user-1"))).expect("client builds")
}

#[tokio::test]
async fn fetches_workflow_with_bearer_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sites/S123/workflows/W1"))
        .and(header("authorization", "Bearer test-session"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "W1", "result": null })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body = client.get_json("sites/S123/workflows/W1", &[]).await.expect("fetch succeeds");
    assert_eq!(body["id"], "W1");
}

#[tokio::test]
async fn forwards_hydration_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/U1/workflows/W9"))
        .and(query_param("hydrate", "operations_with_logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "W9", "operations": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body = client
        .get_json("/users/U1/workflows/W9", &[HYDRATE_OPERATION_LOGS])
        .await
        .expect("hydrated fetch succeeds");
    assert_eq!(body["operations"], json!([]));
}

#[tokio::test]
async fn server_errors_are_transient_status_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let error = client_for(&server).await.get_json("sites/S1/workflows/W1", &[]).await.unwrap_err();
    match &error {
        ApiError::Status { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(error.is_transient());
}

#[tokio::test]
async fn unauthorized_responses_carry_a_login_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Session expired" })))
        .mount(&server)
        .await;

    let error = client_for(&server).await.get_json("sites/S1/workflows/W1", &[]).await.unwrap_err();
    assert!(!error.is_transient());
    let rendered = error.to_string();
    assert!(rendered.contains("terminus auth:login"), "{rendered}");
    assert!(rendered.contains("Session expired"), "{rendered}");
}

#[tokio::test]
async fn non_json_success_bodies_are_decode_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let error = client_for(&server).await.get_json("sites/S1/workflows/W1", &[]).await.unwrap_err();
    assert!(matches!(error, ApiError::Decode(ref decode) if decode.preview() == "<html>maintenance</html>"));
    assert!(error.to_string().contains("sites/S1/workflows/W1"));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn unreachable_hosts_are_transient_network_errors() {
    let server = MockServer::builder().start().await;
    let base_url = format!("{}/api/", server.uri());
    drop(server);

    let client = TerminusClient::new(&base_url, None).expect("client builds");
    let error = client.get_json("sites/S1/workflows/W1", &[]).await.unwrap_err();
    assert!(matches!(error, ApiError::Network(_)), "{error:?}");
    assert!(error.is_transient());
}
