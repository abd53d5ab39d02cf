//! CodeCommit client against a mock HTTP server

use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cirrus_client::codecommit::error_codes::REPOSITORY_DOES_NOT_EXIST;
use cirrus_client::codecommit::{CreateRepositoryInput, ListBranchesInput, UpdateRepositoryNameInput};
use cirrus_client::{
    CODECOMMIT, ClientConfig, ClientError, CodeCommitApi, CodeCommitClient, CredentialsSource,
    GetRepositoryInput, ResourceTagger,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn anonymous_client(server: &MockServer) -> CodeCommitClient {
    let config = ClientConfig::new("us-west-2")
        .with_endpoint(CODECOMMIT, server.uri())
        .with_credentials(CredentialsSource::Anonymous);
    CodeCommitClient::new(&config).unwrap()
}

fn target(operation: &str) -> String {
    format!("CodeCommit_20150413.{}", operation)
}

// =============================================================================
// Protocol Tests
// =============================================================================

#[tokio::test]
async fn test_create_repository_sends_json_rpc() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", target("CreateRepository").as_str()))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(body_json(json!({
            "repositoryName": "demo",
            "repositoryDescription": "",
            "tags": {"env": "test"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "repositoryMetadata": {
                "repositoryName": "demo",
                "repositoryId": "00000000-0000-0000-0000-000000000001",
                "Arn": "arn:aws:codecommit:us-west-2:123456789012:demo",
                "creationDate": 1700000000.5
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let output = client
        .create_repository(CreateRepositoryInput {
            repository_name: "demo".to_string(),
            repository_description: String::new(),
            tags: BTreeMap::from([("env".to_string(), "test".to_string())]),
            kms_key_id: None,
        })
        .await
        .unwrap();

    let metadata = output.repository_metadata.unwrap();
    assert_eq!(
        metadata.arn.as_deref(),
        Some("arn:aws:codecommit:us-west-2:123456789012:demo")
    );
    assert_eq!(metadata.creation_date, Some(1700000000.5));
}

#[tokio::test]
async fn test_operations_without_output_accept_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("UpdateRepositoryName").as_str()))
        .and(body_json(json!({"oldName": "old", "newName": "new"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    client
        .update_repository_name(UpdateRepositoryNameInput {
            old_name: "old".to_string(),
            new_name: "new".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_branches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListBranches").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"branches": ["main", "dev"]})),
        )
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let output = client
        .list_branches(ListBranchesInput {
            repository_name: "demo".to_string(),
            next_token: None,
        })
        .await
        .unwrap();

    assert_eq!(output.branches, vec!["main", "dev"]);
    assert!(output.next_token.is_none());
}

#[tokio::test]
async fn test_list_tags_follows_pagination() {
    let server = MockServer::start().await;
    let arn = "arn:aws:codecommit:us-west-2:123456789012:demo";

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListTagsForResource").as_str()))
        .and(body_json(json!({"resourceArn": arn})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tags": {"a": "1"},
            "nextToken": "page-2"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListTagsForResource").as_str()))
        .and(body_json(json!({"resourceArn": arn, "nextToken": "page-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tags": {"b": "2"}})))
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let tags = client.list_tags(arn).await.unwrap();

    assert_eq!(tags.len(), 2);
    assert_eq!(tags["a"], "1");
    assert_eq!(tags["b"], "2");
}

// =============================================================================
// Error Mapping Tests
// =============================================================================

#[tokio::test]
async fn test_error_type_from_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetRepository").as_str()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.codecommit#RepositoryDoesNotExistException",
            "message": "demo does not exist"
        })))
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let err = client
        .get_repository(GetRepositoryInput {
            repository_name: "demo".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_code(REPOSITORY_DOES_NOT_EXIST));
    match err {
        ClientError::Api(api) => {
            assert_eq!(api.status, 400);
            assert_eq!(api.message, "demo does not exist");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exactly_one_request_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let err = client
        .get_repository(GetRepositoryInput {
            repository_name: "demo".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), Some("UnknownError"));
}

// =============================================================================
// Signing Tests
// =============================================================================

#[tokio::test]
async fn test_requests_are_signed_with_static_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header_regex(
            "authorization",
            r"^AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\d{8}/us-west-2/codecommit/aws4_request, SignedHeaders=[a-z0-9;-]+, Signature=[0-9a-f]{64}$",
        ))
        .and(header_regex("x-amz-date", r"^\d{8}T\d{6}Z$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new("us-west-2")
        .with_endpoint(CODECOMMIT, server.uri())
        .with_credentials(CredentialsSource::static_keys("AKIDEXAMPLE", "secret"));
    let client = CodeCommitClient::new(&config).unwrap();

    let output = client
        .get_repository(GetRepositoryInput {
            repository_name: "demo".to_string(),
        })
        .await
        .unwrap();
    assert!(output.repository_metadata.is_none());
}
