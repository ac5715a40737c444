//! Gateway client tests against a mock API.

mod common;

use std::collections::BTreeMap;

use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_for, count_requests, API_KEY};
use musicai_client::models::{JobId, JobStatus, ListQuery, NewJob};

async fn mount_upload_slot(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/upload"))
        .and(header("Authorization", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uploadUrl": format!("{}/storage/put/abc", server.uri()),
            "downloadUrl": format!("{}/storage/files/abc", server.uri()),
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_file_puts_bytes_and_returns_read_url() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    mount_upload_slot(&server).await;

    Mock::given(method("PUT"))
        .and(path("/storage/put/abc"))
        .and(body_string("fake ogg bytes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fake ogg bytes"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("demo.ogg");
    std::fs::write(&input, "fake ogg bytes").unwrap();

    let read_url = client.upload_file(&input).await.unwrap();
    assert_eq!(read_url, format!("{}/storage/files/abc", server.uri()));

    // The returned reference is readable.
    let copy = dir.path().join("copy.ogg");
    let written = client.download_file(&read_url, &copy).await.unwrap();
    assert_eq!(written, 14);
    assert_eq!(std::fs::read_to_string(&copy).unwrap(), "fake ogg bytes");
}

#[tokio::test]
async fn test_upload_slot_failure_is_transport_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.wav");
    std::fs::write(&input, b"x").unwrap();

    let err = client.upload_file(&input).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_upload_put_failure_is_transport_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    mount_upload_slot(&server).await;

    Mock::given(method("PUT"))
        .and(path("/storage/put/abc"))
        .respond_with(ResponseTemplate::new(403).set_body_string("signature expired"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.wav");
    std::fs::write(&input, b"x").unwrap();

    let err = client.upload_file(&input).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_upload_missing_file_is_local_error_without_requests() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    mount_upload_slot(&server).await;

    let err = client
        .upload_file("/definitely/not/here.wav")
        .await
        .unwrap_err();
    assert!(err.is_local_io());
    assert_eq!(count_requests(&server, "/api/upload").await, 0);
}

#[tokio::test]
async fn test_upload_with_existing_ticket() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    mount_upload_slot(&server).await;

    Mock::given(method("PUT"))
        .and(path("/storage/put/abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.wav");
    std::fs::write(&input, b"x").unwrap();

    let ticket = client.request_upload_slot().await.unwrap();
    let url = client.upload_file_with_ticket(&input, &ticket).await.unwrap();
    assert_eq!(url, ticket.download_url);
}

#[tokio::test]
async fn test_submit_job_sends_body_and_auth() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/job"))
        .and(header("Authorization", API_KEY))
        .and(body_json(json!({
            "name": "sdk-test",
            "workflow": "sdk-test",
            "params": { "file": "https://music.ai/demo.ogg" },
            "copyResultsTo": { "file": "https://storage.example.com/put/1" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "5b1f9d2e-8c4a-4f3b-9e21-7d6c5b4a3f10"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut targets = BTreeMap::new();
    targets.insert("file".to_string(), "https://storage.example.com/put/1".to_string());
    let new_job = NewJob::new("sdk-test", "sdk-test")
        .with_param("file", "https://music.ai/demo.ogg")
        .with_copy_results_to(targets);

    let job = client.submit_job(&new_job).await.unwrap();
    assert_eq!(job.id.as_str(), "5b1f9d2e-8c4a-4f3b-9e21-7d6c5b4a3f10");
    assert_eq!(job.status, JobStatus::Queued);
}

#[tokio::test]
async fn test_submit_job_rejected() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown workflow"))
        .mount(&server)
        .await;

    let err = client
        .submit_job(&NewJob::new("x", "nope"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_get_job_and_status() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/job/job-1"))
        .and(header("Authorization", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-1",
            "name": "sdk-test",
            "workflow": "sdk-test",
            "workflowParams": { "file": "https://music.ai/demo.ogg" },
            "status": "STARTED",
            "result": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/job/job-1/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "job-1", "status": "STARTED" })),
        )
        .mount(&server)
        .await;

    let id = JobId::from("job-1");
    let job = client.get_job(&id).await.unwrap();
    assert_eq!(job.name, "sdk-test");
    assert_eq!(job.workflow, "sdk-test");
    assert_eq!(job.workflow_params["file"], json!("https://music.ai/demo.ogg"));

    let snapshot = client.get_job_status(&id).await.unwrap();
    assert_eq!(snapshot.id, id);
    assert_eq!(snapshot.status, JobStatus::Started);
}

#[tokio::test]
async fn test_get_job_invalid_body() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/job/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.get_job(&JobId::from("job-1")).await.unwrap_err();
    assert!(matches!(err, musicai_client::ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_list_jobs_expands_repeated_filter() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/job"))
        .and(query_param("workflow", "w1"))
        .and(query_param("workflow", "w2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a", "workflow": "w1", "status": "SUCCEEDED" },
            { "id": "b", "workflow": "w2", "status": "QUEUED" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = client
        .list_jobs(&ListQuery::new().workflows(["w1", "w2"]))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|j| j.workflow == "w1" || j.workflow == "w2"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("workflow=w1&workflow=w2"));
}

#[tokio::test]
async fn test_list_jobs_unknown_workflow_is_empty() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/job"))
        .and(query_param("workflow", "3f8e2a41-0000-4000-8000-000000000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobs": [] })))
        .mount(&server)
        .await;

    let jobs = client
        .list_jobs(&ListQuery::new().workflows(["3f8e2a41-0000-4000-8000-000000000000"]))
        .await
        .unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn test_list_jobs_without_filters_sends_no_query() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "a" }])))
        .mount(&server)
        .await;

    let jobs = client.list_jobs(&ListQuery::new()).await.unwrap();
    assert_eq!(jobs.len(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("DELETE"))
        .and(path("/api/job/job-9"))
        .and(header("Authorization", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "job-9" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/job/job-9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("job not found"))
        .mount(&server)
        .await;

    let id = JobId::from("job-9");
    client.delete_job(&id).await.unwrap();

    let err = client.get_job(&id).await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_failure_is_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("DELETE"))
        .and(path("/api/job/job-9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client.delete_job(&JobId::from("job-9")).await.is_err());
}

#[tokio::test]
async fn test_list_workflows() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/workflow"))
        .and(query_param("page", "999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "workflows": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workflows": [
                { "id": "1", "slug": "sdk-test", "name": "SDK test" },
                { "id": "2", "slug": "stems", "name": "Stems" }
            ]
        })))
        .mount(&server)
        .await;

    let all = client.list_workflows(&ListQuery::new()).await.unwrap();
    assert!(all.iter().any(|w| w.slug == "sdk-test"));

    let empty = client
        .list_workflows(&ListQuery::new().page(999))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_get_application_info() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/application"))
        .and(header("Authorization", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "0e7c4b1a-9f3d-4c2e-8b5a-6d1f0e9c8b7a",
            "name": "test application"
        })))
        .mount(&server)
        .await;

    let info = client.get_application_info().await.unwrap();
    assert_eq!(info.id, "0e7c4b1a-9f3d-4c2e-8b5a-6d1f0e9c8b7a");
    assert_eq!(info.name, "test application");
}

#[tokio::test]
async fn test_wrong_key_is_rejected() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/application"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = client.get_application_info().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}
