//! Shared helpers for client integration tests.

#![allow(dead_code)]

use std::time::Duration;

use musicai_client::{ClientConfig, MusicAiClient};
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";

/// Client pointed at the mock server's `/api` root with fast polling.
pub fn client_for(server: &MockServer) -> MusicAiClient {
    let config = ClientConfig::new(API_KEY)
        .with_base_url(format!("{}/api", server.uri()))
        .with_poll_interval(Duration::from_millis(10));
    MusicAiClient::new(config).unwrap()
}

/// Number of received requests whose path equals `path`.
pub async fn count_requests(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}
