//! Music.AI API gateway client.
//!
//! Every call maps to one authenticated HTTP request. Failures are returned
//! as-is; nothing in this module retries.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH};
use reqwest::{Body, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info_span, Instrument};

use musicai_models::{
    ApplicationInfo, Job, JobId, JobList, JobStatusSnapshot, ListQuery, NewJob, UploadTicket,
    Workflow, WorkflowList,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::metrics::record_request;

/// HTTP client for the Music.AI API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct MusicAiClient {
    pub(crate) http: Client,
    config: Arc<ClientConfig>,
}

impl MusicAiClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("musicai-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn job_path(job_id: &JobId) -> String {
        format!("/job/{}", urlencoding::encode(job_id.as_str()))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.config.api_key.as_str())
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Ask the service for a one-time upload slot.
    pub async fn request_upload_slot(&self) -> ClientResult<UploadTicket> {
        let url = self.url("/upload");
        self.execute_request("request_upload_slot", async {
            let response = self.authorized(self.http.get(&url)).send().await?;
            Self::read_json(response, &url).await
        })
        .await
    }

    /// Upload a local file and return the URL it can be referenced by.
    ///
    /// The file is opened before a slot is requested, so a missing input
    /// fails without any request.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> ClientResult<String> {
        let path = path.as_ref();
        let (file, size) = open_for_upload(path).await?;

        let ticket = self.request_upload_slot().await?;
        self.put_file(&ticket, file, size).await?;

        debug!(path = %path.display(), bytes = size, "Uploaded file");
        Ok(ticket.download_url)
    }

    /// Upload a local file into a slot obtained earlier.
    pub async fn upload_file_with_ticket(
        &self,
        path: impl AsRef<Path>,
        ticket: &UploadTicket,
    ) -> ClientResult<String> {
        let path = path.as_ref();
        let (file, size) = open_for_upload(path).await?;

        self.put_file(ticket, file, size).await?;
        Ok(ticket.download_url.clone())
    }

    async fn put_file(&self, ticket: &UploadTicket, file: File, size: u64) -> ClientResult<()> {
        let body = Body::wrap_stream(ReaderStream::new(file));
        // Signed URL: the API key must not be sent to storage.
        self.execute_request("upload_put", async {
            let response = self
                .http
                .put(&ticket.upload_url)
                .header(CONTENT_LENGTH, size)
                .body(body)
                .send()
                .await?;
            Self::check_status(response, &ticket.upload_url).await?;
            debug!(bytes = size, "Upload PUT accepted");
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    /// Submit a job against a workflow.
    pub async fn submit_job(&self, job: &NewJob) -> ClientResult<Job> {
        let url = self.url("/job");
        self.execute_request("submit_job", async {
            let response = self.authorized(self.http.post(&url)).json(job).send().await?;
            Self::read_json(response, &url).await
        })
        .await
    }

    /// Fetch the full job, including results once terminal.
    pub async fn get_job(&self, job_id: &JobId) -> ClientResult<Job> {
        let url = self.url(&Self::job_path(job_id));
        self.execute_request("get_job", async {
            let response = self.authorized(self.http.get(&url)).send().await?;
            Self::read_json(response, &url).await
        })
        .await
    }

    /// Fetch only the job status.
    pub async fn get_job_status(&self, job_id: &JobId) -> ClientResult<JobStatusSnapshot> {
        let url = self.url(&format!("{}/status", Self::job_path(job_id)));
        self.execute_request("get_job_status", async {
            let response = self.authorized(self.http.get(&url)).send().await?;
            Self::read_json(response, &url).await
        })
        .await
    }

    /// List jobs. Repeated query keys are OR-ed by the service.
    pub async fn list_jobs(&self, query: &ListQuery) -> ClientResult<Vec<Job>> {
        let url = self.url("/job");
        self.execute_request("list_jobs", async {
            let response = self
                .authorized(self.http.get(&url))
                .query(query.pairs())
                .send()
                .await?;
            let list: JobList = Self::read_json(response, &url).await?;
            Ok(list.into_vec())
        })
        .await
    }

    /// Delete a job and its stored results.
    pub async fn delete_job(&self, job_id: &JobId) -> ClientResult<()> {
        let url = self.url(&Self::job_path(job_id));
        self.execute_request("delete_job", async {
            let response = self.authorized(self.http.delete(&url)).send().await?;
            Self::check_status(response, &url).await?;
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Workflows & application
    // =========================================================================

    /// List workflows available to the application.
    pub async fn list_workflows(&self, query: &ListQuery) -> ClientResult<Vec<Workflow>> {
        let url = self.url("/workflow");
        self.execute_request("list_workflows", async {
            let response = self
                .authorized(self.http.get(&url))
                .query(query.pairs())
                .send()
                .await?;
            let list: WorkflowList = Self::read_json(response, &url).await?;
            Ok(list.into_vec())
        })
        .await
    }

    /// Metadata of the application owning the API key.
    pub async fn get_application_info(&self) -> ClientResult<ApplicationInfo> {
        let url = self.url("/application");
        self.execute_request("get_application_info", async {
            let response = self.authorized(self.http.get(&url)).send().await?;
            Self::read_json(response, &url).await
        })
        .await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run a request future inside a tracing span and record metrics.
    pub(crate) async fn execute_request<T, F>(&self, operation: &'static str, fut: F) -> ClientResult<T>
    where
        F: std::future::Future<Output = ClientResult<T>>,
    {
        let span = info_span!("musicai_request", operation = %operation);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.status().unwrap_or(0),
        };
        record_request(operation, status, latency_ms);

        result
    }

    pub(crate) async fn check_status(response: Response, url: &str) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_http_status(status.as_u16(), url, body))
    }

    async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> ClientResult<T> {
        let response = Self::check_status(response, url).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ClientError::InvalidResponse(format!("{} returned unexpected body ({}): {}", url, e, truncate(&body, 256)))
        })
    }
}

async fn open_for_upload(path: &Path) -> ClientResult<(File, u64)> {
    let file = File::open(path)
        .await
        .map_err(|e| ClientError::io(path, e))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|e| ClientError::io(path, e))?;
    if !metadata.is_file() {
        return Err(ClientError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    Ok((file, metadata.len()))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
