use std::sync::Arc;

use anyhow::Context;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{
    BackendSummary, ErrorRecord, InjectionRequest, IntervalUpdate, StatusSnapshot, TaskTreeNode,
};
use crate::scheduler::PipelineBackend;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone)]
pub struct DashboardClient {
    inner: reqwest::Client,
    config: Arc<AppConfig>,
    base_url: String,
}

impl DashboardClient {
    pub fn new(config: AppConfig) -> ClientResult<Self> {
        let base_url = normalize_base_url(&config.api_base_url);

        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.request_timeout);

        let client = builder
            .build()
            .context("failed to build reqwest client")
            .map_err(ClientError::Build)?;

        Ok(Self {
            inner: client,
            config: Arc::new(config),
            base_url,
        })
    }

    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub async fn get_status(&self) -> ClientResult<StatusSnapshot> {
        self.get_json("api/get_status").await
    }

    pub async fn get_structure(&self) -> ClientResult<Vec<TaskTreeNode>> {
        let forest: Option<Vec<TaskTreeNode>> = self.get_json("api/get_structure").await?;
        Ok(forest.unwrap_or_default())
    }

    pub async fn get_errors(&self) -> ClientResult<Vec<ErrorRecord>> {
        let errors: Option<Vec<ErrorRecord>> = self.get_json("api/get_errors").await?;
        Ok(errors.unwrap_or_default())
    }

    pub async fn get_summary(&self) -> ClientResult<BackendSummary> {
        self.get_json("api/get_summary").await
    }

    pub async fn push_interval(&self, interval_ms: u32) -> ClientResult<()> {
        let payload = IntervalUpdate {
            interval: interval_ms,
        };
        let builder = self.request(Method::POST, "api/push_interval").json(&payload);
        self.send_discard(builder).await
    }

    pub async fn push_injection_tasks(
        &self,
        node: &str,
        task_datas: &[Value],
        timestamp: &str,
    ) -> ClientResult<()> {
        let payload = InjectionRequest {
            node: node.to_string(),
            task_datas: task_datas.to_vec(),
            timestamp: timestamp.to_string(),
        };
        let builder = self
            .request(Method::POST, "api/push_injection_tasks")
            .json(&payload);
        self.send_discard(builder).await
    }

    /// 返回服务端给出的文本。
    pub async fn shutdown(&self) -> ClientResult<String> {
        let builder = self.request(Method::POST, "shutdown");
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(ClientError::UnexpectedStatus {
                status,
                body: text.into_bytes(),
            })
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.inner.request(method, self.join_path(path))
    }

    fn join_path(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T>(&self, path: &str) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, path);
        let (status, bytes) = self.send(builder).await?;
        if bytes.is_empty() {
            return Err(ClientError::EmptyResponse(status));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_discard(&self, builder: reqwest::RequestBuilder) -> ClientResult<()> {
        self.send(builder).await.map(|_| ())
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> ClientResult<(StatusCode, Vec<u8>)> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();

        if status.is_success() {
            Ok((status, bytes))
        } else {
            Err(ClientError::UnexpectedStatus {
                status,
                body: bytes,
            })
        }
    }
}

impl PipelineBackend for DashboardClient {
    async fn fetch_status(&self) -> ClientResult<StatusSnapshot> {
        self.get_status().await
    }

    async fn fetch_structure(&self) -> ClientResult<Vec<TaskTreeNode>> {
        self.get_structure().await
    }

    async fn fetch_errors(&self) -> ClientResult<Vec<ErrorRecord>> {
        self.get_errors().await
    }

    async fn fetch_summary(&self) -> ClientResult<BackendSummary> {
        self.get_summary().await
    }

    async fn push_interval(&self, interval_ms: u32) -> ClientResult<()> {
        DashboardClient::push_interval(self, interval_ms).await
    }
}

fn normalize_base_url(input: &str) -> String {
    input.trim_end_matches('/').to_string()
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("empty response body: {0}")]
    EmptyResponse(StatusCode),
    #[error("unexpected status {status}: {}", String::from_utf8_lossy(body))]
    UnexpectedStatus { status: StatusCode, body: Vec<u8> },
    #[error("client setup failed: {0:#}")]
    Build(anyhow::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::EmptyResponse(status) => Some(*status),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}
