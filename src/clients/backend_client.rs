/// 后端 API 客户端
///
/// 封装岗位列表、状态同步和用户资料三个接口
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{BackendProfile, JobDescriptor, JobId, JobStatus};

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<JobDescriptor>,
}

#[derive(Debug, Serialize)]
struct StatusUpdate<'a> {
    job_id: &'a JobId,
    status: JobStatus,
}

/// 后端 API 客户端
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend_base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 拉取会话下的岗位列表
    pub async fn fetch_jobs(&self, session_id: &str) -> Result<Vec<JobDescriptor>, ApiError> {
        let endpoint = format!("{}/chrome-extension/jobs/{}", self.base_url, session_id);
        debug!("GET {}", endpoint);

        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| request_failed(&endpoint, source))?;
        let response = check_status(&endpoint, response)?;

        let body: JobsResponse = response
            .json()
            .await
            .map_err(|source| request_failed(&endpoint, source))?;
        Ok(body.jobs)
    }

    /// 同步单个岗位的状态
    pub async fn update_status(
        &self,
        session_id: &str,
        job_id: &JobId,
        status: JobStatus,
    ) -> Result<(), ApiError> {
        let endpoint = format!(
            "{}/chrome-extension/update-status/{}",
            self.base_url, session_id
        );
        debug!("POST {} (岗位 {} → {})", endpoint, job_id, status);

        let response = self
            .http
            .post(&endpoint)
            .json(&StatusUpdate { job_id, status })
            .send()
            .await
            .map_err(|source| request_failed(&endpoint, source))?;
        check_status(&endpoint, response)?;
        Ok(())
    }

    /// 用访问令牌拉取用户资料
    pub async fn fetch_profile(&self, token: &str) -> Result<BackendProfile, ApiError> {
        let endpoint = format!("{}/profile", self.base_url);
        debug!("GET {}", endpoint);

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| request_failed(&endpoint, source))?;
        let response = check_status(&endpoint, response)?;

        response
            .json()
            .await
            .map_err(|source| request_failed(&endpoint, source))
    }
}

fn request_failed(endpoint: &str, source: reqwest::Error) -> ApiError {
    ApiError::RequestFailed {
        endpoint: endpoint.to_string(),
        source,
    }
}

fn check_status(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::BadResponse {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}
