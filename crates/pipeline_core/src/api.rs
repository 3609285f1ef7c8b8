//! REST surface of the hiring backend consumed by the pipeline engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use shared::{
    domain::{CandidateId, JobId, StageId},
    error::ApiError,
    protocol::{PipelineResponse, UpdateCandidateStageRequest},
};
use tracing::debug;
use url::Url;

use crate::{
    config::ClientSettings,
    error::{PipelineError, Result},
};

const ORG_HEADER: &str = "X-Org-Id";

#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// `GET /jobs/{job_id}/pipeline`
    async fn fetch_pipeline(&self, job_id: &JobId) -> Result<PipelineResponse>;

    /// `PATCH /candidates/{candidate_id}` with `{ "stageId": ... }`. Success means
    /// the move is committed.
    async fn update_candidate_stage(
        &self,
        candidate_id: &CandidateId,
        stage_id: &StageId,
    ) -> Result<()>;
}

pub struct HttpPipelineApi {
    http: Client,
    base_url: Url,
    api_token: Option<String>,
    org_id: Option<String>,
}

impl HttpPipelineApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|_| PipelineError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(PipelineError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url,
            api_token: None,
            org_id: None,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        let mut api = Self::with_client(http, &settings.api_base_url)?;
        api.api_token = settings.api_token.clone();
        api.org_id = settings.org_id.clone();
        Ok(api)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.org_id {
            Some(org_id) => request.header(ORG_HEADER, org_id),
            None => request,
        }
    }
}

#[async_trait]
impl PipelineApi for HttpPipelineApi {
    async fn fetch_pipeline(&self, job_id: &JobId) -> Result<PipelineResponse> {
        let url = self.endpoint(&["jobs", job_id.as_str(), "pipeline"])?;
        debug!(job_id = %job_id, %url, "pipeline: GET");
        let response = self.authorize(self.http.get(url)).send().await?;
        let body = ensure_success(response).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| PipelineError::Decode(e.to_string()))
    }

    async fn update_candidate_stage(
        &self,
        candidate_id: &CandidateId,
        stage_id: &StageId,
    ) -> Result<()> {
        let url = self.endpoint(&["candidates", candidate_id.as_str()])?;
        debug!(candidate_id = %candidate_id, stage_id = %stage_id, %url, "pipeline: PATCH");
        let response = self
            .authorize(self.http.patch(url))
            .json(&UpdateCandidateStageRequest {
                stage_id: stage_id.clone(),
            })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Turns a non-2xx response into [`PipelineError::Status`], preferring the
/// backend's `{ code, message }` body over the bare status reason.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .map(|err| err.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(PipelineError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
