//! CV backend client: the only place that talks HTTP to the CV service.
//!
//! Every request carries the stored bearer token. A missing token fails before
//! any request is sent. A 401 clears the stored token. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::errors::PageError;
use crate::form::encode::{PayloadPart, SubmissionPayload};

const DISTRICTS_PATH: &str = "/api/districts";
const INSTITUTES_PATH: &str = "/api/institutes";
const CVS_PATH: &str = "/api/cvs";

/// The backend calls a CV page makes. Bodies are returned raw; shape
/// normalization happens in [`crate::form::normalize`].
#[async_trait]
pub trait CvApi: Send + Sync {
    async fn fetch_districts(&self) -> Result<Value, PageError>;
    async fn fetch_institutes(&self) -> Result<Value, PageError>;
    async fn fetch_cv(&self, cv_id: &str) -> Result<Value, PageError>;
    async fn update_cv(&self, cv_id: &str, payload: SubmissionPayload) -> Result<Value, PageError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct CvApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl CvApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, PageError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| PageError::Network(format!("Invalid URL {}{path}: {e}", self.base_url)))
    }

    /// `/api/cvs/<id>` with the id percent-encoded as a single path segment.
    fn cv_url(&self, cv_id: &str) -> Result<Url, PageError> {
        let mut url = self.endpoint(CVS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| PageError::Network(format!("{} cannot be a base URL", self.base_url)))?
            .push(cv_id);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, PageError> {
        let token = self.tokens.token().ok_or(PageError::AuthMissing)?;
        Ok(request.bearer_auth(token))
    }

    async fn get_json(&self, url: Url) -> Result<Value, PageError> {
        let request = self.authorized(self.client.get(url.clone()))?;
        let response = request.send().await?;
        let body = self.read_body(url.path(), response).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| PageError::Decode(e.to_string()))
    }

    /// Maps non-2xx to the error taxonomy and returns a 2xx body as text.
    async fn read_body(&self, path: &str, response: Response) -> Result<String, PageError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.message);
            warn!("{path} returned {status}");
            if status.as_u16() == 401 {
                warn!("Stored token rejected; clearing it");
                self.tokens.clear();
            }
            return Err(PageError::from_status(status.as_u16(), message));
        }

        debug!("{path} returned {status} ({} bytes)", body.len());
        Ok(body)
    }
}

#[async_trait]
impl CvApi for CvApiClient {
    async fn fetch_districts(&self) -> Result<Value, PageError> {
        self.get_json(self.endpoint(DISTRICTS_PATH)?).await
    }

    async fn fetch_institutes(&self) -> Result<Value, PageError> {
        self.get_json(self.endpoint(INSTITUTES_PATH)?).await
    }

    async fn fetch_cv(&self, cv_id: &str) -> Result<Value, PageError> {
        self.get_json(self.cv_url(cv_id)?).await
    }

    /// Any 2xx counts as saved. A body that is not JSON comes back as a string.
    async fn update_cv(&self, cv_id: &str, payload: SubmissionPayload) -> Result<Value, PageError> {
        let url = self.cv_url(cv_id)?;
        let form = multipart_form(payload)?;
        let request = self.authorized(self.client.put(url.clone()))?;
        let response = request.multipart(form).send().await?;
        let body = self.read_body(url.path(), response).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn multipart_form(payload: SubmissionPayload) -> Result<Form, PageError> {
    let mut form = Form::new();
    for (key, part) in payload.into_parts() {
        form = match part {
            PayloadPart::Text(value) => form.text(key, value),
            PayloadPart::File(attachment) => {
                let part = Part::bytes(attachment.bytes.to_vec())
                    .file_name(attachment.file_name)
                    .mime_str(&attachment.content_type)?;
                form.part(key, part)
            }
        };
    }
    Ok(form)
}
