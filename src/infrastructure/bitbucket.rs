//! Bitbucket Cloud REST client
//!
//! Creates and deletes release tags under
//! `/2.0/repositories/{owner}/{repo}/refs/tags`.
//!
//! Both operations are idempotent from the caller's point of view: creating
//! a tag that already exists and deleting a tag that is already gone are
//! reported as outcomes, not errors, so a whole run can be repeated safely.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::http::resolve_url;
use crate::domain::revision::TagEndpoint;
use crate::domain::tag::{ReleaseTag, TagOutcome};
use crate::error::VcsError;

/// Operations the release run needs from the source host
#[async_trait]
pub trait VcsApi: Send + Sync {
    async fn create_tag(
        &self,
        endpoint: &TagEndpoint,
        tag: &ReleaseTag,
    ) -> Result<TagOutcome, VcsError>;

    async fn delete_tag(&self, endpoint: &TagEndpoint, tag_name: &str)
        -> Result<TagOutcome, VcsError>;
}

/// App username/password for Bitbucket basic auth
#[derive(Clone)]
pub struct BitbucketCredentials {
    username: String,
    password: String,
}

impl BitbucketCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn authorization(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
        )
    }
}

impl std::fmt::Debug for BitbucketCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitbucketCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// HTTP implementation of [`VcsApi`]
pub struct BitbucketClient {
    client: Client,
    base_url: String,
    credentials: BitbucketCredentials,
}

impl BitbucketClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        credentials: BitbucketCredentials,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, endpoint: &str) -> reqwest::RequestBuilder {
        info!("Bitbucket API {} request: {}", method, endpoint);
        self.client
            .request(method, resolve_url(&self.base_url, endpoint))
            .header("Accept", "application/json")
            .header("Authorization", self.credentials.authorization())
    }

    /// Commit an existing tag points at; lookup failures only yield `None`
    async fn fetch_target_hash(&self, endpoint: &TagEndpoint, tag_name: &str) -> Option<String> {
        let path = endpoint.tag_path(tag_name);
        let response = match self.request(reqwest::Method::GET, &path).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(endpoint = %path, error = %e, "Could not read existing tag");
                return None;
            }
        };
        match Self::read(&path, response).await {
            Ok((status, body)) if status.is_success() => existing_target_hash(&body),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Could not read existing tag");
                None
            }
        }
    }

    async fn read(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<(StatusCode, String), VcsError> {
        let status = response.status();
        let body = response.text().await.map_err(|source| VcsError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;
        debug!(endpoint = %endpoint, status = %status, body = %body, "Bitbucket API response");
        Ok((status, body))
    }
}

#[async_trait]
impl VcsApi for BitbucketClient {
    async fn create_tag(
        &self,
        endpoint: &TagEndpoint,
        tag: &ReleaseTag,
    ) -> Result<TagOutcome, VcsError> {
        let response = self
            .request(reqwest::Method::POST, endpoint.as_str())
            .json(tag)
            .send()
            .await
            .map_err(|source| VcsError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let (status, body) = Self::read(endpoint.as_str(), response).await?;
        let existing = existing_target_hash(&body);
        let outcome = classify_create(endpoint.as_str(), status, body)?;

        if outcome == TagOutcome::AlreadyExists {
            let existing = match existing {
                Some(hash) => Some(hash),
                None => self.fetch_target_hash(endpoint, &tag.name).await,
            };
            match existing {
                Some(hash) if hash != tag.target.hash => warn!(
                    endpoint = %endpoint,
                    tag = %tag.name,
                    existing = %hash,
                    mapped = %tag.target.hash,
                    "Existing tag points at a different commit than this release maps to"
                ),
                Some(_) => {}
                None => debug!(endpoint = %endpoint, tag = %tag.name, "Existing tag target unknown"),
            }
        }
        Ok(outcome)
    }

    async fn delete_tag(
        &self,
        endpoint: &TagEndpoint,
        tag_name: &str,
    ) -> Result<TagOutcome, VcsError> {
        let path = endpoint.tag_path(tag_name);
        let response = self
            .request(reqwest::Method::DELETE, &path)
            .send()
            .await
            .map_err(|source| VcsError::Request {
                endpoint: path.clone(),
                source,
            })?;

        let (status, body) = Self::read(&path, response).await?;
        classify_delete(&path, status, body)
    }
}

fn classify_create(endpoint: &str, status: StatusCode, body: String) -> Result<TagOutcome, VcsError> {
    if status.is_success() {
        return Ok(TagOutcome::Created);
    }
    // Bitbucket answers 400 with "tag ... already exists" for duplicates
    let duplicate = matches!(status, StatusCode::BAD_REQUEST | StatusCode::CONFLICT)
        && body.to_lowercase().contains("already exists");
    if duplicate {
        return Ok(TagOutcome::AlreadyExists);
    }
    Err(VcsError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Target hash of a tag, from a tag body (`{"target":{"hash":..}}`) or an
/// error body that carries the existing tag under `error.data`
fn existing_target_hash(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["/target/hash", "/error/data/target/hash"]
        .iter()
        .find_map(|pointer| value.pointer(pointer))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn classify_delete(endpoint: &str, status: StatusCode, body: String) -> Result<TagOutcome, VcsError> {
    if status.is_success() {
        return Ok(TagOutcome::Deleted);
    }
    if status == StatusCode::NOT_FOUND {
        return Ok(TagOutcome::Absent);
    }
    Err(VcsError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}
