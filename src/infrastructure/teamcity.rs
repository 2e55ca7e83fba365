//! TeamCity REST client
//!
//! Covers the handful of endpoints a release run needs:
//! - resulting properties of a build
//! - dependency closures by locator
//! - build details (revisions) and VCS root instances
//! - build tags and pin info
//!
//! Responses are decoded into explicit structures. Fields a run depends on
//! (`href`, `revisions`, `vcs-root-instance`, `properties`) are required, so a
//! response missing them fails instead of producing a half-empty result.
//! Lists TeamCity omits when empty (`build`, `property`, `revision`) default
//! to empty.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{display_endpoint, resolve_url};
use crate::domain::build::{BuildHandle, BuildIdentifier, DependencyKind};
use crate::domain::properties::Property;
use crate::domain::tag::{BuildTagsRequest, PinRequest};
use crate::error::CiError;

/// Operations the release run needs from the CI server
#[async_trait]
pub trait CiApi: Send + Sync {
    /// `name -> value` properties the build resolved
    async fn resulting_properties(&self, build: &BuildIdentifier) -> Result<Vec<Property>, CiError>;

    /// Add tags to a build
    async fn tag_build(
        &self,
        build: &BuildIdentifier,
        tags: &BuildTagsRequest,
    ) -> Result<(), CiError>;

    /// Every build related to `build` through `kind` dependencies, itself included
    async fn dependency_closure(
        &self,
        build: &BuildIdentifier,
        kind: DependencyKind,
    ) -> Result<Vec<BuildHandle>, CiError>;

    /// Pin or unpin a build
    async fn set_pin(&self, build: &BuildHandle, request: &PinRequest) -> Result<(), CiError>;

    /// Revisions the build was started from, one per VCS root
    async fn build_revisions(&self, build: &BuildHandle) -> Result<Vec<Revision>, CiError>;

    /// Parameters of a VCS root instance (`url`, `branch`, ...)
    async fn vcs_root_properties(&self, root: &VcsRootInstance) -> Result<Vec<Property>, CiError>;
}

/// One entry of `revisions.revision[]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Revision {
    /// Commit hash
    pub version: String,
    #[serde(rename = "vcs-root-instance")]
    pub vcs_root_instance: VcsRootInstance,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VcsRootInstance {
    #[serde(rename = "vcs-root-id")]
    pub vcs_root_id: String,
    pub href: String,
}

#[derive(Debug, Deserialize)]
struct BuildList {
    #[serde(default)]
    build: Vec<BuildHandle>,
}

#[derive(Debug, Deserialize)]
struct PropertyList {
    #[serde(default)]
    property: Vec<Property>,
}

#[derive(Debug, Deserialize)]
struct BuildDetails {
    revisions: RevisionList,
}

#[derive(Debug, Deserialize)]
struct RevisionList {
    #[serde(default)]
    revision: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct VcsRootInstanceDetails {
    properties: PropertyList,
}

/// Bearer token for the TeamCity REST API
#[derive(Clone)]
pub struct TeamCityCredentials {
    token: String,
}

impl TeamCityCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for TeamCityCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamCityCredentials")
            .field("token", &"***")
            .finish()
    }
}

/// HTTP implementation of [`CiApi`]
pub struct TeamCityClient {
    client: Client,
    base_url: String,
    credentials: TeamCityCredentials,
}

impl TeamCityClient {
    pub fn new(client: Client, base_url: impl Into<String>, credentials: TeamCityCredentials) -> Self {
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

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CiError> {
        let body = self
            .request(Method::GET, endpoint, query, Option::<&()>::None)
            .await?;

        serde_json::from_str(&body).map_err(|e| CiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<(), CiError> {
        self.request(method, endpoint, &[], Some(body)).await?;
        Ok(())
    }

    async fn request<B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<String, CiError> {
        info!(
            "TeamCity API {} request: {}",
            method,
            display_endpoint(&self.base_url, endpoint)
        );

        let mut request = self
            .client
            .request(method, resolve_url(&self.base_url, endpoint))
            .header("Accept", "application/json")
            .header("Authorization", self.credentials.authorization());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| CiError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| CiError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;
        debug!(endpoint = %endpoint, status = %status, body = %text, "TeamCity API response");

        if !status.is_success() {
            return Err(CiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl CiApi for TeamCityClient {
    async fn resulting_properties(&self, build: &BuildIdentifier) -> Result<Vec<Property>, CiError> {
        let endpoint = format!("/app/rest/builds/{}/resulting-properties", build.locator());
        let list: PropertyList = self.get_json(&endpoint, &[]).await?;
        Ok(list.property)
    }

    async fn tag_build(
        &self,
        build: &BuildIdentifier,
        tags: &BuildTagsRequest,
    ) -> Result<(), CiError> {
        let endpoint = format!("/app/rest/builds/{}/tags", build.locator());
        self.send_json(Method::POST, &endpoint, tags).await
    }

    async fn dependency_closure(
        &self,
        build: &BuildIdentifier,
        kind: DependencyKind,
    ) -> Result<Vec<BuildHandle>, CiError> {
        let locator = build.closure_locator(kind);
        let list: BuildList = self
            .get_json("/app/rest/builds", &[("locator", locator.as_str())])
            .await?;
        Ok(list.build)
    }

    async fn set_pin(&self, build: &BuildHandle, request: &PinRequest) -> Result<(), CiError> {
        self.send_json(Method::PUT, &build.pin_info_href(), request)
            .await
    }

    async fn build_revisions(&self, build: &BuildHandle) -> Result<Vec<Revision>, CiError> {
        let details: BuildDetails = self.get_json(&build.href, &[]).await?;
        Ok(details.revisions.revision)
    }

    async fn vcs_root_properties(&self, root: &VcsRootInstance) -> Result<Vec<Property>, CiError> {
        let details: VcsRootInstanceDetails = self.get_json(&root.href, &[]).await?;
        Ok(details.properties.property)
    }
}
