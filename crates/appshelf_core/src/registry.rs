//! # Registry Abstractions
//!
//! Defines the interoperability layer between [`crate::catalog::Catalog`] and the upstream image
//! registry. The catalog only ever talks to a [`Registry`], which keeps the aggregation logic
//! independent of the HTTP details and lets it be exercised against in-memory registries.
//!
//! ## Known Implementations
//!
//! ### [`crate::client::HubClient`]
//!
//! Talks to two services: the Docker Hub API for repository and tag listings, and the
//! Distribution API (plus its token service) for manifests and config blobs.
use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::Result;
use crate::oci_digest::OciDigest;
use crate::types::{ConfigBlob, Manifest, RepositoryInfo, RepositoryName};

/// Upstream endpoints and namespace the catalog is built from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry account or organization whose repositories are listed.
    pub namespace: String,
    /// Base URL of the catalog API (repository and tag listings).
    pub hub_url: String,
    /// Base URL of the Distribution API (manifests and blobs).
    pub registry_url: String,
    /// Base URL of the token service issuing pull tokens.
    pub auth_url: String,
    /// `service` parameter sent to the token service.
    pub auth_service: String,
    /// `page_size` requested from the catalog API.
    pub page_size: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: String::from("library"),
            hub_url: String::from("https://hub.docker.com"),
            registry_url: String::from("https://registry-1.docker.io"),
            auth_url: String::from("https://auth.docker.io"),
            auth_service: String::from("registry.docker.io"),
            page_size: 100,
        }
    }
}

/// Read-only access to the repositories of one registry namespace.
///
/// Implementations isolate transport failures according to the soft-miss policy of each method:
/// methods returning [`Option`] or [`Vec`] never fail, methods returning [`Result`] report hard
/// failures and leave fallback policy to the caller.
#[async_trait]
pub trait Registry: Clone + Send + Sync + 'static {
    /// List every repository of the configured namespace as `<namespace>/<repo>`, following
    /// pagination to the end. Fails as a whole if any page fails.
    async fn list_repositories(&self) -> Result<Vec<String>>;

    /// Summary metadata and tags for a repository. `None` if the repository does not exist or
    /// could not be fetched.
    async fn get_repository_info(&self, name: &RepositoryName) -> Option<RepositoryInfo>;

    /// Tag names in registry order. Empty if the repository has no tags or the listing failed.
    async fn get_tags(&self, name: &RepositoryName) -> Vec<String>;

    /// Manifest for `tag`, or for the default tag when `tag` is `None`. `Ok(None)` when the
    /// repository has no tags at all.
    async fn get_manifest(
        &self,
        name: &RepositoryName,
        tag: Option<&str>,
    ) -> Result<Option<Manifest>>;

    /// Config blob addressed by `digest`. `Ok(None)` if the blob does not exist.
    async fn get_config(
        &self,
        name: &RepositoryName,
        digest: &OciDigest,
    ) -> Result<Option<ConfigBlob>>;

    /// Short-lived pull token scoped to `repository:<name>:pull`.
    async fn get_auth_token(&self, name: &RepositoryName) -> Result<String>;
}

/// Tag the catalog resolves when none is given: `latest` if present, otherwise the first tag in
/// registry order.
pub fn default_tag(tags: &[String]) -> Option<&str> {
    tags.iter()
        .find(|t| t.as_str() == "latest")
        .or_else(|| tags.first())
        .map(String::as_str)
}
