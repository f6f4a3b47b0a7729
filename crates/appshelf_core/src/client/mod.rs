//! Registry client backed by the Docker Hub API and the Distribution API

use std::collections::HashSet;

use async_trait::async_trait;
use oci_spec::image::MediaType;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

mod api;
use api::{NamedEntry, Page, RepositorySummary, TokenResponse};

use crate::errors::{Error, Result};
use crate::oci_digest::OciDigest;
use crate::registry::{default_tag, Registry, RegistryConfig};
use crate::types::{
    ConfigBlob, Manifest, RepositoryInfo, RepositoryName, DOCKER_MANIFEST_LIST_MEDIA_TYPE,
    DOCKER_MANIFEST_MEDIA_TYPE,
};

const DOCKER_CONFIG_MEDIA_TYPE: &str = "application/vnd.docker.container.image.v1+json";

/// [`Registry`] implementation talking to Docker Hub (listings) and a Distribution API registry
/// (manifests, blobs, pull tokens).
///
/// Manifest and blob requests are first sent anonymously; a `401` triggers exactly one retry with
/// a freshly issued pull token. Tokens are never cached.
#[derive(Clone, Debug)]
pub struct HubClient {
    client: Client,
    config: RegistryConfig,
}

impl HubClient {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("appshelf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn hub_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/v2/{}",
            self.config.hub_url.trim_end_matches('/'),
            path
        ))?;
        url.query_pairs_mut()
            .append_pair("page_size", &self.config.page_size.to_string());
        Ok(url)
    }

    fn registry_url(&self, name: &RepositoryName, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/v2/{}/{}",
            self.config.registry_url.trim_end_matches('/'),
            name,
            path
        ))?)
    }

    /// GET a JSON document, mapping `404` to `None`.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.json::<T>().await?)),
            status => Err(Error::UnexpectedStatus {
                url: url.to_string(),
                status,
            }),
        }
    }

    /// GET from the Distribution API, retrying once with a pull token if the anonymous request is
    /// rejected with `401`.
    async fn pull(&self, name: &RepositoryName, url: &Url, accept: &str) -> Result<Response> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept)
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("anonymous request to {url} rejected, retrying with pull token");
        let token = self.get_auth_token(name).await?;
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept)
            .bearer_auth(token)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::error!("pull token rejected for {url}");
            return Err(Error::Authentication(format!(
                "pull token for {name} rejected by {url}"
            )));
        }
        Ok(response)
    }

    async fn fetch_manifest(&self, name: &RepositoryName, reference: &str) -> Result<Response> {
        let url = self.registry_url(name, &format!("manifests/{reference}"))?;
        self.pull(name, &url, &manifest_accept()).await
    }

    /// Follow a manifest list or image index down to a single platform manifest.
    async fn resolve_index(&self, name: &RepositoryName, index: Manifest) -> Result<Manifest> {
        let digest = match index.platform_manifest().map(|entry| entry.digest.clone()) {
            Some(digest) => OciDigest::try_from(digest.as_str())?,
            None => return Ok(index),
        };
        tracing::debug!("{name}: following index entry {digest}");

        let response = self.fetch_manifest(name, &digest.to_string()).await?;
        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus {
                url: response.url().to_string(),
                status: response.status(),
            });
        }
        Ok(response.json::<Manifest>().await?)
    }
}

fn manifest_accept() -> String {
    [
        MediaType::ImageManifest.to_string(),
        MediaType::ImageIndex.to_string(),
        DOCKER_MANIFEST_MEDIA_TYPE.to_string(),
        DOCKER_MANIFEST_LIST_MEDIA_TYPE.to_string(),
    ]
    .join(", ")
}

fn config_accept() -> String {
    [
        MediaType::ImageConfig.to_string(),
        DOCKER_CONFIG_MEDIA_TYPE.to_string(),
        String::from("application/json"),
    ]
    .join(", ")
}

#[async_trait]
impl Registry for HubClient {
    async fn list_repositories(&self) -> Result<Vec<String>> {
        let namespace = self.config.namespace.as_str();
        tracing::info!("listing repositories in namespace {namespace}");

        let mut names = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.hub_url(&format!("repositories/{namespace}/"))?);
        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                tracing::error!("repository listing page {url} was already visited");
                return Err(Error::PaginationLoop(url.to_string()));
            }
            let page: Page<NamedEntry> = match self.get_json(url.clone()).await {
                Ok(Some(page)) => page,
                Ok(None) => {
                    tracing::error!("repository listing page {url} not found");
                    return Err(Error::UnexpectedStatus {
                        url: url.to_string(),
                        status: StatusCode::NOT_FOUND,
                    });
                }
                Err(e) => {
                    tracing::error!("failed to fetch repository listing page {url}: {e}");
                    return Err(e);
                }
            };
            names.extend(
                page.results
                    .into_iter()
                    .map(|entry| format!("{namespace}/{}", entry.name)),
            );
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }

        tracing::info!("found {} repositories in {namespace}", names.len());
        Ok(names)
    }

    async fn get_repository_info(&self, name: &RepositoryName) -> Option<RepositoryInfo> {
        let url = match self.hub_url(&format!("repositories/{name}/")) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("{name}: {e}");
                return None;
            }
        };
        let summary: RepositorySummary = match self.get_json(url).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                tracing::warn!("repository {name} not found");
                return None;
            }
            Err(e) => {
                tracing::error!("failed to fetch repository info for {name}: {e}");
                return None;
            }
        };

        let tags = self.get_tags(name).await;
        tracing::info!("{name}: fetched repository info ({} tags)", tags.len());
        Some(RepositoryInfo {
            name: Some(summary.name),
            description: summary.description,
            has_tags: !tags.is_empty(),
            tags,
        })
    }

    async fn get_tags(&self, name: &RepositoryName) -> Vec<String> {
        let url = match self.hub_url(&format!("repositories/{name}/tags")) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("{name}: {e}");
                return Vec::new();
            }
        };
        match self.get_json::<Page<NamedEntry>>(url).await {
            Ok(Some(page)) => page.results.into_iter().map(|t| t.name).collect(),
            Ok(None) => {
                tracing::warn!("no tags found for {name}");
                Vec::new()
            }
            Err(e) => {
                tracing::error!("failed to fetch tags for {name}: {e}");
                Vec::new()
            }
        }
    }

    async fn get_manifest(
        &self,
        name: &RepositoryName,
        tag: Option<&str>,
    ) -> Result<Option<Manifest>> {
        let (tag, known_tags) = match tag {
            Some(tag) => (tag.to_string(), None),
            None => {
                let tags = self.get_tags(name).await;
                match default_tag(&tags) {
                    Some(tag) => (tag.to_string(), Some(tags.clone())),
                    None => {
                        tracing::warn!("{name} has no tags, skipping manifest");
                        return Ok(None);
                    }
                }
            }
        };

        tracing::info!("{name}: fetching manifest for tag {tag}");
        let response = self.fetch_manifest(name, &tag).await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                let available = match known_tags {
                    Some(tags) => tags,
                    None => self.get_tags(name).await,
                };
                tracing::error!("{name}: manifest for tag {tag} not found");
                Err(Error::TagNotFound {
                    repository: name.to_string(),
                    tag,
                    available,
                })
            }
            s if s.is_success() => {
                let manifest = response.json::<Manifest>().await?;
                if manifest.is_index() {
                    return Ok(Some(self.resolve_index(name, manifest).await?));
                }
                Ok(Some(manifest))
            }
            status => {
                tracing::error!("{name}: manifest request for {tag} failed with {status}");
                Err(Error::UnexpectedStatus {
                    url: response.url().to_string(),
                    status,
                })
            }
        }
    }

    async fn get_config(
        &self,
        name: &RepositoryName,
        digest: &OciDigest,
    ) -> Result<Option<ConfigBlob>> {
        tracing::info!("{name}: fetching config blob {digest}");
        let url = self.registry_url(name, &format!("blobs/{digest}"))?;
        let response = self.pull(name, &url, &config_accept()).await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::warn!("{name}: config blob {digest} not found");
                Ok(None)
            }
            s if s.is_success() => Ok(Some(response.json::<ConfigBlob>().await?)),
            status => {
                tracing::error!("{name}: config blob request failed with {status}");
                Err(Error::UnexpectedStatus {
                    url: url.to_string(),
                    status,
                })
            }
        }
    }

    async fn get_auth_token(&self, name: &RepositoryName) -> Result<String> {
        let mut url = Url::parse(&format!(
            "{}/token",
            self.config.auth_url.trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("service", &self.config.auth_service)
            .append_pair("scope", &format!("repository:{name}:pull"));

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            tracing::error!("token request for {name} failed with {}", response.status());
            return Err(Error::UnexpectedStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }
        match response.json::<TokenResponse>().await?.token {
            Some(token) => Ok(token),
            None => {
                tracing::error!("token response for {name} carried no token");
                Err(Error::Authentication(format!(
                    "no token issued for repository:{name}:pull"
                )))
            }
        }
    }
}
