//! # Catalog aggregation
//!
//! Folds the metadata a [`Registry`] can provide for each repository into an [`AppRecord`],
//! falling back progressively when upstream data is partial:
//!
//! 1. repository info: if absent, the repository is omitted
//! 2. tags: if there are none, an info-only record is produced
//! 3. manifest of the default tag: if absent or without config digest, info-only record
//! 4. config blob: if absent or failing, info-only record
//! 5. labels: title, description and picture URL labels override the info fields
//!
//! Any error while resolving one repository is contained at that repository and produces a
//! minimal record instead.
use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use crate::errors::Result;
use crate::registry::{default_tag, Registry};
use crate::types::{AppRecord, ConfigBlob, RepositoryInfo, RepositoryName};

pub const TITLE_LABEL: &str = "org.opencontainers.image.title";
pub const DESCRIPTION_LABEL: &str = "org.opencontainers.image.description";
pub const PICTURE_URL_LABEL: &str = "org.opencontainers.image.picture-url";

pub const PLACEHOLDER_DESCRIPTION: &str = "No description provided.";
pub const UNAVAILABLE_DESCRIPTION: &str = "Description unavailable.";
pub const PLACEHOLDER_PICTURE_URL: &str = "https://via.placeholder.com/150";

/// Outcome of the fallible part of a single repository's resolution.
enum Resolution {
    Omitted,
    Record(AppRecord),
}

#[derive(Clone)]
pub struct Catalog<R: Registry> {
    registry: R,
}

impl<R: Registry> Catalog<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// Resolve every repository of the namespace concurrently.
    ///
    /// Records are returned in listing order; omitted repositories are dropped. A failed listing
    /// yields an empty catalog.
    pub async fn fetch_all(&self) -> Vec<AppRecord> {
        let names = match self.registry.list_repositories().await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!("failed to list repositories: {e}");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let handles = names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| {
                let catalog = self.clone();
                tokio::spawn(async move { catalog.resolve_one(name).await })
            })
            .collect::<Vec<_>>();

        let records = join_all(handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!("repository resolution task failed: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();

        tracing::info!("catalog contains {} apps", records.len());
        records
    }

    /// Resolve a single repository, containing any failure to this repository.
    ///
    /// Returns `None` when the repository does not exist or its name is invalid.
    pub async fn resolve_one(&self, raw_name: String) -> Option<AppRecord> {
        let name = match RepositoryName::try_from(raw_name) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("skipping repository: {e}");
                return None;
            }
        };

        match self.resolve(&name).await {
            Ok(Resolution::Record(record)) => Some(record),
            Ok(Resolution::Omitted) => None,
            Err(e) => {
                tracing::error!("{name}: resolution failed, using minimal record: {e}");
                Some(AppRecord::new(
                    name.to_string(),
                    name,
                    UNAVAILABLE_DESCRIPTION.to_string(),
                    PLACEHOLDER_PICTURE_URL.to_string(),
                ))
            }
        }
    }

    async fn resolve(&self, name: &RepositoryName) -> Result<Resolution> {
        let info = match self.registry.get_repository_info(name).await {
            Some(info) => info,
            None => {
                tracing::warn!("{name}: no repository info, omitting");
                return Ok(Resolution::Omitted);
            }
        };

        let config = match self.fetch_config(name, &info).await? {
            Some(config) => config,
            None => return Ok(Resolution::Record(info_record(name, &info))),
        };

        Ok(Resolution::Record(labelled_record(
            name,
            &info,
            &config.labels(),
        )))
    }

    /// Walk tags → manifest → config blob. `Ok(None)` means an info-only record should be used.
    async fn fetch_config(
        &self,
        name: &RepositoryName,
        info: &RepositoryInfo,
    ) -> Result<Option<ConfigBlob>> {
        let tag = match default_tag(&info.tags) {
            Some(tag) if info.has_tags => tag,
            _ => {
                tracing::info!("{name}: no tags, using repository info only");
                return Ok(None);
            }
        };

        let digest = match self.registry.get_manifest(name, Some(tag)).await? {
            Some(manifest) => manifest.config_digest(),
            None => None,
        };
        let digest = match digest {
            Some(digest) => digest,
            None => {
                tracing::info!("{name}: no manifest config digest, using repository info only");
                return Ok(None);
            }
        };

        match self.registry.get_config(name, &digest).await {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("{name}: config blob {digest} unavailable: {e}");
                Ok(None)
            }
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn info_record(name: &RepositoryName, info: &RepositoryInfo) -> AppRecord {
    AppRecord::new(
        non_blank(info.name.as_deref())
            .unwrap_or(name.as_str())
            .to_string(),
        name.clone(),
        non_blank(info.description.as_deref())
            .unwrap_or(PLACEHOLDER_DESCRIPTION)
            .to_string(),
        PLACEHOLDER_PICTURE_URL.to_string(),
    )
}

fn labelled_record(
    name: &RepositoryName,
    info: &RepositoryInfo,
    labels: &HashMap<String, String>,
) -> AppRecord {
    let label = |key: &str| non_blank(labels.get(key).map(String::as_str));
    AppRecord::new(
        label(TITLE_LABEL)
            .or(non_blank(info.name.as_deref()))
            .unwrap_or(name.as_str())
            .to_string(),
        name.clone(),
        label(DESCRIPTION_LABEL)
            .or(non_blank(info.description.as_deref()))
            .unwrap_or(PLACEHOLDER_DESCRIPTION)
            .to_string(),
        label(PICTURE_URL_LABEL)
            .unwrap_or(PLACEHOLDER_PICTURE_URL)
            .to_string(),
    )
}
