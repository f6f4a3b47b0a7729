use std::collections::HashMap;
use std::fmt;

use oci_spec::image::MediaType;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::oci_digest::OciDigest;

/// Media type Docker Hub uses for single-platform schema 2 manifests.
pub const DOCKER_MANIFEST_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// Media type Docker Hub uses for multi-platform manifest lists.
pub const DOCKER_MANIFEST_LIST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";

/// Fully-qualified repository name of the form `<namespace>/<repo>`.
///
/// Construction rejects blank names and names containing empty path segments, so a
/// `RepositoryName` can always be used as a URL path component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for RepositoryName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::InvalidRepositoryName(s));
        }
        if s.split('/').any(|segment| segment.trim().is_empty()) {
            return Err(Error::InvalidRepositoryName(s));
        }
        Ok(Self(s))
    }
}

impl TryFrom<&str> for RepositoryName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::try_from(s.to_string())
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Summary metadata for a repository, combined with its tag listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RepositoryInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub has_tags: bool,
    /// Tag names in the order the registry reported them.
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReference {
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Platform {
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub os: String,
}

/// Entry of a manifest list or OCI image index.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformManifest {
    pub digest: String,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Image manifest, manifest list, or OCI image index as returned by the manifests endpoint.
///
/// Only the fields needed to reach the config blob are retained.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub config: Option<ConfigReference>,
    #[serde(default)]
    pub manifests: Vec<PlatformManifest>,
}

impl Manifest {
    /// Digest of the config blob, if present and well-formed.
    pub fn config_digest(&self) -> Option<OciDigest> {
        let digest = self.config.as_ref()?.digest.as_deref()?;
        match OciDigest::try_from(digest) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::warn!("ignoring malformed config digest {digest:?}: {e}");
                None
            }
        }
    }

    pub fn is_index(&self) -> bool {
        if !self.manifests.is_empty() {
            return true;
        }
        match &self.media_type {
            Some(MediaType::ImageIndex) => true,
            Some(MediaType::Other(s)) => s == DOCKER_MANIFEST_LIST_MEDIA_TYPE,
            _ => false,
        }
    }

    /// Select the platform manifest to follow when this manifest is an index: `linux/amd64` if
    /// listed, otherwise the first entry.
    pub fn platform_manifest(&self) -> Option<&PlatformManifest> {
        self.manifests
            .iter()
            .find(|m| match &m.platform {
                Some(p) => p.os == "linux" && p.architecture == "amd64",
                None => false,
            })
            .or_else(|| self.manifests.first())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ContainerConfig {
    #[serde(rename = "Labels", default)]
    pub labels: Option<HashMap<String, String>>,
}

/// Image config blob. Only `config.Labels` is read.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ConfigBlob {
    #[serde(default)]
    pub config: Option<ContainerConfig>,
}

impl ConfigBlob {
    /// Label set of the image; empty when the config carries none.
    pub fn labels(&self) -> HashMap<String, String> {
        self.config
            .as_ref()
            .and_then(|c| c.labels.clone())
            .unwrap_or_default()
    }
}

/// A catalog entry as served to clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    name: String,
    location: RepositoryName,
    description: String,
    picture_url: String,
}

impl AppRecord {
    pub fn new(
        name: String,
        location: RepositoryName,
        description: String,
        picture_url: String,
    ) -> Self {
        Self {
            name,
            location,
            description,
            picture_url,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &RepositoryName {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn picture_url(&self) -> &str {
        &self.picture_url
    }
}
