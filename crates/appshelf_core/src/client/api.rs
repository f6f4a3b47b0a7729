//! Docker Hub and token service response types

use serde::Deserialize;

/// One page of a paginated catalog listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Absolute URL of the following page, `null` on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

/// Listing entry carrying only a name (repositories and tags).
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

/// Repository summary from `/v2/repositories/<namespace>/<repo>/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}
