//! # appshelf core
//!
//! Presents the repositories of a registry namespace as a catalog of "apps". The [`registry`]
//! module defines the seam between catalog aggregation and the network, [`client`] implements it
//! against the Docker Hub API plus the Distribution API, and [`catalog`] folds whatever metadata
//! is available for each repository into an [`AppRecord`].

pub mod errors;
pub use errors::{Error, Result};

mod oci_digest;
pub use oci_digest::OciDigest;

mod types;
pub use types::{
    AppRecord, ConfigBlob, ConfigReference, ContainerConfig, Manifest, Platform, PlatformManifest,
    RepositoryInfo, RepositoryName,
};

pub mod registry;
pub use registry::{Registry, RegistryConfig};

pub mod client;
pub use client::HubClient;

pub mod catalog;
pub use catalog::Catalog;
