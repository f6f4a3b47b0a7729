use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Deserialize;

use appshelf_core::RegistryConfig;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub registry: RegistryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: String::from("info"),
            registry: RegistryConfig::default(),
        }
    }
}

/// Settings taken from the command line or environment, overriding the config file.
#[derive(Args, Clone, Debug, Default)]
pub struct Overrides {
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
    /// Base URL of the Distribution API serving manifests and blobs.
    #[arg(long, env = "REGISTRY_URL")]
    pub registry_url: Option<String>,
    /// Base URL of the API listing repositories and tags.
    #[arg(long, env = "HUB_URL")]
    pub hub_url: Option<String>,
    /// Base URL of the token service issuing pull tokens.
    #[arg(long, env = "AUTH_URL")]
    pub auth_url: Option<String>,
    #[arg(long, env = "REGISTRY_NAMESPACE")]
    pub namespace: Option<String>,
}

impl Config {
    /// Load configuration from an optional YAML file, then apply overrides.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let mut file = File::open(path)?;
                let mut s = String::new();
                file.read_to_string(&mut s)?;
                serde_yaml::from_str(&s)?
            }
            None => Config::default(),
        };
        Ok(config.with_overrides(overrides))
    }

    fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(log_level) = &overrides.log_level {
            self.log_level = log_level.clone();
        }
        if let Some(url) = &overrides.registry_url {
            self.registry.registry_url = url.clone();
        }
        if let Some(url) = &overrides.hub_url {
            self.registry.hub_url = url.clone();
        }
        if let Some(url) = &overrides.auth_url {
            self.registry.auth_url = url.clone();
        }
        if let Some(namespace) = &overrides.namespace {
            self.registry.namespace = namespace.clone();
        }
        self
    }
}
