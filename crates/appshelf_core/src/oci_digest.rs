use std::fmt;

use crate::{Error, Result};

// https://github.com/opencontainers/image-spec/blob/main/descriptor.md#digests
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OciDigest {
    algorithm: RegisteredImageSpecAlgorithm,
    encoded: String,
}

impl TryFrom<&str> for OciDigest {
    type Error = Error;
    fn try_from(s: &str) -> Result<Self> {
        let (algo, encoded) = match s.split_once(':') {
            Some(parts) => parts,
            None => return Err(Error::InvalidDigest(s.to_string())),
        };
        if algo.is_empty() || encoded.is_empty() {
            return Err(Error::InvalidDigest(s.to_string()));
        }
        if !encoded.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidDigest(s.to_string()));
        }
        let algorithm = RegisteredImageSpecAlgorithm::try_from(algo)?;

        Ok(Self {
            algorithm,
            encoded: encoded.to_string(),
        })
    }
}

impl From<&OciDigest> for String {
    fn from(d: &OciDigest) -> String {
        d.to_string()
    }
}

impl fmt::Display for OciDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.encoded)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum RegisteredImageSpecAlgorithm {
    Sha256,
    Sha512,
}

impl RegisteredImageSpecAlgorithm {
    fn as_str(&self) -> &'static str {
        match self {
            RegisteredImageSpecAlgorithm::Sha256 => "sha256",
            RegisteredImageSpecAlgorithm::Sha512 => "sha512",
        }
    }
}

impl TryFrom<&str> for RegisteredImageSpecAlgorithm {
    type Error = Error;

    fn try_from(a: &str) -> Result<Self> {
        match a {
            "sha512" => Ok(RegisteredImageSpecAlgorithm::Sha512),
            "sha256" => Ok(RegisteredImageSpecAlgorithm::Sha256),
            s => Err(Error::UnsupportedDigestAlgorithm(String::from(s))),
        }
    }
}
