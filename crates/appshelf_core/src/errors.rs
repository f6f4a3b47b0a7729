use thiserror;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid repository name: {0:?}")]
    InvalidRepositoryName(String),
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedDigestAlgorithm(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("tag '{tag}' not found in {repository}, available tags: {available:?}")]
    TagNotFound {
        repository: String,
        tag: String,
        available: Vec<String>,
    },

    #[error("repository listing links back to {0}")]
    PaginationLoop(String),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("http error: {0}")]
    HTTPError(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
