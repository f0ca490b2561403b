use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The search index (or file server) could not be reached or answered
    /// with a transport-level failure. Always names the target host.
    #[error("cannot reach search index at {host}: {source}")]
    Connectivity {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The index rejected a query because an attribute is not yet configured
    /// as searchable/filterable. Transient while settings converge; callers
    /// should retry shortly.
    #[error("search index is still warming up, retry shortly: {0}")]
    IndexWarming(String),

    /// The app is served over a secure origin but the index endpoint is not.
    /// Raised before any network I/O.
    #[error("blocked mixed content: page origin is {origin_scheme} but search index {host} is plain http")]
    MixedContent { origin_scheme: String, host: String },

    #[error("index error: {0}")]
    Index(String),

    #[error("file server error: {0}")]
    FileServer(String),

    #[error("authority lookup error ({service}): {message}")]
    Authority { service: String, message: String },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an index-layer failure in a connectivity error naming the host,
    /// unless it is already one of our typed conditions.
    pub fn connectivity(host: &str, err: Error) -> Error {
        match err {
            e @ (Error::IndexWarming(_) | Error::MixedContent { .. } | Error::Connectivity { .. }) => e,
            other => Error::Connectivity {
                host: host.to_string(),
                source: Box::new(other),
            },
        }
    }
}
