use thiserror::Error;

/// Canonical result for the optimizer crates.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The input topology/application description is inconsistent
    /// (unknown references, duplicate names, degenerate distributions).
    #[error("Invalid model input: {0}")]
    Model(String),

    /// A matrix has the wrong dimensions or holds an out-of-range value.
    /// This is a contract failure between extractor and solver, not a
    /// property of the topology.
    #[error("Shape violation: {0}")]
    Shape(String),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}
