use thiserror::Error;

/// Errors produced while decoding on-disk records.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("malformed record: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
