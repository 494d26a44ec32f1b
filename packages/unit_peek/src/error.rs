use std::time::Duration;

use unit_dump::DumpError;

#[derive(Debug, thiserror::Error)]
pub enum PeekError {
    /// The dump could not be decoded; the introspection source is broken.
    #[error("failed to parse unit dump: {0}")]
    Parse(#[from] DumpError),

    /// The condition never held before the deadline.
    #[error("timed out after {0:?} waiting for condition")]
    Timeout(Duration),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl PeekError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, PeekError>;
