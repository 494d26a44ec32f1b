/// Errors produced while decoding a unit dump.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DumpError {
    #[error("dump is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed dump at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl DumpError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }

    /// 1-based line the parser stopped at, if the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Utf8(_) => None,
            Self::Malformed { line, .. } => Some(*line),
        }
    }
}

pub type Result<T> = std::result::Result<T, DumpError>;
