use std::path::PathBuf;

use thiserror::Error;

/// A finished fragment response. Once produced, nothing else may be written
/// for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum PjaxError {
    /// The response has already been fully produced; stop rendering and send it.
    #[error("fragment response already written ({} bytes)", .0.body.len())]
    Halt(FragmentResponse),

    #[error("output buffer level {expected} closed before the widget ended (now at {actual})")]
    BufferUnderflow { expected: usize, actual: usize },

    #[error("failed to publish {path}: {source}")]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl PjaxError {
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt(_))
    }

    pub fn into_fragment(self) -> Result<FragmentResponse, Self> {
        match self {
            Self::Halt(fragment) => Ok(fragment),
            other => Err(other),
        }
    }
}
