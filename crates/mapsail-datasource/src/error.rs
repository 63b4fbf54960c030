use thiserror::Error;

pub type DatasourceResult<T> = Result<T, DatasourceError>;

/// The uniform error reported by datasource plugins to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("datasource error: {message}")]
pub struct DatasourceError {
    message: String,
}

impl DatasourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The diagnostic message without the error prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}
