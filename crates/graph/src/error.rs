use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The one-time build failed; the engine stays queryable but empty
    #[error("Call graph initialization failed: {0}")]
    InitError(String),
}

impl GraphError {
    pub fn init(msg: impl Into<String>) -> Self {
        Self::InitError(msg.into())
    }
}
