use std::path::PathBuf;
use thiserror::Error;

/// Result type for program loading
pub type Result<T> = std::result::Result<T, ProgramError>;

/// Errors that can occur while loading and checking a program
#[derive(Error, Debug)]
pub enum ProgramError {
    /// The build manifest exists but could not be understood
    #[error("Invalid manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// Failed to parse a source file
    #[error("Parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    /// Tree-sitter setup error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid program root
    #[error("Invalid program root: {0}")]
    InvalidRoot(String),
}

impl ProgramError {
    /// Create a parse error
    pub fn parse(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
