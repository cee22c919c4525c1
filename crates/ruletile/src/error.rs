use ruletile_rules::LibraryError;
use thiserror::Error;

/// Errors from loading or saving configuration and tile libraries
#[derive(Debug, Error)]
pub enum RuleTileError {
    #[error("Failed to read or write file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid tile library: {0}")]
    Library(#[from] LibraryError),
}
