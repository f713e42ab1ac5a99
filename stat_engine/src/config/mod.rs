//! Content loading from TOML files

mod content;
mod validate;

pub use content::{Content, ContentFile};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Why a content file could not be turned into definitions
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read content file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("content is not valid TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid content definition: {0}")]
    ValidationError(String),
}

/// Read a content file from disk and deserialize it
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    parse_toml(&fs::read_to_string(path)?)
}

/// Deserialize content from TOML text
pub fn parse_toml<T: DeserializeOwned>(text: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(text)?)
}
