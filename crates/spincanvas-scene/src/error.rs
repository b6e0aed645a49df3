//! Error types for the scene core
//!
//! Only configuration and lifecycle misuse are surfaced to callers. Asset
//! load failures are wrapped in [`AssetLoadFailure`] and handed to the
//! diagnostics sink; the render loop keeps running without the asset.

use thiserror::Error;

/// Why an asset could not be turned into a fragment
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to fetch asset: {0}")]
    Fetch(String),
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },
    #[error("Failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF asset contains no scene")]
    NoScene,
    #[error("Buffer {0} has no binary chunk to read from")]
    MissingBuffer(usize),
    #[error("External buffer URIs are not supported: {0}")]
    ExternalBuffer(String),
    #[error("Invalid data URI: {0}")]
    DataUri(String),
    #[error("Buffer {index} declares {expected} bytes but only {actual} are present")]
    BufferLength {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Unreadable accessor data for {0}")]
    Accessor(String),
}

/// A failed load of a specific asset path, as reported to diagnostics
#[derive(Error, Debug)]
#[error("An error occurred while loading the model '{path}': {error}")]
pub struct AssetLoadFailure {
    pub path: String,
    #[source]
    pub error: LoadError,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised by a platform render surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Failed to attach surface: {0}")]
    Attach(String),
    #[error("Rendering context unavailable: {0}")]
    Context(String),
    #[error("Shader error: {0}")]
    Shader(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Canvas is already mounted")]
    AlreadyMounted,
    #[error("Canvas has been unmounted and cannot be mounted again")]
    Disposed,
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
