//! Error types for Placenote

use thiserror::Error;

/// Errors raised inside the crate.
///
/// Only catalog errors are fatal. Everything else is caught at the
/// boundary of the working-set manager or the composer, logged, and
/// turned into a no-op.
#[derive(Error, Debug)]
pub enum PlacenoteError {
    /// Catalog file could not be read
    #[error("catalog unreadable: {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not a JSON array of places
    #[error("catalog undecodable: {0}")]
    CatalogDecode(#[from] serde_json::Error),

    /// Two catalog entries share a place name
    #[error("duplicate place name in catalog: '{0}'")]
    DuplicatePlace(String),

    /// No usable visitor position
    #[error("origin unavailable")]
    OriginUnavailable,

    /// Region gateway refused a start/stop request
    #[error("gateway failed for region '{name}': {message}")]
    Gateway { name: String, message: String },

    /// Image could not be fetched
    #[error("image fetch failed for '{url}': {message}")]
    ImageFetch { url: String, message: String },

    /// Image cache could not be written
    #[error("image cache error: {0}")]
    Cache(#[source] std::io::Error),

    /// Event log could not be written
    #[error("event log error: {0}")]
    Log(#[source] std::io::Error),

    /// The serialized manager task is gone
    #[error("service closed")]
    ServiceClosed,
}

impl PlacenoteError {
    /// Shorthand for a gateway failure
    pub fn gateway(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an image fetch failure
    pub fn image_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageFetch {
            url: url.into(),
            message: message.into(),
        }
    }
}
