//! Error types for zone loading and decoding

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A vertex that is not a `[lng, lat]` pair of finite numbers
    #[error("zone {zone} vertex {vertex} is not a finite [lng, lat] pair")]
    MalformedCoordinate { zone: usize, vertex: usize },
}
