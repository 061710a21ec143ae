/*!
Error type shared by the whole crate.
 */
use std::{convert::Infallible, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Construction arguments below the minimum cardinality or mutually exclusive sources
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Well typed but semantically wrong input
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Wrong geometry kind or structure where a specific one is required
    #[error("invalid type: {0}")]
    InvalidType(String),
    #[error("file not found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = std::result::Result<T, Error>;
