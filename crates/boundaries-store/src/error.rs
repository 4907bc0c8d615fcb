use std::path::PathBuf;

use boundaries_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bad ZIP file {path}: {source}")]
    BadZip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("bad KMZ file {path}: {source}")]
    BadKmz {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("too many layers ({count}) in {path}")]
    TooManyLayers { path: PathBuf, count: usize },

    #[error("no layers in {0}")]
    NoLayers(PathBuf),

    #[error("unrecognized extension {0:?}")]
    Unsupported(String),

    #[error("malformed ogr2ogr arguments {0:?}")]
    Arguments(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Tool {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}
