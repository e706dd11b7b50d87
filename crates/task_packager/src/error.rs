use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("could not read distribution path {0}")]
    MissingDistDir(PathBuf),
    #[error("could not read task path {0}")]
    MissingTaskDir(PathBuf),
    #[error("no tasks found in {0}")]
    NoTasks(PathBuf),
    #[error("unknown task '{name}', available: {available}")]
    UnknownTask { name: String, available: String },
    #[error("invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
    #[error("missing package source {0}")]
    MissingSource(PathBuf),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl PackError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
