use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::PackError;

/// The packaging fields of the project manifest; everything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    pub exclude_deps: Vec<String>,
}

impl PackageManifest {
    pub fn load(path: &Path) -> Result<Self, PackError> {
        let raw = fs::read_to_string(path).map_err(|error| PackError::Manifest {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        Self::parse(&raw).map_err(|error| PackError::Manifest {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn excludes(&self, dependency: &str) -> bool {
        self.exclude_deps.iter().any(|name| name == dependency)
    }
}
