use std::path::{Path, PathBuf};

use crate::environment::Environment;

/// Where a packaging run finds its inputs, relative to the project root.
///
/// Absolute paths in any field are used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub tasks_dir: PathBuf,
    pub task_extension: String,
    /// Runtime files copied next to every task (the app entry point first).
    pub shared_files: Vec<PathBuf>,
    pub overlay_dir: PathBuf,
    pub dependency_dir: PathBuf,
    pub manifest_file: PathBuf,
    pub dist_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tasks_dir: PathBuf::from("tasks"),
            task_extension: "js".to_string(),
            shared_files: vec![
                PathBuf::from("app.js"),
                PathBuf::from(".env"),
                PathBuf::from("toolbox.js"),
            ],
            overlay_dir: PathBuf::from("environment-deps"),
            dependency_dir: PathBuf::from("node_modules"),
            manifest_file: PathBuf::from("package.json"),
            dist_dir: PathBuf::from("dist"),
        }
    }

    pub fn with_dist_dir(mut self, dist_dir: impl Into<PathBuf>) -> Self {
        self.dist_dir = dist_dir.into();
        self
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.resolve(&self.tasks_dir)
    }

    pub fn shared_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.shared_files.iter().map(|file| self.resolve(file))
    }

    pub fn overlay_path(&self, environment: Environment) -> PathBuf {
        self.resolve(&self.overlay_dir).join(environment.as_str())
    }

    pub fn dependency_path(&self) -> PathBuf {
        self.resolve(&self.dependency_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.manifest_file)
    }

    pub fn dist_path(&self) -> PathBuf {
        self.resolve(&self.dist_dir)
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}
