use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;

use crate::discovery::TaskSource;
use crate::environment::Environment;
use crate::error::PackError;
use crate::layout::ProjectLayout;
use crate::manifest::PackageManifest;
use crate::rewrite::rewrite_app_import;

const SCRATCH_PREFIX: &str = "lambda-dist-";

/// A file or folder to place in the archive under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFileEntry {
    pub source: PathBuf,
    pub target: String,
}

/// A retained dependency, archived under `node_modules/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFolderEntry {
    pub source: PathBuf,
    pub target: String,
}

/// Everything staged for one task, with sources pointing into the scratch tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedTask {
    pub files: Vec<PackageFileEntry>,
    pub folders: Vec<PackageFileEntry>,
    pub dependencies: Vec<DependencyFolderEntry>,
}

impl StagedTask {
    pub fn entry_count(&self) -> usize {
        self.files.len() + self.folders.len() + self.dependencies.len()
    }
}

/// Per-run staging root. It is removed when dropped, so every exit path
/// cleans up.
#[derive(Debug)]
pub struct ScratchRoot {
    dir: TempDir,
}

impl ScratchRoot {
    pub fn create(parent: Option<&Path>) -> Result<Self, PackError> {
        let parent = parent
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&parent)
            .map_err(|error| PackError::io(&parent, error))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Fresh `<root>/<task>` directory with an empty dependency subdirectory.
    pub fn task_dir(&self, task_name: &str, dependency_folder: &str) -> Result<PathBuf, PackError> {
        let task_dir = self.path().join(task_name);
        if task_dir.exists() {
            fs::remove_dir_all(&task_dir).map_err(|error| PackError::io(&task_dir, error))?;
        }
        let modules = task_dir.join(dependency_folder);
        fs::create_dir_all(&modules).map_err(|error| PackError::io(&modules, error))?;
        Ok(task_dir)
    }

    pub fn close(self) -> Result<(), PackError> {
        let path = self.path().to_path_buf();
        self.dir.close().map_err(|error| PackError::io(path, error))
    }
}

/// Copy the task, the shared runtime files, the environment overlay and the
/// retained dependencies into `task_dir`.
pub fn stage_task(
    layout: &ProjectLayout,
    manifest: &PackageManifest,
    environment: Environment,
    task: &TaskSource,
    task_dir: &Path,
) -> Result<StagedTask, PackError> {
    let mut staged = StagedTask::default();
    let dependency_folder = dependency_folder_name(layout)?;
    let mut extra_dependencies = Vec::new();

    for source in package_sources(layout, environment, task)? {
        let target = file_name(&source)?;
        let staged_path = task_dir.join(&target);

        // A folder named like the dependency folder adds dependencies.
        if source.is_dir() && target == dependency_folder {
            extra_dependencies.push(source);
            continue;
        }
        if source.is_dir() {
            copy_dir_recursive(&source, &staged_path)?;
            staged.folders.retain(|entry| entry.target != target);
            staged.folders.push(PackageFileEntry {
                source: staged_path,
                target,
            });
            continue;
        }

        if !source.exists() {
            return Err(PackError::MissingSource(source));
        }
        if source == task.path {
            let original =
                fs::read_to_string(&source).map_err(|error| PackError::io(&source, error))?;
            fs::write(&staged_path, rewrite_app_import(&original).as_bytes())
                .map_err(|error| PackError::io(&staged_path, error))?;
        } else {
            fs::copy(&source, &staged_path).map_err(|error| PackError::io(&source, error))?;
        }
        // Overlay files replace shared files of the same name.
        staged.files.retain(|entry| entry.target != target);
        staged.files.push(PackageFileEntry {
            source: staged_path,
            target,
        });
    }

    staged.dependencies = stage_dependencies(layout, manifest, &dependency_folder, task_dir)?;
    for source in extra_dependencies {
        merge_dependencies(&source, &dependency_folder, task_dir, &mut staged.dependencies)?;
    }
    Ok(staged)
}

fn package_sources(
    layout: &ProjectLayout,
    environment: Environment,
    task: &TaskSource,
) -> Result<Vec<PathBuf>, PackError> {
    let mut sources = vec![task.path.clone()];
    sources.extend(layout.shared_paths());

    let overlay = layout.overlay_path(environment);
    if overlay.is_dir() {
        sources.extend(sorted_children(&overlay)?);
    } else {
        debug!(path = %overlay.display(), "no environment overlay");
    }
    Ok(sources)
}

fn stage_dependencies(
    layout: &ProjectLayout,
    manifest: &PackageManifest,
    folder: &str,
    task_dir: &Path,
) -> Result<Vec<DependencyFolderEntry>, PackError> {
    let dependency_root = layout.dependency_path();
    if !dependency_root.is_dir() {
        debug!(path = %dependency_root.display(), "no dependency root");
        return Ok(Vec::new());
    }

    let mut dependencies = Vec::new();
    for source in sorted_children(&dependency_root)? {
        let name = file_name(&source)?;
        if manifest.excludes(&name) {
            debug!(dependency = %name, "excluded by manifest");
            continue;
        }
        if !source.is_dir() {
            continue;
        }

        let staged_path = task_dir.join(folder).join(&name);
        copy_dir_recursive(&source, &staged_path)?;
        dependencies.push(DependencyFolderEntry {
            source: staged_path,
            target: format!("{folder}/{name}"),
        });
    }
    Ok(dependencies)
}

/// Stage the dependency folders found in `source`, replacing staged
/// dependencies of the same name.
fn merge_dependencies(
    source: &Path,
    folder: &str,
    task_dir: &Path,
    dependencies: &mut Vec<DependencyFolderEntry>,
) -> Result<(), PackError> {
    for child in sorted_children(source)? {
        if !child.is_dir() {
            debug!(path = %child.display(), "skipping non-folder dependency");
            continue;
        }
        let name = file_name(&child)?;
        let staged_path = task_dir.join(folder).join(&name);
        if staged_path.exists() {
            fs::remove_dir_all(&staged_path).map_err(|error| PackError::io(&staged_path, error))?;
        }
        copy_dir_recursive(&child, &staged_path)?;

        let target = format!("{folder}/{name}");
        dependencies.retain(|entry| entry.target != target);
        dependencies.push(DependencyFolderEntry {
            source: staged_path,
            target,
        });
    }
    Ok(())
}

/// Copy `source` into `destination`. Symlinks are followed when they point at
/// files and skipped otherwise.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<(), PackError> {
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|error| {
            let path = error.path().unwrap_or(source).to_path_buf();
            PackError::io(path, error.into())
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|error| PackError::io(&target, error))?;
        } else if file_type.is_file() || entry.path().is_file() {
            fs::copy(entry.path(), &target).map_err(|error| PackError::io(entry.path(), error))?;
        } else {
            debug!(path = %entry.path().display(), "skipping non-file entry");
        }
    }
    Ok(())
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>, PackError> {
    let mut children = fs::read_dir(dir)
        .map_err(|error| PackError::io(dir, error))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| PackError::io(dir, error))?;
    children.sort();
    Ok(children)
}

/// Folder name dependencies are staged and archived under.
pub fn dependency_folder_name(layout: &ProjectLayout) -> Result<String, PackError> {
    file_name(&layout.dependency_dir)
}

fn file_name(path: &Path) -> Result<String, PackError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| PackError::MissingSource(path.to_path_buf()))
}

/// Relative path rendered with `/` separators for use inside the archive.
pub(crate) fn archive_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
