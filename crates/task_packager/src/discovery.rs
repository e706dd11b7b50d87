use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PackError;

/// A task definition found in the tasks directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSource {
    /// File name without extension; also names the archive.
    pub name: String,
    pub file_name: String,
    pub path: PathBuf,
}

/// List every regular file with `extension` in `tasks_dir`, sorted by name.
pub fn discover_tasks(tasks_dir: &Path, extension: &str) -> Result<Vec<TaskSource>, PackError> {
    if !tasks_dir.is_dir() {
        return Err(PackError::MissingTaskDir(tasks_dir.to_path_buf()));
    }

    let entries = fs::read_dir(tasks_dir).map_err(|error| PackError::io(tasks_dir, error))?;
    let mut tasks = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| PackError::io(tasks_dir, error))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        let (Some(name), Some(file_name)) = (
            path.file_stem().and_then(|stem| stem.to_str()),
            path.file_name().and_then(|file| file.to_str()),
        ) else {
            continue;
        };
        tasks.push(TaskSource {
            name: name.to_string(),
            file_name: file_name.to_string(),
            path: path.clone(),
        });
    }

    if tasks.is_empty() {
        return Err(PackError::NoTasks(tasks_dir.to_path_buf()));
    }
    tasks.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(tasks)
}

/// Narrow the run to `only` when given; the name must match a discovered task.
pub fn select_tasks(
    tasks: Vec<TaskSource>,
    only: Option<&str>,
) -> Result<Vec<TaskSource>, PackError> {
    let Some(name) = only else {
        return Ok(tasks);
    };

    match tasks.iter().position(|task| task.name == name) {
        Some(index) => Ok(vec![tasks[index].clone()]),
        None => Err(PackError::UnknownTask {
            name: name.to_string(),
            available: tasks
                .iter()
                .map(|task| task.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
