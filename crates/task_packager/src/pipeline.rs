use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::archive::write_archive;
use crate::discovery::{discover_tasks, select_tasks, TaskSource};
use crate::environment::Environment;
use crate::error::PackError;
use crate::layout::ProjectLayout;
use crate::manifest::PackageManifest;
use crate::staging::{dependency_folder_name, stage_task, ScratchRoot};

/// A validated packaging run, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackPlan {
    pub layout: ProjectLayout,
    pub environment: Environment,
    pub dist_dir: PathBuf,
    pub tasks: Vec<TaskSource>,
    pub manifest: PackageManifest,
}

impl PackPlan {
    pub fn archive_path(&self, task_name: &str) -> PathBuf {
        self.dist_dir.join(self.environment.archive_name(task_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub task: String,
    pub path: PathBuf,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub archives: Vec<ArchiveSummary>,
    /// Staging root used by the run; already removed when the report is returned.
    pub scratch_root: PathBuf,
}

/// Validate the project and resolve which tasks a run would package.
/// Nothing is written.
pub fn preflight(
    layout: ProjectLayout,
    environment: Environment,
    only_task: Option<&str>,
) -> Result<PackPlan, PackError> {
    let dist_dir = layout.dist_path();
    if !dist_dir.is_dir() {
        return Err(PackError::MissingDistDir(dist_dir));
    }

    let tasks = discover_tasks(&layout.tasks_path(), &layout.task_extension)?;
    let tasks = select_tasks(tasks, only_task)?;
    let manifest = PackageManifest::load(&layout.manifest_path())?;

    Ok(PackPlan {
        layout,
        environment,
        dist_dir,
        tasks,
        manifest,
    })
}

/// Package every planned task into its own archive.
///
/// Tasks are staged and archived in parallel. The scratch root is removed
/// after all of them have finished, whether or not they succeeded; the first
/// failure is returned.
pub fn package_tasks(
    plan: &PackPlan,
    scratch_parent: Option<&Path>,
) -> Result<PackReport, PackError> {
    let scratch = ScratchRoot::create(scratch_parent)?;
    let scratch_root = scratch.path().to_path_buf();
    debug!(path = %scratch_root.display(), "staging tasks");

    let outcome = plan
        .tasks
        .par_iter()
        .map(|task| package_task(plan, &scratch, task))
        .collect::<Result<Vec<_>, _>>();

    info!("Removing temporary path {}", scratch_root.display());
    let cleanup = scratch.close();
    let archives = outcome?;
    cleanup?;

    Ok(PackReport {
        archives,
        scratch_root,
    })
}

fn package_task(
    plan: &PackPlan,
    scratch: &ScratchRoot,
    task: &TaskSource,
) -> Result<ArchiveSummary, PackError> {
    let destination = plan.archive_path(&task.name);
    info!("Creating archive {}", destination.display());

    let dependency_folder = dependency_folder_name(&plan.layout)?;
    let task_dir = scratch.task_dir(&task.name, &dependency_folder)?;
    let staged = stage_task(
        &plan.layout,
        &plan.manifest,
        plan.environment,
        task,
        &task_dir,
    )?;
    debug!(task = %task.name, entries = staged.entry_count(), "task staged");

    let entries = write_archive(&destination, &staged)?;
    Ok(ArchiveSummary {
        task: task.name.clone(),
        path: destination,
        entries,
    })
}
