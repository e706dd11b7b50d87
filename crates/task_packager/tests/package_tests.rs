use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use task_packager::{package_tasks, preflight, Environment, PackError, ProjectLayout};
use tempfile::TempDir;
use zip::ZipArchive;

const EXAMPLE_TASK: &str = "\
// This line is replaced during the build to reflect the required flat structure
const app = require(\"../app\"); // DO NOT CHANGE

exports.handler = (event, context) => {
  context.done();
};
";

struct Project {
    dir: TempDir,
    scratch_parent: TempDir,
}

impl Project {
    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.root())
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs should be created");
        }
        fs::write(path, contents).expect("fixture file should be written");
    }

    fn dist(&self, archive: &str) -> PathBuf {
        self.root().join("dist").join(archive)
    }
}

fn project() -> Project {
    let project = Project {
        dir: tempfile::tempdir().expect("project dir should be created"),
        scratch_parent: tempfile::tempdir().expect("scratch parent should be created"),
    };
    project.write("tasks/Example.js", EXAMPLE_TASK);
    project.write("tasks/Cleanup.js", "const app = require('../app');\n");
    project.write("app.js", "module.exports = { version: 1 };\n");
    project.write(".env", "EMAIL_SEND_ENABLED=\n");
    project.write("toolbox.js", "module.exports = {};\n");
    project.write("environment-deps/dev/config.json", "{\"stage\": \"dev\"}");
    project.write("environment-deps/dev/certs/ca.pem", "-----CERT-----");
    project.write("node_modules/left-pad/index.js", "module.exports = pad;");
    project.write("node_modules/left-pad/lib/util.js", "util");
    project.write("node_modules/aws-sdk/index.js", "huge");
    project.write("node_modules/.package-lock.json", "{}");
    project.write(
        "package.json",
        r#"{"name": "tasks", "exclude_deps": ["aws-sdk"]}"#,
    );
    fs::create_dir_all(project.root().join("dist")).expect("dist dir should be created");
    project
}

fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).expect("archive should open"))
        .expect("archive should be a valid zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn read_entry(path: &Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).expect("archive should open"))
        .expect("archive should be a valid zip");
    let mut contents = String::new();
    archive
        .by_name(name)
        .expect("entry should exist")
        .read_to_string(&mut contents)
        .expect("entry should be readable");
    contents
}

fn run(project: &Project, environment: Environment, only: Option<&str>) -> task_packager::PackReport {
    let plan = preflight(project.layout(), environment, only).expect("preflight should pass");
    package_tasks(&plan, Some(project.scratch_parent.path())).expect("packaging should succeed")
}

#[test]
fn produces_one_archive_per_task_and_removes_scratch_root() {
    let project = project();

    let report = run(&project, Environment::Local, None);

    let tasks: Vec<&str> = report.archives.iter().map(|archive| archive.task.as_str()).collect();
    assert_eq!(tasks, vec!["Cleanup", "Example"]);
    assert!(project.dist("Cleanup.zip").is_file());
    assert!(project.dist("Example.zip").is_file());
    assert!(!report.scratch_root.exists());
    assert_eq!(
        fs::read_dir(project.scratch_parent.path())
            .expect("scratch parent should be readable")
            .count(),
        0
    );
}

#[test]
fn archive_holds_task_runtime_and_retained_dependencies() {
    let project = project();
    run(&project, Environment::Local, None);

    let names = entry_names(&project.dist("Example.zip"));
    for expected in [
        "Example.js",
        "app.js",
        ".env",
        "toolbox.js",
        "node_modules/left-pad/index.js",
        "node_modules/left-pad/lib/util.js",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }
    assert!(names.iter().all(|name| !name.starts_with("node_modules/aws-sdk")));
    assert!(names.iter().all(|name| !name.contains(".package-lock.json")));
    assert!(!names.contains(&"config.json".to_string()));
}

#[test]
fn task_file_imports_staged_app() {
    let project = project();
    run(&project, Environment::Local, Some("Example"));

    let packaged = read_entry(&project.dist("Example.zip"), "Example.js");
    let lines: Vec<&str> = packaged.lines().collect();
    assert_eq!(lines[1], "const app = require('./app'); // DO NOT CHANGE");
    assert_eq!(lines[3], "exports.handler = (event, context) => {");

    let original = fs::read_to_string(project.root().join("tasks/Example.js"))
        .expect("source task should still exist");
    assert_eq!(original, EXAMPLE_TASK);
}

#[test]
fn dev_archives_are_suffixed_and_carry_overlay() {
    let project = project();
    let report = run(&project, Environment::Dev, None);

    assert_eq!(report.archives[1].path, project.dist("Example-dev.zip"));
    assert!(!project.dist("Example.zip").exists());

    let names = entry_names(&project.dist("Example-dev.zip"));
    assert!(names.contains(&"config.json".to_string()));
    assert!(names.contains(&"certs/ca.pem".to_string()));
    assert_eq!(
        read_entry(&project.dist("Example-dev.zip"), "certs/ca.pem"),
        "-----CERT-----"
    );
}

#[test]
fn overlay_file_replaces_shared_file() {
    let project = project();
    project.write("environment-deps/live/.env", "EMAIL_SEND_ENABLED=1\n");

    run(&project, Environment::Live, Some("Example"));

    let archive = project.dist("Example.zip");
    let env_entries = entry_names(&archive)
        .into_iter()
        .filter(|name| name == ".env")
        .count();
    assert_eq!(env_entries, 1);
    assert_eq!(read_entry(&archive, ".env"), "EMAIL_SEND_ENABLED=1\n");
}

#[test]
fn overlay_dependencies_merge_without_duplicate_entries() {
    let project = project();
    project.write("environment-deps/dev/node_modules/extra/index.js", "extra");
    project.write("environment-deps/dev/node_modules/left-pad/index.js", "patched pad");

    run(&project, Environment::Dev, Some("Example"));

    let path = project.dist("Example-dev.zip");
    let archive = ZipArchive::new(File::open(&path).expect("archive should open"))
        .expect("archive should be a valid zip");
    assert_eq!(archive.len(), archive.file_names().count());

    let names = entry_names(&path);
    assert!(names.contains(&"node_modules/extra/index.js".to_string()));
    assert!(!names.iter().any(|name| name == "node_modules/" || name == "node_modules"));
    assert_eq!(read_entry(&path, "node_modules/left-pad/index.js"), "patched pad");
    assert_eq!(read_entry(&path, "node_modules/left-pad/lib/util.js"), "util");
}

#[test]
fn stale_archive_is_replaced() {
    let project = project();
    fs::write(project.dist("Example.zip"), b"not a zip").expect("stale file should be written");

    run(&project, Environment::Local, Some("Example"));

    assert!(entry_names(&project.dist("Example.zip")).contains(&"Example.js".to_string()));
    assert!(!project.dist("Cleanup.zip").exists());
}

#[test]
fn preflight_rejects_missing_dist_dir() {
    let project = project();
    fs::remove_dir(project.root().join("dist")).expect("dist dir should be removed");

    let error = preflight(project.layout(), Environment::Local, None)
        .expect_err("missing dist should fail");
    assert!(matches!(error, PackError::MissingDistDir(_)));
}

#[test]
fn preflight_rejects_empty_task_dir() {
    let project = project();
    fs::remove_dir_all(project.root().join("tasks")).expect("tasks should be removed");
    fs::create_dir(project.root().join("tasks")).expect("tasks dir should be created");

    let error = preflight(project.layout(), Environment::Local, None)
        .expect_err("empty tasks should fail");
    assert!(matches!(error, PackError::NoTasks(_)));
}

#[test]
fn preflight_rejects_unknown_task() {
    let project = project();

    let error = preflight(project.layout(), Environment::Local, Some("Nightly"))
        .expect_err("unknown task should fail");
    assert!(matches!(error, PackError::UnknownTask { .. }));
}

#[test]
fn preflight_requires_exclusion_list() {
    let project = project();
    project.write("package.json", r#"{"name": "tasks"}"#);

    let error = preflight(project.layout(), Environment::Local, None)
        .expect_err("manifest without exclude_deps should fail");
    assert!(matches!(error, PackError::Manifest { .. }));
}

#[test]
fn missing_shared_file_fails_and_cleans_up() {
    let project = project();
    fs::remove_file(project.root().join("toolbox.js")).expect("toolbox should be removed");

    let plan = preflight(project.layout(), Environment::Local, None).expect("preflight should pass");
    let error = package_tasks(&plan, Some(project.scratch_parent.path()))
        .expect_err("missing shared file should fail");

    assert!(matches!(error, PackError::MissingSource(_)));
    assert_eq!(
        fs::read_dir(project.scratch_parent.path())
            .expect("scratch parent should be readable")
            .count(),
        0
    );
}
