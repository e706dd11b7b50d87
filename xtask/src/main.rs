use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{exit, Command};

use clap::{Args, Parser, Subcommand, ValueEnum};
use dialoguer::Confirm;
use task_packager::{package_tasks, preflight, Environment, ProjectLayout};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the serverless task workspace",
    long_about = "A unified CLI for packaging serverless tasks, invoking them\n\
                  locally, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Zip every task (or one task) into the distribution directory
    Package(PackageArgs),
    /// Invoke a task handler locally with an optional JSON event
    Invoke {
        /// Task name
        task: String,
        /// Event payload as JSON
        event: Option<String>,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::All)]
        job: CiJob,
    },
}

#[derive(Args)]
struct PackageArgs {
    /// Only package this task
    task: Option<String>,
    /// Package for the live environment
    #[arg(long, conflicts_with = "dev")]
    prod: bool,
    /// Package for the dev environment (archives get a `-dev` suffix)
    #[arg(long)]
    dev: bool,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
    /// Project root holding tasks/, package.json and node_modules/
    #[arg(long, env = "TASK_PROJECT_DIR", default_value = ".")]
    project_dir: PathBuf,
    /// Distribution directory; must already exist
    #[arg(long)]
    dist_dir: Option<PathBuf>,
}

impl PackageArgs {
    fn environment(&self) -> Environment {
        Environment::from_flags(self.prod, self.dev)
    }
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Check,
    /// Workspace tests
    Test,
    /// Run check + test
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    info!("=== {label} ===");
}

fn run_cargo(args: &[&str]) {
    info!("+ cargo {}", args.join(" "));
    let status = match Command::new("cargo").args(args).status() {
        Ok(status) => status,
        Err(err) => {
            error!("failed to execute cargo: {err}");
            exit(1);
        }
    };
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

/// Parse the command line. Help and version output exit 0; every other
/// argument error (including unknown environment flags) exits 1.
fn parse_cli<I, T>(args: I) -> Result<Cli, i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        if err.use_stderr() {
            1
        } else {
            0
        }
    })
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

// ── packaging ──────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Gate {
    Proceed,
    Abort,
}

/// `--yes` skips the prompt entirely.
fn confirmation_gate(
    yes: bool,
    ask: impl FnOnce() -> Result<bool, dialoguer::Error>,
) -> Result<Gate, dialoguer::Error> {
    if yes || ask()? {
        Ok(Gate::Proceed)
    } else {
        Ok(Gate::Abort)
    }
}

fn package(args: PackageArgs) -> Result<(), Box<dyn Error>> {
    let environment = args.environment();
    let mut layout = ProjectLayout::new(args.project_dir);
    if let Some(dist_dir) = args.dist_dir {
        layout = layout.with_dist_dir(dist_dir);
    }
    let tasks_path = layout.tasks_path();

    let plan = preflight(layout, environment, args.task.as_deref())?;

    info!(
        "Creating {environment} version of {}",
        args.task.as_deref().unwrap_or("all tasks")
    );
    info!(
        "All matching zip files in the following distribution path will be unlinked: {}",
        plan.dist_dir.display()
    );
    info!(
        "Found {} matching task(s) in the following path: {}",
        plan.tasks.len(),
        tasks_path.display()
    );

    if confirmation_gate(args.yes, confirm)? == Gate::Abort {
        info!("Aborted.");
        return Ok(());
    }

    let report = package_tasks(&plan, None)?;
    for archive in &report.archives {
        info!(
            task = %archive.task,
            entries = archive.entries,
            "packaged {}",
            archive.path.display()
        );
    }
    Ok(())
}

fn confirm() -> Result<bool, dialoguer::Error> {
    Confirm::new()
        .with_prompt("Are you sure you want to create the distribution using the above paths?")
        .default(true)
        .interact()
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test workspace");
    run_cargo(&["test", "--workspace"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    init_logging();

    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => exit(code),
    };

    match cli.command {
        Commands::Package(args) => {
            if let Err(err) = package(args) {
                error!("{err}");
                exit(1);
            }
        }
        Commands::Invoke { task, event } => {
            let mut cargo_args = vec!["run", "-p", "task_runtime", "--bin", "invoke_local", "--"];
            cargo_args.push(&task);
            if let Some(event) = event.as_deref() {
                cargo_args.push(event);
            }
            run_cargo(&cargo_args);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Test => ci_test(),
                CiJob::All => {
                    ci_check();
                    ci_test();
                }
            }
            info!("CI job passed.");
        }
    }
}
