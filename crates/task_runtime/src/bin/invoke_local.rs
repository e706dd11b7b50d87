use std::io::{self, Write};
use std::process::exit;

use clap::Parser;
use task_runtime::harness::{invoke, HarnessError};
use task_runtime::{logging, registry, LocalContext};
use tracing::debug;

const USAGE: &str = "Usage: invoke_local [task name] [event data json]";

/// Run one task handler locally with a synthetic event and context.
#[derive(Parser)]
#[command(name = "invoke_local")]
struct Args {
    /// Name of the task to invoke
    task: Option<String>,
    /// Event payload as JSON
    event: Option<String>,
}

/// Harness failures go to stderr whatever the log filter is.
fn report(err: &HarnessError, out: &mut impl Write) {
    let _ = writeln!(out, "{err}");
}

fn main() {
    logging::init();
    logging::load_dotenv();

    let args = Args::parse();
    let Some(task_name) = args.task else {
        println!("{USAGE}");
        return;
    };

    let tasks = registry();
    let mut context = LocalContext::new(|| {
        exit(0);
    });
    if let Err(err) = invoke(&tasks, &task_name, args.event.as_deref(), &mut context) {
        debug!(task = %task_name, "invocation failed");
        report(&err, &mut io::stderr());
        exit(1);
    }
}
