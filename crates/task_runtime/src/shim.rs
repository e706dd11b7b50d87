//! Bridge between the async Lambda runtime and synchronous task handlers.

use std::sync::Arc;

use lambda_runtime::Error;
use serde_json::Value;

use crate::context::OutcomeContext;
use crate::registry::TaskRegistry;

/// Run `task_name` against `payload` and map its completion signal to the
/// invocation result.
pub fn run_task(tasks: &TaskRegistry, task_name: &str, payload: Value) -> Result<Value, Error> {
    let task = tasks
        .get(task_name)
        .ok_or_else(|| Error::from(format!("unknown task '{task_name}'")))?;

    let mut context = OutcomeContext::new();
    task.handler(payload, &mut context);
    context.complete().map_err(Error::from)
}

/// Handlers may block (the toolbox fetcher does), so they run on tokio's
/// blocking pool instead of a runtime worker.
pub async fn dispatch(
    tasks: Arc<TaskRegistry>,
    task_name: Arc<str>,
    payload: Value,
) -> Result<Value, Error> {
    tokio::task::spawn_blocking(move || run_task(&tasks, &task_name, payload)).await?
}
