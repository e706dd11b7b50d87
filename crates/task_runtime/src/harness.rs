use serde_json::Value;
use thiserror::Error;

use crate::context::TaskContext;
use crate::registry::TaskRegistry;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Could not find task: {0}")]
    UnknownTask(String),
    #[error("Error parsing event data: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

/// Parse the optional event argument; no argument means an empty object.
pub fn parse_event(raw: Option<&str>) -> Result<Value, HarnessError> {
    match raw {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Ok(Value::Object(Default::default())),
    }
}

/// Look up `task_name`, parse `raw_event`, and drive the task's handler.
pub fn invoke(
    registry: &TaskRegistry,
    task_name: &str,
    raw_event: Option<&str>,
    context: &mut dyn TaskContext,
) -> Result<(), HarnessError> {
    let task = registry
        .get(task_name)
        .ok_or_else(|| HarnessError::UnknownTask(task_name.to_string()))?;
    let event = parse_event(raw_event)?;
    task.handler(event, context);
    Ok(())
}
