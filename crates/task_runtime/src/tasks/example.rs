use serde_json::Value;
use task_toolbox::format_plural;
use tracing::info;

use crate::context::TaskContext;
use crate::registry::Task;

/// Smoke-test task: logs the event and completes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExampleTask;

impl ExampleTask {
    pub const NAME: &'static str = "Example";
}

impl Task for ExampleTask {
    fn handler(&self, event: Value, context: &mut dyn TaskContext) {
        info!("Lambda Test Function");
        let fields = event.as_object().map_or(0, |object| object.len());
        info!(
            event = %event,
            "Here's some sample event data ({})",
            format_plural(fields as i64, "@count field", "@count fields")
        );
        context.done();
    }
}
