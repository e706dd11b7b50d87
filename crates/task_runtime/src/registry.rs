use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::TaskContext;
use crate::tasks::example::ExampleTask;

pub trait Task: Send + Sync {
    fn handler(&self, event: Value, context: &mut dyn TaskContext);
}

/// Tasks addressable by name.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Box<dyn Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, task: impl Task + 'static) {
        self.tasks.insert(name.into(), Box::new(task));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Task> {
        self.tasks.get(name).map(|task| task.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}

/// Every task bundled with this crate.
pub fn registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register(ExampleTask::NAME, ExampleTask);
    registry
}
