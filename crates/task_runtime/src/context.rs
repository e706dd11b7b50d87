use serde_json::Value;
use tracing::{error, info};

/// Completion signals handed to a task handler.
pub trait TaskContext {
    fn done(&mut self);
    fn fail(&mut self, error: Value);
    fn succeed(&mut self, result: Value);
}

/// Context for manual runs: every signal is logged, and `done` runs the exit
/// hook (the harness binary passes one that terminates the process).
pub struct LocalContext {
    on_done: Option<Box<dyn FnOnce()>>,
}

impl LocalContext {
    pub fn new(on_done: impl FnOnce() + 'static) -> Self {
        Self {
            on_done: Some(Box::new(on_done)),
        }
    }
}

impl TaskContext for LocalContext {
    fn done(&mut self) {
        info!("...context.done();");
        if let Some(hook) = self.on_done.take() {
            hook();
        }
    }

    fn fail(&mut self, err: Value) {
        error!("context.fail");
        error!(error = %err, "task failed");
    }

    fn succeed(&mut self, result: Value) {
        info!("context.succeed");
        info!(result = %result, "task succeeded");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Failed(Value),
    Succeeded(Value),
}

/// Records the first completion signal of an invocation.
#[derive(Debug, Default)]
pub struct OutcomeContext {
    outcome: Option<Outcome>,
}

impl OutcomeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Turn the recorded signal into the invocation result.
    pub fn complete(self) -> Result<Value, String> {
        match self.outcome {
            Some(Outcome::Done) => Ok(Value::Null),
            Some(Outcome::Succeeded(result)) => Ok(result),
            Some(Outcome::Failed(err)) => Err(match err {
                Value::String(message) => message,
                other => other.to_string(),
            }),
            None => Err("task returned without signalling completion".to_string()),
        }
    }

    fn record(&mut self, outcome: Outcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }
}

impl TaskContext for OutcomeContext {
    fn done(&mut self) {
        self.record(Outcome::Done);
    }

    fn fail(&mut self, err: Value) {
        self.record(Outcome::Failed(err));
    }

    fn succeed(&mut self, result: Value) {
        self.record(Outcome::Succeeded(result));
    }
}
