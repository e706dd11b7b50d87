//! Invocation contract for serverless tasks.
//!
//! A task exposes a single handler taking the event payload and a completion
//! context. The same handler runs under the local harness (`invoke_local`)
//! and under the Lambda runtime shim (`task_lambda`).

pub mod context;
pub mod harness;
pub mod logging;
pub mod registry;
pub mod shim;
pub mod tasks;

pub use context::{LocalContext, Outcome, OutcomeContext, TaskContext};
pub use registry::{registry, Task, TaskRegistry};
