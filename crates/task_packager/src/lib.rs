//! Assembles one deployable zip per serverless task.
//!
//! A run is split in two so callers can put a confirmation gate in between:
//! [`preflight`] validates the project and resolves the task set, and
//! [`package_tasks`] stages every task in a scratch tree and streams it into
//! `<dist>/<task>[-dev].zip`.

pub mod archive;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod rewrite;
pub mod staging;

pub use environment::Environment;
pub use error::PackError;
pub use layout::ProjectLayout;
pub use pipeline::{package_tasks, preflight, ArchiveSummary, PackPlan, PackReport};
