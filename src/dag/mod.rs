//! Explicit task dependency graph and per-task state machine.
//!
//! The graph knows nothing about databases or pipelines; it only answers
//! "what may run next" for whichever scheduler drives it.

pub mod graph;
pub mod state;

pub use graph::{GraphRun, TaskGraph};
pub use state::TaskState;

/// Errors raised while building or walking a [`TaskGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DagError {
    #[error("unknown task `{0}`")]
    UnknownNode(String),

    #[error("task `{0}` is declared twice")]
    DuplicateNode(String),

    #[error("dependency cycle among tasks: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("task `{task}` cannot move from {from} to {to}")]
    InvalidTransition {
        task: String,
        from: TaskState,
        to: TaskState,
    },
}
