use sea_orm::DbErr;

use crate::dag::DagError;

/// Errors that can occur while running an ETL task.
///
/// Connectivity, resolution and load failures abort the task that raised
/// them. Rentals whose dimension keys cannot be resolved are not errors;
/// they are counted in [`crate::transform::ExclusionCounts`].
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("failed to connect to {target}")]
    Connection {
        target: String,
        #[source]
        source: DbErr,
    },

    #[error("extracting `{entity}` failed")]
    Query {
        entity: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("{owner}: {from} references missing {missing} {id}")]
    Unresolved {
        owner: String,
        from: String,
        missing: &'static str,
        id: String,
    },

    #[error("loading `{table}` failed")]
    Load {
        table: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cancellation requested")]
    Cancelled,

    #[error("task `{0}` panicked")]
    TaskPanicked(String),

    #[error(transparent)]
    Graph(#[from] DagError),
}

impl EtlError {
    pub(crate) fn query(entity: &'static str) -> impl FnOnce(DbErr) -> EtlError {
        move |source| EtlError::Query { entity, source }
    }

    pub(crate) fn load<E>(table: &'static str) -> impl FnOnce(E) -> EtlError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |source| EtlError::Load {
            table,
            source: Box::new(source),
        }
    }

    /// True when the source data itself is broken (a dangling location link).
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, EtlError::Unresolved { .. })
    }
}
