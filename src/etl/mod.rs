use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::store::{Connections, Connector, Warehouse};

pub mod manager;
pub mod task;
pub mod types;

pub use manager::{sakila_graph, Config, ConfigBuilder, PipelineManager, RunReport, TaskReport};
pub use task::{TaskId, TaskOutput, Upstream};
pub use types::EtlError;

/// Defines one extract-transform-load unit that fills a single warehouse
/// table.
///
/// # Lifecycle
///
/// 1. `extract()` - Read everything the table needs from the source
/// 2. `transform()` - Reshape the rows, assigning surrogate keys
/// 3. `load()` - Replace the table's contents in the warehouse
/// 4. `finish()` - Hand key maps or counts to downstream tasks
#[async_trait]
pub trait ETLPipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send + Sync;

    /// Warehouse table written by this pipeline.
    fn table_name(&self) -> &'static str;

    async fn extract(
        &self,
        connections: &Connections,
        upstream: &Upstream,
    ) -> Result<Self::Extracted, EtlError>;

    fn transform(&self, extracted: Self::Extracted) -> Result<Self::Transformed, EtlError>;

    /// Returns the number of rows written.
    async fn load(&self, warehouse: &dyn Warehouse, data: &Self::Transformed)
        -> Result<u64, EtlError>;

    fn finish(&self, data: Self::Transformed) -> TaskOutput;
}

/// A schedulable task, independent of the row types it moves.
#[async_trait]
pub trait ETLRunner: Send + Sync {
    fn id(&self) -> TaskId;

    async fn run(
        &self,
        connector: &dyn Connector,
        upstream: &Upstream,
        cancel: &CancellationToken,
    ) -> Result<TaskOutput, EtlError>;
}

/// Adapter to make an [`ETLPipeline`] schedulable as an [`ETLRunner`].
pub struct ETLPipelineAdapter<P> {
    id: TaskId,
    pipeline: P,
}

impl<P> ETLPipelineAdapter<P>
where
    P: ETLPipeline,
{
    pub fn new(id: TaskId, pipeline: P) -> Self {
        ETLPipelineAdapter { id, pipeline }
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), EtlError> {
    if cancel.is_cancelled() {
        Err(EtlError::Cancelled)
    } else {
        Ok(())
    }
}

#[async_trait]
impl<P> ETLRunner for ETLPipelineAdapter<P>
where
    P: ETLPipeline,
{
    fn id(&self) -> TaskId {
        self.id
    }

    async fn run(
        &self,
        connector: &dyn Connector,
        upstream: &Upstream,
        cancel: &CancellationToken,
    ) -> Result<TaskOutput, EtlError> {
        let table = self.pipeline.table_name();
        let span = info_span!("etl_task", task = %self.id, table);

        async move {
            ensure_active(cancel)?;
            // Connections live for this block only and are released on every exit path.
            let connections = connector.connect().await?;
            connections.warehouse.ensure_schema().await?;

            info!("starting extract phase");
            let extracted = self.pipeline.extract(&connections, upstream).await?;

            info!("starting transform phase");
            let transformed = self.pipeline.transform(extracted)?;

            ensure_active(cancel)?;
            info!("starting load phase");
            let rows = self
                .pipeline
                .load(connections.warehouse.as_ref(), &transformed)
                .await?;
            info!(rows, "loaded data into `{}`", table);

            Ok(self.pipeline.finish(transformed))
        }
        .instrument(span)
        .await
    }
}
