use async_trait::async_trait;

use crate::etl::{ETLPipeline, EtlError, TaskOutput, Upstream};
use crate::model::{dim_store, StoreRow};
use crate::store::{Connections, Warehouse};
use crate::transform::{build_store_dimension, Dimension};

/// `dim_store` from `store` and its address, city and country.
pub struct StoreETL;

#[async_trait]
impl ETLPipeline for StoreETL {
    type Extracted = Vec<StoreRow>;
    type Transformed = Dimension<dim_store::Model, i64>;

    fn table_name(&self) -> &'static str {
        "dim_store"
    }

    async fn extract(
        &self,
        connections: &Connections,
        _upstream: &Upstream,
    ) -> Result<Self::Extracted, EtlError> {
        connections.source.stores().await
    }

    fn transform(&self, extracted: Self::Extracted) -> Result<Self::Transformed, EtlError> {
        build_store_dimension(&extracted)
    }

    async fn load(
        &self,
        warehouse: &dyn Warehouse,
        data: &Self::Transformed,
    ) -> Result<u64, EtlError> {
        warehouse.replace_stores(&data.rows).await
    }

    fn finish(&self, data: Self::Transformed) -> TaskOutput {
        TaskOutput::Stores(data.keys)
    }
}
