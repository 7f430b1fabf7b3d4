use async_trait::async_trait;

use crate::etl::{ETLPipeline, EtlError, TaskOutput, Upstream};
use crate::model::{dim_client, CustomerRow};
use crate::store::{Connections, Warehouse};
use crate::transform::{build_client_dimension, Dimension};

/// `dim_client` from `customer` and its address, city and country.
pub struct CustomerETL;

#[async_trait]
impl ETLPipeline for CustomerETL {
    type Extracted = Vec<CustomerRow>;
    type Transformed = Dimension<dim_client::Model, i64>;

    fn table_name(&self) -> &'static str {
        "dim_client"
    }

    async fn extract(
        &self,
        connections: &Connections,
        _upstream: &Upstream,
    ) -> Result<Self::Extracted, EtlError> {
        connections.source.customers().await
    }

    fn transform(&self, extracted: Self::Extracted) -> Result<Self::Transformed, EtlError> {
        build_client_dimension(&extracted)
    }

    async fn load(
        &self,
        warehouse: &dyn Warehouse,
        data: &Self::Transformed,
    ) -> Result<u64, EtlError> {
        warehouse.replace_clients(&data.rows).await
    }

    fn finish(&self, data: Self::Transformed) -> TaskOutput {
        TaskOutput::Customers(data.keys)
    }
}
