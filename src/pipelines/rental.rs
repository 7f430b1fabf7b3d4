use async_trait::async_trait;
use tracing::{info, warn};

use crate::etl::{ETLPipeline, EtlError, TaskOutput, Upstream};
use crate::model::RentalPaymentRow;
use crate::store::{Connections, Warehouse};
use crate::transform::{build_rental_facts, DimensionKeys, FactTable};

/// `fact_rental` from rentals, their inventory and their payments.
///
/// Dimension keys come from the upstream tasks of the same run; when the
/// task is started on its own they are read back from the warehouse.
pub struct RentalETL;

#[async_trait]
impl ETLPipeline for RentalETL {
    type Extracted = (Vec<RentalPaymentRow>, DimensionKeys);
    type Transformed = FactTable;

    fn table_name(&self) -> &'static str {
        "fact_rental"
    }

    async fn extract(
        &self,
        connections: &Connections,
        upstream: &Upstream,
    ) -> Result<Self::Extracted, EtlError> {
        let keys = match upstream.dimension_keys() {
            Some(keys) => keys,
            None => {
                info!("dimension keys not passed in, reading them from the warehouse");
                connections.warehouse.dimension_keys().await?
            }
        };
        let rows = connections.source.rental_payments().await?;
        Ok((rows, keys))
    }

    fn transform(&self, extracted: Self::Extracted) -> Result<Self::Transformed, EtlError> {
        let (rows, keys) = extracted;
        let facts = build_rental_facts(&rows, &keys);
        let exclusions = facts.exclusions;
        if !exclusions.is_empty() {
            warn!(
                excluded = exclusions.excluded,
                missing_date = exclusions.missing_date,
                missing_film = exclusions.missing_film,
                missing_store = exclusions.missing_store,
                missing_customer = exclusions.missing_customer,
                "rentals excluded from fact table"
            );
        }
        Ok(facts)
    }

    async fn load(
        &self,
        warehouse: &dyn Warehouse,
        data: &Self::Transformed,
    ) -> Result<u64, EtlError> {
        warehouse.replace_rentals(&data.rows).await
    }

    fn finish(&self, data: Self::Transformed) -> TaskOutput {
        TaskOutput::Rentals {
            rows: data.rows.len(),
            exclusions: data.exclusions,
        }
    }
}
