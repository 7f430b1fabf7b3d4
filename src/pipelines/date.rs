use async_trait::async_trait;
use chrono::NaiveDate;

use crate::etl::{ETLPipeline, EtlError, TaskOutput, Upstream};
use crate::model::{dim_date, RentalDateRow};
use crate::store::{Connections, Warehouse};
use crate::transform::{build_date_dimension, Dimension};

/// `dim_date` from the distinct days found in `rental.rental_date`.
pub struct DateETL;

#[async_trait]
impl ETLPipeline for DateETL {
    type Extracted = Vec<RentalDateRow>;
    type Transformed = Dimension<dim_date::Model, NaiveDate>;

    fn table_name(&self) -> &'static str {
        "dim_date"
    }

    async fn extract(
        &self,
        connections: &Connections,
        _upstream: &Upstream,
    ) -> Result<Self::Extracted, EtlError> {
        connections.source.rental_dates().await
    }

    fn transform(&self, extracted: Self::Extracted) -> Result<Self::Transformed, EtlError> {
        Ok(build_date_dimension(&extracted))
    }

    async fn load(
        &self,
        warehouse: &dyn Warehouse,
        data: &Self::Transformed,
    ) -> Result<u64, EtlError> {
        warehouse.replace_dates(&data.rows).await
    }

    fn finish(&self, data: Self::Transformed) -> TaskOutput {
        TaskOutput::Dates(data.keys)
    }
}
