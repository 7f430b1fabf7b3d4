use async_trait::async_trait;

use crate::etl::{ETLPipeline, EtlError, TaskOutput, Upstream};
use crate::model::{dim_film, FilmRow};
use crate::store::{Connections, Warehouse};
use crate::transform::{build_film_dimension, Dimension};

/// `dim_film` from `film` joined with its categories.
pub struct FilmETL;

#[async_trait]
impl ETLPipeline for FilmETL {
    type Extracted = Vec<FilmRow>;
    type Transformed = Dimension<dim_film::Model, i64>;

    fn table_name(&self) -> &'static str {
        "dim_film"
    }

    async fn extract(
        &self,
        connections: &Connections,
        _upstream: &Upstream,
    ) -> Result<Self::Extracted, EtlError> {
        connections.source.films().await
    }

    fn transform(&self, extracted: Self::Extracted) -> Result<Self::Transformed, EtlError> {
        let dimension = build_film_dimension(&extracted);
        let uncategorized = dimension.rows.iter().filter(|f| f.category.is_none()).count();
        if uncategorized > 0 {
            tracing::warn!(films = uncategorized, "films without a category");
        }
        Ok(dimension)
    }

    async fn load(
        &self,
        warehouse: &dyn Warehouse,
        data: &Self::Transformed,
    ) -> Result<u64, EtlError> {
        warehouse.replace_films(&data.rows).await
    }

    fn finish(&self, data: Self::Transformed) -> TaskOutput {
        TaskOutput::Films(data.keys)
    }
}
