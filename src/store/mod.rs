//! Source and warehouse access.
//!
//! Pipelines only see the [`Source`] and [`Warehouse`] traits; `mysql` backs
//! them with sea-orm connections; the test-only `memory` backend uses plain
//! vectors.

use std::sync::Arc;

use async_trait::async_trait;

use crate::etl::EtlError;
use crate::model::{
    dim_client, dim_date, dim_film, dim_store, fact_rental, CustomerRow, FilmRow, RentalDateRow,
    RentalPaymentRow, StoreRow,
};
use crate::transform::DimensionKeys;

pub mod mysql;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
pub(crate) mod memory;

#[cfg(test)]
pub(crate) use memory::{MemoryConnector, SakilaTables, WarehouseTables};
pub use mysql::{MySqlConnector, MySqlSource, MySqlWarehouse};

/// Read-only access to the operational database.
#[async_trait]
pub trait Source: Send + Sync {
    async fn rental_dates(&self) -> Result<Vec<RentalDateRow>, EtlError>;

    async fn films(&self) -> Result<Vec<FilmRow>, EtlError>;

    async fn stores(&self) -> Result<Vec<StoreRow>, EtlError>;

    async fn customers(&self) -> Result<Vec<CustomerRow>, EtlError>;

    async fn rental_payments(&self) -> Result<Vec<RentalPaymentRow>, EtlError>;
}

/// Write access to the star schema.
///
/// Every `replace_*` call swaps the whole table atomically: either all rows
/// are replaced or the previous contents stay in place.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn ensure_schema(&self) -> Result<(), EtlError>;

    async fn replace_dates(&self, rows: &[dim_date::Model]) -> Result<u64, EtlError>;

    async fn replace_films(&self, rows: &[dim_film::Model]) -> Result<u64, EtlError>;

    async fn replace_stores(&self, rows: &[dim_store::Model]) -> Result<u64, EtlError>;

    async fn replace_clients(&self, rows: &[dim_client::Model]) -> Result<u64, EtlError>;

    async fn replace_rentals(&self, rows: &[fact_rental::Model]) -> Result<u64, EtlError>;

    /// Reads the surrogate keys currently stored in the four dimensions.
    async fn dimension_keys(&self) -> Result<DimensionKeys, EtlError>;
}

/// Connections owned by a single task; dropped when the task ends.
pub struct Connections {
    pub source: Arc<dyn Source>,
    pub warehouse: Arc<dyn Warehouse>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Connections, EtlError>;
}
