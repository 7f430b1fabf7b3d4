//! In-memory Sakila source and warehouse.
//!
//! The source keeps the normalized tables and performs the same outer joins
//! as the SQL extract queries, so broken location chains and lost inventory
//! rows surface exactly as they would from MySQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use sea_orm::DbErr;
use tokio::sync::Mutex;

use super::{Connections, Connector, Source, Warehouse};
use crate::etl::EtlError;
use crate::model::{
    dim_client, dim_date, dim_film, dim_store, fact_rental, CustomerRow, FilmRow, RentalDateRow,
    RentalPaymentRow, StoreRow,
};
use crate::transform::{DimensionKeys, KeyMap};

#[derive(Debug, Clone)]
pub struct Country {
    pub country_id: i64,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct City {
    pub city_id: i64,
    pub city: String,
    pub country_id: i64,
}

#[derive(Debug, Clone)]
pub struct Address {
    pub address_id: i64,
    pub address: String,
    pub district: Option<String>,
    pub city_id: i64,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Store {
    pub store_id: i64,
    pub address_id: i64,
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub address_id: i64,
}

#[derive(Debug, Clone)]
pub struct Film {
    pub film_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub length: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FilmCategory {
    pub film_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct Inventory {
    pub inventory_id: i64,
    pub film_id: i64,
    pub store_id: i64,
}

#[derive(Debug, Clone)]
pub struct Rental {
    pub rental_id: i64,
    pub rental_date: NaiveDateTime,
    pub inventory_id: i64,
    pub customer_id: i64,
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub payment_id: i64,
    pub rental_id: Option<i64>,
    pub amount: BigDecimal,
}

/// The normalized Sakila tables the pipeline reads from.
#[derive(Debug, Clone, Default)]
pub struct SakilaTables {
    pub countries: Vec<Country>,
    pub cities: Vec<City>,
    pub addresses: Vec<Address>,
    pub stores: Vec<Store>,
    pub customers: Vec<Customer>,
    pub films: Vec<Film>,
    pub categories: Vec<Category>,
    pub film_categories: Vec<FilmCategory>,
    pub inventory: Vec<Inventory>,
    pub rentals: Vec<Rental>,
    pub payments: Vec<Payment>,
}

struct LocationJoin<'a> {
    address: Option<&'a Address>,
    city: Option<&'a City>,
    country: Option<&'a Country>,
}

impl SakilaTables {
    fn location(&self, address_id: i64) -> LocationJoin<'_> {
        let address = self.addresses.iter().find(|a| a.address_id == address_id);
        let city = address.and_then(|a| self.cities.iter().find(|c| c.city_id == a.city_id));
        let country = city.and_then(|c| {
            self.countries
                .iter()
                .find(|co| co.country_id == c.country_id)
        });
        LocationJoin {
            address,
            city,
            country,
        }
    }
}

pub struct MemorySource {
    tables: SakilaTables,
}

impl MemorySource {
    pub fn new(tables: SakilaTables) -> Self {
        MemorySource { tables }
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn rental_dates(&self) -> Result<Vec<RentalDateRow>, EtlError> {
        let mut rows: Vec<RentalDateRow> = self
            .tables
            .rentals
            .iter()
            .map(|r| RentalDateRow {
                rental_id: r.rental_id,
                rental_date: r.rental_date,
            })
            .collect();
        rows.sort_by_key(|r| r.rental_id);
        Ok(rows)
    }

    async fn films(&self) -> Result<Vec<FilmRow>, EtlError> {
        let categories: HashMap<i64, &Category> = self
            .tables
            .categories
            .iter()
            .map(|c| (c.category_id, c))
            .collect();

        let mut rows = Vec::new();
        for film in &self.tables.films {
            let links: Vec<&FilmCategory> = self
                .tables
                .film_categories
                .iter()
                .filter(|fc| fc.film_id == film.film_id)
                .collect();
            let row = |category: Option<&Category>| FilmRow {
                film_id: film.film_id,
                title: film.title.clone(),
                description: film.description.clone(),
                length: film.length,
                category_id: category.map(|c| c.category_id),
                category: category.map(|c| c.name.clone()),
            };
            if links.is_empty() {
                rows.push(row(None));
            }
            for link in links {
                rows.push(row(categories.get(&link.category_id).copied()));
            }
        }
        rows.sort_by_key(|r| (r.film_id, r.category_id));
        Ok(rows)
    }

    async fn stores(&self) -> Result<Vec<StoreRow>, EtlError> {
        let mut rows: Vec<StoreRow> = self
            .tables
            .stores
            .iter()
            .map(|store| {
                let join = self.tables.location(store.address_id);
                StoreRow {
                    store_id: store.store_id,
                    address_id: store.address_id,
                    address: join.address.map(|a| a.address.clone()),
                    district: join.address.and_then(|a| a.district.clone()),
                    city_id: join.address.map(|a| a.city_id),
                    city: join.city.map(|c| c.city.clone()),
                    country_id: join.city.map(|c| c.country_id),
                    country: join.country.map(|co| co.country.clone()),
                }
            })
            .collect();
        rows.sort_by_key(|r| r.store_id);
        Ok(rows)
    }

    async fn customers(&self) -> Result<Vec<CustomerRow>, EtlError> {
        let mut rows: Vec<CustomerRow> = self
            .tables
            .customers
            .iter()
            .map(|customer| {
                let join = self.tables.location(customer.address_id);
                CustomerRow {
                    customer_id: customer.customer_id,
                    first_name: customer.first_name.clone(),
                    last_name: customer.last_name.clone(),
                    email: customer.email.clone(),
                    address_id: customer.address_id,
                    address: join.address.map(|a| a.address.clone()),
                    district: join.address.and_then(|a| a.district.clone()),
                    phone: join.address.and_then(|a| a.phone.clone()),
                    city_id: join.address.map(|a| a.city_id),
                    city: join.city.map(|c| c.city.clone()),
                    country_id: join.city.map(|c| c.country_id),
                    country: join.country.map(|co| co.country.clone()),
                }
            })
            .collect();
        rows.sort_by_key(|r| r.customer_id);
        Ok(rows)
    }

    async fn rental_payments(&self) -> Result<Vec<RentalPaymentRow>, EtlError> {
        let mut rentals: Vec<&Rental> = self.tables.rentals.iter().collect();
        rentals.sort_by_key(|r| r.rental_id);

        let mut rows = Vec::new();
        for rental in rentals {
            let inventory = self
                .tables
                .inventory
                .iter()
                .find(|i| i.inventory_id == rental.inventory_id);
            let mut payments: Vec<&Payment> = self
                .tables
                .payments
                .iter()
                .filter(|p| p.rental_id == Some(rental.rental_id))
                .collect();
            payments.sort_by_key(|p| p.payment_id);

            let row = |amount: Option<BigDecimal>| RentalPaymentRow {
                rental_id: rental.rental_id,
                rental_date: rental.rental_date,
                customer_id: rental.customer_id,
                film_id: inventory.map(|i| i.film_id),
                store_id: inventory.map(|i| i.store_id),
                amount,
            };
            if payments.is_empty() {
                rows.push(row(None));
            }
            for payment in payments {
                rows.push(row(Some(payment.amount.clone())));
            }
        }
        Ok(rows)
    }
}

/// Contents of the five warehouse tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarehouseTables {
    pub dim_date: Vec<dim_date::Model>,
    pub dim_film: Vec<dim_film::Model>,
    pub dim_store: Vec<dim_store::Model>,
    pub dim_client: Vec<dim_client::Model>,
    pub fact_rental: Vec<fact_rental::Model>,
}

#[derive(Default)]
struct WarehouseState {
    schema_ready: bool,
    tables: WarehouseTables,
    load_log: Vec<&'static str>,
    fail_table: Option<&'static str>,
}

#[derive(Default)]
pub struct MemoryWarehouse {
    state: Mutex<WarehouseState>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> WarehouseTables {
        self.state.lock().await.tables.clone()
    }

    /// Tables in the order they were successfully replaced.
    pub async fn load_log(&self) -> Vec<&'static str> {
        self.state.lock().await.load_log.clone()
    }

    /// Makes every later write to `table` fail, leaving its rows untouched.
    pub async fn fail_writes_to(&self, table: &'static str) {
        self.state.lock().await.fail_table = Some(table);
    }

    async fn replace<M, F>(&self, table: &'static str, rows: &[M], slot: F) -> Result<u64, EtlError>
    where
        M: Clone + Send + Sync,
        F: FnOnce(&mut WarehouseTables) -> &mut Vec<M> + Send,
    {
        let mut state = self.state.lock().await;
        if !state.schema_ready {
            return Err(EtlError::load(table)(missing_table(table)));
        }
        if state.fail_table == Some(table) {
            return Err(EtlError::load(table)(std::io::Error::new(
                std::io::ErrorKind::Other,
                "write rejected by warehouse",
            )));
        }
        *slot(&mut state.tables) = rows.to_vec();
        state.load_log.push(table);
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn ensure_schema(&self) -> Result<(), EtlError> {
        self.state.lock().await.schema_ready = true;
        Ok(())
    }

    async fn replace_dates(&self, rows: &[dim_date::Model]) -> Result<u64, EtlError> {
        self.replace("dim_date", rows, |t| &mut t.dim_date).await
    }

    async fn replace_films(&self, rows: &[dim_film::Model]) -> Result<u64, EtlError> {
        self.replace("dim_film", rows, |t| &mut t.dim_film).await
    }

    async fn replace_stores(&self, rows: &[dim_store::Model]) -> Result<u64, EtlError> {
        self.replace("dim_store", rows, |t| &mut t.dim_store).await
    }

    async fn replace_clients(&self, rows: &[dim_client::Model]) -> Result<u64, EtlError> {
        self.replace("dim_client", rows, |t| &mut t.dim_client).await
    }

    async fn replace_rentals(&self, rows: &[fact_rental::Model]) -> Result<u64, EtlError> {
        self.replace("fact_rental", rows, |t| &mut t.fact_rental).await
    }

    async fn dimension_keys(&self) -> Result<DimensionKeys, EtlError> {
        let state = self.state.lock().await;
        if !state.schema_ready {
            return Err(EtlError::query("dim_date")(missing_table("dim_date")));
        }
        let tables = &state.tables;
        Ok(DimensionKeys {
            dates: KeyMap::from_pairs(tables.dim_date.iter().map(|d| (d.full_date, d.date_key))),
            films: KeyMap::from_pairs(tables.dim_film.iter().map(|f| (f.film_id, f.film_key))),
            stores: KeyMap::from_pairs(tables.dim_store.iter().map(|s| (s.store_id, s.store_key))),
            customers: KeyMap::from_pairs(
                tables
                    .dim_client
                    .iter()
                    .map(|c| (c.customer_id, c.customer_key)),
            ),
        })
    }
}

fn missing_table(table: &str) -> DbErr {
    DbErr::Custom(format!("Table 'sakila_dw.{}' doesn't exist", table))
}

/// Hands every task the same in-memory source and warehouse.
pub struct MemoryConnector {
    source: Arc<MemorySource>,
    warehouse: Arc<MemoryWarehouse>,
    connections: AtomicUsize,
    refuse: AtomicBool,
}

impl MemoryConnector {
    pub fn new(tables: SakilaTables) -> Self {
        Self::with_warehouse(tables, Arc::new(MemoryWarehouse::new()))
    }

    pub fn with_warehouse(tables: SakilaTables, warehouse: Arc<MemoryWarehouse>) -> Self {
        MemoryConnector {
            source: Arc::new(MemorySource::new(tables)),
            warehouse,
            connections: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
        }
    }

    pub fn warehouse(&self) -> Arc<MemoryWarehouse> {
        Arc::clone(&self.warehouse)
    }

    /// Number of successful `connect` calls so far.
    pub fn connections_opened(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Connections, EtlError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(EtlError::Connection {
                target: "memory://sakila".to_string(),
                source: DbErr::Custom("connection refused".to_string()),
            });
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Connections {
            source: self.source.clone(),
            warehouse: self.warehouse.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;

    #[tokio::test]
    async fn test_store_join_exposes_missing_country() {
        let mut tables = fixtures::single_rental();
        tables.countries.clear();
        let source = MemorySource::new(tables);

        let stores = source.stores().await.unwrap();
        assert_eq!(stores.len(), 1);
        assert!(stores[0].city.is_some());
        assert_eq!(stores[0].country_id, Some(1));
        assert_eq!(stores[0].country, None);
    }

    #[tokio::test]
    async fn test_film_rows_per_category() {
        let source = MemorySource::new(fixtures::catalog());
        let films = source.films().await.unwrap();

        let alpha: Vec<_> = films.iter().filter(|f| f.film_id == 1).collect();
        assert_eq!(alpha.len(), 2);
        assert_eq!(alpha[0].category_id, Some(1));
        assert_eq!(alpha[1].category_id, Some(2));
    }

    #[tokio::test]
    async fn test_rental_payment_rows_per_payment() {
        let source = MemorySource::new(fixtures::catalog());
        let rows = source.rental_payments().await.unwrap();

        let split: Vec<_> = rows.iter().filter(|r| r.rental_id == 2).collect();
        assert_eq!(split.len(), 2);
        let unpaid: Vec<_> = rows.iter().filter(|r| r.rental_id == 4).collect();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].amount, None);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_rows() {
        let warehouse = MemoryWarehouse::new();
        warehouse.ensure_schema().await.unwrap();
        let row = dim_date::Model {
            date_key: 1,
            full_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            rental_month: 1,
            rental_week: 3,
        };
        warehouse.replace_dates(&[row.clone()]).await.unwrap();

        warehouse.fail_writes_to("dim_date").await;
        let err = warehouse.replace_dates(&[]).await.unwrap_err();

        assert_eq!(err.to_string(), "loading `dim_date` failed");
        assert_eq!(warehouse.snapshot().await.dim_date, vec![row]);
        assert_eq!(warehouse.load_log().await, vec!["dim_date"]);
    }

    #[tokio::test]
    async fn test_tables_missing_until_schema_created() {
        let warehouse = MemoryWarehouse::new();

        let err = warehouse.dimension_keys().await.err().unwrap();
        assert_eq!(err.to_string(), "extracting `dim_date` failed");
        assert!(warehouse.replace_films(&[]).await.is_err());

        warehouse.ensure_schema().await.unwrap();
        let keys = warehouse.dimension_keys().await.unwrap();
        assert!(keys.dates.is_empty());
        assert_eq!(warehouse.replace_films(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let connector = MemoryConnector::new(SakilaTables::default());
        connector.refuse_connections(true);

        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, EtlError::Connection { .. }));
        assert_eq!(connector.connections_opened(), 0);
    }
}
