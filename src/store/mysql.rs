use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, FromQueryResult, IntoActiveModel, Schema, Statement, TransactionTrait,
};
use tracing::{info, warn};

use super::{Connections, Connector, Source, Warehouse};
use crate::config::DatabaseConfig;
use crate::etl::EtlError;
use crate::model::{
    dim_client, dim_date, dim_film, dim_store, fact_rental, CustomerRow, FilmRow, RentalDateRow,
    RentalPaymentRow, StoreRow,
};
use crate::transform::{DimensionKeys, KeyMap};

// Integer columns are cast to SIGNED so every id decodes as i64 regardless of
// the unsigned SMALLINT/TINYINT types used by the Sakila schema.

const RENTAL_DATES_SQL: &str = r#"
SELECT CAST(r.rental_id AS SIGNED) AS rental_id,
       r.rental_date
FROM rental r
ORDER BY r.rental_id"#;

const FILMS_SQL: &str = r#"
SELECT CAST(f.film_id AS SIGNED) AS film_id,
       f.title,
       f.description,
       CAST(f.length AS SIGNED) AS length,
       CAST(c.category_id AS SIGNED) AS category_id,
       c.name AS category
FROM film f
LEFT JOIN film_category fc ON fc.film_id = f.film_id
LEFT JOIN category c ON c.category_id = fc.category_id
ORDER BY f.film_id, c.category_id"#;

const STORES_SQL: &str = r#"
SELECT CAST(s.store_id AS SIGNED) AS store_id,
       CAST(s.address_id AS SIGNED) AS address_id,
       a.address,
       a.district,
       CAST(a.city_id AS SIGNED) AS city_id,
       ci.city,
       CAST(ci.country_id AS SIGNED) AS country_id,
       co.country
FROM store s
LEFT JOIN address a ON a.address_id = s.address_id
LEFT JOIN city ci ON ci.city_id = a.city_id
LEFT JOIN country co ON co.country_id = ci.country_id
ORDER BY s.store_id"#;

const CUSTOMERS_SQL: &str = r#"
SELECT CAST(cu.customer_id AS SIGNED) AS customer_id,
       cu.first_name,
       cu.last_name,
       cu.email,
       CAST(cu.address_id AS SIGNED) AS address_id,
       a.address,
       a.district,
       a.phone,
       CAST(a.city_id AS SIGNED) AS city_id,
       ci.city,
       CAST(ci.country_id AS SIGNED) AS country_id,
       co.country
FROM customer cu
LEFT JOIN address a ON a.address_id = cu.address_id
LEFT JOIN city ci ON ci.city_id = a.city_id
LEFT JOIN country co ON co.country_id = ci.country_id
ORDER BY cu.customer_id"#;

const RENTAL_PAYMENTS_SQL: &str = r#"
SELECT CAST(r.rental_id AS SIGNED) AS rental_id,
       r.rental_date,
       CAST(r.customer_id AS SIGNED) AS customer_id,
       CAST(i.film_id AS SIGNED) AS film_id,
       CAST(i.store_id AS SIGNED) AS store_id,
       p.amount
FROM rental r
LEFT JOIN inventory i ON i.inventory_id = r.inventory_id
LEFT JOIN payment p ON p.rental_id = r.rental_id
ORDER BY r.rental_id, p.payment_id"#;

/// Opens a connection and verifies it with a ping before handing it out.
pub async fn open(config: &DatabaseConfig) -> Result<DatabaseConnection, EtlError> {
    let mut options = ConnectOptions::new(config.url());
    options.max_connections(2).sqlx_logging(false);

    let connection_error = |source: DbErr| EtlError::Connection {
        target: config.to_string(),
        source,
    };
    let db = Database::connect(options).await.map_err(connection_error)?;
    db.ping().await.map_err(connection_error)?;

    info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "connected to database"
    );
    Ok(db)
}

pub struct MySqlSource {
    db: DatabaseConnection,
}

impl MySqlSource {
    pub fn new(db: DatabaseConnection) -> Self {
        MySqlSource { db }
    }

    async fn fetch<R>(&self, entity: &'static str, sql: &str) -> Result<Vec<R>, EtlError>
    where
        R: FromQueryResult,
    {
        R::find_by_statement(Statement::from_string(DbBackend::MySql, sql))
            .all(&self.db)
            .await
            .map_err(EtlError::query(entity))
    }
}

#[async_trait]
impl Source for MySqlSource {
    async fn rental_dates(&self) -> Result<Vec<RentalDateRow>, EtlError> {
        self.fetch("rental", RENTAL_DATES_SQL).await
    }

    async fn films(&self) -> Result<Vec<FilmRow>, EtlError> {
        self.fetch("film", FILMS_SQL).await
    }

    async fn stores(&self) -> Result<Vec<StoreRow>, EtlError> {
        self.fetch("store", STORES_SQL).await
    }

    async fn customers(&self) -> Result<Vec<CustomerRow>, EtlError> {
        self.fetch("customer", CUSTOMERS_SQL).await
    }

    async fn rental_payments(&self) -> Result<Vec<RentalPaymentRow>, EtlError> {
        self.fetch("rental", RENTAL_PAYMENTS_SQL).await
    }
}

pub struct MySqlWarehouse {
    db: DatabaseConnection,
    batch_size: usize,
}

impl MySqlWarehouse {
    pub fn new(db: DatabaseConnection, batch_size: usize) -> Self {
        MySqlWarehouse {
            db,
            batch_size: batch_size.max(1),
        }
    }

    /// Deletes and re-inserts `table` inside one transaction. `DELETE` is used
    /// rather than `TRUNCATE`, which would commit implicitly on MySQL.
    async fn replace_all<A>(&self, table: &'static str, models: Vec<A>) -> Result<u64, EtlError>
    where
        A: ActiveModelTrait + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let txn = self.db.begin().await.map_err(EtlError::load(table))?;
        match rewrite(&txn, models, self.batch_size).await {
            Ok(inserted) => {
                txn.commit().await.map_err(EtlError::load(table))?;
                info!(table, rows = inserted, "table replaced");
                Ok(inserted)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(table, error = %rollback, "rollback failed");
                }
                Err(EtlError::load(table)(e))
            }
        }
    }
}

async fn rewrite<A, C>(db: &C, models: Vec<A>, batch_size: usize) -> Result<u64, DbErr>
where
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    A::Entity::delete_many().exec(db).await?;

    let mut inserted = 0;
    let mut models = models.into_iter().peekable();
    while models.peek().is_some() {
        let chunk: Vec<A> = models.by_ref().take(batch_size).collect();
        inserted += A::Entity::insert_many(chunk)
            .exec_without_returning(db)
            .await?;
    }
    Ok(inserted)
}

#[async_trait]
impl Warehouse for MySqlWarehouse {
    async fn ensure_schema(&self) -> Result<(), EtlError> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        let tables = [
            ("dim_date", schema.create_table_from_entity(dim_date::Entity)),
            ("dim_film", schema.create_table_from_entity(dim_film::Entity)),
            ("dim_store", schema.create_table_from_entity(dim_store::Entity)),
            ("dim_client", schema.create_table_from_entity(dim_client::Entity)),
            ("fact_rental", schema.create_table_from_entity(fact_rental::Entity)),
        ];
        for (table, mut statement) in tables {
            statement.if_not_exists();
            self.db
                .execute(backend.build(&statement))
                .await
                .map_err(EtlError::load(table))?;
        }
        Ok(())
    }

    async fn replace_dates(&self, rows: &[dim_date::Model]) -> Result<u64, EtlError> {
        let models = rows.iter().map(dim_date::Model::to_active_model).collect();
        self.replace_all("dim_date", models).await
    }

    async fn replace_films(&self, rows: &[dim_film::Model]) -> Result<u64, EtlError> {
        let models = rows.iter().map(dim_film::Model::to_active_model).collect();
        self.replace_all("dim_film", models).await
    }

    async fn replace_stores(&self, rows: &[dim_store::Model]) -> Result<u64, EtlError> {
        let models = rows.iter().map(dim_store::Model::to_active_model).collect();
        self.replace_all("dim_store", models).await
    }

    async fn replace_clients(&self, rows: &[dim_client::Model]) -> Result<u64, EtlError> {
        let models = rows.iter().map(dim_client::Model::to_active_model).collect();
        self.replace_all("dim_client", models).await
    }

    async fn replace_rentals(&self, rows: &[fact_rental::Model]) -> Result<u64, EtlError> {
        let models = rows.iter().map(fact_rental::Model::to_active_model).collect();
        self.replace_all("fact_rental", models).await
    }

    async fn dimension_keys(&self) -> Result<DimensionKeys, EtlError> {
        let dates = dim_date::Entity::find()
            .all(&self.db)
            .await
            .map_err(EtlError::query("dim_date"))?;
        let films = dim_film::Entity::find()
            .all(&self.db)
            .await
            .map_err(EtlError::query("dim_film"))?;
        let stores = dim_store::Entity::find()
            .all(&self.db)
            .await
            .map_err(EtlError::query("dim_store"))?;
        let customers = dim_client::Entity::find()
            .all(&self.db)
            .await
            .map_err(EtlError::query("dim_client"))?;

        Ok(DimensionKeys {
            dates: KeyMap::from_pairs(dates.into_iter().map(|d| (d.full_date, d.date_key))),
            films: KeyMap::from_pairs(films.into_iter().map(|f| (f.film_id, f.film_key))),
            stores: KeyMap::from_pairs(stores.into_iter().map(|s| (s.store_id, s.store_key))),
            customers: KeyMap::from_pairs(
                customers.into_iter().map(|c| (c.customer_id, c.customer_key)),
            ),
        })
    }
}

/// Opens a fresh source and warehouse connection for every task.
#[derive(Clone)]
pub struct MySqlConnector {
    source: DatabaseConfig,
    warehouse: DatabaseConfig,
    batch_size: usize,
}

impl MySqlConnector {
    pub fn new(source: DatabaseConfig, warehouse: DatabaseConfig, batch_size: usize) -> Self {
        MySqlConnector {
            source,
            warehouse,
            batch_size,
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self) -> Result<Connections, EtlError> {
        let source = open(&self.source).await?;
        let warehouse = open(&self.warehouse).await?;
        Ok(Connections {
            source: Arc::new(MySqlSource::new(source)),
            warehouse: Arc::new(MySqlWarehouse::new(warehouse, self.batch_size)),
        })
    }
}
