//! Connection settings for the source and warehouse databases.
//!
//! Values come from the environment (after `.env` is loaded), using the same
//! variable names as the container setup: `MYSQL_SOURCE_*` and
//! `MYSQL_WAREHOUSE_*`.

use std::fmt;

use derive_builder::Builder;

use crate::etl::manager;
use crate::etl::EtlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseRole {
    Source,
    Warehouse,
}

impl DatabaseRole {
    fn prefix(self) -> &'static str {
        match self {
            DatabaseRole::Source => "MYSQL_SOURCE",
            DatabaseRole::Warehouse => "MYSQL_WAREHOUSE",
        }
    }

    fn default_database(self) -> &'static str {
        match self {
            DatabaseRole::Source => "sakila",
            DatabaseRole::Warehouse => "sakila_dw",
        }
    }
}

#[derive(Clone, Builder)]
#[builder(setter(into))]
pub struct DatabaseConfig {
    #[builder(default = "\"root\".to_string()")]
    pub user: String,

    pub password: String,

    #[builder(default = "\"localhost\".to_string()")]
    pub host: String,

    #[builder(default = "3306")]
    pub port: u16,

    pub database: String,
}

impl DatabaseConfig {
    pub fn from_env(role: DatabaseRole) -> Result<Self, EtlError> {
        Self::from_lookup(role, |name| std::env::var(name).ok())
    }

    /// Builds the config from `<PREFIX>_{USER,ROOT_PASSWORD,HOST,PORT,DATABASE}`;
    /// only the password is mandatory.
    pub fn from_lookup<F>(role: DatabaseRole, lookup: F) -> Result<Self, EtlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = role.prefix();
        let var = |name: &str| lookup(&format!("{}_{}", prefix, name));

        let mut builder = DatabaseConfigBuilder::default();
        builder.database(var("DATABASE").unwrap_or_else(|| role.default_database().to_string()));
        if let Some(user) = var("USER") {
            builder.user(user);
        }
        if let Some(host) = var("HOST") {
            builder.host(host);
        }
        if let Some(port) = var("PORT") {
            let port: u16 = port.trim().parse().map_err(|e| {
                EtlError::Configuration(format!("{}_PORT `{}`: {}", prefix, port, e))
            })?;
            builder.port(port);
        }
        let password = var("ROOT_PASSWORD").ok_or_else(|| {
            EtlError::Configuration(format!("{}_ROOT_PASSWORD is not set", prefix))
        })?;
        builder.password(password);

        builder
            .build()
            .map_err(|e| EtlError::Configuration(e.to_string()))
    }

    /// Connection URL with percent-encoded credentials.
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.database
        )
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mysql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

/// Everything a run needs: both databases plus scheduler settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: DatabaseConfig,
    pub warehouse: DatabaseConfig,
    pub pipeline: manager::Config,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, EtlError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `ETL_WORKERS` and `ETL_BATCH_SIZE` override the scheduler defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EtlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = DatabaseConfig::from_lookup(DatabaseRole::Source, &lookup)?;
        let warehouse = DatabaseConfig::from_lookup(DatabaseRole::Warehouse, &lookup)?;

        let mut builder = manager::ConfigBuilder::default();
        if let Some(workers) = lookup("ETL_WORKERS") {
            builder.worker_num(parse_positive("ETL_WORKERS", &workers)?);
        }
        if let Some(batch) = lookup("ETL_BATCH_SIZE") {
            builder.batch_size(parse_positive("ETL_BATCH_SIZE", &batch)?);
        }
        let pipeline = builder
            .build()
            .map_err(|e| EtlError::Configuration(e.to_string()))?;

        Ok(AppConfig {
            source,
            warehouse,
            pipeline,
        })
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize, EtlError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(EtlError::Configuration(format!(
            "{} must be a positive integer, got `{}`",
            name, value
        ))),
    }
}
