//! # sakila-etl
//!
//! Batch ETL that rebuilds a rental star schema (`sakila_dw`) from the
//! operational Sakila database.
//!
//! ## Features
//!
//! - **Explicit task graph**: date, film, store and customer dimensions run
//!   concurrently and feed the rental fact task
//! - **Deterministic surrogate keys**: reruns produce identical tables
//! - **Transactional table replacement** in the warehouse
//! - **Graceful cancellation** support
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sakila_etl::config::AppConfig;
//! use sakila_etl::etl::PipelineManager;
//! use sakila_etl::store::MySqlConnector;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = AppConfig::from_env()?;
//! let connector = Arc::new(MySqlConnector::new(
//!     config.source.clone(),
//!     config.warehouse.clone(),
//!     config.pipeline.batch_size,
//! ));
//! let manager = PipelineManager::sakila(&config.pipeline, connector)?;
//! let report = manager.run_all(&CancellationToken::new()).await?;
//! assert!(report.is_success());
//! ```
//!
//! ## Modules
//!
//! - [`dag`] - Task graph, ordering and per-run task states
//! - [`etl`] - Pipeline abstraction and the scheduler that runs it
//! - [`pipelines`] - The five Sakila ETL units
//! - [`transform`] - Pure row reshaping and surrogate key assignment
//! - [`store`] - Source and warehouse access over MySQL
//! - [`model`] - Extracted row shapes and warehouse entities

pub mod config;
pub mod dag;
pub mod etl;
pub mod logging;
pub mod model;
pub mod pipelines;
pub mod store;
pub mod transform;
