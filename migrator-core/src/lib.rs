//! A structure-and-data migration engine that moves a MySQL database into a PostgreSQL schema.
//!
//! The core engine (this crate) knows nothing about files, processes, or command-line flags; it
//! is driven entirely through [`Config`] and a [`MigrationLogger`] sink, so a host can embed it
//! without dragging in file I/O or log rotation concerns.

pub mod config;
mod data_pipeline;
mod ddl_emitter;
mod error;
mod helpers;
mod logger;
mod models;
mod mysql_client;
mod orchestrator;
mod parallel_runner;
mod postgres_client_wrapper;
mod quoting;
mod row_encoder;
mod schema_planner;
mod type_mapper;
mod view_rewriter;

pub use config::{Config, Dsn};
pub use error::{ConnectError, ConnectionTarget, MigrationError, Result};
pub use logger::{ErrorContext, LogLevel, MigrationLogger, NullLogger, SharedLogger};
pub use models::*;
pub use orchestrator::run_migration;
pub use quoting::{quote_ident, quote_ident_list, quote_literal, quote_qualified};
pub use row_encoder::{encode_row, EncodedField};
pub use type_mapper::map_type;
pub use view_rewriter::rewrite_view;
