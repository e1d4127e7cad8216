//! Component G: runs every phase in the mandatory order and produces the summary report.

use crate::config::Config;
use crate::ddl_emitter::{
    build_create_table, build_deferred_statements, build_foreign_key_statements, build_table_comment,
};
use crate::error::MigrationError;
use crate::logger::{ErrorContext, LogLevel, SharedLogger};
use crate::models::{MigrationPlan, SourceTable, SummaryRow, ViewDefinition};
use crate::mysql_client::MySqlSourcePool;
use crate::parallel_runner::ParallelRunner;
use crate::postgres_client_wrapper::PostgresClientWrapper;
use crate::schema_planner::resolve_schema_name;
use crate::view_rewriter::rewrite_view;
use crate::{data_pipeline, Result};
use std::num::NonZeroUsize;
use std::sync::atomic::AtomicBool;

/// Runs the full migration described by `config`, phase by phase, and returns one
/// [`SummaryRow`] per table. Destination schema creation, discovery, foreign-key installation
/// and view creation run strictly sequentially; per-table work (create + copy + deferred DDL)
/// may run up to `config.max_parallel` at a time.
///
/// `cancelled` is polled between tables and between chunks (§5): once set, no new table is
/// scheduled, running COPY streams finish their in-flight chunk and stop, and the function
/// returns normally with whatever was copied so far - there is no rollback.
pub async fn run_migration(
    config: &Config,
    logger: SharedLogger,
    cancelled: &AtomicBool,
) -> Result<Vec<SummaryRow>> {
    logger.log(LogLevel::Info, "connecting to destination");
    let destination = PostgresClientWrapper::new(&config.target.postgres_connection_string()).await?;

    logger.log(LogLevel::Info, "connecting to source");
    let source_pool = MySqlSourcePool::new(&config.source.mysql_url(), config.source.database.clone())?;
    let mut source = source_pool.get_client().await?;

    logger.log(LogLevel::Info, "resolving destination schema");
    let schema_name = resolve_schema_name(
        &destination,
        config.schema.as_deref(),
        &config.source.database,
    )
    .await?;

    logger.log(LogLevel::Info, "discovering source structure");
    let plan = discover(&mut source, &schema_name, config.chunk_target_mb()).await?;

    let encoding = resolve_encoding(&config.encoding);

    logger.log(
        LogLevel::Info,
        &format!(
            "migrating {} table(s) and {} view(s) into schema \"{}\"",
            plan.tables.len(),
            plan.views.len(),
            plan.target_schema_name
        ),
    );

    let summary = run_table_phase(
        &plan,
        &source_pool,
        &destination,
        &schema_name,
        encoding,
        plan.chunk_target_mb,
        config.max_parallel,
        config.data_only,
        cancelled,
        &logger,
    )
    .await?;

    if !config.data_only && !cancelled.load(std::sync::atomic::Ordering::Relaxed) {
        run_foreign_key_phase(&plan, &destination, &schema_name, &logger).await;
        run_view_phase(&plan, &destination, &schema_name, &logger).await;
    }

    logger.record_summary(&summary);

    Ok(summary)
}

async fn discover(
    source: &mut crate::mysql_client::MySqlSourceClient,
    schema_name: &str,
    chunk_target_mb: u64,
) -> Result<MigrationPlan> {
    let (base_table_names, view_names) = source.discover_table_names().await?;

    let mut tables = Vec::with_capacity(base_table_names.len());
    for name in base_table_names {
        tables.push(source.load_table(&name).await?);
    }

    let mut views = Vec::with_capacity(view_names.len());
    for name in view_names {
        views.push(source.load_view(&name).await?);
    }

    Ok(MigrationPlan {
        target_schema_name: schema_name.to_string(),
        tables,
        views,
        chunk_target_mb,
    })
}

/// Phase 4 (+ 5 folded in, per the concurrency contract): for each table, `CREATE TABLE`, table
/// comment, the data pipeline, then its deferred DDL - as one serial per-table pipeline, bounded
/// to `max_parallel` concurrent tables.
async fn run_table_phase(
    plan: &MigrationPlan,
    source_pool: &MySqlSourcePool,
    destination: &PostgresClientWrapper,
    schema_name: &str,
    encoding: &'static encoding_rs::Encoding,
    chunk_target_mb: u64,
    max_parallel: NonZeroUsize,
    data_only: bool,
    cancelled: &AtomicBool,
    logger: &SharedLogger,
) -> Result<Vec<SummaryRow>> {
    let mut runner: ParallelRunner<_, MigrationError> = ParallelRunner::new(max_parallel);
    let results: std::sync::Arc<tokio::sync::Mutex<Vec<SummaryRow>>> =
        std::sync::Arc::new(tokio::sync::Mutex::new(Vec::with_capacity(plan.tables.len())));

    for table in plan.tables.clone() {
        if cancelled.load(std::sync::atomic::Ordering::Relaxed) {
            logger.log(LogLevel::Warn, "cancellation requested: no further tables will be scheduled");
            break;
        }

        let source_pool = source_pool.clone();
        let destination = destination.create_another_connection().await?;
        let schema_name = schema_name.to_string();
        let logger = logger.clone();
        let results = results.clone();

        runner
            .enqueue(async move {
                let mut source = source_pool.get_client().await?;
                let row = migrate_one_table(
                    &mut source,
                    &destination,
                    &schema_name,
                    &table,
                    encoding,
                    chunk_target_mb,
                    data_only,
                    cancelled,
                    &logger,
                )
                .await?;
                results.lock().await.push(row);
                Ok(())
            })
            .await?;
    }

    runner.run_remaining().await?;

    let mut rows = std::sync::Arc::try_unwrap(results)
        .map(|mutex| mutex.into_inner())
        .unwrap_or_default();
    rows.sort_by(|a, b| a.qualified_table_name.cmp(&b.qualified_table_name));
    Ok(rows)
}

async fn migrate_one_table(
    source: &mut crate::mysql_client::MySqlSourceClient,
    destination: &PostgresClientWrapper,
    schema_name: &str,
    table: &SourceTable,
    encoding: &'static encoding_rs::Encoding,
    chunk_target_mb: u64,
    data_only: bool,
    cancelled: &AtomicBool,
    logger: &SharedLogger,
) -> Result<SummaryRow> {
    let create_table_sql = build_create_table(schema_name, table)?;
    destination
        .execute_non_query_raw(&create_table_sql)
        .await
        .map_err(|e| MigrationError::TableCreate {
            schema: schema_name.to_string(),
            table: table.name.clone(),
            sql: create_table_sql.clone(),
            source: e,
        })?;

    if let Some(comment_sql) = build_table_comment(schema_name, table) {
        if let Err(e) = destination.execute_non_query(&comment_sql).await {
            logger.report_error(&ErrorContext {
                message: format!("table comment failed for \"{}\".\"{}\": {e}", schema_name, table.name),
                sql: Some(comment_sql),
            });
        }
    }

    let summary = data_pipeline::copy_table_data(
        source,
        destination,
        schema_name,
        table,
        chunk_target_mb,
        encoding,
        cancelled,
        logger,
    )
    .await?;

    if !data_only {
        for statement in build_deferred_statements(schema_name, table) {
            if let Err(e) = destination.execute_non_query(&statement.sql).await {
                logger.report_error(&ErrorContext {
                    message: format!(
                        "deferred DDL statement failed on \"{}\".\"{}\": {e}",
                        schema_name, table.name
                    ),
                    sql: Some(statement.sql),
                });
            }
        }
    }

    Ok(summary)
}

/// Phase 6: foreign keys, installed only after every table has finished phases 4/5.
async fn run_foreign_key_phase(
    plan: &MigrationPlan,
    destination: &PostgresClientWrapper,
    schema_name: &str,
    logger: &SharedLogger,
) {
    for table in &plan.tables {
        for (fk, sql) in build_foreign_key_statements(schema_name, table) {
            if let Err(e) = destination.execute_non_query(&sql).await {
                logger.report_error(&ErrorContext {
                    message: format!("foreign key `{}` failed to install: {e}", fk.constraint_name),
                    sql: Some(sql),
                });
            }
        }
    }
}

/// Phase 7: rewrite and install each view; a failure is logged and the raw MySQL DDL handed to
/// the logger's `record_view_failure` sink, never aborting the run.
async fn run_view_phase(
    plan: &MigrationPlan,
    destination: &PostgresClientWrapper,
    schema_name: &str,
    logger: &SharedLogger,
) {
    for view in &plan.views {
        let ViewDefinition { name, raw_definition } = view;
        let rewritten = rewrite_view(schema_name, name, raw_definition);
        if let Err(e) = destination.execute_non_query(&rewritten).await {
            logger.record_view_failure(name, raw_definition, &e.to_string());
        }
    }
}

fn resolve_encoding(name: &str) -> &'static encoding_rs::Encoding {
    encoding_rs::Encoding::for_label(name.as_bytes()).unwrap_or(encoding_rs::UTF_8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_encoding_labels() {
        assert_eq!(resolve_encoding("UTF-8").name(), "UTF-8");
        assert_eq!(resolve_encoding("utf8").name(), "UTF-8");
    }

    #[test]
    fn unknown_encoding_falls_back_to_utf8() {
        assert_eq!(resolve_encoding("not-a-real-encoding").name(), "UTF-8");
    }
}
