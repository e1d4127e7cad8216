//! Component F: per-table chunk sizing, streamed SELECT, re-encoding, and batched COPY with
//! row-level fallback.

use crate::error::MigrationError;
use crate::logger::{ErrorContext, LogLevel, SharedLogger};
use crate::models::{Column, SourceTable, SummaryRow};
use crate::mysql_client::MySqlSourceClient;
use crate::postgres_client_wrapper::PostgresClientWrapper;
use crate::quoting::quote_qualified;
use crate::row_encoder::{encode_row, EncodedField};
use crate::Result;
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use mysql_async::Row as MySqlRow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// How a column's already-shaped projection value is turned into an [`EncodedField`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FieldKind {
    /// The SELECT already produced a hex string (spatial or binary/blob columns).
    Hex,
    /// Plain text, possibly needing encoding validation.
    Text,
}

fn field_kind(column: &Column) -> FieldKind {
    match column.base_type() {
        "geometry" | "point" | "polygon" | "linestring" | "multipoint" | "multilinestring"
        | "multipolygon" | "geometrycollection" | "binary" | "varbinary" | "blob" | "tinyblob"
        | "mediumblob" | "longblob" => FieldKind::Hex,
        _ => FieldKind::Text,
    }
}

/// Builds the SELECT projection expression for one column, applying the shaping rules of
/// §4.F.2: spatial columns become hex WKB, bit columns become a string of `0`/`1`, zero dates
/// become the `-INFINITY` sentinel, and binary/blob columns are hex-encoded.
fn projection_expression(column: &Column) -> String {
    let quoted = crate::quoting::quote_ident(&column.field);
    match column.base_type() {
        "geometry" | "point" | "polygon" | "linestring" | "multipoint" | "multilinestring"
        | "multipolygon" | "geometrycollection" => {
            format!("HEX(ST_AsWKB({quoted})) AS {quoted}")
        }
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
            format!("HEX({quoted}) AS {quoted}")
        }
        "bit" => format!("BIN({quoted}) AS {quoted}"),
        "timestamp" | "date" | "datetime" => format!(
            "IF({quoted} IN ('0000-00-00','0000-00-00 00:00:00'), '-INFINITY', {quoted}) AS {quoted}"
        ),
        _ => quoted,
    }
}

/// Chunk sizing per §4.F.1: `chunks = max(1, ceil(size_mb / chunk_target_mb))`,
/// `rows_per_chunk = ceil(row_count / chunks)`.
pub fn compute_chunking(size_mb: u64, chunk_target_mb: u64, row_count: u64) -> (u64, u64) {
    let chunk_target_mb = chunk_target_mb.max(1);
    let chunks = (size_mb as f64 / chunk_target_mb as f64).ceil().max(1.0) as u64;
    let rows_per_chunk = if row_count == 0 {
        1
    } else {
        (row_count as f64 / chunks as f64).ceil() as u64
    };
    (chunks, rows_per_chunk.max(1))
}

/// Copies one table's data from source to destination, chunked, with row-level fallback on a
/// failed chunk. On cancellation the in-flight chunk is finished, the stream is dropped (closing
/// it), and no further chunk is started - there is no rollback of what was already copied.
pub async fn copy_table_data(
    source: &mut MySqlSourceClient,
    destination: &PostgresClientWrapper,
    schema: &str,
    table: &SourceTable,
    chunk_target_mb: u64,
    encoding: &'static encoding_rs::Encoding,
    cancelled: &AtomicBool,
    logger: &SharedLogger,
) -> Result<SummaryRow> {
    let started = Instant::now();
    let qualified_table = quote_qualified(schema, &table.name);
    let (_chunks, rows_per_chunk) = compute_chunking(table.size_mb, chunk_target_mb, table.row_count);

    destination
        .execute_non_query("SET synchronous_commit = off;")
        .await?;

    let projections = table
        .columns
        .iter()
        .map(projection_expression)
        .collect::<Vec<_>>()
        .join(", ");
    let select_sql = format!("SELECT {projections} FROM `{}`", table.name);

    let mut rows_attempted = 0u64;
    let mut rows_failed = 0u64;
    let mut buffer: Vec<MySqlRow> = Vec::with_capacity(rows_per_chunk as usize);
    let mut stopped_early = false;

    {
        let mut stream = source.stream_rows(select_sql).await?;
        while let Some(row) = stream.next().await {
            let row = row.map_err(MigrationError::Discovery)?;
            buffer.push(row);
            if buffer.len() as u64 >= rows_per_chunk {
                let chunk = std::mem::take(&mut buffer);
                let (attempted, failed) = deliver_chunk(
                    destination,
                    schema,
                    table,
                    &qualified_table,
                    chunk,
                    encoding,
                    logger,
                )
                .await?;
                rows_attempted += attempted;
                rows_failed += failed;

                if cancelled.load(Ordering::Relaxed) {
                    stopped_early = true;
                    break;
                }
            }
        }
        // `stream` drops here, closing the cursor, whether or not it ran to completion.
    }

    if !buffer.is_empty() && !stopped_early {
        let (attempted, failed) = deliver_chunk(
            destination,
            schema,
            table,
            &qualified_table,
            buffer,
            encoding,
            logger,
        )
        .await?;
        rows_attempted += attempted;
        rows_failed += failed;
    }

    if stopped_early {
        logger.log(
            LogLevel::Warn,
            &format!("cancellation requested: stopped {qualified_table} after the in-flight chunk"),
        );
    }

    Ok(SummaryRow {
        qualified_table_name: qualified_table,
        rows_attempted,
        rows_failed,
        elapsed: started.elapsed(),
    })
}

/// Delivers one chunk via a bulk `COPY FROM STDIN`; on failure, retries the same chunk one row
/// at a time so a single bad row never loses the rest of the chunk.
async fn deliver_chunk(
    destination: &PostgresClientWrapper,
    schema: &str,
    table: &SourceTable,
    qualified_table: &str,
    rows: Vec<MySqlRow>,
    encoding: &'static encoding_rs::Encoding,
    logger: &SharedLogger,
) -> Result<(u64, u64)> {
    let total_rows = rows.len() as u64;
    let mut encoding_failures = 0u64;
    let encoded_rows: Vec<String> = rows
        .iter()
        .filter_map(|row| match encode_mysql_row(row, &table.columns, encoding) {
            Some(line) => Some(line),
            None => {
                encoding_failures += 1;
                logger.record_rejected_row(&table.name, "<row dropped: invalid encoding>");
                None
            }
        })
        .collect();

    if encoded_rows.is_empty() {
        return Ok((total_rows, encoding_failures));
    }

    let copy_sql = format!("COPY {qualified_table} FROM STDIN;");

    match bulk_copy(destination, &copy_sql, &encoded_rows).await {
        Ok(()) => Ok((total_rows, encoding_failures)),
        Err(e) => {
            logger.log(
                LogLevel::Warn,
                &format!("chunk COPY into {qualified_table} failed ({e}), retrying row by row"),
            );
            let failed =
                retry_rows_individually(destination, schema, table, qualified_table, &encoded_rows, logger)
                    .await?;
            Ok((total_rows, failed + encoding_failures))
        }
    }
}

async fn bulk_copy(destination: &PostgresClientWrapper, copy_sql: &str, lines: &[String]) -> Result {
    let sink = destination.copy_in::<Bytes>(copy_sql).await?;
    futures::pin_mut!(sink);

    let mut payload = BytesMut::new();
    for line in lines {
        payload.extend_from_slice(line.as_bytes());
        payload.extend_from_slice(b"\n");
    }

    sink.send(payload.freeze()).await?;
    sink.close().await?;
    Ok(())
}

async fn retry_rows_individually(
    destination: &PostgresClientWrapper,
    _schema: &str,
    table: &SourceTable,
    qualified_table: &str,
    encoded_rows: &[String],
    logger: &SharedLogger,
) -> Result<u64> {
    let mut failed = 0u64;
    let copy_sql = format!("COPY {qualified_table} FROM STDIN;");

    for (idx, line) in encoded_rows.iter().enumerate() {
        if let Err(e) = bulk_copy(destination, &copy_sql, std::slice::from_ref(line)).await {
            failed += 1;
            logger.record_rejected_row(&table.name, line);
            logger.report_error(&ErrorContext {
                message: format!("row {idx} in {qualified_table} failed to copy: {e}"),
                sql: Some(copy_sql.clone()),
            });
        }
    }

    Ok(failed)
}

/// Encodes one fetched row, or returns `None` if any non-null text field is invalid in the
/// target encoding and cannot be converted - the whole row is then dropped and counted as
/// failed, per the encoding-validation rule in §4.F.4.
fn encode_mysql_row(
    row: &MySqlRow,
    columns: &[Column],
    encoding: &'static encoding_rs::Encoding,
) -> Option<String> {
    let mut fields = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value: Option<Vec<u8>> = row.as_ref(idx).and_then(mysql_value_to_bytes);
        let field = match value {
            None => EncodedField::Null,
            Some(bytes) => match field_kind(column) {
                FieldKind::Hex => EncodedField::Hex(String::from_utf8_lossy(&bytes).into_owned()),
                FieldKind::Text => EncodedField::Text(shape_text(&bytes, encoding)?),
            },
        };
        fields.push(field);
    }

    Some(encode_row(&fields))
}

fn mysql_value_to_bytes(value: &mysql_async::Value) -> Option<Vec<u8>> {
    use mysql_async::Value;
    match value {
        Value::NULL => None,
        Value::Bytes(b) => Some(b.clone()),
        Value::Int(i) => Some(i.to_string().into_bytes()),
        Value::UInt(u) => Some(u.to_string().into_bytes()),
        Value::Float(f) => Some(f.to_string().into_bytes()),
        Value::Double(d) => Some(d.to_string().into_bytes()),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            Some(format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
            )
            .into_bytes())
        }
        Value::Time(is_negative, days, hours, minutes, seconds, micros) => {
            let sign = if *is_negative { "-" } else { "" };
            let total_hours = *days as u32 * 24 + *hours as u32;
            Some(
                format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
                    .into_bytes(),
            )
        }
    }
}

/// Validates `bytes` in the target encoding; if invalid, attempts a Windows-1252 fallback
/// decode (the common source encoding for unmarked MySQL latin1 data) before giving up.
fn shape_text(bytes: &[u8], target: &'static encoding_rs::Encoding) -> Option<String> {
    let (decoded, _, had_errors) = target.decode(bytes);
    if !had_errors {
        return Some(decoded.into_owned());
    }

    let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    if !had_errors {
        Some(decoded.into_owned())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableKind;

    fn column(field: &str, raw_type: &str) -> Column {
        Column {
            field: field.to_string(),
            raw_type: raw_type.to_string(),
            nullable: true,
            default: None,
            extra: String::new(),
            comment: None,
        }
    }

    #[test]
    fn chunk_bound_matches_spec_example() {
        let (chunks, rows_per_chunk) = compute_chunking(100, 10, 50);
        assert_eq!(chunks, 10);
        assert_eq!(rows_per_chunk, 5);
    }

    #[test]
    fn chunk_target_floored_at_one() {
        let (chunks, _) = compute_chunking(5, 0, 10);
        assert_eq!(chunks, 5);
    }

    #[test]
    fn empty_table_still_gets_one_row_per_chunk_floor() {
        let (_, rows_per_chunk) = compute_chunking(1, 10, 0);
        assert_eq!(rows_per_chunk, 1);
    }

    #[test]
    fn spatial_column_gets_hex_wkb_projection() {
        let c = column("geo", "geometry");
        assert!(projection_expression(&c).contains("HEX(ST_AsWKB"));
    }

    #[test]
    fn bit_column_gets_bin_projection() {
        let c = column("flags", "bit(8)");
        assert_eq!(projection_expression(&c), "BIN(\"flags\") AS \"flags\"");
    }

    #[test]
    fn datetime_column_gets_zero_date_guard() {
        let c = column("d", "datetime");
        assert!(projection_expression(&c).contains("'-INFINITY'"));
    }

    #[test]
    fn plain_column_is_identity_projection() {
        let c = column("name", "varchar(10)");
        assert_eq!(projection_expression(&c), "\"name\"");
    }

    #[test]
    fn field_kind_classifies_spatial_and_binary_as_hex() {
        assert_eq!(field_kind(&column("geo", "geometry")), FieldKind::Hex);
        assert_eq!(field_kind(&column("b", "varbinary(16)")), FieldKind::Hex);
        assert_eq!(field_kind(&column("t", "text")), FieldKind::Text);
    }

    #[test]
    fn shape_text_accepts_valid_utf8() {
        let out = shape_text("hello".as_bytes(), encoding_rs::UTF_8);
        assert_eq!(out.as_deref(), Some("hello"));
    }

    #[test]
    fn shape_text_falls_back_to_windows_1252_for_invalid_utf8() {
        let latin1_e_acute = [0xE9u8]; // é in Windows-1252, invalid standalone UTF-8
        let out = shape_text(&latin1_e_acute, encoding_rs::UTF_8);
        assert!(out.is_some());
    }

    #[test]
    fn table_kind_base_table_is_constructible() {
        let _ = TableKind::BaseTable;
    }
}
