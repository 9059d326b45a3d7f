//! SQLite row access
//!
//! SQLite values are dynamically typed, so decoding follows the storage class
//! of each value rather than the declared column type.

use orgair_domain::{StoreRow, StoreValue};
use orgair_errors::{OrgAirError, OrgAirResult};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};

pub async fn fetch_one(
    pool: &SqlitePool,
    query: &str,
    params: &[StoreValue],
) -> OrgAirResult<Option<StoreRow>> {
    let row = bind(sqlx::query(query), params)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(decode_row).transpose()
}

pub async fn fetch_many(
    pool: &SqlitePool,
    query: &str,
    params: &[StoreValue],
) -> OrgAirResult<Vec<StoreRow>> {
    let rows = bind(sqlx::query(query), params).fetch_all(pool).await?;
    rows.iter().map(decode_row).collect()
}

fn bind<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[StoreValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            StoreValue::Null => query.bind(None::<String>),
            StoreValue::Bool(value) => query.bind(*value),
            StoreValue::Integer(value) => query.bind(*value),
            StoreValue::Float(value) => query.bind(*value),
            StoreValue::Text(value) => query.bind(value.clone()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> OrgAirResult<StoreRow> {
    let mut decoded = StoreRow::new();

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            decoded.push(column.name(), StoreValue::Null);
            continue;
        }

        let type_name = raw.type_info().name().to_string();
        let value = match type_name.as_str() {
            "TEXT" => StoreValue::Text(row.try_get(index)?),
            "INTEGER" => StoreValue::Integer(row.try_get(index)?),
            "REAL" => StoreValue::Float(row.try_get(index)?),
            "BOOLEAN" => StoreValue::Bool(row.try_get(index)?),
            other => {
                return Err(OrgAirError::StoreQuery(format!(
                    "不支持的列类型 {other} (列 {})",
                    column.name()
                )))
            }
        };
        decoded.push(column.name(), value);
    }

    Ok(decoded)
}
