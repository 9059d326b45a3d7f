//! PostgreSQL row access

use orgair_domain::{StoreRow, StoreValue};
use orgair_errors::{OrgAirError, OrgAirResult};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo, ValueRef};

pub async fn fetch_one(
    pool: &PgPool,
    query: &str,
    params: &[StoreValue],
) -> OrgAirResult<Option<StoreRow>> {
    let row = bind(sqlx::query(query), params)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(decode_row).transpose()
}

pub async fn fetch_many(
    pool: &PgPool,
    query: &str,
    params: &[StoreValue],
) -> OrgAirResult<Vec<StoreRow>> {
    let rows = bind(sqlx::query(query), params).fetch_all(pool).await?;
    rows.iter().map(decode_row).collect()
}

fn bind<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[StoreValue],
) -> Query<'q, Postgres, PgArguments> {
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

fn decode_row(row: &PgRow) -> OrgAirResult<StoreRow> {
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
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => StoreValue::Text(row.try_get(index)?),
            "BOOL" => StoreValue::Bool(row.try_get(index)?),
            "INT2" => StoreValue::Integer(row.try_get::<i16, _>(index)?.into()),
            "INT4" => StoreValue::Integer(row.try_get::<i32, _>(index)?.into()),
            "INT8" => StoreValue::Integer(row.try_get(index)?),
            "FLOAT4" => float4_value(row.try_get(index)?),
            "FLOAT8" => StoreValue::Float(row.try_get(index)?),
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

/// REAL 按 f32 的最短文本拓宽，直接 `into()` 会把 0.15 变成 0.15000000596046448
fn float4_value(value: f32) -> StoreValue {
    StoreValue::Float(value.to_string().parse().unwrap_or_else(|_| value.into()))
}
