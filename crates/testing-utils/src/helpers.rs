//! SQLite helpers for integration tests

use orgair_domain::StoreValue;
use orgair_infrastructure::{DatabasePool, SqlxStore};
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions};
use sqlx::query::Query;
use sqlx::{Sqlite, SqlitePool};

use crate::builders::SectorFixture;

/// Sector schema in SQLite dialect
pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE dimensions (
        dimension_id INTEGER PRIMARY KEY,
        dimension_code TEXT NOT NULL UNIQUE,
        display_order INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE focus_groups (
        focus_group_id TEXT PRIMARY KEY,
        platform TEXT NOT NULL,
        group_name TEXT NOT NULL,
        group_code TEXT,
        display_order INTEGER NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE focus_group_dimension_weights (
        weight_id INTEGER PRIMARY KEY AUTOINCREMENT,
        focus_group_id TEXT NOT NULL REFERENCES focus_groups (focus_group_id),
        dimension_id INTEGER NOT NULL REFERENCES dimensions (dimension_id),
        weight NUMERIC,
        is_current BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE focus_group_calibrations (
        calibration_id INTEGER PRIMARY KEY AUTOINCREMENT,
        focus_group_id TEXT NOT NULL REFERENCES focus_groups (focus_group_id),
        parameter_name TEXT NOT NULL,
        parameter_value NUMERIC,
        is_current BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
];

/// Single-connection in-memory pool; every connection to `sqlite::memory:`
/// is a separate database, so the one connection must never be recycled.
pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

/// Create the schema and insert the fixtures
pub async fn seed(pool: &SqlitePool, fixtures: &[SectorFixture]) {
    for statement in SQLITE_SCHEMA {
        sqlx::query(statement).execute(pool).await.unwrap();
    }

    let mut dimensions: Vec<&str> = Vec::new();
    for fixture in fixtures {
        for (code, _) in &fixture.weights {
            if !dimensions.contains(&code.as_str()) {
                dimensions.push(code);
            }
        }
    }
    for (index, code) in dimensions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO dimensions (dimension_id, dimension_code, display_order) VALUES ($1, $2, $3)",
        )
        .bind(index as i64 + 1)
        .bind(*code)
        .bind(index as i64 + 1)
        .execute(pool)
        .await
        .unwrap();
    }

    for fixture in fixtures {
        sqlx::query(
            "INSERT INTO focus_groups (focus_group_id, platform, group_name, group_code, display_order, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&fixture.focus_group_id)
        .bind(&fixture.platform)
        .bind(&fixture.group_name)
        .bind(&fixture.group_code)
        .bind(fixture.display_order)
        .bind(fixture.is_active)
        .execute(pool)
        .await
        .unwrap();

        for (code, weight) in &fixture.weights {
            let query = sqlx::query(
                "INSERT INTO focus_group_dimension_weights (focus_group_id, dimension_id, weight) \
                 SELECT $1, dimension_id, $2 FROM dimensions WHERE dimension_code = $3",
            )
            .bind(&fixture.focus_group_id);
            bind_value(query, weight)
                .bind(code)
                .execute(pool)
                .await
                .unwrap();
        }

        for (name, value) in &fixture.calibrations {
            let query = sqlx::query(
                "INSERT INTO focus_group_calibrations (focus_group_id, parameter_name, parameter_value) \
                 VALUES ($1, $2, $3)",
            )
            .bind(&fixture.focus_group_id)
            .bind(name);
            bind_value(query, value).execute(pool).await.unwrap();
        }
    }
}

/// Mark every current weight row of a sector as superseded
pub async fn retire_weights(pool: &SqlitePool, focus_group_id: &str) {
    sqlx::query("UPDATE focus_group_dimension_weights SET is_current = FALSE WHERE focus_group_id = $1")
        .bind(focus_group_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seeded_sqlite_store(fixtures: &[SectorFixture]) -> (SqlxStore, SqlitePool) {
    let pool = memory_pool().await;
    seed(&pool, fixtures).await;
    (SqlxStore::new(DatabasePool::SQLite(pool.clone())), pool)
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q StoreValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        StoreValue::Null => query.bind(None::<String>),
        StoreValue::Bool(value) => query.bind(*value),
        StoreValue::Integer(value) => query.bind(*value),
        StoreValue::Float(value) => query.bind(*value),
        StoreValue::Text(value) => query.bind(value.as_str()),
    }
}
