use orgair_domain::{StoreAccessPort, StoreValue};
use orgair_infrastructure::{DatabasePool, SqlxStore};
use sqlx::sqlite::SqlitePoolOptions;

async fn seeded_store() -> SqlxStore {
    // 内存数据库每个连接独立，只保留一个长期连接
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE focus_groups (
            focus_group_id TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            group_name TEXT NOT NULL,
            group_code TEXT,
            display_order INTEGER NOT NULL,
            weight_hint REAL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        INSERT INTO focus_groups VALUES
            ('pe_technology', 'pe_org_air', 'Technology', 'TECHNOLOGY', 2, 0.3, TRUE),
            ('pe_healthcare', 'pe_org_air', 'Healthcare', NULL, 1, NULL, TRUE),
            ('pe_retired', 'pe_org_air', 'Retired', 'RETIRED', 3, NULL, FALSE)
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    SqlxStore::new(DatabasePool::SQLite(pool))
}

#[tokio::test]
async fn test_fetch_one_binds_positional_params() {
    let store = seeded_store().await;

    let row = store
        .fetch_one(
            "SELECT focus_group_id, group_name, display_order, weight_hint FROM focus_groups \
             WHERE focus_group_id = $1 AND platform = $2 AND is_active = $3",
            &[
                StoreValue::from("pe_technology"),
                StoreValue::from("pe_org_air"),
                StoreValue::from(true),
            ],
        )
        .await
        .unwrap()
        .unwrap();

    let columns: Vec<&str> = row.columns().collect();
    assert_eq!(
        columns,
        vec!["focus_group_id", "group_name", "display_order", "weight_hint"]
    );
    assert_eq!(
        row.get("group_name"),
        Some(&StoreValue::Text("Technology".to_string()))
    );
    assert_eq!(row.get("display_order"), Some(&StoreValue::Integer(2)));
    assert_eq!(row.get("weight_hint"), Some(&StoreValue::Float(0.3)));
}

#[tokio::test]
async fn test_fetch_one_absent_row() {
    let store = seeded_store().await;

    let row = store
        .fetch_one(
            "SELECT focus_group_id FROM focus_groups WHERE focus_group_id = $1",
            &[StoreValue::from("pe_does_not_exist")],
        )
        .await
        .unwrap();

    assert!(row.is_none());
}

#[tokio::test]
async fn test_fetch_many_preserves_order_and_nulls() {
    let store = seeded_store().await;

    let rows = store
        .fetch_many(
            "SELECT focus_group_id, group_code FROM focus_groups \
             WHERE is_active = TRUE ORDER BY display_order",
            &[],
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].get("focus_group_id").and_then(StoreValue::as_text),
        Some("pe_healthcare")
    );
    assert!(rows[0].get("group_code").unwrap().is_null());
    assert_eq!(
        rows[1].get("focus_group_id").and_then(StoreValue::as_text),
        Some("pe_technology")
    );
}

#[tokio::test]
async fn test_invalid_sql_is_query_error() {
    let store = seeded_store().await;

    let err = store
        .fetch_many("SELECT * FROM missing_table", &[])
        .await
        .unwrap_err();

    assert!(err.is_store_error());
    assert!(!err.is_store_unavailable());
}
