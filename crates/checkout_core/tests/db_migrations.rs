use checkout_core::db::migrations::latest_version;
use checkout_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["customers", "products", "orders", "order_items"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn open_db_enables_foreign_keys() {
    let conn = open_db_in_memory().unwrap();

    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkout.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO products (id, name, price) VALUES ('p1', 'Product 1', 10);",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let products: i64 = second
        .query_row("SELECT COUNT(*) FROM products;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(products, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_non_positive_quantity() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO customers (id, name) VALUES ('c1', 'Customer 1');
         INSERT INTO products (id, name, price) VALUES ('p1', 'Product 1', 10);
         INSERT INTO orders (id, customer_id, total) VALUES ('o1', 'c1', 0);",
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO order_items (order_id, id, name, price, product_id, quantity, position)
             VALUES ('o1', '1', 'Product 1', 10, 'p1', 0, 0);",
            [],
        )
        .unwrap_err();
    assert!(DbError::from(err).is_constraint_violation());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
