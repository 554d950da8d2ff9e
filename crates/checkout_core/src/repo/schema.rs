//! Connection readiness checks shared by SQLite repositories.

use super::{RepoError, RepoResult};
use crate::db::migrations::{current_version, latest_version};
use rusqlite::Connection;

/// Table name plus the columns a repository reads or writes.
pub(crate) struct RequiredTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Fails unless `conn` is fully migrated and exposes every required column.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[RequiredTable],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }

        let present = table_columns(conn, table.name)?;
        for &column in table.columns {
            if !present.iter().any(|name| name == column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: table.name,
                    column,
                });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
