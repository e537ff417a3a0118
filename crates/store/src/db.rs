//! Throwaway in-memory SQLite databases

use rusqlite::types::FromSql;
use rusqlite::Connection;
use tracing::debug;

use crate::Result;

/// An in-memory SQLite connection owned by exactly one test.
///
/// The database exists only as long as this value: there is no file, no
/// migration and nothing shared with other instances. Dropping it discards
/// every table and row.
pub struct EphemeralDatabase {
    conn: Connection,
}

impl EphemeralDatabase {
    /// Open an empty in-memory database with no tables
    pub fn open_empty() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened ephemeral database");
        Ok(Self { conn })
    }

    /// Open an in-memory database and initialize it from literal SQL.
    ///
    /// `schema` runs first as one batch. `seed` runs afterwards, unless it is
    /// blank.
    pub fn create(schema: &str, seed: Option<&str>) -> Result<Self> {
        let db = Self::open_empty()?;
        db.conn.execute_batch(schema)?;

        if let Some(seed) = seed.filter(|s| !s.trim().is_empty()) {
            db.conn.execute_batch(seed)?;
        }

        Ok(db)
    }

    /// Run a single mutating statement and return the affected-row count
    pub fn execute(&self, sql: &str) -> Result<usize> {
        debug!(sql = sql.trim(), "execute");
        let rows = self.conn.execute(sql, [])?;
        Ok(rows)
    }

    /// Run a query that yields one row with one column
    pub fn query_scalar<T: FromSql>(&self, sql: &str) -> Result<T> {
        debug!(sql = sql.trim(), "query_scalar");
        let value = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(value)
    }

    /// Names of the user tables, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Expose the underlying connection for parameterized statements
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    #[test]
    fn test_blank_seed_is_skipped() {
        let db = EphemeralDatabase::create("CREATE TABLE t (x INTEGER);", Some("   \n")).unwrap();
        let count: i64 = db.query_scalar("SELECT COUNT(*) FROM t").unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_malformed_schema_is_database_error() {
        let result = EphemeralDatabase::create("CREATE TABLE (", None);
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn test_constraint_violation_is_database_error() {
        let db = EphemeralDatabase::create("CREATE TABLE t (x INTEGER NOT NULL);", None).unwrap();
        let result = db.execute("INSERT INTO t (x) VALUES (NULL)");
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn test_table_names_ignores_internal_tables() {
        let db = EphemeralDatabase::create(
            "CREATE TABLE b (id INTEGER PRIMARY KEY AUTOINCREMENT);
             CREATE TABLE a (id INTEGER);",
            None,
        )
        .unwrap();
        db.execute("INSERT INTO b DEFAULT VALUES").unwrap();

        assert_eq!(db.table_names().unwrap(), vec!["a", "b"]);
    }
}
