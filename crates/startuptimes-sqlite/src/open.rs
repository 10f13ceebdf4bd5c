use crate::insert::{insert_record, to_record};
use crate::query::{read_schema_versions, table_exists};
use crate::schema::{SchemaVersion, CREATE_PROPS, CREATE_TABLES, SCHEMA_VERSION};
use crate::{Result, StoreConfig, StoreError};
use log::{debug, info};
use rusqlite::Connection;
use startuptimes_core::{LogSink, Notice, NoticeSink};
use std::path::Path;
use std::time::Duration;

pub struct Store {
    pub(crate) conn: Connection,
    sink: Box<dyn NoticeSink>,
}

impl Store {
    /// Open or create the database at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(&StoreConfig::with_path(path.as_ref()))
    }

    pub fn open_with_config(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(&config.path)?;
        apply_pragmas(&conn, config)?;
        debug!("opened {}", config.path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(Duration::ZERO)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        setup_schema(&mut conn)?;
        Ok(Store {
            conn,
            sink: Box::new(LogSink),
        })
    }

    /// Replace the default [`LogSink`].
    pub fn with_sink(mut self, sink: impl NoticeSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn emit(&self, notice: &Notice) {
        self.sink.notice(notice);
    }

    /// Close the handle, reporting any error from the engine. Dropping the
    /// store also closes it.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| StoreError::from(e))
    }
}

fn apply_pragmas(conn: &Connection, config: &StoreConfig) -> Result<()> {
    let mode: String = conn.pragma_update_and_check(
        None,
        "journal_mode",
        config.journal_mode.pragma_value(),
        |r| r.get(0),
    )?;
    debug!("journal_mode={mode}");
    conn.pragma_update(None, "synchronous", config.synchronous.pragma_value())?;
    // rusqlite installs a 5s busy handler on open; a locked file fails at once
    conn.busy_timeout(Duration::ZERO)?;
    // not persisted by SQLite; every connection has to turn it on
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

/// Create the schema on a fresh file, or confirm an existing file carries
/// exactly the expected version record.
fn setup_schema(conn: &mut Connection) -> Result<()> {
    let expected = SchemaVersion::expected();
    if table_exists(conn, "Props")? {
        let found = read_schema_versions(conn)?;
        return match found.as_slice() {
            [only] if *only == expected => {
                debug!("schema version {SCHEMA_VERSION} already present");
                Ok(())
            }
            [] => Err(mismatch("no schemaVersion record".to_string())),
            [other] => Err(mismatch(other.to_string())),
            many => Err(mismatch(format!("{} schemaVersion records", many.len()))),
        };
    }

    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_PROPS)?;
    insert_record(&tx, "Props", &to_record(&expected)?)?;
    tx.execute_batch(CREATE_TABLES)?;
    tx.commit()?;
    info!("created startuptimes schema version {SCHEMA_VERSION}");
    Ok(())
}

fn mismatch(found: String) -> StoreError {
    StoreError::Schema {
        expected: SchemaVersion::expected().to_string(),
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn scalar(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |r| r.get(0)).unwrap()
    }

    fn created_file() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times.db");
        Store::open(&path).unwrap().close().unwrap();
        (dir, path)
    }

    #[test]
    fn fresh_store_has_schema_and_version() {
        let store = Store::open_in_memory().unwrap();
        for table in ["Props", "Device", "Entry", "Checkpoint"] {
            assert!(store.table_exists(table).unwrap(), "{table}");
        }
        assert_eq!(store.schema_version().unwrap(), Some(SchemaVersion::expected()));
        assert_eq!(scalar(store.connection(), "PRAGMA foreign_keys"), 1);
    }

    #[test]
    fn reopening_is_a_no_op() {
        let (_dir, path) = created_file();
        let store = Store::open(&path).unwrap();
        assert_eq!(scalar(store.connection(), "SELECT COUNT(*) FROM Props"), 1);
        assert_eq!(scalar(store.connection(), "PRAGMA foreign_keys"), 1);
    }

    #[test]
    fn no_busy_timeout() {
        let (_dir, path) = created_file();
        let store = Store::open(&path).unwrap();
        assert_eq!(scalar(store.connection(), "PRAGMA busy_timeout"), 0);
    }

    #[test]
    fn wrong_version_is_refused() {
        let (_dir, path) = created_file();
        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE Props SET value = ?1 WHERE id = 1", params!["2.0"])
            .unwrap();
        drop(conn);
        match Store::open(&path).err().unwrap() {
            StoreError::Schema { expected, found } => {
                assert_eq!(expected, "startuptimes/schemaVersion=1.0 (id 1)");
                assert_eq!(found, "startuptimes/schemaVersion=2.0 (id 1)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn version_row_with_other_id_is_refused() {
        let (_dir, path) = created_file();
        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE Props SET id = 7 WHERE id = 1", []).unwrap();
        drop(conn);
        match Store::open(&path).err().unwrap() {
            StoreError::Schema { found, .. } => {
                assert_eq!(found, "startuptimes/schemaVersion=1.0 (id 7)")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_version_row_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(CREATE_PROPS).unwrap();
        drop(conn);
        match Store::open(&path).err().unwrap() {
            StoreError::Schema { found, .. } => assert_eq!(found, "no schemaVersion record"),
            other => panic!("unexpected error: {other}"),
        }
        // the mismatch aborts before any table is created
        let conn = Connection::open(&path).unwrap();
        let entry_tables = scalar(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='Entry'",
        );
        assert_eq!(entry_tables, 0);
    }

    #[test]
    fn journal_mode_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = StoreConfig::with_path(dir.path().join("times.db"));
        cfg.journal_mode = crate::JournalMode::Delete;
        let store = Store::open_with_config(&cfg).unwrap();
        let mode: String = store
            .connection()
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "delete");
    }
}
