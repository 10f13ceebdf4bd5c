use crate::{Result, Store, StoreError};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::{Map, Value};
use startuptimes_core::{
    CheckpointInput, DeviceId, DeviceInput, DeviceKey, EntryId, EntryInput, Notice, RecordError,
};

/// Field name to value, as written by [`insert_record`].
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Inserted {
        entry_id: EntryId,
        device_id: DeviceId,
        checkpoints: usize,
    },
    /// An entry with the same timestamp already exists for this device.
    Duplicate { device_id: DeviceId },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub checkpoints: usize,
}

impl IngestSummary {
    fn add(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Inserted { checkpoints, .. } => {
                self.inserted += 1;
                self.checkpoints += checkpoints;
            }
            EntryOutcome::Duplicate { .. } => self.duplicates += 1,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckpointRow<'a> {
    #[serde(rename = "entryID")]
    entry_id: EntryId,
    array_index: i64,
    #[serde(flatten)]
    checkpoint: &'a CheckpointInput,
}

fn shape_error(message: String) -> StoreError {
    RecordError::Shape {
        record: "record",
        message,
    }
    .into()
}

pub fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(shape_error(format!("expected an object, got {other}"))),
        Err(e) => Err(shape_error(e.to_string())),
    }
}

/// Strings, numbers and booleans; `null`, arrays and objects are not columns.
fn scalar(value: &Value) -> Option<SqlValue> {
    match value {
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn scalar_columns(record: &Record) -> Vec<&str> {
    record
        .iter()
        .filter(|(_, v)| scalar(v).is_some())
        .map(|(k, _)| k.as_str())
        .collect()
}

fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

fn insert_sql(table: &str, columns: &[&str]) -> Result<String> {
    check_identifier(table)?;
    if columns.is_empty() {
        return Ok(format!("INSERT INTO {table} DEFAULT VALUES"));
    }
    for c in columns {
        check_identifier(c)?;
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    Ok(format!(
        "INSERT INTO {table}({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    ))
}

/// Insert the scalar fields of `record` into `table`, returning the new row id.
pub fn insert_record(conn: &Connection, table: &str, record: &Record) -> Result<i64> {
    let columns = scalar_columns(record);
    let sql = insert_sql(table, &columns)?;
    let values: Vec<SqlValue> = record.values().filter_map(scalar).collect();
    conn.execute(&sql, params_from_iter(values))?;
    Ok(conn.last_insert_rowid())
}

/// Insert `records` with the column set of the first one. A later record
/// lacking one of those columns fails the call.
pub fn insert_records(conn: &Connection, table: &str, records: &[Record]) -> Result<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let columns = scalar_columns(first);
    let sql = insert_sql(table, &columns)?;
    let mut stmt = conn.prepare(&sql)?;
    for record in records {
        let values = columns
            .iter()
            .map(|c| {
                record
                    .get(*c)
                    .and_then(scalar)
                    .ok_or_else(|| RecordError::MissingField {
                        record: table.to_string(),
                        field: c.to_string(),
                    })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        stmt.execute(params_from_iter(values))?;
    }
    Ok(())
}

pub fn find_device(conn: &Connection, key: &DeviceKey) -> Result<Option<DeviceId>> {
    let id = conn
        .query_row(
            "SELECT id FROM Device
             WHERE cpuCores=? AND memory=? AND modelID=? AND systemVersion=?
             ORDER BY id LIMIT 1",
            params![key.cpu_cores, key.memory, key.model_id, key.system_version],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

fn resolve_device(conn: &Connection, device: &DeviceInput) -> Result<(DeviceId, Option<Notice>)> {
    let key = device.key();
    if let Some(id) = find_device(conn, &key)? {
        return Ok((id, None));
    }
    let id = insert_record(conn, "Device", &to_record(device)?)?;
    let notice = Notice::DeviceCreated {
        model_id: key.model_id,
        device_id: id,
    };
    Ok((id, Some(notice)))
}

fn entry_exists(conn: &Connection, timestamp: &str, device_id: DeviceId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM Entry WHERE timestamp=? AND deviceID=?",
            params![timestamp, device_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl Store {
    pub fn insert_record(&mut self, table: &str, record: &Record) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = insert_record(&tx, table, record)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn insert_records(&mut self, table: &str, records: &[Record]) -> Result<()> {
        let tx = self.conn.transaction()?;
        insert_records(&tx, table, records)?;
        tx.commit()?;
        Ok(())
    }

    pub fn find_device(&self, key: &DeviceKey) -> Result<Option<DeviceId>> {
        find_device(&self.conn, key)
    }

    /// Id of the stored device sharing `device`'s identity key, inserting
    /// `device` if there is none.
    pub fn find_or_create_device(&mut self, device: &DeviceInput) -> Result<DeviceId> {
        device.validate()?;
        let tx = self.conn.transaction()?;
        let (id, created) = resolve_device(&tx, device)?;
        tx.commit()?;
        if let Some(n) = created {
            self.emit(&n);
        }
        Ok(id)
    }

    /// Store one entry with its device and checkpoints in a single
    /// transaction. Notices go out after the commit.
    pub fn insert_entry(&mut self, entry: &EntryInput) -> Result<EntryOutcome> {
        entry.validate()?;
        let tx = self.conn.transaction()?;
        let (device_id, created) = resolve_device(&tx, &entry.device)?;
        let mut notices: Vec<Notice> = created.into_iter().collect();

        let outcome = if entry_exists(&tx, &entry.timestamp, device_id)? {
            notices.push(Notice::DuplicateEntry {
                model_id: entry.device.model_id.clone(),
                timestamp: entry.timestamp.clone(),
            });
            EntryOutcome::Duplicate { device_id }
        } else {
            let mut record = to_record(entry)?;
            record.insert("deviceID".to_string(), Value::from(device_id));
            let entry_id = insert_record(&tx, "Entry", &record)?;
            notices.push(Notice::EntryInserted { entry_id });

            let rows = entry
                .checkpoints
                .iter()
                .enumerate()
                .map(|(i, checkpoint)| {
                    to_record(&CheckpointRow {
                        entry_id,
                        array_index: i as i64,
                        checkpoint,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            insert_records(&tx, "Checkpoint", &rows)?;
            notices.push(Notice::CheckpointsInserted { count: rows.len() });
            EntryOutcome::Inserted {
                entry_id,
                device_id,
                checkpoints: rows.len(),
            }
        };

        tx.commit()?;
        for n in &notices {
            self.emit(n);
        }
        Ok(outcome)
    }

    /// Ingest a single entry object or an array of them, in order. Each entry
    /// commits on its own, so an error leaves earlier entries stored.
    pub fn ingest(&mut self, value: &Value) -> Result<IngestSummary> {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        let mut summary = IngestSummary::default();
        for item in items {
            let entry = EntryInput::from_value(item)?;
            summary.add(self.insert_entry(&entry)?);
        }
        Ok(summary)
    }
}
