use crate::schema::{SchemaVersion, SCHEMA_NAMESPACE, SCHEMA_VERSION_NAME};
use crate::{Result, Store};
use rusqlite::{params, Connection};
use startuptimes_core::{elapsed_string, render_table, Cell, Column, DeviceId, Row};

/// Summary of every entry recorded for one (iTwinVersion, device) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub model_id: String,
    pub itwin_version: String,
    /// Mean totalTime, seconds.
    pub average_time: f64,
    pub samples: i64,
}

impl ReportRow {
    pub fn to_row(&self) -> Row {
        Row::from([
            ("modelID".to_string(), Cell::from(self.model_id.as_str())),
            ("iTwinVersion".to_string(), Cell::from(self.itwin_version.as_str())),
            ("averageTime".to_string(), Cell::from(self.average_time)),
            ("samples".to_string(), Cell::from(self.samples)),
        ])
    }
}

pub fn report_columns() -> Vec<Column> {
    vec![
        Column::titled("modelID", "Device"),
        Column::new("iTwinVersion"),
        Column::titled("averageTime", "Average Time").with_formatter(elapsed_string),
        Column::titled("samples", "Samples"),
    ]
}

pub fn render_report(rows: &[ReportRow]) -> String {
    let rows: Vec<Row> = rows.iter().map(ReportRow::to_row).collect();
    render_table(&rows, &report_columns())
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let cnt: i64 = conn.query_row(
        "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?",
        [name],
        |r| r.get(0),
    )?;
    Ok(cnt > 0)
}

pub(crate) fn read_schema_versions(conn: &Connection) -> Result<Vec<SchemaVersion>> {
    let mut stmt =
        conn.prepare("SELECT id, namespace, name, value FROM Props WHERE namespace=? AND name=?")?;
    let rows = stmt
        .query_map(params![SCHEMA_NAMESPACE, SCHEMA_VERSION_NAME], |r| {
            Ok(SchemaVersion {
                id: r.get(0)?,
                namespace: r.get(1)?,
                name: r.get(2)?,
                value: r.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Store {
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        table_exists(&self.conn, name)
    }

    pub fn schema_version(&self) -> Result<Option<SchemaVersion>> {
        Ok(read_schema_versions(&self.conn)?.into_iter().next())
    }

    /// One row per distinct (iTwinVersion, device) seen in Entry, ordered by modelID.
    pub fn build_report(&self) -> Result<Vec<ReportRow>> {
        let mut pairs = self.conn.prepare(
            "SELECT DISTINCT Entry.iTwinVersion, Entry.deviceID, Device.modelID
             FROM Entry JOIN Device ON Entry.deviceID = Device.id
             ORDER BY Device.modelID",
        )?;
        let keys = pairs
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, DeviceId>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut times = self
            .conn
            .prepare("SELECT totalTime FROM Entry WHERE iTwinVersion=? AND deviceID=?")?;
        let mut report = Vec::with_capacity(keys.len());
        for (itwin_version, device_id, model_id) in keys {
            let totals = times
                .query_map(params![itwin_version, device_id], |r| r.get::<_, f64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            // non-empty: the pair came from these same rows
            let sum: f64 = totals.iter().sum();
            report.push(ReportRow {
                model_id,
                itwin_version,
                average_time: sum / totals.len() as f64,
                samples: totals.len() as i64,
            });
        }
        Ok(report)
    }

    /// [`build_report`](Self::build_report) rendered as a text table.
    pub fn report_table(&self) -> Result<String> {
        Ok(render_report(&self.build_report()?))
    }
}
