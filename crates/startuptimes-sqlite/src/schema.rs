use serde::Serialize;
use std::fmt;

pub const SCHEMA_NAMESPACE: &str = "startuptimes";
pub const SCHEMA_VERSION_NAME: &str = "schemaVersion";
pub const SCHEMA_VERSION: &str = "1.0";

/// The Props row asserting which layout the file uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaVersion {
    pub id: i64,
    pub namespace: String,
    pub name: String,
    pub value: String,
}

impl SchemaVersion {
    /// The record this build writes and expects; `id` is pinned so a stored
    /// row can be compared field for field.
    pub fn expected() -> Self {
        SchemaVersion {
            id: 1,
            namespace: SCHEMA_NAMESPACE.to_string(),
            name: SCHEMA_VERSION_NAME.to_string(),
            value: SCHEMA_VERSION.to_string(),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}={} (id {})", self.namespace, self.name, self.value, self.id)
    }
}

pub const CREATE_PROPS: &str = r#"
CREATE TABLE Props (
  id              INTEGER PRIMARY KEY,
  namespace       TEXT NOT NULL,
  name            TEXT NOT NULL,
  value           TEXT NOT NULL
);

CREATE UNIQUE INDEX Props_namespace ON Props(namespace);
CREATE UNIQUE INDEX Props_lookup ON Props(namespace, name);
"#;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE Device (
  id              INTEGER PRIMARY KEY,
  cpuCores        INTEGER NOT NULL,
  memory          INTEGER NOT NULL,
  model           TEXT,
  modelID         TEXT NOT NULL,
  modelIDRefURL   TEXT NOT NULL,
  systemName      TEXT NOT NULL,
  systemVersion   TEXT NOT NULL
);

CREATE TABLE Entry (
  id                INTEGER PRIMARY KEY,
  iTwinVersion      TEXT NOT NULL,
  title             TEXT NOT NULL,
  timestamp         TEXT NOT NULL,
  totalTime         REAL NOT NULL,
  usingRemoteServer INTEGER NOT NULL,
  deviceID          INTEGER NOT NULL REFERENCES Device(id)
);

CREATE TABLE Checkpoint (
  id              INTEGER PRIMARY KEY,
  entryID         INTEGER NOT NULL REFERENCES Entry(id) ON DELETE CASCADE,
  arrayIndex      INTEGER NOT NULL,
  action          TEXT NOT NULL,
  timestamp       TEXT NOT NULL,
  step            REAL NOT NULL,
  total           REAL NOT NULL
);

CREATE INDEX Entry_timestamp ON Entry(timestamp);
CREATE INDEX Checkpoint_arrayIndex ON Checkpoint(arrayIndex);
CREATE INDEX Device_modelID ON Device(modelID);
"#;
