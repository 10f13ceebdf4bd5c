//! Typed submission records and the device identity key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type DeviceId = i64;
pub type EntryId = i64;

/// A submitted record that cannot be stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("malformed {record}: {message}")]
    Shape {
        record: &'static str,
        message: String,
    },
    #[error("{record} is missing field `{field}`")]
    MissingField {
        record: String,
        field: String,
    },
    #[error("device {model_id}: cpuCores must be at least 1, got {value}")]
    CpuCores {
        model_id: String,
        value: i64,
    },
    #[error("device {model_id}: memory must not be negative, got {value}")]
    Memory {
        model_id: String,
        value: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInput {
    pub cpu_cores: i64,
    /// Bytes.
    pub memory: i64,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(rename = "modelID")]
    pub model_id: String,
    #[serde(rename = "modelIDRefURL")]
    pub model_id_ref_url: String,
    pub system_name: String,
    pub system_version: String,
}

/// The fields that decide whether two submitted devices are the same row.
///
/// Everything else on [`DeviceInput`] is descriptive: the first submission for
/// a key is stored and later submissions of the same key do not update it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub cpu_cores: i64,
    pub memory: i64,
    pub model_id: String,
    pub system_version: String,
}

impl DeviceInput {
    pub fn key(&self) -> DeviceKey {
        DeviceKey::from(self)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.cpu_cores < 1 {
            return Err(RecordError::CpuCores {
                model_id: self.model_id.clone(),
                value: self.cpu_cores,
            });
        }
        if self.memory < 0 {
            return Err(RecordError::Memory {
                model_id: self.model_id.clone(),
                value: self.memory,
            });
        }
        Ok(())
    }
}

impl From<&DeviceInput> for DeviceKey {
    fn from(d: &DeviceInput) -> Self {
        DeviceKey {
            cpu_cores: d.cpu_cores,
            memory: d.memory,
            model_id: d.model_id.clone(),
            system_version: d.system_version.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointInput {
    pub action: String,
    pub timestamp: String,
    /// Seconds since the previous checkpoint.
    pub step: f64,
    /// Seconds since start.
    pub total: f64,
}

/// One startup run as submitted, with its device and checkpoints embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    pub device: DeviceInput,
    #[serde(rename = "iTwinVersion")]
    pub itwin_version: String,
    pub title: String,
    pub timestamp: String,
    /// Seconds.
    pub total_time: f64,
    pub using_remote_server: bool,
    pub checkpoints: Vec<CheckpointInput>,
}

impl EntryInput {
    /// Decode and validate one submitted entry object.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let entry = EntryInput::deserialize(value).map_err(|e| RecordError::Shape {
            record: "entry",
            message: e.to_string(),
        })?;
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        self.device.validate()
    }
}
