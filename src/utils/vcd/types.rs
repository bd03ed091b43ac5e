//! JSON documents exchanged with the Cloud Director API.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, PowerState};
use crate::utils::extra_config::ExtraConfigEntry;

/// VM status code the platform reports for a powered-on VM.
pub const VM_STATUS_POWERED_ON: i32 = 4;

/// Reply of the OAuth token exchange
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Entry of a list document such as `OrgList`
#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    pub href: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrgList {
    #[serde(default)]
    pub org: Vec<Reference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Org {
    #[serde(default)]
    pub link: Vec<Link>,
}

impl Org {
    /// Link to the VDC called `name`, if the org has one.
    pub fn vdc_link(&self, name: &str) -> Option<&Link> {
        self.link.iter().find(|link| {
            link.name.as_deref() == Some(name)
                && link
                    .media_type
                    .as_deref()
                    .is_some_and(|t| t.starts_with("application/vnd.vmware.vcloud.vdc+"))
        })
    }
}

/// One row of a `type=vm` query in records format
#[derive(Debug, Clone, Deserialize)]
pub struct VmRecord {
    pub name: String,
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResultRecords {
    #[serde(default)]
    pub record: Vec<VmRecord>,
}

/// The parts of a VM document needed for power sequencing
#[derive(Debug, Clone, Deserialize)]
pub struct Vm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<i32>,
}

impl Vm {
    pub fn power_state(&self) -> Result<PowerState, ApiError> {
        match self.status {
            Some(VM_STATUS_POWERED_ON) => Ok(PowerState::Running),
            Some(code) => Ok(PowerState::NotRunning(code)),
            None => Err(ApiError::Decode(format!(
                "VM '{}' reported no status",
                self.name
            ))),
        }
    }
}

/// Human readable name of a VM status code.
pub fn vm_status_label(code: i32) -> &'static str {
    match code {
        -1 => "FAILED_CREATION",
        0 => "UNRESOLVED",
        1 => "RESOLVED",
        2 => "DEPLOYED",
        3 => "SUSPENDED",
        4 => "POWERED_ON",
        5 => "WAITING_FOR_INPUT",
        6 => "UNKNOWN",
        7 => "UNRECOGNIZED",
        8 => "POWERED_OFF",
        9 => "INCONSISTENT_STATE",
        10 => "MIXED",
        _ => "UNRECOGNIZED",
    }
}

/// Error document returned with failed requests and failed tasks
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDocument {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub href: String,
    pub status: String,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorDocument>,
}

/// Where a task stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Succeeded,
    Failed(String),
}

impl Task {
    pub fn state(&self) -> TaskState {
        match self.status.as_str() {
            "success" => TaskState::Succeeded,
            "error" | "aborted" => TaskState::Failed(
                self.error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| format!("task {}", self.status)),
            ),
            // queued, preRunning, running
            _ => TaskState::Pending,
        }
    }
}

/// Set `entry` in a virtual hardware section document.
///
/// An existing item with the same key gets the new value, otherwise the item
/// is appended.
pub fn upsert_extra_config(section: &mut Value, entry: &ExtraConfigEntry) -> Result<(), ApiError> {
    let object = section
        .as_object_mut()
        .ok_or_else(|| ApiError::Decode("virtual hardware section is not an object".into()))?;

    let items = object
        .entry("extraConfig")
        .or_insert_with(|| Value::Array(Vec::new()));
    if items.is_null() {
        *items = Value::Array(Vec::new());
    }
    let items = items
        .as_array_mut()
        .ok_or_else(|| ApiError::Decode("extraConfig is not a list".into()))?;

    let existing = items
        .iter()
        .position(|item| item.get("key").and_then(Value::as_str) == Some(entry.key.as_str()));
    match existing {
        Some(index) => {
            items[index]["value"] = Value::String(entry.value.clone());
        }
        None => items.push(json!({
            "key": entry.key,
            "value": entry.value,
            "required": false,
        })),
    }

    Ok(())
}
