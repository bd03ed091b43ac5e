//! Cloud Director access.
//!
//! [`DirectorApi`] is the seam between the command and the platform: the
//! binary drives it with [`client::VcdClient`], tests with an in-memory
//! implementation.

pub mod client;
pub mod types;

use crate::utils::extra_config::ExtraConfigEntry;

pub use client::VcdClient;

/// Name and location of a remote entity (org, vdc, VM).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub name: String,
    pub href: String,
}

impl EntityRef {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// Handle to an asynchronous platform task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub href: String,
    pub operation: Option<String>,
}

/// Power state as far as power-on sequencing cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Running,
    /// Anything else; carries the platform status code
    NotRunning(i32),
}

/// Errors raised while talking to Cloud Director.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid endpoint '{0}': {1}")]
    Endpoint(String, url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {url} failed with status {status}: {message}")]
    Status {
        method: String,
        url: String,
        status: u16,
        message: String,
    },
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{kind} name '{name}' is ambiguous ({count} matches)")]
    Ambiguous {
        kind: &'static str,
        name: String,
        count: usize,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("task {href} ended with status '{status}': {message}")]
    TaskFailed {
        href: String,
        status: String,
        message: String,
    },
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> ApiError {
        ApiError::Decode(value.to_string())
    }
}

/// Operations the command needs from the platform.
///
/// Every call is awaited to completion before the next one is issued.
#[allow(async_fn_in_trait)]
pub trait DirectorApi {
    async fn find_org(&self, name: &str) -> Result<EntityRef, ApiError>;

    async fn find_vdc(&self, org: &EntityRef, name: &str) -> Result<EntityRef, ApiError>;

    async fn find_vm(&self, vdc: &EntityRef, name: &str) -> Result<EntityRef, ApiError>;

    /// Set one extraConfig key on `vm`, returning once the platform applied it.
    async fn set_extra_config(
        &self,
        vm: &EntityRef,
        entry: &ExtraConfigEntry,
    ) -> Result<(), ApiError>;

    async fn power_state(&self, vm: &EntityRef) -> Result<PowerState, ApiError>;

    async fn power_on(&self, vm: &EntityRef) -> Result<TaskRef, ApiError>;

    /// Block until `task` succeeds or fails. There is no timeout.
    async fn wait_task(&self, task: &TaskRef) -> Result<(), ApiError>;
}
