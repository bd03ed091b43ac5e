#![allow(dead_code)] // Test utilities - some functions may not be used in all tests

use std::cell::RefCell;
use std::process::Command;

use vcd_extraconfig::cli::Cli;
use vcd_extraconfig::utils::config::Config;
use vcd_extraconfig::utils::extra_config::ExtraConfigEntry;
use vcd_extraconfig::utils::vcd::{ApiError, DirectorApi, EntityRef, PowerState, TaskRef};

pub mod stub_server;

/// Environment variables the CLI falls back to
pub const VCD_ENV: &[&str] = &["VCD_URL", "VCD_USER", "VCD_TOKEN"];

#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Execute the compiled binary with `args` and the given extra environment.
pub fn run_cli(args: &[&str], envs: &[(&str, &str)]) -> TestResult {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vcd-extraconfig"));
    cmd.args(args);
    for name in VCD_ENV {
        cmd.env_remove(name);
    }
    cmd.envs(envs.iter().copied());

    let output = cmd.output().expect("Failed to execute command");

    TestResult {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    }
}

/// Remove the fallback variables from this process
pub fn clear_vcd_env() {
    for name in VCD_ENV {
        std::env::remove_var(name);
    }
}

/// Parse `args` the way the binary does and assemble the configuration
pub fn config_from(args: &[&str]) -> Config {
    let mut argv = vec!["vcd-extraconfig"];
    argv.extend_from_slice(args);
    let (cli, presence) = Cli::try_parse_with_presence(argv).expect("arguments should parse");
    Config::assemble(cli, &presence).expect("configuration should be complete")
}

/// A call received by [`RecordingDirector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindOrg(String),
    FindVdc(String),
    FindVm(String),
    SetExtraConfig(String, String),
    PowerState,
    PowerOn,
    WaitTask(String),
}

/// In-memory platform that records every call and fails where told to.
pub struct RecordingDirector {
    calls: RefCell<Vec<Call>>,
    missing_org: bool,
    missing_vm: bool,
    /// 1-based index of the extraConfig call that fails
    fail_mutation_at: Option<usize>,
    power_state: PowerState,
    power_task_fails: bool,
}

impl RecordingDirector {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            missing_org: false,
            missing_vm: false,
            fail_mutation_at: None,
            power_state: PowerState::NotRunning(8),
            power_task_fails: false,
        }
    }

    pub fn with_missing_org(mut self) -> Self {
        self.missing_org = true;
        self
    }

    pub fn with_missing_vm(mut self) -> Self {
        self.missing_vm = true;
        self
    }

    pub fn with_mutation_failure_at(mut self, index: usize) -> Self {
        self.fail_mutation_at = Some(index);
        self
    }

    pub fn with_power_state(mut self, state: PowerState) -> Self {
        self.power_state = state;
        self
    }

    pub fn with_failing_power_task(mut self) -> Self {
        self.power_task_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<(String, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::SetExtraConfig(key, value) => Some((key.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == wanted).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Default for RecordingDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectorApi for RecordingDirector {
    async fn find_org(&self, name: &str) -> Result<EntityRef, ApiError> {
        self.record(Call::FindOrg(name.to_string()));
        if self.missing_org {
            return Err(ApiError::NotFound {
                kind: "org",
                name: name.to_string(),
            });
        }
        Ok(EntityRef::new(name, format!("https://vcd.test/api/org/{name}")))
    }

    async fn find_vdc(&self, org: &EntityRef, name: &str) -> Result<EntityRef, ApiError> {
        self.record(Call::FindVdc(name.to_string()));
        Ok(EntityRef::new(name, format!("{}/vdc/{name}", org.href)))
    }

    async fn find_vm(&self, vdc: &EntityRef, name: &str) -> Result<EntityRef, ApiError> {
        self.record(Call::FindVm(name.to_string()));
        if self.missing_vm {
            return Err(ApiError::NotFound {
                kind: "vm",
                name: name.to_string(),
            });
        }
        Ok(EntityRef::new(name, format!("{}/vm/{name}", vdc.href)))
    }

    async fn set_extra_config(
        &self,
        _vm: &EntityRef,
        entry: &ExtraConfigEntry,
    ) -> Result<(), ApiError> {
        self.record(Call::SetExtraConfig(
            entry.key.clone(),
            entry.value.clone(),
        ));
        if Some(self.mutations().len()) == self.fail_mutation_at {
            return Err(ApiError::TaskFailed {
                href: "https://vcd.test/api/task/mutation".to_string(),
                status: "error".to_string(),
                message: "extraConfig rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn power_state(&self, _vm: &EntityRef) -> Result<PowerState, ApiError> {
        self.record(Call::PowerState);
        Ok(self.power_state)
    }

    async fn power_on(&self, vm: &EntityRef) -> Result<TaskRef, ApiError> {
        self.record(Call::PowerOn);
        Ok(TaskRef {
            href: format!("{}/task/power-on", vm.href),
            operation: Some(format!("Powering on {}", vm.name)),
        })
    }

    async fn wait_task(&self, task: &TaskRef) -> Result<(), ApiError> {
        self.record(Call::WaitTask(task.href.clone()));
        if self.power_task_fails {
            return Err(ApiError::TaskFailed {
                href: task.href.clone(),
                status: "error".to_string(),
                message: "insufficient resources".to_string(),
            });
        }
        Ok(())
    }
}
