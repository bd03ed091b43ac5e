//! Set extraConfig command implementation.
//!
//! Resolves org → vdc → VM, applies every extraConfig entry in the order it
//! was given and, when asked, powers the VM on. The first failure ends the
//! run; entries already applied stay applied.

use crate::utils::config::Config;
use crate::utils::extra_config::ExtraConfig;
use crate::utils::output::{print_info, print_success, print_warning, OutputLevel};
use crate::utils::vcd::types::vm_status_label;
use crate::utils::vcd::{ApiError, DirectorApi, EntityRef, PowerState, VcdClient};

/// Runtime failure of the command. Every variant exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Connection(String),
    #[error("failed to set extraConfig '{key}': {message}")]
    Mutation { key: String, message: String },
    #[error("{0}")]
    Power(String),
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        1
    }

    fn connection(step: &str, err: ApiError) -> Self {
        RunError::Connection(format!("{step}: {err}"))
    }
}

/// Outcome of the power-on step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOutcome {
    AlreadyRunning,
    PoweredOn,
}

/// Implementation of the set extraConfig command.
pub struct SetExtraConfigCommand {
    config: Config,
}

impl SetExtraConfigCommand {
    /// Create a new SetExtraConfigCommand instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Connect to Cloud Director and run the command against it
    pub async fn execute(&self) -> Result<(), RunError> {
        if self.config.insecure {
            print_warning("Certificate verification is disabled", OutputLevel::Verbose);
        }

        let client = VcdClient::connect(&self.config)
            .await
            .map_err(|e| RunError::connection("failed to connect to Cloud Director", e))?;

        self.run(&client).await
    }

    /// Run the command against an already connected API.
    pub async fn run<A: DirectorApi>(&self, api: &A) -> Result<(), RunError> {
        let vm = resolve_vm(api, &self.config).await?;

        let applied = apply_extra_config(api, &vm, &self.config.extra_config).await?;
        print_success(
            &format!("Applied {applied} extraConfig entries to VM '{}'", vm.name),
            OutputLevel::Verbose,
        );

        if self.config.power_on {
            match ensure_powered_on(api, &vm).await? {
                PowerOutcome::AlreadyRunning => print_info(
                    &format!("VM '{}' is already powered on", vm.name),
                    OutputLevel::Verbose,
                ),
                PowerOutcome::PoweredOn => print_success(
                    &format!("VM '{}' powered on", vm.name),
                    OutputLevel::Verbose,
                ),
            }
        }

        Ok(())
    }
}

/// Look up the configured VM through its org and vdc, stopping at the first miss.
pub async fn resolve_vm<A: DirectorApi>(api: &A, config: &Config) -> Result<EntityRef, RunError> {
    let org = api
        .find_org(&config.org)
        .await
        .map_err(|e| RunError::connection("failed to find org", e))?;
    print_info(&format!("Found org '{}'", org.name), OutputLevel::Verbose);

    let vdc = api
        .find_vdc(&org, &config.vdc)
        .await
        .map_err(|e| RunError::connection("failed to find vdc", e))?;
    print_info(&format!("Found vdc '{}'", vdc.name), OutputLevel::Verbose);

    let vm = api
        .find_vm(&vdc, &config.vm)
        .await
        .map_err(|e| RunError::connection("failed to find vm", e))?;
    print_info(
        &format!("Found VM '{}' at {}", vm.name, vm.href),
        OutputLevel::Verbose,
    );

    Ok(vm)
}

/// Apply `entries` one at a time, in order. Returns how many were applied.
///
/// Entries after a failing one are never sent.
pub async fn apply_extra_config<A: DirectorApi>(
    api: &A,
    vm: &EntityRef,
    entries: &ExtraConfig,
) -> Result<usize, RunError> {
    print_info(
        &format!(
            "Applying {} extraConfig entries {entries} to VM '{}'",
            entries.entries().len(),
            vm.name
        ),
        OutputLevel::Verbose,
    );

    let mut applied = 0;
    for entry in entries {
        print_info(
            &format!("Setting extraConfig {entry}"),
            OutputLevel::Verbose,
        );
        api.set_extra_config(vm, entry)
            .await
            .map_err(|e| RunError::Mutation {
                key: entry.key.clone(),
                message: e.to_string(),
            })?;
        applied += 1;
    }
    Ok(applied)
}

/// Power `vm` on unless it already runs, waiting for the power-on task.
pub async fn ensure_powered_on<A: DirectorApi>(
    api: &A,
    vm: &EntityRef,
) -> Result<PowerOutcome, RunError> {
    let state = api
        .power_state(vm)
        .await
        .map_err(|e| RunError::Power(format!("failed to query power state: {e}")))?;

    let code = match state {
        PowerState::Running => return Ok(PowerOutcome::AlreadyRunning),
        PowerState::NotRunning(code) => code,
    };
    print_info(
        &format!(
            "VM '{}' is {}, powering on",
            vm.name,
            vm_status_label(code)
        ),
        OutputLevel::Verbose,
    );

    let task = api
        .power_on(vm)
        .await
        .map_err(|e| RunError::Power(format!("failed to power on VM: {e}")))?;
    api.wait_task(&task)
        .await
        .map_err(|e| RunError::Power(format!("power on task failed: {e}")))?;

    Ok(PowerOutcome::PoweredOn)
}
