mod device;
mod info;
mod install;
mod restrict;
mod uninstall;

use std::sync::Arc;

use mdm::DeviceEngine;
use mdm_protocol::{BridgeRequest, InstallStatus};
use mdm_runtime::fake::FakePlatform;
use mdm_runtime::OwnerState;
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::result_builder::{print_result, ResultBuilder};

/// Executes the parsed command against a simulated device built from the
/// global flags, printing exactly one result envelope.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	let platform = build_platform(&cli);
	let engine = Arc::new(DeviceEngine::new(Arc::clone(&platform)));
	let pump = Arc::clone(&engine);
	tokio::spawn(async move { pump.run().await });

	let command = command_name(&cli.command);
	if let Some(request) = bridge_request(&cli.command) {
		debug!(target: "mdm", method = request.method(), "bridge request");
	}
	let builder: ResultBuilder<Value> = ResultBuilder::new(command);

	let outcome = match cli.command {
		Commands::Privilege => info::privilege(&engine),
		Commands::SdkVersion => info::sdk_version(&engine),
		Commands::Install { path } => install::execute(&engine, &path).await,
		Commands::Uninstall { package } => uninstall::execute(&engine, &package).await,
		Commands::Restrict { changes } => restrict::execute(&engine, &changes),
		Commands::Baseline => restrict::baseline(&engine),
		Commands::Lock => device::lock(&engine),
		Commands::Wipe => device::wipe(&engine),
		Commands::Disable { package } => device::disable(&engine, &package),
		Commands::Elevate { explanation } => device::elevate(&engine, &explanation),
	};

	match outcome {
		Ok(data) => {
			print_result(&builder.data(data).build(), cli.format);
			Ok(())
		}
		Err(err) => {
			let message = err.to_string();
			print_result(&builder.error(err.code(), &message).build(), cli.format);
			Err(anyhow::anyhow!("{command}: {message}"))
		}
	}
}

/// The bridge-surface request a CLI command stands in for. `baseline` is
/// CLI-only convenience with no bridge equivalent.
fn bridge_request(command: &Commands) -> Option<BridgeRequest> {
	match command {
		Commands::Privilege => Some(BridgeRequest::GetPrivilegeLevel),
		Commands::SdkVersion => Some(BridgeRequest::GetPlatformVersion),
		Commands::Install { path } => Some(BridgeRequest::InstallPackage {
			path: path.display().to_string(),
		}),
		Commands::Uninstall { package } => Some(BridgeRequest::UninstallPackage {
			package_id: package.clone(),
		}),
		Commands::Restrict { changes } => Some(BridgeRequest::ApplyRestrictions {
			restrictions: changes
				.iter()
				.filter_map(|raw| {
					let (name, value) = raw.split_once('=')?;
					Some((name.to_string(), value == "true"))
				})
				.collect(),
		}),
		Commands::Baseline => None,
		Commands::Lock => Some(BridgeRequest::LockDevice),
		Commands::Wipe => Some(BridgeRequest::WipeData),
		Commands::Disable { package } => Some(BridgeRequest::DisableApp {
			package_id: package.clone(),
		}),
		Commands::Elevate { explanation } => Some(BridgeRequest::RequestElevation {
			explanation: explanation.clone(),
		}),
	}
}

fn command_name(command: &Commands) -> &'static str {
	match command {
		Commands::Privilege => "privilege",
		Commands::SdkVersion => "sdk-version",
		Commands::Install { .. } => "install",
		Commands::Uninstall { .. } => "uninstall",
		Commands::Restrict { .. } => "restrict",
		Commands::Baseline => "baseline",
		Commands::Lock => "lock",
		Commands::Wipe => "wipe",
		Commands::Disable { .. } => "disable",
		Commands::Elevate { .. } => "elevate",
	}
}

fn build_platform(cli: &Cli) -> Arc<FakePlatform> {
	let owner = if cli.privileged {
		OwnerState::Owner
	} else {
		OwnerState::NotOwner
	};
	let platform = FakePlatform::new(owner, cli.platform_version);
	for package in &cli.installed {
		platform.seed_installed(package);
	}
	for name in &cli.restricted {
		platform.seed_restriction(name);
	}
	if let Some(code) = cli.install_status {
		platform.script_completion(InstallStatus::from_code(code));
	}
	platform
}

pub(crate) type CommandOutcome = Result<Value, CliError>;
