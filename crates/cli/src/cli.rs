use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::format::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mdm")]
#[command(about = "Device-management engine over a simulated platform")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format for results
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Grant the simulated caller owner-level rights
	#[arg(long, global = true)]
	pub privileged: bool,

	/// Platform version of the simulated device
	#[arg(long, global = true, value_name = "N", default_value = "34")]
	pub platform_version: u32,

	/// Seed an installed package (repeatable; enables installed-set checks)
	#[arg(long, global = true, value_name = "PKG")]
	pub installed: Vec<String>,

	/// Seed an already-active restriction (repeatable)
	#[arg(long, global = true, value_name = "NAME")]
	pub restricted: Vec<String>,

	/// Completion status the platform reports for sessions (numeric code)
	#[arg(long, global = true, value_name = "CODE")]
	pub install_status: Option<i32>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Report whether the caller holds owner-level rights
	Privilege,

	/// Report the simulated platform version
	SdkVersion,

	/// Install a package file
	Install {
		/// Path to the package file
		path: PathBuf,
	},

	/// Uninstall a package by id
	Uninstall { package: String },

	/// Apply a batch of restriction changes
	Restrict {
		/// Changes as NAME=true or NAME=false
		#[arg(required = true, value_name = "NAME=BOOL")]
		changes: Vec<String>,
	},

	/// Apply the baseline restriction set
	Baseline,

	/// Lock the device immediately
	Lock,

	/// Wipe device data
	Wipe,

	/// Hide an application from the launcher
	Disable { package: String },

	/// Dispatch the elevation prompt
	Elevate {
		/// Explanation shown to the user
		#[arg(long)]
		explanation: String,
	},
}
