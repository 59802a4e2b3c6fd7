//! Redmine desk client: the `IssueTrackerClient` component and its
//! command-line front end.

use std::process::ExitCode;

use clap::Parser;

pub mod bridge;
pub mod cli;
pub mod config;
pub mod features;
pub mod forms;
pub mod messages;
pub mod session;
pub mod state;
pub mod uploads;

pub use config::{Config, ConfigManager, ConnectionProbe};
pub use features::FeatureSet;
pub use forms::{Connection, FilterType, IssueFilter, IssueForm};
pub use session::{IssueTrackerClient, Results};
pub use state::{ErrorKind, Notice, Operation, OperationError, OperationState};
pub use uploads::SelectedFile;

/// Entry point of the `redmine-desk` binary.
pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = cli::Cli::parse();
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to start async runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli::execute(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
