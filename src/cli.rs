//! Command-line front end driving `IssueTrackerClient`.

use clap::{Args, Parser, Subcommand};
use log::debug;
use std::path::PathBuf;

use crate::bridge::{issue_detail_lines, IssueRow};
use crate::config::{Config, ConfigManager, ConnectionProbe};
use crate::features::FeatureSet;
use crate::forms::FilterType;
use crate::session::{IssueTrackerClient, Results};
use crate::state::OperationState;

#[derive(Parser, Debug)]
#[command(name = "redmine-desk", version, about = "Redmine desk client")]
pub struct Cli {
    /// Redmine base URL, e.g. https://redmine.example.com
    #[arg(long, env = "REDMINE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API key sent in the X-Redmine-API-Key header
    #[arg(long, env = "REDMINE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Which operations are available
    #[arg(long, value_enum, global = true)]
    pub features: Option<FeatureSet>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the server answers and accepts the API key
    TestConnection,
    /// List issues
    Issues(IssuesArgs),
    /// Create an issue, optionally uploading attachments first
    Create(CreateArgs),
    /// Show one issue with attachments, history, watchers, subtasks and relations
    Show { id: u64 },
    /// List projects
    Projects,
    /// List users
    Users,
    /// List issue priorities
    Priorities,
    /// List the issue categories of a project
    Categories {
        #[arg(long)]
        project: String,
    },
    /// List trackers
    Trackers,
    /// Show or change the persisted configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
pub struct IssuesArgs {
    #[arg(long, value_enum)]
    pub filter: Option<FilterType>,
    /// User id for the author/assigned filter ("me" for the key owner)
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub project: String,
    #[arg(long)]
    pub subject: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub tracker: Option<String>,
    /// Files uploaded and attached to the new issue
    #[arg(long = "attach", num_args = 1..)]
    pub attachments: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (API key masked)
    Show,
    /// Update persisted values
    Set(ConfigSetArgs),
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub issue_limit: Option<u32>,
    #[arg(long, value_enum)]
    pub filter: Option<FilterType>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long, value_enum)]
    pub probe: Option<ConnectionProbe>,
    #[arg(long = "default-features", value_enum)]
    pub default_features: Option<FeatureSet>,
}

/// Runs one command to completion. `Err` carries the message to print
/// before exiting with a failure status.
pub async fn execute(cli: Cli) -> Result<(), String> {
    let manager = ConfigManager::new();
    let mut config = manager.as_ref().map(ConfigManager::load).unwrap_or_default();

    if let Command::Config { action } = cli.command {
        return run_config(manager, config, action);
    }

    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = Some(api_key);
    }
    if let Some(features) = cli.features {
        config.features = features;
    }

    let session = IssueTrackerClient::from_config(&config);
    debug!("features={:?} base_url={}", session.features(), config.base_url);

    match cli.command {
        Command::TestConnection => report(session.test_connection().await).map(|_| ()),
        Command::Issues(args) => {
            session.update_filter(|filter| {
                if let Some(filter_type) = args.filter {
                    filter.filter_type = filter_type;
                }
                if let Some(user) = args.user {
                    filter.user_id = user;
                }
                if let Some(status) = args.status {
                    filter.status_id = status;
                }
                if let Some(project) = args.project {
                    filter.project_id = project;
                }
                if let Some(limit) = args.limit {
                    filter.limit = limit;
                }
            });
            report(session.list_issues().await)?;
            print_lines(issue_lines(&session.results()));
            Ok(())
        }
        Command::Create(args) => create(&session, args).await,
        Command::Show { id } => {
            report(session.fetch_issue_detail(id).await)?;
            if let Some(issue) = session.detail() {
                print_lines(issue_detail_lines(&issue));
            }
            session.close_detail();
            Ok(())
        }
        Command::Projects => {
            report(session.list_projects().await)?;
            print_lines(session.results().projects.iter().map(|project| {
                format!(
                    "{}\t{}\t{}",
                    project.id,
                    project.identifier.as_deref().unwrap_or("-"),
                    project.name
                )
            }));
            Ok(())
        }
        Command::Users => {
            report(session.list_users().await)?;
            print_lines(session.results().users.iter().map(|user| {
                format!(
                    "{}\t{}\t{}",
                    user.id,
                    user.login.as_deref().unwrap_or("-"),
                    user.display_name().unwrap_or_default()
                )
            }));
            Ok(())
        }
        Command::Priorities => {
            report(session.list_priorities().await)?;
            print_lines(session.results().priorities.iter().map(|priority| {
                let marker = if priority.is_default.unwrap_or(false) {
                    " (default)"
                } else {
                    ""
                };
                format!("{}\t{}{}", priority.id, priority.name, marker)
            }));
            Ok(())
        }
        Command::Categories { project } => {
            session.update_form(|form| form.project_id = project);
            report(session.list_categories().await)?;
            print_lines(
                session
                    .results()
                    .categories
                    .iter()
                    .map(|category| format!("{}\t{}", category.id, category.name)),
            );
            Ok(())
        }
        Command::Trackers => {
            report(session.list_trackers().await)?;
            print_lines(
                session
                    .results()
                    .trackers
                    .iter()
                    .map(|tracker| format!("{}\t{}", tracker.id, tracker.name)),
            );
            Ok(())
        }
        Command::Config { .. } => Ok(()),
    }
}

async fn create(session: &IssueTrackerClient, args: CreateArgs) -> Result<(), String> {
    if !args.attachments.is_empty() {
        session.select_files(args.attachments);
        report(session.upload_files().await)?;
    }
    session.update_form(|form| {
        form.project_id = args.project;
        form.subject = args.subject;
        form.description = args.description;
        form.assigned_to_id = args.assignee.unwrap_or_default();
        form.priority_id = args.priority.unwrap_or_default();
        form.category_id = args.category.unwrap_or_default();
        form.tracker_id = args.tracker.unwrap_or_default();
    });
    report(session.create_issue().await).map(|_| ())
}

fn run_config(
    manager: Option<ConfigManager>,
    mut config: Config,
    action: ConfigAction,
) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            if let Some(manager) = &manager {
                println!("# {}", manager.path().display());
            }
            let mut shown = config.clone();
            shown.api_key = shown.api_key.as_deref().map(mask_secret);
            let text = serde_json::to_string_pretty(&shown)
                .map_err(|err| format!("Failed to render config: {}", err))?;
            println!("{}", text);
            Ok(())
        }
        ConfigAction::Set(args) => {
            let manager = manager
                .ok_or_else(|| "No configuration directory available on this platform".to_string())?;
            if let Some(base_url) = args.base_url {
                config.base_url = base_url;
            }
            if let Some(api_key) = args.api_key {
                config.api_key = Some(api_key).filter(|key| !key.trim().is_empty());
            }
            if let Some(limit) = args.issue_limit {
                config.issue_limit = limit;
            }
            if let Some(filter) = args.filter {
                config.default_filter = filter;
            }
            if let Some(user) = args.user {
                config.default_user = user;
            }
            if let Some(probe) = args.probe {
                config.connection_probe = probe;
            }
            if let Some(features) = args.default_features {
                config.features = features;
            }
            manager
                .save(&config)
                .map_err(|err| format!("Failed to save config: {}", err))?;
            println!("Configuración guardada en {}", manager.path().display());
            Ok(())
        }
    }
}

/// Prints the settled message of an operation; failures become `Err`.
fn report(state: OperationState) -> Result<OperationState, String> {
    match &state {
        OperationState::Succeeded(notice) => {
            println!("{}", notice.message);
            if let Some(detail) = &notice.detail {
                println!("{}", detail);
            }
            Ok(state)
        }
        OperationState::Failed(error) => Err(error.message.clone()),
        OperationState::Idle | OperationState::Pending => Ok(state),
    }
}

fn issue_lines(results: &Results) -> Vec<String> {
    results
        .issues
        .iter()
        .map(IssueRow::from)
        .map(|row| {
            format!(
                "#{}\t[{}] {}\t{}\t{}\t{}",
                row.id, row.tracker, row.status, row.subject, row.assignee, row.updated
            )
        })
        .collect()
}

fn print_lines<I>(lines: I)
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    for line in lines {
        println!("{}", line);
    }
}

fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("****{}", tail)
}
