use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jira_workflow::config::{AppConfig, DEFAULT_CONFIG_NAME};
use jira_workflow::platform::jira::JiraClient;
use jira_workflow::platform::IssueTracker;
use jira_workflow::runner::WorkflowRunner;
use jira_workflow::workflow::candidates::{fill_source_summary, list_candidates};
use jira_workflow::workflow::report::format_row;
use jira_workflow::workflow::{
    Assignment, DueDatePolicy, MaintenanceType, NewIssueType, Orchestrator, WorkflowRequest,
    WorkflowSettings,
};

#[derive(Parser)]
#[command(name = "jira-workflow", about = "Clone and transform Jira issues through the workflow")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// List issues selected by the workflow JQL
    Issues,
    /// List assignment options
    Teams,
    /// Run the workflow for one issue
    Process(ProcessArgs),
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Source issue key
    key: String,

    /// Issue type of the new issue
    #[arg(long = "type", value_enum)]
    issue_type: IssueTypeArg,

    /// Team to assign; omit for the unassigned backlog
    #[arg(long)]
    team: Option<String>,

    #[arg(long, value_enum, default_value = "maintenance")]
    maintenance: MaintenanceArg,

    /// FY summary issue to link (defaults to the configured one; pass "" to skip)
    #[arg(long)]
    fy_summary: Option<String>,

    /// Manual due date (YYYY-MM-DD); omit to keep the original due date
    #[arg(long)]
    due_date: Option<String>,

    /// Summary to copy into the new issue (defaults to the source issue's summary)
    #[arg(long)]
    summary: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum IssueTypeArg {
    UtilityExtract,
    Fcr,
    Ptr,
    TableUpdate,
}

impl From<IssueTypeArg> for NewIssueType {
    fn from(arg: IssueTypeArg) -> Self {
        match arg {
            IssueTypeArg::UtilityExtract => NewIssueType::UtilityExtract,
            IssueTypeArg::Fcr => NewIssueType::Fcr,
            IssueTypeArg::Ptr => NewIssueType::Ptr,
            IssueTypeArg::TableUpdate => NewIssueType::TableUpdate,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MaintenanceArg {
    Maintenance,
    Enhancement,
    Fallout,
}

impl From<MaintenanceArg> for MaintenanceType {
    fn from(arg: MaintenanceArg) -> Self {
        match arg {
            MaintenanceArg::Maintenance => MaintenanceType::Maintenance,
            MaintenanceArg::Enhancement => MaintenanceType::Enhancement,
            MaintenanceArg::Fallout => MaintenanceType::Fallout,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        // Commands that don't require config
        Command::Init { force } => {
            let path = cli
                .config
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("{DEFAULT_CONFIG_NAME}.toml")));
            AppConfig::write_starter(&path, force)?;
            println!("Wrote {}", path.display());
        }
        command => {
            let config = AppConfig::load(cli.config.as_deref())?;
            tracing::debug!(jira = ?config.jira, "Loaded configuration");

            match command {
                Command::Teams => {
                    println!("Unassigned backlog");
                    for team in &config.workflow.teams {
                        println!(
                            "{}  (assignee: {}, component: {}, team: {})",
                            team.name, team.assignee, team.component, team.team_id
                        );
                    }
                }
                Command::Issues => {
                    let client = JiraClient::new(&config.jira)?;
                    let issues = list_candidates(&client, &config.workflow.jql).await?;
                    println!("Found {} issues.", issues.len());
                    for issue in issues {
                        println!(
                            "{:<12} {:<24} {:<10} {}",
                            issue.key,
                            issue.status,
                            issue.due_date.as_deref().unwrap_or("-"),
                            issue.summary
                        );
                    }
                }
                Command::Process(args) => {
                    let succeeded = process(&config, args).await?;
                    if !succeeded {
                        std::process::exit(1);
                    }
                }
                Command::Init { .. } => {
                    // Already handled above
                }
            }
        }
    }

    Ok(())
}

async fn process(config: &AppConfig, args: ProcessArgs) -> anyhow::Result<bool> {
    let assignment = Assignment::resolve(config, args.team.as_deref())?;
    let due_date_policy = match args.due_date {
        Some(date) => DueDatePolicy::Manual(date),
        None => DueDatePolicy::UseOriginal,
    };
    let fy_summary_issue_key = args
        .fy_summary
        .unwrap_or_else(|| config.workflow.fy_summary_issue.clone());

    let mut request = WorkflowRequest {
        source_issue_key: args.key,
        source_summary: args.summary.unwrap_or_default(),
        new_issue_type: args.issue_type.into(),
        assignment,
        maintenance_type: args.maintenance.into(),
        fy_summary_issue_key: Some(fy_summary_issue_key),
        due_date_policy,
    };
    request.validate()?;

    let client: Arc<dyn IssueTracker> = Arc::new(JiraClient::new(&config.jira)?);
    fill_source_summary(client.as_ref(), &mut request).await?;

    let runner = WorkflowRunner::new(Orchestrator::new(
        client,
        WorkflowSettings::from(config),
    ));
    let mut handle = runner.start(request)?;

    // Live progress goes to stderr; the final table goes to stdout.
    while let Some(row) = handle.rows.recv().await {
        if !args.json {
            eprintln!("{}", format_row(&row, 5, 40));
        }
    }

    let report = handle.finish().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(report.overall_succeeded)
}
