use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "deckhand",
    version,
    about = "Browse services, deploys and logs of a cloud platform from the terminal."
)]
pub struct CliArgs {
    /// Resource to open (services, deploys, jobs, projects, environments, logs, workspaces)
    #[arg(default_value = "services")]
    pub resource: String,

    /// Service id for deploys and jobs
    #[arg(long)]
    pub service: Option<String>,

    /// Project id to scope environments
    #[arg(long)]
    pub project: Option<String>,

    /// Environment id to scope services
    #[arg(long)]
    pub environment: Option<String>,

    /// Resource id whose logs to show
    #[arg(long)]
    pub id: Option<String>,

    /// Catalog file (YAML or JSON) backing the resource tables
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Workspace id or name to activate before loading
    #[arg(short, long)]
    pub workspace: Option<String>,

    /// Tick interval in milliseconds (spinner and cursor blink)
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Visible table rows
    #[arg(long)]
    pub table_height: Option<usize>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
