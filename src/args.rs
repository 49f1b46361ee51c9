use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dashboard-pdf")]
#[command(about = "Exports dashboards to PDF documents")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture a dashboard and write it as a PDF
    Export(ExportArgs),

    /// Check which element would be captured from a saved page source
    Probe(ProbeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Dashboard snapshot JSON (as returned by the dashboards REST API)
    pub snapshot: PathBuf,

    /// Full URL of the dashboard page
    #[arg(short, long)]
    pub url: Option<String>,

    /// Organization URL, used with --project to build the dashboard URL
    #[arg(long)]
    pub organization_url: Option<String>,

    /// Project name shown in the document header
    #[arg(short, long)]
    pub project: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the PDF is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Leave the header out of metadata-only documents
    #[arg(long)]
    pub no_header: bool,

    /// Leave the widget listing out of metadata-only documents
    #[arg(long)]
    pub no_widgets: bool,

    /// Maximum time to wait for loading indicators, in milliseconds
    #[arg(long)]
    pub max_wait: Option<u64>,

    /// Skip the browser and export metadata only
    #[arg(long, conflicts_with = "require_visual")]
    pub metadata_only: bool,

    /// Fail when no browser page can be captured instead of degrading
    #[arg(long)]
    pub require_visual: bool,
}

#[derive(clap::Args, Debug)]
pub struct ProbeArgs {
    /// Saved HTML page source
    pub page: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
