//! Command-line interface.
//!
//! - `init`: interactive configuration wizard.
//! - `report`: fetch issues, reconstruct their status history and write the
//!   KPI table.

pub mod init;
pub mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configure Jira, GitHub, report defaults and the work calendar")]
    Init(init::InitArgs),
    #[command(about = "Build the issue KPI report")]
    Report(report::ReportArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Report(args) => report::cmd(args).await,
        }
    }
}
