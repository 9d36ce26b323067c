use clap::{Args, Parser, Subcommand};

use super::commands::{
    fetch::FetchArgs, notify::NotifyArgs, poll::PollArgs, schema::SchemaArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "buildwatch",
    version,
    about = "App Store Connect app and build status reporter"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch app and build status and print the report as JSON.
    Fetch(FetchArgs),
    /// Run the fetch stage and print the report with a summary.
    Poll(PollArgs),
    /// Post Slack notifications for builds whose status changed.
    Notify(NotifyArgs),
    /// Print the JSON Schema of the report document.
    Schema(SchemaArgs),
}
