use anyhow::{Context, Result};
use clap::Args;

use crate::config::{ConfigError, RunConfig};
use crate::report::assemble_report;
use crate::upstream::ConnectClient;

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Emit the report on a single line.
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

pub fn run(args: &FetchArgs) -> Result<()> {
    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingAuth) => {
            // Downstream consumers look for this exact line on stdout.
            println!("{}", ConfigError::MissingAuth);
            return Err(ConfigError::MissingAuth.into());
        }
        Err(error) => return Err(error.into()),
    };
    tracing::info!(
        auth = ?config.auth.mode(),
        teams = config.team_ids.len(),
        apps = config.app_ids.len(),
        number_of_builds = config.number_of_builds,
        "fetch: start"
    );

    let mut client =
        ConnectClient::connect(&config.auth).context("failed to connect to App Store Connect")?;
    let report = assemble_report(&mut client, &config)?;

    let document = if args.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("failed to serialize report")?;
    println!("{document}");

    tracing::info!(apps = report.len(), "fetch: report written");
    Ok(())
}
