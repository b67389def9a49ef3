//! CLI command definitions and execution
//!
//! Every command loads the configuration once, resolves a profile into an S3
//! client and drives a [`bv_core::ListingClient`] or a bucket listing.

use std::path::PathBuf;
use std::sync::Arc;

use bv_core::{
    Config, ConfigManager, ListingConfig, ProfileManager, RemotePath, parse_remote_path,
};
use bv_s3::S3Client;
use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod browse;
mod buckets;
mod ls;

/// bv - bucketview
///
/// Browse the buckets and folders of S3-compatible object storage,
/// one page at a time.
#[derive(Parser, Debug)]
#[command(name = "bv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Directory containing config.toml
    #[arg(long, global = true, env = "BV_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the buckets of a profile
    Buckets(buckets::BucketsArgs),

    /// List one folder of a bucket
    Ls(ls::LsArgs),

    /// Browse a bucket interactively
    Browse(browse::BrowseArgs),
}

/// State shared by all commands
pub(crate) struct Context {
    config_manager: ConfigManager,
    config: Config,
    formatter: Formatter,
}

impl Context {
    pub(crate) fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Listing parameters for `bucket`, with an optional page size override
    pub(crate) fn listing_config(&self, bucket: &str, page_size: Option<i32>) -> ListingConfig {
        let defaults = &self.config.defaults;
        ListingConfig::new(bucket)
            .with_page_size(page_size.unwrap_or(defaults.page_size))
            .with_fetch_timeout(defaults.fetch_timeout())
    }

    pub(crate) fn fetch_timeout(&self) -> std::time::Duration {
        self.config.defaults.fetch_timeout()
    }

    /// Resolve `profile` and build its S3 client
    ///
    /// Failures are reported through the formatter.
    pub(crate) async fn connect(&self, profile: &str) -> Result<Arc<S3Client>, ExitCode> {
        let profiles = ProfileManager::with_config_manager(self.config_manager.clone());
        let profile = profiles.get(profile).map_err(|e| {
            self.formatter.error(&e.to_string());
            ExitCode::from(&e)
        })?;
        tracing::debug!(profile = %profile.name, endpoint = ?profile.endpoint, "connecting");

        let client = S3Client::new(&profile).await.map_err(|e| {
            self.formatter.error(&format!("Failed to create S3 client: {e}"));
            ExitCode::from(&e)
        })?;

        Ok(Arc::new(client))
    }

    /// Parse a `profile/bucket[/prefix]` argument, requiring a bucket
    pub(crate) fn bucket_path(&self, path: &str) -> Result<RemotePath, ExitCode> {
        let path = parse_remote_path(path).map_err(|e| {
            self.formatter.error(&e.to_string());
            ExitCode::from(&e)
        })?;

        if !path.has_bucket() {
            self.formatter.error(&format!(
                "'{path}' names no bucket. Use format: profile/bucket[/prefix]"
            ));
            return Err(ExitCode::UsageError);
        }

        Ok(path)
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let flags = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let config_manager = match &cli.config_dir {
        Some(dir) => ConfigManager::with_dir(dir),
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                Formatter::new(flags).error(&e.to_string());
                return ExitCode::from(&e);
            }
        },
    };

    let config = match config_manager.load() {
        Ok(config) => config,
        Err(e) => {
            Formatter::new(flags).error(&format!(
                "Failed to load {}: {e}",
                config_manager.config_path().display()
            ));
            return ExitCode::UsageError;
        }
    };

    let ctx = Context {
        formatter: Formatter::new(output_config(flags, &config)),
        config_manager,
        config,
    };

    match cli.command {
        Commands::Buckets(args) => buckets::execute(args, &ctx).await,
        Commands::Ls(args) => ls::execute(args, &ctx).await,
        Commands::Browse(args) => browse::execute(args, &ctx).await,
    }
}

/// Command-line flags layered over the `[defaults]` table
fn output_config(flags: OutputConfig, config: &Config) -> OutputConfig {
    let defaults = &config.defaults;
    OutputConfig {
        json: flags.json || defaults.output == "json",
        no_color: flags.no_color || defaults.color == "never",
        no_progress: flags.no_progress || !defaults.progress,
        quiet: flags.quiet,
    }
}
