//! hostsync - mirror LDAP computer objects into a Zabbix host group
//!
//! ## Commands
//!
//! - `sync`: create missing hosts and remove stale ones
//! - `plan`: show what `sync` would change, without writing
//! - `check`: verify the Zabbix API and the LDAP bind

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hostsync_core::{init_tracing, ApplyPolicy, SyncEngine, SyncReport, SyncStatus};
use ldap_inventory::LdapDirectory;
use tracing::{info, Level};
use zabbix_rpc::ZabbixClient;

use crate::config::HostsyncConfig;

const EXIT_OK: u8 = 0;
const EXIT_FAILED: u8 = 1;
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "hostsync")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sync LDAP computer objects into a Zabbix host group", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "HOSTSYNC_CONFIG",
        default_value = "hostsync.toml"
    )]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Format of the final report on stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the host group with the directory
    Sync {
        /// Compute the plan but do not create or delete anything
        #[arg(long)]
        dry_run: bool,

        /// Attempt every write even after a failure
        #[arg(long)]
        keep_going: bool,
    },

    /// Show what a sync would change
    Plan,

    /// Check the Zabbix API, the host group, the template and the LDAP bind
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            println!("Error: {:#}", err);
            ExitCode::from(EXIT_FAILED)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = HostsyncConfig::load(&cli.config)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    match cli.command {
        Commands::Sync {
            dry_run,
            keep_going,
        } => cmd_sync(&config, dry_run, keep_going, cli.output).await,
        Commands::Plan => cmd_sync(&config, true, false, cli.output).await,
        Commands::Check => cmd_check(&config).await,
    }
}

async fn cmd_sync(
    config: &HostsyncConfig,
    dry_run: bool,
    keep_going: bool,
    output: OutputFormat,
) -> Result<u8> {
    let mut settings = config.sync.clone();
    if keep_going {
        settings.on_error = ApplyPolicy::ContinueOnError;
    }

    let zabbix =
        ZabbixClient::new(config.zabbix.clone()).context("Failed to create Zabbix client")?;
    let directory =
        LdapDirectory::new(config.ldap.clone()).context("Failed to create LDAP directory")?;

    let print_progress = output == OutputFormat::Text;
    let engine = SyncEngine::new(&directory, &zabbix, settings).on_progress(move |outcome| {
        if print_progress {
            println!("{}", outcome.describe());
        }
    });

    let report = engine.run(dry_run).await?;

    match output {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(exit_status(report.status()))
}

fn print_report(report: &SyncReport) {
    if report.dry_run {
        for name in &report.plan.to_add {
            println!("Would create host '{}'.", name);
        }
        for host in &report.plan.to_remove {
            println!(
                "Would remove host '{}' (ID {}).",
                host.host_name, host.host_id
            );
        }
    }
    if report.plan.is_empty() {
        println!("Nothing to do.");
        return;
    }
    if report.aborted {
        println!(
            "Error: sync aborted after a failed write, {} planned change(s) not attempted",
            report.skipped()
        );
        return;
    }
    println!("{}", report.summary());
}

fn exit_status(status: SyncStatus) -> u8 {
    match status {
        SyncStatus::NothingToDo | SyncStatus::Success => EXIT_OK,
        SyncStatus::Partial => EXIT_PARTIAL,
        SyncStatus::Failed => EXIT_FAILED,
    }
}

async fn cmd_check(config: &HostsyncConfig) -> Result<u8> {
    let zabbix =
        ZabbixClient::new(config.zabbix.clone()).context("Failed to create Zabbix client")?;
    let version = zabbix
        .api_version()
        .await
        .with_context(|| format!("Zabbix API at {} is unreachable", config.zabbix.api_url))?;
    println!("Zabbix API {} at {}", version, config.zabbix.api_url);

    let group_id = zabbix
        .resolve_group_id(&config.sync.group_name)
        .await
        .context("Host group lookup failed")?;
    println!(
        "Host group '{}' has ID {}",
        config.sync.group_name, group_id
    );

    let template_id = zabbix
        .resolve_template_id(&config.sync.template_name)
        .await
        .context("Template lookup failed")?;
    println!(
        "Template '{}' has ID {}",
        config.sync.template_name, template_id
    );

    let directory =
        LdapDirectory::new(config.ldap.clone()).context("Failed to create LDAP directory")?;
    directory
        .check()
        .await
        .with_context(|| format!("LDAP bind to {} failed", config.ldap.url))?;
    println!(
        "LDAP bind as '{}' to {} succeeded",
        config.ldap.bind_dn, config.ldap.url
    );

    Ok(EXIT_OK)
}
