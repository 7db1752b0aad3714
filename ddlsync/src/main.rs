//! Database definition synchronization tool.
//!
//! This binary reads a JSON configuration, connects to a SQL Server or
//! Oracle database, and writes one file per database object (and optionally
//! per exported table) into the configured directory layout. Files whose
//! content did not change are left untouched.
//!
//! # Security Guarantees
//! - Read-only database operations only
//! - Passwords are never logged
//! - Configuration files can carry an obfuscated password (`ddlsync crypt`)

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ddlsync_core::config::LogConfig;
use ddlsync_core::logging::init_logging;
use ddlsync_core::security::obscure_password;
use ddlsync_core::{Config, Dialect, synchronize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ddlsync")]
#[command(about = "Database definition and data synchronization tool")]
#[command(version)]
#[command(long_about = "
ddlsync - Synchronize database object definitions into files

This tool reconstructs the definitions of tables, views, indexes, triggers,
routines, sequences, synonyms and more from the database catalog and writes
one script per object. Selected tables can also be exported as data fills.

SUPPORTED DATABASES:
- SQL Server (MSSQL)
- Oracle (ORA) [if compiled with --features oracle]

EXAMPLES:
  ddlsync init --dialect mssql --dir /srv/ddlsync
  ddlsync crypt
  ddlsync sync --config /srv/ddlsync/ddlsync.mssql.json
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synchronize objects and fills described by a configuration file
    Sync(SyncArgs),
    /// Write a template configuration file
    Init(InitArgs),
    /// Obfuscate a password for the configuration file
    Crypt(CryptArgs),
}

#[derive(Args)]
struct SyncArgs {
    /// Configuration file path
    #[arg(short, long, env = "DDLSYNC_CONFIG", help = "Path of the JSON configuration file")]
    config: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    /// SQL Server
    Mssql,
    /// Oracle
    Ora,
}

impl From<DialectArg> for Dialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Mssql => Self::Mssql,
            DialectArg::Ora => Self::Oracle,
        }
    }
}

#[derive(Args)]
struct InitArgs {
    /// Dialect of the template
    #[arg(short, long, value_enum, help = "Database dialect of the template")]
    dialect: DialectArg,

    /// Directory for the configuration and default output layout
    #[arg(long, default_value = ".", help = "Directory for the template and output layout")]
    dir: PathBuf,

    /// Overwrite an existing file
    #[arg(long, help = "Overwrite an existing configuration file")]
    force: bool,
}

#[derive(Args)]
struct CryptArgs {
    /// Password to obfuscate; prompted for when omitted
    #[arg(help = "Password to obfuscate (prompted for when omitted)")]
    password: Option<String>,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Sync(args) => run_sync(&args.config, &cli.global).await,
        Command::Init(args) => {
            init_logging(&LogConfig::default(), cli.global.verbose, cli.global.quiet)?;
            write_template(args.dialect.into(), &args.dir, args.force)
        }
        Command::Crypt(args) => crypt(args.password),
    }
}

/// Loads the configuration and runs one synchronization.
async fn run_sync(config_path: &Path, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load configuration \"{}\"", config_path.display()))?;
    init_logging(&config.log, global.verbose, global.quiet)?;

    info!("Starting synchronization");
    info!("Configuration: {}", config_path.display());

    let report = synchronize(&config).await.map_err(|e| {
        error!("Synchronization aborted: {}", e);
        e
    })?;

    let total = report.total();
    info!(
        "✓ Synchronization completed: {} created, {} updated, {} unchanged, {} failed",
        total.insert, total.update, total.no_change, total.error
    );
    Ok(())
}

/// Writes `ddlsync.<dialect>.json` with the default layout under `dir`.
fn write_template(dialect: Dialect, dir: &Path, force: bool) -> anyhow::Result<()> {
    let file_name = format!("ddlsync.{}.json", dialect.as_str().to_lowercase());
    let path = dir.join(file_name);
    if path.exists() && !force {
        bail!(
            "Configuration file \"{}\" already exists (use --force to overwrite)",
            path.display()
        );
    }

    let root = dir.to_string_lossy();
    let text = Config::template(dialect, &root).to_json_pretty()?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory \"{}\"", dir.display()))?;
    std::fs::write(&path, text)
        .with_context(|| format!("Failed to write \"{}\"", path.display()))?;

    info!("✓ Template written to {}", path.display());
    println!("{}", path.display());
    Ok(())
}

/// Prints the obfuscated form of a password.
fn crypt(password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    if password.is_empty() {
        bail!("Password cannot be empty");
    }
    println!("{}", obscure_password(&password)?);
    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    use std::io::{self, Write};

    eprint!("Enter password: ");
    io::stderr()
        .flush()
        .context("Failed to flush stderr before reading password")?;
    let password = rpassword::read_password().context("Failed to read password")?;

    eprint!("Confirm password: ");
    io::stderr()
        .flush()
        .context("Failed to flush stderr before reading password confirmation")?;
    let confirm = rpassword::read_password().context("Failed to read password confirmation")?;

    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}
