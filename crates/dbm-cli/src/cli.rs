//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// dbmigrate - versioned SQL migration runner for PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "dbm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override config file path (default: ./dbmigrate.yml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover migration scripts and list them in version order
    Scan(ScanArgs),

    /// Apply migration scripts to the target database
    Run(RunArgs),

    /// Create the target database if it does not exist
    CreateDb(CreateDbArgs),

    /// Drop the target database
    DropDb(DropDbArgs),

    /// Print the tracked schema version
    GetVersion(GetVersionArgs),

    /// Record a schema version without running scripts
    SetVersion(SetVersionArgs),
}

/// Connection identity, either a full connection string or split fields.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Full connection string, key/value (`host=...`) or URL form
    #[arg(long)]
    pub connection_string: Option<String>,

    /// Database server host
    #[arg(short, long)]
    pub server: Option<String>,

    /// Target database name
    #[arg(short, long)]
    pub database: Option<String>,

    /// User name; omit for trusted authentication
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password; omit for trusted authentication
    #[arg(short, long, env = "DBM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Version-tracking strategy selection.
#[derive(Args, Debug, Clone, Default)]
pub struct VersioningArgs {
    /// Disable version tracking; every script is applied unconditionally
    #[arg(long)]
    pub no_versioning: bool,

    /// Settings-table name for the default version manager
    #[arg(long)]
    pub settings_table: Option<String>,

    /// Version seeded when the settings table is created on first run
    #[arg(long, default_value = "1.0")]
    pub default_version: String,

    /// Track the version in a column of an existing caller-owned table
    #[arg(long, requires = "version_column")]
    pub version_table: Option<String>,

    /// Column of --version-table holding the version
    #[arg(long, requires = "version_table")]
    pub version_column: Option<String>,

    /// Treat a missing version table as version 0.0.0.0
    #[arg(long)]
    pub missing_as_zero: bool,
}

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory (or single file) to scan; defaults to the configured
    /// scripts directory
    pub path: Option<String>,

    /// Regex filter on directory names (repeatable)
    #[arg(short, long)]
    pub filter: Vec<String>,

    /// Accepted directory levels, comma-separated (e.g. 0,1)
    #[arg(short, long, value_delimiter = ',')]
    pub levels: Vec<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: ScanOutput,
}

/// Scan output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutput {
    /// Aligned table with version, name, and path
    Table,
    /// Names only
    Name,
    /// Paths only
    Path,
    /// Versions only
    Version,
    /// Version and name
    VersionName,
    /// Version and path
    VersionPath,
    /// JSON array
    Json,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory (or single file) with migration scripts; defaults to the
    /// configured scripts directory
    pub path: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub versioning: VersioningArgs,

    /// Script parameter as Name=Value (repeatable)
    #[arg(short = 'P', long = "param")]
    pub params: Vec<String>,

    /// Regex filter on directory names (repeatable)
    #[arg(short, long)]
    pub filter: Vec<String>,

    /// Accepted directory levels, comma-separated (e.g. 0,1)
    #[arg(short, long, value_delimiter = ',')]
    pub levels: Vec<usize>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<String>,
}

/// Arguments for the create-db command
#[derive(Args, Debug)]
pub struct CreateDbArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub versioning: VersioningArgs,

    /// Database to create; falls back to --database or the DbName parameter
    #[arg(short, long)]
    pub name: Option<String>,

    /// Script parameter as Name=Value (repeatable), e.g. DbCollation=C
    #[arg(short = 'P', long = "param")]
    pub params: Vec<String>,
}

/// Arguments for the drop-db command
#[derive(Args, Debug)]
pub struct DropDbArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Database to drop; falls back to --database or the DbName parameter
    #[arg(short, long)]
    pub name: Option<String>,

    /// Leave other sessions connected instead of terminating them
    #[arg(long)]
    pub keep_connections: bool,

    /// Script parameter as Name=Value (repeatable)
    #[arg(short = 'P', long = "param")]
    pub params: Vec<String>,
}

/// Arguments for the get-version command
#[derive(Args, Debug)]
pub struct GetVersionArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub versioning: VersioningArgs,
}

/// Arguments for the set-version command
#[derive(Args, Debug)]
pub struct SetVersionArgs {
    /// Version to record, e.g. 1.2 or 1.2.3.4
    pub version: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub versioning: VersioningArgs,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
