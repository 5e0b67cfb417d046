// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
    /// Structured YAML output
    Yaml,
}

/// Stratum Scaffold - Reverse-engineer SQLite schemas
///
/// Reads the system catalog of an existing SQLite database and rebuilds
/// its structure (tables, columns, indexes, foreign keys) as a model.
#[derive(Parser, Debug)]
#[command(name = "stratum-scaffold")]
#[command(author = "Stratum Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reverse-engineer the schema of an existing SQLite database")]
#[command(long_about = "Stratum Scaffold - Reverse-engineer SQLite schemas

Reads the system catalog of an existing SQLite database and rebuilds
its structure as a model suitable for code generation.

Stratum Scaffold helps you:
  • Inspect tables, columns, primary keys and defaults
  • Recover indexes and foreign keys with their referential actions
  • Limit the extraction to a selection of tables
  • Export the model as JSON or YAML for further tooling")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. List the tables of a database:   stratum-scaffold tables --database app.db
  2. Extract the full model:          stratum-scaffold scaffold --database app.db
  3. Export it as YAML:               stratum-scaffold scaffold --database app.db --format yaml

For detailed help on each command, use: stratum-scaffold <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (trace-level diagnostics)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text, json or yaml)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// データベースとテーブル選択の共通引数
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// SQLite database file or `sqlite:` connection string
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<String>,

    /// Only include these tables (repeatable, comma-separated)
    #[arg(short, long = "table", value_name = "TABLE", value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Exclude these tables (repeatable, comma-separated)
    #[arg(short, long, value_name = "TABLE", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Busy timeout for the catalog connection (in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the database model
    ///
    /// Walks the SQLite catalog and prints the reconstructed tables,
    /// columns, indexes and foreign keys.
    ///
    /// EXAMPLES:
    ///   # Extract every table
    ///   stratum-scaffold scaffold --database app.db
    ///
    ///   # Extract a subset as JSON
    ///   stratum-scaffold scaffold --database app.db --table users,orders --format json
    ///
    ///   # Write YAML to a file
    ///   stratum-scaffold scaffold --format yaml --output schema.yaml
    Scaffold {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List tables admitted and excluded by the selection
    ///
    /// EXAMPLES:
    ///   # List all tables
    ///   stratum-scaffold tables --database app.db
    ///
    ///   # Preview an exclusion
    ///   stratum-scaffold tables --database app.db --exclude audit_log
    Tables {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}
