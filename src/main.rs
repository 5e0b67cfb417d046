use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use std::env;
use std::path::PathBuf;
use std::process;
use stratum_scaffold::cli::commands::scaffold::{ScaffoldCommand, ScaffoldCommandHandler};
use stratum_scaffold::cli::commands::tables::{TablesCommand, TablesCommandHandler};
use stratum_scaffold::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する
///
/// `--verbose` 指定時はtraceレベル、それ以外は `RUST_LOG`（既定はwarn）に従う。
fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Scaffold { selection, output } => {
            let handler = ScaffoldCommandHandler::new();
            let command = ScaffoldCommand {
                project_path,
                config_path,
                selection,
                output,
                format: cli.format,
            };
            handler.execute(&command).await
        }

        Commands::Tables { selection } => {
            let handler = TablesCommandHandler::new();
            let command = TablesCommand {
                project_path,
                config_path,
                selection,
                format: cli.format,
            };
            handler.execute(&command).await
        }
    }
}
