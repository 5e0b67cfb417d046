// tablesコマンドハンドラー
//
// テーブル選択の結果（採用・除外）を一覧表示します。
// 除外されたテーブルは抽出中の診断イベントから収集します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::{OutputFormat, SelectionArgs};
use crate::core::diagnostics::{
    DiagnosticSink, FanOutDiagnosticSink, MemoryDiagnosticSink, ScaffoldEvent,
    TracingDiagnosticSink,
};
use crate::services::schema_extractor::SchemaExtractor;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// tablesコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct TablesOutput {
    /// データベース名
    pub database: String,
    /// 採用されたテーブル（発見順）
    pub included: Vec<String>,
    /// 除外されたテーブル（発見順）
    pub excluded: Vec<String>,
}

impl CommandOutput for TablesOutput {
    fn to_text(&self) -> String {
        let mut output = format!(
            "{} {}\n",
            "Database:".bold(),
            self.database.cyan()
        );

        output.push_str(&format!("\nIncluded ({}):\n", self.included.len()));
        for table in &self.included {
            output.push_str(&format!("  {} {}\n", "✓".green(), table));
        }

        if !self.excluded.is_empty() {
            output.push_str(&format!("\nExcluded ({}):\n", self.excluded.len()));
            for table in &self.excluded {
                output.push_str(&format!("  {} {}\n", "-".yellow(), table.dimmed()));
            }
        }

        output
    }
}

/// tablesコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct TablesCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// データベースとテーブル選択
    pub selection: SelectionArgs,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// tablesコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct TablesCommandHandler {}

impl TablesCommandHandler {
    /// 新しいTablesCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// tablesコマンドを実行
    pub async fn execute(&self, command: &TablesCommand) -> Result<String> {
        let context = CommandContext::load(
            command.project_path.clone(),
            command.config_path.as_deref(),
            &command.selection,
        )?;
        let connection_string = context.connection_string()?;

        let memory = Arc::new(MemoryDiagnosticSink::new());
        let sinks: Vec<Arc<dyn DiagnosticSink>> =
            vec![memory.clone(), Arc::new(TracingDiagnosticSink)];
        let extractor = SchemaExtractor::new(Arc::new(FanOutDiagnosticSink::new(sinks)))
            .with_connection_service(context.connection_service());

        let model = extractor
            .extract(&connection_string, &context.selection())
            .await
            .with_context(|| "Failed to read tables")?;

        let output = TablesOutput {
            database: model.database_name.clone(),
            included: model.tables.iter().map(|t| t.name.clone()).collect(),
            excluded: excluded_tables(&memory.events()),
        };

        render_output(&output, &command.format)
    }
}

/// 除外イベントからテーブル名を収集
fn excluded_tables(events: &[ScaffoldEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ScaffoldEvent::TableExcluded { table } => Some(table.clone()),
            _ => None,
        })
        .collect()
}
