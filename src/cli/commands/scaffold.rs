// scaffoldコマンドハンドラー
//
// データベースモデルの抽出と出力を実装します。
// - 設定とCLI引数からの接続文字列・テーブル選択の解決
// - カタログからのモデル抽出
// - テキスト（カラー）/JSON/YAML形式での出力

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::{OutputFormat, SelectionArgs};
use crate::core::diagnostics::TracingDiagnosticSink;
use crate::services::model_dto::{DatabaseDto, TableDto};
use crate::services::schema_extractor::SchemaExtractor;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// scaffoldコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldOutput {
    /// 生成日時（UTC）
    pub generated_at: DateTime<Utc>,
    /// 抽出したデータベースモデル
    pub database: DatabaseDto,
}

impl CommandOutput for ScaffoldOutput {
    fn to_text(&self) -> String {
        format_database(&self.database)
    }
}

/// scaffoldコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ScaffoldCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// データベースとテーブル選択
    pub selection: SelectionArgs,
    /// 出力先ファイル（Noneの場合は標準出力）
    pub output: Option<PathBuf>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// scaffoldコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct ScaffoldCommandHandler {}

impl ScaffoldCommandHandler {
    /// 新しいScaffoldCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// scaffoldコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - scaffoldコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は整形済みのモデル（またはファイル出力のサマリー）
    pub async fn execute(&self, command: &ScaffoldCommand) -> Result<String> {
        let context = CommandContext::load(
            command.project_path.clone(),
            command.config_path.as_deref(),
            &command.selection,
        )?;
        let connection_string = context.connection_string()?;
        debug!(%connection_string, "Executing scaffold command");

        let extractor = SchemaExtractor::new(Arc::new(TracingDiagnosticSink))
            .with_connection_service(context.connection_service());
        let model = extractor
            .extract(&connection_string, &context.selection())
            .await
            .with_context(|| "Failed to extract database model")?;

        let output = ScaffoldOutput {
            generated_at: Utc::now(),
            database: DatabaseDto::from_model(&model),
        };

        let rendered = render_output(&output, &command.format)?;

        match &command.output {
            Some(path) => {
                fs::write(path, &rendered)
                    .with_context(|| format!("Failed to write output file: {:?}", path))?;
                Ok(format!(
                    "{} Wrote {} table(s) from '{}' to {}",
                    "✓".green(),
                    output.database.tables.len(),
                    output.database.name,
                    path.display()
                ))
            }
            None => Ok(rendered),
        }
    }
}

/// データベースDTOをテキスト形式に整形
pub fn format_database(database: &DatabaseDto) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} {} ({} table(s))\n",
        "Database:".bold(),
        database.name.cyan(),
        database.tables.len()
    ));

    for table in &database.tables {
        output.push('\n');
        output.push_str(&format_table(table));
    }

    output
}

fn format_table(table: &TableDto) -> String {
    let mut output = format!("{}\n", table.name.bold());

    for column in &table.columns {
        let marker = match column.primary_key_ordinal {
            Some(ordinal) => format!("PK{}", ordinal).yellow().to_string(),
            None => "   ".to_string(),
        };
        let nullability = if column.nullable { "NULL" } else { "NOT NULL" };
        let mut line = format!(
            "  {} {} {} {}",
            marker,
            column.name,
            column.data_type.dimmed(),
            nullability
        );
        if let Some(default_value) = &column.default_value {
            line.push_str(&format!(" DEFAULT {}", default_value));
        }
        output.push_str(&line);
        output.push('\n');
    }

    if !table.indexes.is_empty() {
        output.push_str("  indexes:\n");
        for index in &table.indexes {
            let unique = if index.unique { " UNIQUE" } else { "" };
            output.push_str(&format!(
                "    {}{} ({})\n",
                index.name,
                unique.green(),
                index.columns.join(", ")
            ));
        }
    }

    if !table.foreign_keys.is_empty() {
        output.push_str("  foreign keys:\n");
        for foreign_key in &table.foreign_keys {
            let principal = foreign_key
                .principal_table
                .as_deref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "?".red().to_string());
            let principal_columns: Vec<&str> = foreign_key
                .principal_columns
                .iter()
                .map(|c| c.as_deref().unwrap_or("?"))
                .collect();
            let mut line = format!(
                "    ({}) -> {}({})",
                foreign_key.columns.join(", "),
                principal,
                principal_columns.join(", ")
            );
            if let Some(on_delete) = &foreign_key.on_delete {
                line.push_str(&format!(" ON DELETE {}", on_delete));
            }
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::model_dto::{ColumnDto, ForeignKeyDto, IndexDto};

    fn sample_database() -> DatabaseDto {
        DatabaseDto {
            name: "shop".to_string(),
            tables: vec![TableDto {
                name: "orders".to_string(),
                columns: vec![
                    ColumnDto {
                        name: "id".to_string(),
                        data_type: "INTEGER".to_string(),
                        ordinal: 0,
                        nullable: false,
                        primary_key_ordinal: Some(1),
                        default_value: None,
                    },
                    ColumnDto {
                        name: "customer_id".to_string(),
                        data_type: "INTEGER".to_string(),
                        ordinal: 1,
                        nullable: true,
                        primary_key_ordinal: None,
                        default_value: Some("0".to_string()),
                    },
                ],
                primary_key: vec!["id".to_string()],
                indexes: vec![IndexDto {
                    name: "ix_orders_customer".to_string(),
                    unique: false,
                    columns: vec!["customer_id".to_string()],
                }],
                foreign_keys: vec![ForeignKeyDto {
                    columns: vec!["customer_id".to_string()],
                    principal_table: None,
                    principal_columns: vec![Some("id".to_string())],
                    on_delete: Some("SET NULL".to_string()),
                }],
            }],
        }
    }

    #[test]
    fn test_format_database_text() {
        colored::control::set_override(false);
        let text = format_database(&sample_database());

        assert!(text.contains("Database: shop (1 table(s))"));
        assert!(text.contains("PK1 id INTEGER NOT NULL"));
        assert!(text.contains("customer_id INTEGER NULL DEFAULT 0"));
        assert!(text.contains("ix_orders_customer (customer_id)"));
        assert!(text.contains("(customer_id) -> ?(id) ON DELETE SET NULL"));
    }

    #[test]
    fn test_output_envelope_json() {
        let output = ScaffoldOutput {
            generated_at: Utc::now(),
            database: sample_database(),
        };

        let json: serde_json::Value =
            serde_json::from_str(&render_output(&output, &OutputFormat::Json).unwrap()).unwrap();
        assert!(json.get("generated_at").is_some());
        assert_eq!(json["database"]["name"], "shop");
        assert_eq!(json["database"]["tables"][0]["name"], "orders");
    }
}
