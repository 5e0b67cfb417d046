// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod scaffold;
pub mod tables;

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;

/// コマンド出力
///
/// 構造化フォーマットではserdeでシリアライズし、テキストでは `to_text` を使います。
pub trait CommandOutput: Serialize {
    /// テキスト形式の出力
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じて出力を整形
pub fn render_output<T: CommandOutput>(output: &T, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output as JSON")
        }
        OutputFormat::Yaml => {
            serde_saphyr::to_string(output).with_context(|| "Failed to serialize output as YAML")
        }
    }
}
