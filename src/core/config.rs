// 設定ファイル管理
//
// スキャフォールド対象のデータベースとテーブル選択の設定（YAML形式）を扱います。
// ファイルI/Oは services::config_loader に集約しています。

use crate::core::naming::SQLITE_SCHEME;
use crate::core::table_selection::TableSelectionSet;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// プロジェクト設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// データベースファイルのパス、または `sqlite:` から始まる接続文字列
    #[serde(default)]
    pub database: Option<String>,

    /// ビジータイムアウト（秒）
    #[serde(default)]
    pub timeout: Option<u64>,

    /// テーブル選択
    #[serde(default)]
    pub tables: TableSelectionConfig,
}

/// テーブル選択設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSelectionConfig {
    /// 対象テーブル（空の場合は全テーブル）
    #[serde(default)]
    pub include: Vec<String>,

    /// 除外テーブル
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TableSelectionConfig {
    /// テーブル選択セットに変換
    pub fn to_selection_set(&self) -> TableSelectionSet {
        TableSelectionSet::new(self.include.clone(), self.exclude.clone())
    }
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        match self.database.as_deref() {
            None => Err(anyhow!(
                "Database is not specified. Set `database` in the config file or pass --database"
            )),
            Some(db) if db.trim().is_empty() => Err(anyhow!("Database path is empty")),
            Some(_) => Ok(()),
        }
    }

    /// 接続文字列を取得
    pub fn connection_string(&self) -> Result<String> {
        self.validate()?;
        let database = self.database.as_deref().unwrap_or_default();
        Ok(build_connection_string(database))
    }

    /// CLI引数で設定を上書き
    ///
    /// 指定された値のみを上書きし、テーブルリストは空でない場合に置き換えます。
    pub fn merge_overrides(
        mut self,
        database: Option<String>,
        timeout: Option<u64>,
        include: Vec<String>,
        exclude: Vec<String>,
    ) -> Self {
        if database.is_some() {
            self.database = database;
        }
        if timeout.is_some() {
            self.timeout = timeout;
        }
        if !include.is_empty() {
            self.tables.include = include;
        }
        if !exclude.is_empty() {
            self.tables.exclude = exclude;
        }
        self
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// 接続文字列を生成
///
/// `sqlite:` で始まる文字列はそのまま使用し、それ以外はファイルパスとして扱います。
pub fn build_connection_string(database: &str) -> String {
    if database.starts_with(SQLITE_SCHEME) {
        database.to_string()
    } else {
        format!("sqlite://{}", database)
    }
}
