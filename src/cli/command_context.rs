// コマンド共通コンテキスト
//
// 設定ファイル読み込みとCLI引数による上書きをCLI層で集約する。

use crate::adapters::database::DatabaseConnectionService;
use crate::cli::SelectionArgs;
use crate::core::config::Config;
use crate::core::table_selection::TableSelectionSet;
use crate::services::config_loader::ConfigLoader;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// 設定を読み込み、CLI引数で上書きしてコンテキストを作成
    ///
    /// 設定ファイルは省略可能です。相対パスのデータベースはプロジェクトルート基準で解決します。
    pub fn load(
        project_path: PathBuf,
        custom_config_path: Option<&Path>,
        selection: &SelectionArgs,
    ) -> Result<Self> {
        let config = ConfigLoader::load(custom_config_path, &project_path)
            .with_context(|| "Failed to load configuration")?
            .merge_overrides(
                selection.database.clone(),
                selection.timeout,
                selection.tables.clone(),
                selection.exclude.clone(),
            );

        Ok(Self {
            project_path,
            config,
        })
    }

    /// 接続文字列
    pub fn connection_string(&self) -> Result<String> {
        let mut config = self.config.clone();
        if let Some(database) = config.database.as_deref() {
            config.database = Some(self.resolve_database_path(database));
        }
        config.connection_string()
    }

    /// テーブル選択セット
    pub fn selection(&self) -> TableSelectionSet {
        self.config.tables.to_selection_set()
    }

    /// 接続サービス
    pub fn connection_service(&self) -> DatabaseConnectionService {
        DatabaseConnectionService::with_timeout(self.config.timeout)
    }

    fn resolve_database_path(&self, database: &str) -> String {
        let path = Path::new(database);
        if database.starts_with(crate::core::naming::SQLITE_SCHEME)
            || database.trim().is_empty()
            || path.is_absolute()
        {
            database.to_string()
        } else {
            self.project_path.join(path).to_string_lossy().into_owned()
        }
    }
}
