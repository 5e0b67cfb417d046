// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::Config;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込む
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        content
            .parse::<Config>()
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<Config> {
        let path = Path::new(Config::DEFAULT_CONFIG_PATH);
        Self::from_file(path)
    }

    /// 設定を読み込む（ファイルは省略可能）
    ///
    /// 明示的に指定されたファイルは存在しなければエラーです。
    /// 指定がない場合はベースディレクトリのデフォルトファイルを探し、なければ空の設定を返します。
    pub fn load(explicit: Option<&Path>, base_dir: &Path) -> Result<Config> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {:?}", path));
            }
            return Self::from_file(path);
        }

        let default_path = base_dir.join(Config::DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "database: shop.db\ntimeout: 3\n").unwrap();

        let config = ConfigLoader::from_file(&path).unwrap();
        assert_eq!(config.database.as_deref(), Some("shop.db"));
        assert_eq!(config.timeout, Some(3));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "tables: [unclosed\n").unwrap();

        let err = ConfigLoader::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_without_any_file() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_default_file_in_base_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(Config::DEFAULT_CONFIG_PATH),
            "database: app.db\ntables:\n  exclude: [logs]\n",
        )
        .unwrap();

        let config = ConfigLoader::load(None, dir.path()).unwrap();
        assert_eq!(config.tables.exclude, vec!["logs"]);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");

        let err = ConfigLoader::load(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
