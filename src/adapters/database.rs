// データベース接続アダプター
//
// SQLxを使用したSQLite接続の管理を行います。
// カタログ読み取りは1本の読み取り専用接続で行います。

use crate::core::error::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// データベース接続サービス
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {
    /// ビジータイムアウト（秒）
    timeout: Option<u64>,
}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// タイムアウト付きのDatabaseConnectionServiceを作成
    pub fn with_timeout(timeout_secs: Option<u64>) -> Self {
        Self {
            timeout: timeout_secs,
        }
    }

    /// 接続オプションを作成
    ///
    /// # Arguments
    ///
    /// * `connection_string` - `sqlite:` から始まる接続文字列
    ///
    /// # Returns
    ///
    /// 読み取り専用の接続オプション（ファイルは作成しない）
    pub fn connect_options(
        &self,
        connection_string: &str,
    ) -> Result<SqliteConnectOptions, DatabaseError> {
        if connection_string.trim().is_empty() {
            return Err(DatabaseError::Connection {
                message: "Connection string is empty".to_string(),
                cause: "no database specified".to_string(),
            });
        }

        let options = SqliteConnectOptions::from_str(connection_string).map_err(|e| {
            DatabaseError::Connection {
                message: format!("Invalid connection string: {}", connection_string),
                cause: e.to_string(),
            }
        })?;

        let mut options = options.read_only(true).create_if_missing(false);
        if let Some(timeout_secs) = self.timeout {
            options = options.busy_timeout(Duration::from_secs(timeout_secs));
        }

        Ok(options)
    }

    /// 接続を開く
    pub async fn open(&self, connection_string: &str) -> Result<SqliteConnection, DatabaseError> {
        let options = self.connect_options(connection_string)?;

        options
            .connect()
            .await
            .map_err(|e| DatabaseError::Connection {
                message: format!("Failed to open database: {}", connection_string),
                cause: e.to_string(),
            })
    }

    /// 接続を閉じる
    pub async fn close(&self, connection: SqliteConnection) -> Result<(), DatabaseError> {
        connection
            .close()
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Failed to close database connection".to_string(),
                cause: e.to_string(),
            })
    }
}

/// 接続オプションからデータベース名を取得
///
/// ファイル名から拡張子を除いた部分を使用し、取得できない場合はファイル名そのものを返します。
pub fn database_name(options: &SqliteConnectOptions) -> String {
    let filename = options.get_filename();
    database_name_from_path(filename)
}

fn database_name_from_path(path: &Path) -> String {
    match path.file_stem().map(|s| s.to_string_lossy()) {
        Some(stem) if !stem.is_empty() => stem.into_owned(),
        _ => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_service() {
        let service = DatabaseConnectionService::new();
        assert!(format!("{:?}", service).contains("DatabaseConnectionService"));
    }

    #[test]
    fn test_empty_connection_string() {
        let service = DatabaseConnectionService::new();
        let err = service.connect_options("  ").unwrap_err();
        assert!(err.is_connection());
    }

    #[test]
    fn test_connect_options_file() {
        let service = DatabaseConnectionService::with_timeout(Some(5));
        let options = service.connect_options("sqlite:///tmp/shop.db").unwrap();
        assert_eq!(database_name(&options), "shop");
    }

    #[test]
    fn test_database_name_from_path() {
        assert_eq!(database_name_from_path(Path::new("/data/app.sqlite3")), "app");
        assert_eq!(database_name_from_path(Path::new("plain")), "plain");
        assert_eq!(database_name_from_path(Path::new(":memory:")), ":memory:");
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.db");

        let service = DatabaseConnectionService::new();
        let result = service
            .open(&format!("sqlite://{}", path.display()))
            .await;

        assert!(result.unwrap_err().is_connection());
        assert!(!path.exists());
    }
}
