// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "stratum-scaffold";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".stratum-scaffold.yaml";

/// 接続文字列のスキーム
pub const SQLITE_SCHEME: &str = "sqlite:";

/// SQLiteの内部テーブル接頭辞
pub const SQLITE_INTERNAL_PREFIX: &str = "sqlite_";
