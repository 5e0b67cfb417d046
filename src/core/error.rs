// エラー型定義
//
// スキーマ抽出とコマンド構築で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、DatabaseError と ParameterError を定義します。

use thiserror::Error;

/// データベースエラー
///
/// カタログ読み取り時に発生する致命的なエラーを表現します。
/// いずれのバリアントも抽出処理を中断させます。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// 依存側カラムがカタログから取得したカラム一覧に存在しない
    #[error("Column '{column}' referenced by the catalog does not exist in table '{table}'")]
    MissingColumn {
        /// テーブル名
        table: String,
        /// カラム名
        column: String,
    },
}

impl DatabaseError {
    /// sqlxのエラーからクエリエラーを作成
    pub fn query(sql: &str, cause: sqlx::Error) -> Self {
        DatabaseError::Query {
            message: cause.to_string(),
            sql: Some(sql.to_string()),
        }
    }

    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }

    /// カラム欠落エラーかどうか
    pub fn is_missing_column(&self) -> bool {
        matches!(self, DatabaseError::MissingColumn { .. })
    }

    /// 失敗したSQLを取得
    pub fn sql(&self) -> Option<&str> {
        match self {
            DatabaseError::Query { sql, .. } => sql.as_deref(),
            _ => None,
        }
    }
}

/// パラメータエラー
///
/// パラメータリストの構築と値のバインド時に発生するエラーを表現します。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// Invalid argument (empty name)
    #[error("The argument '{argument}' cannot be empty")]
    InvalidArgument {
        /// 引数名
        argument: &'static str,
    },

    /// No value supplied for a parameter
    #[error("No value was supplied for parameter '{name}'")]
    MissingValue {
        /// パラメータの不変名
        name: String,
    },

    /// Value conversion error
    #[error("Cannot convert value for parameter '{name}' to {store_type}: {message}")]
    Conversion {
        /// パラメータの不変名
        name: String,
        /// 変換先のストア型
        store_type: String,
        /// エラーメッセージ
        message: String,
    },

    /// Format placeholder out of range
    #[error("Placeholder {{{index}}} is out of range ({count} values supplied)")]
    FormatIndex {
        /// プレースホルダー番号
        index: usize,
        /// 渡された値の数
        count: usize,
    },
}

impl ParameterError {
    /// 引数不正エラーかどうか
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ParameterError::InvalidArgument { .. })
    }

    /// 値欠落エラーかどうか
    pub fn is_missing_value(&self) -> bool {
        matches!(self, ParameterError::MissingValue { .. })
    }

    /// 変換エラーかどうか
    pub fn is_conversion(&self) -> bool {
        matches!(self, ParameterError::Conversion { .. })
    }

    /// プレースホルダー範囲外エラーかどうか
    pub fn is_format_index(&self) -> bool {
        matches!(self, ParameterError::FormatIndex { .. })
    }
}

/// コマンド実行エラー
///
/// 値のバインドと実行のどちらで失敗したかを区別します。
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl CommandError {
    /// バインド時のエラーかどうか
    pub fn is_parameter(&self) -> bool {
        matches!(self, CommandError::Parameter(_))
    }

    /// 実行時のエラーかどうか
    pub fn is_database(&self) -> bool {
        matches!(self, CommandError::Database(_))
    }
}

/// 空文字列を拒否する引数チェック
pub(crate) fn check_not_empty<'a>(
    value: &'a str,
    argument: &'static str,
) -> Result<&'a str, ParameterError> {
    if value.trim().is_empty() {
        Err(ParameterError::InvalidArgument { argument })
    } else {
        Ok(value)
    }
}
