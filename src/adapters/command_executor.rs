// コマンド実行アダプター
//
// リレーショナルコマンドに値をバインドし、SQLite接続上で実行します。
// パラメータは展開順に位置指定でバインドされます。

use crate::core::command::{BoundParameter, RawSqlCommand, RelationalCommand};
use crate::core::error::{CommandError, DatabaseError};
use crate::core::parameter::{DbValue, ParameterValues};
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::query::Query;
use sqlx::Sqlite;
use tracing::debug;

/// コマンド実行サービス
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: DbValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        DbValue::Null => query.bind(None::<i64>),
        DbValue::Integer(i) => query.bind(i),
        DbValue::Real(r) => query.bind(r),
        DbValue::Text(s) => query.bind(s),
        DbValue::Blob(b) => query.bind(b),
    }
}

fn prepare<'q>(
    sql: &'q str,
    parameters: Vec<BoundParameter>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    parameters
        .into_iter()
        .fold(sqlx::query(sql), |query, parameter| {
            bind_value(query, parameter.value)
        })
}

impl CommandExecutor {
    /// 新しいCommandExecutorを作成
    pub fn new() -> Self {
        Self
    }

    /// 結果セットを返さないコマンドを実行
    ///
    /// # Returns
    ///
    /// 影響を受けた行数
    pub async fn execute_non_query(
        &self,
        connection: &mut SqliteConnection,
        command: &RelationalCommand,
        values: &ParameterValues,
    ) -> Result<u64, CommandError> {
        let sql = command.command_text();
        let parameters = command.bind(values)?;
        debug!(sql, parameters = parameters.len(), "Executing command");

        let result = prepare(sql, parameters)
            .execute(&mut *connection)
            .await
            .map_err(|e| DatabaseError::query(sql, e))?;

        Ok(result.rows_affected())
    }

    /// 行を返すコマンドを実行
    pub async fn fetch_all(
        &self,
        connection: &mut SqliteConnection,
        command: &RelationalCommand,
        values: &ParameterValues,
    ) -> Result<Vec<SqliteRow>, CommandError> {
        let sql = command.command_text();
        let parameters = command.bind(values)?;
        debug!(sql, parameters = parameters.len(), "Fetching rows");

        let rows = prepare(sql, parameters)
            .fetch_all(&mut *connection)
            .await
            .map_err(|e| DatabaseError::query(sql, e))?;

        Ok(rows)
    }

    /// 生SQLコマンドを実行
    pub async fn execute_raw(
        &self,
        connection: &mut SqliteConnection,
        raw: &RawSqlCommand,
    ) -> Result<u64, CommandError> {
        self.execute_non_query(connection, &raw.command, &raw.parameter_values)
            .await
    }

    /// 生SQLコマンドで行を取得
    pub async fn fetch_raw(
        &self,
        connection: &mut SqliteConnection,
        raw: &RawSqlCommand,
    ) -> Result<Vec<SqliteRow>, CommandError> {
        self.fetch_all(connection, &raw.command, &raw.parameter_values)
            .await
    }
}
