// カタログゲートウェイ
//
// データベースのシステムカタログからスキーマ情報の生データを読み取ります。
// 行の形だけが契約で、クエリ文はSQLite固有です。

use crate::adapters::sql_quote::pragma_call;
use crate::core::error::DatabaseError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

/// インデックス一覧の行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndexEntry {
    /// インデックス名
    pub name: String,
    /// 所有テーブル名
    pub table_name: String,
}

/// カラム定義の行（定義順）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumnRow {
    pub name: String,
    /// 宣言された型（空文字列の場合あり）
    pub declared_type: String,
    /// 主キー内の位置（1始まり、主キーでなければ0）
    pub primary_key_position: u32,
    pub not_null: bool,
    pub default_value: Option<String>,
}

/// インデックスのユニークフラグ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndexFlag {
    pub name: String,
    pub is_unique: bool,
}

/// インデックスを構成するカラムの行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndexColumnRow {
    /// カラム名（式インデックスではNone）
    pub name: Option<String>,
    pub sequence: u32,
}

/// 外部キーの行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForeignKeyRow {
    /// 制約ID（同じ外部キーに属する行で共通）
    pub id: i64,
    pub principal_table: String,
    pub from_column: String,
    /// 参照先カラム（Noneは参照先テーブルの主キーを指す）
    pub to_column: Option<String>,
    pub on_delete: String,
    pub sequence: u32,
}

/// カタログ読み取りインターフェース
///
/// スキーマ抽出に必要な論理的な読み取り操作を抽象化します。
#[async_trait]
pub trait CatalogReader: Send {
    /// データベース名
    fn data_source(&self) -> &str;

    /// テーブル名一覧を取得（内部テーブルを除く）
    async fn list_tables(&mut self) -> Result<Vec<String>, DatabaseError>;

    /// インデックス一覧を取得
    async fn list_indexes(&mut self) -> Result<Vec<RawIndexEntry>, DatabaseError>;

    /// カラム定義を定義順に取得
    async fn describe_columns(&mut self, table: &str) -> Result<Vec<RawColumnRow>, DatabaseError>;

    /// テーブルのインデックスフラグを取得
    async fn list_index_flags(&mut self, table: &str) -> Result<Vec<RawIndexFlag>, DatabaseError>;

    /// インデックスのカラムを取得
    async fn describe_index_columns(
        &mut self,
        index: &str,
    ) -> Result<Vec<RawIndexColumnRow>, DatabaseError>;

    /// テーブルの外部キー行を取得
    async fn describe_foreign_keys(
        &mut self,
        table: &str,
    ) -> Result<Vec<RawForeignKeyRow>, DatabaseError>;
}

const LIST_TABLES_SQL: &str = r#"
    SELECT name
    FROM sqlite_master
    WHERE type = 'table'
        AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
    ORDER BY rowid
"#;

const LIST_INDEXES_SQL: &str = r#"
    SELECT name, tbl_name
    FROM sqlite_master
    WHERE type = 'index'
    ORDER BY rowid
"#;

/// SQLite用カタログリーダー
pub struct SqliteCatalog<'c> {
    connection: &'c mut SqliteConnection,
    database_name: String,
}

impl<'c> SqliteCatalog<'c> {
    /// 新しいSqliteCatalogを作成
    pub fn new(connection: &'c mut SqliteConnection, database_name: impl Into<String>) -> Self {
        Self {
            connection,
            database_name: database_name.into(),
        }
    }

    async fn fetch(&mut self, sql: &str) -> Result<Vec<SqliteRow>, DatabaseError> {
        sqlx::query(sql)
            .fetch_all(&mut *self.connection)
            .await
            .map_err(|e| DatabaseError::query(sql, e))
    }
}

fn get<'r, T>(row: &'r SqliteRow, column: &str, sql: &str) -> Result<T, DatabaseError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get::<T, _>(column)
        .map_err(|e| DatabaseError::query(sql, e))
}

/// 位置番号の列を取得（負数や範囲外はクエリエラー）
fn get_position(row: &SqliteRow, column: &str, sql: &str) -> Result<u32, DatabaseError> {
    let value: i64 = get(row, column, sql)?;
    to_position(value, column, sql)
}

fn to_position(value: i64, column: &str, sql: &str) -> Result<u32, DatabaseError> {
    u32::try_from(value).map_err(|_| DatabaseError::Query {
        message: format!("Column '{}' has an out-of-range position: {}", column, value),
        sql: Some(sql.to_string()),
    })
}

#[async_trait]
impl CatalogReader for SqliteCatalog<'_> {
    fn data_source(&self) -> &str {
        &self.database_name
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, DatabaseError> {
        let rows = self.fetch(LIST_TABLES_SQL).await?;
        rows.iter()
            .map(|row| get::<String>(row, "name", LIST_TABLES_SQL))
            .collect()
    }

    async fn list_indexes(&mut self) -> Result<Vec<RawIndexEntry>, DatabaseError> {
        let rows = self.fetch(LIST_INDEXES_SQL).await?;
        rows.iter()
            .map(|row| {
                Ok(RawIndexEntry {
                    name: get(row, "name", LIST_INDEXES_SQL)?,
                    table_name: get(row, "tbl_name", LIST_INDEXES_SQL)?,
                })
            })
            .collect()
    }

    async fn describe_columns(&mut self, table: &str) -> Result<Vec<RawColumnRow>, DatabaseError> {
        let sql = pragma_call("table_info", table);
        let rows = self.fetch(&sql).await?;

        rows.iter()
            .map(|row| {
                let not_null: i64 = get(row, "notnull", &sql)?;
                let declared_type: Option<String> = get(row, "type", &sql)?;
                Ok(RawColumnRow {
                    name: get(row, "name", &sql)?,
                    declared_type: declared_type.unwrap_or_default(),
                    primary_key_position: get_position(row, "pk", &sql)?,
                    not_null: not_null != 0,
                    default_value: get(row, "dflt_value", &sql)?,
                })
            })
            .collect()
    }

    async fn list_index_flags(&mut self, table: &str) -> Result<Vec<RawIndexFlag>, DatabaseError> {
        let sql = pragma_call("index_list", table);
        let rows = self.fetch(&sql).await?;

        rows.iter()
            .map(|row| {
                let unique: i64 = get(row, "unique", &sql)?;
                Ok(RawIndexFlag {
                    name: get(row, "name", &sql)?,
                    is_unique: unique != 0,
                })
            })
            .collect()
    }

    async fn describe_index_columns(
        &mut self,
        index: &str,
    ) -> Result<Vec<RawIndexColumnRow>, DatabaseError> {
        let sql = pragma_call("index_info", index);
        let rows = self.fetch(&sql).await?;

        rows.iter()
            .map(|row| {
                Ok(RawIndexColumnRow {
                    name: get(row, "name", &sql)?,
                    sequence: get_position(row, "seqno", &sql)?,
                })
            })
            .collect()
    }

    async fn describe_foreign_keys(
        &mut self,
        table: &str,
    ) -> Result<Vec<RawForeignKeyRow>, DatabaseError> {
        let sql = pragma_call("foreign_key_list", table);
        let rows = self.fetch(&sql).await?;

        rows.iter()
            .map(|row| {
                Ok(RawForeignKeyRow {
                    id: get(row, "id", &sql)?,
                    principal_table: get(row, "table", &sql)?,
                    from_column: get(row, "from", &sql)?,
                    to_column: get(row, "to", &sql)?,
                    on_delete: get(row, "on_delete", &sql)?,
                    sequence: get_position(row, "seq", &sql)?,
                })
            })
            .collect()
    }
}
