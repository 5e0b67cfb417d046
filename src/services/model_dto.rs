// モデルDTO
//
// ID参照のデータベースモデルを、名前で参照する出力用の構造に変換します。
// JSON/YAML出力はこのDTOを経由します。

use crate::core::database_model::{
    ColumnModel, DatabaseModel, ForeignKeyModel, IndexModel, TableModel,
};
use serde::{Deserialize, Serialize};

/// データベースDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDto {
    pub name: String,
    pub tables: Vec<TableDto>,
}

/// テーブルDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDto {
    pub name: String,
    pub columns: Vec<ColumnDto>,
    /// 主キーカラム名（主キー内の位置順）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyDto>,
}

/// カラムDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDto {
    pub name: String,
    pub data_type: String,
    pub ordinal: usize,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key_ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// インデックスDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDto {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// 外部キーDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDto {
    pub columns: Vec<String>,
    /// 参照先テーブル（選択外の場合はNone）
    pub principal_table: Option<String>,
    /// 参照先カラム（解決できない場合はNone）
    pub principal_columns: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl DatabaseDto {
    /// DatabaseModel → DatabaseDto 変換
    pub fn from_model(model: &DatabaseModel) -> Self {
        Self {
            name: model.database_name.clone(),
            tables: model
                .tables
                .iter()
                .map(|table| TableDto::from_model(model, table))
                .collect(),
        }
    }
}

impl TableDto {
    fn from_model(model: &DatabaseModel, table: &TableModel) -> Self {
        Self {
            name: table.name.clone(),
            columns: table.columns.iter().map(ColumnDto::from).collect(),
            primary_key: table
                .primary_key()
                .into_iter()
                .map(|c| c.name.clone())
                .collect(),
            indexes: table
                .indexes
                .iter()
                .map(|index| IndexDto::from_model(model, index))
                .collect(),
            foreign_keys: table
                .foreign_keys
                .iter()
                .map(|fk| ForeignKeyDto::from_model(model, fk))
                .collect(),
        }
    }
}

impl From<&ColumnModel> for ColumnDto {
    fn from(column: &ColumnModel) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            ordinal: column.ordinal,
            nullable: column.is_nullable,
            primary_key_ordinal: column.primary_key_ordinal,
            default_value: column.default_value.clone(),
        }
    }
}

impl IndexDto {
    fn from_model(model: &DatabaseModel, index: &IndexModel) -> Self {
        Self {
            name: index.name.clone(),
            unique: index.is_unique,
            columns: index
                .columns
                .iter()
                .map(|c| model.column(c.column).name.clone())
                .collect(),
        }
    }
}

impl ForeignKeyDto {
    fn from_model(model: &DatabaseModel, foreign_key: &ForeignKeyModel) -> Self {
        Self {
            columns: foreign_key
                .columns
                .iter()
                .map(|c| model.column(c.column).name.clone())
                .collect(),
            principal_table: foreign_key
                .principal_table(model)
                .map(|t| t.name.clone()),
            principal_columns: foreign_key
                .columns
                .iter()
                .map(|c| c.principal_column.name(model).map(str::to_string))
                .collect(),
            on_delete: foreign_key.on_delete.map(|a| a.to_string()),
        }
    }
}
