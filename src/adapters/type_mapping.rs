// SQLite用型マッパー
//
// 値の種類をSQLiteのストレージクラスへ対応付けます。
// 明示的なストア型はSQLiteの型アフィニティ規則で解釈します。

use crate::core::parameter::{PropertyDescriptor, TypeMapper, TypeMapping, ValueKind, ValueType};
use std::fmt;

/// SQLiteの型アフィニティ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteAffinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl SqliteAffinity {
    /// 宣言型からアフィニティを判定
    ///
    /// 判定順序はSQLiteの規則どおり（INT → CHAR/CLOB/TEXT → BLOB/空 → REAL/FLOA/DOUB → NUMERIC）。
    pub fn from_declared_type(declared_type: &str) -> Self {
        let upper = declared_type.trim().to_uppercase();

        if upper.contains("INT") {
            SqliteAffinity::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            SqliteAffinity::Text
        } else if upper.is_empty() || upper.contains("BLOB") {
            SqliteAffinity::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            SqliteAffinity::Real
        } else {
            SqliteAffinity::Numeric
        }
    }

    /// ストア型名
    pub fn as_str(&self) -> &'static str {
        match self {
            SqliteAffinity::Integer => "INTEGER",
            SqliteAffinity::Text => "TEXT",
            SqliteAffinity::Blob => "BLOB",
            SqliteAffinity::Real => "REAL",
            SqliteAffinity::Numeric => "NUMERIC",
        }
    }
}

impl fmt::Display for SqliteAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQLite用型マッパー
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTypeMapper;

impl SqliteTypeMapper {
    fn storage_class(kind: ValueKind) -> SqliteAffinity {
        match kind {
            ValueKind::Bool | ValueKind::Int32 | ValueKind::Int64 => SqliteAffinity::Integer,
            ValueKind::Double => SqliteAffinity::Real,
            // SQLiteには10進数型がないため精度を保つ文字列で保持
            ValueKind::Decimal | ValueKind::String | ValueKind::DateTime | ValueKind::Uuid => {
                SqliteAffinity::Text
            }
            ValueKind::Bytes => SqliteAffinity::Blob,
        }
    }
}

impl TypeMapper for SqliteTypeMapper {
    fn mapping_for_type(&self, value_type: &ValueType) -> TypeMapping {
        TypeMapping::new(Self::storage_class(value_type.kind).as_str(), value_type.kind)
    }

    fn mapping_for_property(&self, property: &PropertyDescriptor) -> TypeMapping {
        let affinity = match property.store_type.as_deref() {
            Some(store_type) => SqliteAffinity::from_declared_type(store_type),
            None => Self::storage_class(property.kind),
        };
        TypeMapping::new(affinity.as_str(), property.kind)
    }
}
