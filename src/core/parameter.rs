// リレーショナルパラメータ
//
// コマンドテキストと対になるパラメータ記述子と、その順序付きリストを提供します。
// 型マッピングは TypeMapper トレイト経由で解決します。

use crate::core::error::{check_not_empty, ParameterError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// バインドする値
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl DbValue {
    /// NULLかどうか
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    fn describe(&self) -> &'static str {
        match self {
            DbValue::Null => "NULL",
            DbValue::Integer(_) => "INTEGER",
            DbValue::Real(_) => "REAL",
            DbValue::Text(_) => "TEXT",
            DbValue::Blob(_) => "BLOB",
        }
    }
}

impl From<i64> for DbValue {
    fn from(value: i64) -> Self {
        DbValue::Integer(value)
    }
}

impl From<i32> for DbValue {
    fn from(value: i32) -> Self {
        DbValue::Integer(i64::from(value))
    }
}

impl From<bool> for DbValue {
    fn from(value: bool) -> Self {
        DbValue::Integer(i64::from(value))
    }
}

impl From<f64> for DbValue {
    fn from(value: f64) -> Self {
        DbValue::Real(value)
    }
}

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        DbValue::Text(value.to_string())
    }
}

impl From<String> for DbValue {
    fn from(value: String) -> Self {
        DbValue::Text(value)
    }
}

impl From<Vec<u8>> for DbValue {
    fn from(value: Vec<u8>) -> Self {
        DbValue::Blob(value)
    }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DbValue::Null, Into::into)
    }
}

/// 不変名から値へのマップ
pub type ParameterValues = HashMap<String, DbValue>;

/// 値の意味上の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int32,
    Int64,
    Double,
    Decimal,
    String,
    Bytes,
    DateTime,
    Uuid,
}

/// 値の型（種類 + NULL許可）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl ValueType {
    /// NULL非許可の型
    pub fn of(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// NULL許可の型
    pub fn nullable(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }
}

/// マッピング対象のプロパティ記述子
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// プロパティ名
    pub name: String,
    /// 値の種類
    pub kind: ValueKind,
    /// 宣言上のNULL許可
    pub is_nullable: bool,
    /// 明示的なストア型（例: "VARCHAR(100)"）
    pub store_type: Option<String>,
}

impl PropertyDescriptor {
    /// 新しいPropertyDescriptorを作成
    pub fn new(name: impl Into<String>, kind: ValueKind, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            is_nullable,
            store_type: None,
        }
    }

    /// ストア型を指定
    pub fn with_store_type(mut self, store_type: impl Into<String>) -> Self {
        self.store_type = Some(store_type.into());
        self
    }
}

/// 解決済みの型マッピング
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeMapping {
    /// データベース上のストア型
    pub store_type: String,
    /// 値の種類
    pub kind: ValueKind,
}

impl TypeMapping {
    /// 新しいTypeMappingを作成
    pub fn new(store_type: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            store_type: store_type.into(),
            kind,
        }
    }

    /// 値をこのマッピングの表現に変換
    ///
    /// NULLはそのまま通過します。
    pub fn convert(&self, name: &str, value: &DbValue) -> Result<DbValue, ParameterError> {
        let fail = |message: String| ParameterError::Conversion {
            name: name.to_string(),
            store_type: self.store_type.clone(),
            message,
        };
        let unsupported = || fail(format!("{} value is not supported", value.describe()));

        match (self.kind, value) {
            (_, DbValue::Null) => Ok(DbValue::Null),

            (ValueKind::Bool, DbValue::Integer(i)) => Ok(DbValue::Integer(i64::from(*i != 0))),
            (ValueKind::Bool, DbValue::Text(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(DbValue::Integer(1)),
                "false" | "0" => Ok(DbValue::Integer(0)),
                other => Err(fail(format!("'{}' is not a boolean", other))),
            },

            (ValueKind::Int32 | ValueKind::Int64, DbValue::Integer(i)) => {
                self.check_integer_range(*i).map_err(fail)
            }
            (ValueKind::Int32 | ValueKind::Int64, DbValue::Real(r)) => {
                // i64::MAX as f64 は 2^63 に丸められるため上限は排他
                if !r.is_finite()
                    || r.fract() != 0.0
                    || *r < i64::MIN as f64
                    || *r >= i64::MAX as f64
                {
                    return Err(fail(format!("{} is not an integer", r)));
                }
                self.check_integer_range(*r as i64).map_err(fail)
            }
            (ValueKind::Int32 | ValueKind::Int64, DbValue::Text(s)) => {
                let i = s.trim().parse::<i64>().map_err(|e| fail(e.to_string()))?;
                self.check_integer_range(i).map_err(fail)
            }

            (ValueKind::Double, DbValue::Real(r)) => Ok(DbValue::Real(*r)),
            (ValueKind::Double, DbValue::Integer(i)) => Ok(DbValue::Real(*i as f64)),
            (ValueKind::Double, DbValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(DbValue::Real)
                .map_err(|e| fail(e.to_string())),

            (
                ValueKind::String | ValueKind::Decimal | ValueKind::DateTime,
                DbValue::Text(s),
            ) => Ok(DbValue::Text(s.clone())),
            (ValueKind::String | ValueKind::Decimal, DbValue::Integer(i)) => {
                Ok(DbValue::Text(i.to_string()))
            }
            (ValueKind::String | ValueKind::Decimal, DbValue::Real(r)) => {
                Ok(DbValue::Text(r.to_string()))
            }

            (ValueKind::Bytes | ValueKind::Uuid, DbValue::Blob(b)) => Ok(DbValue::Blob(b.clone())),
            (ValueKind::Bytes, DbValue::Text(s)) => Ok(DbValue::Blob(s.as_bytes().to_vec())),
            (ValueKind::Uuid, DbValue::Text(s)) => Ok(DbValue::Text(s.clone())),

            _ => Err(unsupported()),
        }
    }

    /// 整数がマッピングの種類の範囲に収まるか確認
    fn check_integer_range(&self, value: i64) -> Result<DbValue, String> {
        if self.kind == ValueKind::Int32 && i32::try_from(value).is_err() {
            return Err(format!("{} overflows a 32-bit integer", value));
        }
        Ok(DbValue::Integer(value))
    }
}

impl fmt::Display for TypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.store_type)
    }
}

/// 型マッピングの解決インターフェース
///
/// 決定的で副作用を持たない実装でなければなりません。
pub trait TypeMapper: Send + Sync {
    /// 値の型からマッピングを取得
    fn mapping_for_type(&self, value_type: &ValueType) -> TypeMapping;

    /// プロパティからマッピングを取得
    fn mapping_for_property(&self, property: &PropertyDescriptor) -> TypeMapping;
}

/// リレーショナルパラメータ
#[derive(Debug, Clone, PartialEq)]
pub enum RelationalParameter {
    /// 実行時に値を受け取る型情報なしのパラメータ
    Dynamic { invariant_name: String, name: String },
    /// 構築時に型マッピングを解決したパラメータ
    TypeMapped {
        invariant_name: String,
        name: String,
        mapping: TypeMapping,
        nullable: bool,
    },
    /// 複数カラムの値を表す複合パラメータ
    Composite {
        invariant_name: String,
        parameters: Vec<RelationalParameter>,
    },
}

impl RelationalParameter {
    /// 不変名
    pub fn invariant_name(&self) -> &str {
        match self {
            RelationalParameter::Dynamic { invariant_name, .. }
            | RelationalParameter::TypeMapped { invariant_name, .. }
            | RelationalParameter::Composite { invariant_name, .. } => invariant_name,
        }
    }

    /// コマンドテキスト上の名前（複合パラメータにはない）
    pub fn name(&self) -> Option<&str> {
        match self {
            RelationalParameter::Dynamic { name, .. }
            | RelationalParameter::TypeMapped { name, .. } => Some(name),
            RelationalParameter::Composite { .. } => None,
        }
    }

    /// 複合パラメータかどうか
    pub fn is_composite(&self) -> bool {
        matches!(self, RelationalParameter::Composite { .. })
    }
}

/// パラメータリスト
///
/// 挿入順を保持します。この順序はコマンドテキストへのプレースホルダー出力順と
/// 一致しなければなりません。
#[derive(Clone)]
pub struct ParameterList {
    type_mapper: Arc<dyn TypeMapper>,
    parameters: Vec<RelationalParameter>,
}

impl fmt::Debug for ParameterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterList")
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl ParameterList {
    /// 新しいParameterListを作成
    pub fn new(type_mapper: Arc<dyn TypeMapper>) -> Self {
        Self {
            type_mapper,
            parameters: Vec::new(),
        }
    }

    /// パラメータ一覧（挿入順）
    pub fn parameters(&self) -> &[RelationalParameter] {
        &self.parameters
    }

    /// パラメータ数
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// 型情報なしのパラメータを追加
    pub fn add_dynamic(&mut self, invariant_name: &str, name: &str) -> Result<(), ParameterError> {
        let invariant_name = check_not_empty(invariant_name, "invariant_name")?;
        let name = check_not_empty(name, "name")?;

        self.parameters.push(RelationalParameter::Dynamic {
            invariant_name: invariant_name.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    /// 値の型からマッピングを解決してパラメータを追加
    ///
    /// NULL許可フラグは値の型から取得します。
    pub fn add_type_mapped(
        &mut self,
        invariant_name: &str,
        name: &str,
        value_type: &ValueType,
    ) -> Result<(), ParameterError> {
        let invariant_name = check_not_empty(invariant_name, "invariant_name")?;
        let name = check_not_empty(name, "name")?;

        self.parameters.push(RelationalParameter::TypeMapped {
            invariant_name: invariant_name.to_string(),
            name: name.to_string(),
            mapping: self.type_mapper.mapping_for_type(value_type),
            nullable: value_type.nullable,
        });
        Ok(())
    }

    /// プロパティからマッピングを解決してパラメータを追加
    ///
    /// NULL許可フラグはプロパティの宣言から取得します。
    pub fn add_property(
        &mut self,
        invariant_name: &str,
        name: &str,
        property: &PropertyDescriptor,
    ) -> Result<(), ParameterError> {
        let invariant_name = check_not_empty(invariant_name, "invariant_name")?;
        let name = check_not_empty(name, "name")?;

        self.parameters.push(RelationalParameter::TypeMapped {
            invariant_name: invariant_name.to_string(),
            name: name.to_string(),
            mapping: self.type_mapper.mapping_for_property(property),
            nullable: property.is_nullable,
        });
        Ok(())
    }

    /// 複合パラメータを追加
    ///
    /// 独立した内部リストに対して `build` を実行し、内部リストが空でない場合のみ
    /// 1つの複合パラメータとして追加します。
    pub fn add_composite<F>(&mut self, invariant_name: &str, build: F) -> Result<(), ParameterError>
    where
        F: FnOnce(&mut ParameterList) -> Result<(), ParameterError>,
    {
        let invariant_name = check_not_empty(invariant_name, "invariant_name")?;

        let mut inner = ParameterList::new(Arc::clone(&self.type_mapper));
        build(&mut inner)?;

        if !inner.is_empty() {
            self.parameters.push(RelationalParameter::Composite {
                invariant_name: invariant_name.to_string(),
                parameters: inner.parameters,
            });
        }
        Ok(())
    }

    /// パラメータ一覧を取り出す
    pub fn into_parameters(self) -> Vec<RelationalParameter> {
        self.parameters
    }
}
