// リレーショナルコマンド
//
// 生成されたSQLテキストとパラメータリストを組にし、実行時の値バインドを提供します。
// コマンドビルダーと生SQLビルダーもここで定義します。

use crate::core::error::ParameterError;
use crate::core::parameter::{
    DbValue, ParameterList, ParameterValues, RelationalParameter, TypeMapper,
};
use regex::{Captures, Regex};
use std::sync::{Arc, OnceLock};

/// バインド済みパラメータ
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// 不変名
    pub invariant_name: String,
    /// コマンドテキスト上の名前
    pub name: String,
    /// ストア型（型マッピング済みの場合のみ）
    pub store_type: Option<String>,
    /// バインドする値
    pub value: DbValue,
}

/// リレーショナルコマンド
///
/// 構築後はテキストもパラメータも変更できません。
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalCommand {
    command_text: String,
    parameters: Vec<RelationalParameter>,
}

impl RelationalCommand {
    /// 新しいRelationalCommandを作成
    pub fn new(command_text: impl Into<String>, parameters: Vec<RelationalParameter>) -> Self {
        Self {
            command_text: command_text.into(),
            parameters,
        }
    }

    /// コマンドテキスト
    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    /// パラメータ一覧
    pub fn parameters(&self) -> &[RelationalParameter] {
        &self.parameters
    }

    /// 値をバインドする
    ///
    /// 複合パラメータは子パラメータを順に展開し、それぞれ自身の不変名で値を参照します。
    /// 戻り値の順序はプレースホルダーの出力順と一致します。
    pub fn bind(&self, values: &ParameterValues) -> Result<Vec<BoundParameter>, ParameterError> {
        let mut bound = Vec::new();
        for parameter in &self.parameters {
            bind_parameter(parameter, values, &mut bound)?;
        }
        Ok(bound)
    }
}

fn bind_parameter(
    parameter: &RelationalParameter,
    values: &ParameterValues,
    bound: &mut Vec<BoundParameter>,
) -> Result<(), ParameterError> {
    let lookup = |invariant_name: &str| {
        values
            .get(invariant_name)
            .ok_or_else(|| ParameterError::MissingValue {
                name: invariant_name.to_string(),
            })
    };

    match parameter {
        RelationalParameter::Dynamic {
            invariant_name,
            name,
        } => bound.push(BoundParameter {
            invariant_name: invariant_name.clone(),
            name: name.clone(),
            store_type: None,
            value: lookup(invariant_name)?.clone(),
        }),
        RelationalParameter::TypeMapped {
            invariant_name,
            name,
            mapping,
            ..
        } => bound.push(BoundParameter {
            invariant_name: invariant_name.clone(),
            name: name.clone(),
            store_type: Some(mapping.store_type.clone()),
            value: mapping.convert(invariant_name, lookup(invariant_name)?)?,
        }),
        RelationalParameter::Composite { parameters, .. } => {
            for child in parameters {
                bind_parameter(child, values, bound)?;
            }
        }
    }
    Ok(())
}

/// パラメータ名ジェネレーター
///
/// `p0`, `p1`, ... の順に不変名を生成します。
#[derive(Debug, Clone, Default)]
pub struct ParameterNameGenerator {
    count: usize,
}

impl ParameterNameGenerator {
    /// 新しいParameterNameGeneratorを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 次の名前を生成
    pub fn generate_next(&mut self) -> String {
        let name = format!("p{}", self.count);
        self.count += 1;
        name
    }

    /// 生成済みの名前の数
    pub fn count(&self) -> usize {
        self.count
    }
}

/// SQLite用SQL生成ヘルパー
///
/// sqlxのSQLiteドライバーは `?NNN` 形式の番号付きパラメータを位置でバインドするため、
/// プレースホルダーは1始まりの位置から生成します。
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSqlGenerationHelper;

impl SqliteSqlGenerationHelper {
    /// 0始まりの位置からプレースホルダーを生成
    pub fn parameter_placeholder(&self, position: usize) -> String {
        format!("?{}", position + 1)
    }

    /// 文字列リテラルを生成
    pub fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// コマンドビルダー
///
/// コマンドテキストを組み立てながらパラメータリストを構築します。
#[derive(Debug, Clone)]
pub struct RelationalCommandBuilder {
    text: String,
    indent: usize,
    at_line_start: bool,
    parameter_list: ParameterList,
}

impl RelationalCommandBuilder {
    const INDENT: &'static str = "    ";

    /// 新しいRelationalCommandBuilderを作成
    pub fn new(type_mapper: Arc<dyn TypeMapper>) -> Self {
        Self {
            text: String::new(),
            indent: 0,
            at_line_start: true,
            parameter_list: ParameterList::new(type_mapper),
        }
    }

    /// テキストを追加
    pub fn append(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            if self.at_line_start {
                self.text.push_str(&Self::INDENT.repeat(self.indent));
            }
            self.text.push_str(text);
            self.at_line_start = false;
        }
        self
    }

    /// テキストを追加して改行
    pub fn append_line(&mut self, text: &str) -> &mut Self {
        self.append(text);
        self.text.push('\n');
        self.at_line_start = true;
        self
    }

    /// インデントを1段深くする
    pub fn increment_indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    /// インデントを1段浅くする
    pub fn decrement_indent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    /// パラメータリスト
    pub fn parameter_list(&self) -> &ParameterList {
        &self.parameter_list
    }

    /// パラメータリスト（可変）
    pub fn parameter_list_mut(&mut self) -> &mut ParameterList {
        &mut self.parameter_list
    }

    /// 現在のテキスト
    pub fn text(&self) -> &str {
        &self.text
    }

    /// コマンドを構築
    pub fn build(self) -> RelationalCommand {
        RelationalCommand::new(self.text, self.parameter_list.into_parameters())
    }
}

/// 生SQLから構築したコマンドとパラメータ値
#[derive(Debug, Clone)]
pub struct RawSqlCommand {
    /// コマンド
    pub command: RelationalCommand,
    /// 不変名から値へのマップ
    pub parameter_values: ParameterValues,
}

/// 生SQLコマンドビルダー
///
/// `{0}`, `{1}`, ... 形式のプレースホルダーを生成したパラメータに置き換えます。
#[derive(Clone)]
pub struct RawSqlCommandBuilder {
    type_mapper: Arc<dyn TypeMapper>,
    sql_helper: SqliteSqlGenerationHelper,
}

impl std::fmt::Debug for RawSqlCommandBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSqlCommandBuilder").finish()
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("Invalid placeholder regex"))
}

impl RawSqlCommandBuilder {
    /// 新しいRawSqlCommandBuilderを作成
    pub fn new(type_mapper: Arc<dyn TypeMapper>) -> Self {
        Self {
            type_mapper,
            sql_helper: SqliteSqlGenerationHelper,
        }
    }

    /// パラメータなしのコマンドを構築
    pub fn build(&self, sql: &str) -> RelationalCommand {
        let mut builder = RelationalCommandBuilder::new(Arc::clone(&self.type_mapper));
        builder.append(sql);
        builder.build()
    }

    /// 値付きのコマンドを構築
    ///
    /// 値ごとに動的パラメータを1つ生成します。同じ番号のプレースホルダーは
    /// 同じパラメータを参照します。
    pub fn build_with_values(
        &self,
        sql_format: &str,
        values: Vec<DbValue>,
    ) -> Result<RawSqlCommand, ParameterError> {
        let mut builder = RelationalCommandBuilder::new(Arc::clone(&self.type_mapper));
        let mut generator = ParameterNameGenerator::new();
        let mut placeholders = Vec::with_capacity(values.len());
        let mut parameter_values = ParameterValues::new();

        for (position, value) in values.into_iter().enumerate() {
            let invariant_name = generator.generate_next();
            let placeholder = self.sql_helper.parameter_placeholder(position);
            builder
                .parameter_list_mut()
                .add_dynamic(&invariant_name, &placeholder)?;
            parameter_values.insert(invariant_name, value);
            placeholders.push(placeholder);
        }

        let mut out_of_range = None;
        let text = placeholder_pattern().replace_all(sql_format, |caps: &Captures| {
            let index = caps[1].parse::<usize>().unwrap_or(usize::MAX);
            match placeholders.get(index) {
                Some(placeholder) => placeholder.clone(),
                None => {
                    out_of_range.get_or_insert(index);
                    caps[0].to_string()
                }
            }
        });

        if let Some(index) = out_of_range {
            return Err(ParameterError::FormatIndex {
                index,
                count: placeholders.len(),
            });
        }

        builder.append(&text);
        Ok(RawSqlCommand {
            command: builder.build(),
            parameter_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parameter::{PropertyDescriptor, TypeMapping, ValueKind, ValueType};

    struct FakeTypeMapper;

    impl TypeMapper for FakeTypeMapper {
        fn mapping_for_type(&self, value_type: &ValueType) -> TypeMapping {
            match value_type.kind {
                ValueKind::Int32 | ValueKind::Int64 => TypeMapping::new("INTEGER", value_type.kind),
                kind => TypeMapping::new("TEXT", kind),
            }
        }

        fn mapping_for_property(&self, property: &PropertyDescriptor) -> TypeMapping {
            self.mapping_for_type(&ValueType::of(property.kind))
        }
    }

    fn mapper() -> Arc<dyn TypeMapper> {
        Arc::new(FakeTypeMapper)
    }

    #[test]
    fn test_builds_simple_command() {
        let command = RelationalCommandBuilder::new(mapper()).build();

        assert_eq!(command.command_text(), "");
        assert!(command.parameters().is_empty());
    }

    #[test]
    fn test_build_command_with_parameter() {
        let mut builder = RelationalCommandBuilder::new(mapper());
        builder
            .parameter_list_mut()
            .add_type_mapped("InvariantName", "Name", &ValueType::of(ValueKind::String))
            .unwrap();

        let command = builder.build();

        assert_eq!(command.command_text(), "");
        assert_eq!(command.parameters().len(), 1);
        assert_eq!(command.parameters()[0].invariant_name(), "InvariantName");
    }

    #[test]
    fn test_builder_indentation() {
        let mut builder = RelationalCommandBuilder::new(mapper());
        builder
            .append_line("SELECT")
            .increment_indent()
            .append("\"id\"")
            .append(", \"name\"")
            .append_line("")
            .decrement_indent()
            .append("FROM \"users\"");

        assert_eq!(
            builder.build().command_text(),
            "SELECT\n    \"id\", \"name\"\nFROM \"users\""
        );
    }

    #[test]
    fn test_bind_flattens_composite_in_order() {
        let mut builder = RelationalCommandBuilder::new(mapper());
        builder.append("WHERE (a, b) = (?1, ?2) AND c = ?3");
        let list = builder.parameter_list_mut();
        list.add_composite("key", |inner| {
            inner.add_type_mapped("a", "?1", &ValueType::of(ValueKind::Int32))?;
            inner.add_dynamic("b", "?2")
        })
        .unwrap();
        list.add_type_mapped("c", "?3", &ValueType::of(ValueKind::String))
            .unwrap();
        let command = builder.build();

        let values: ParameterValues = [
            ("a".to_string(), DbValue::Text("10".to_string())),
            ("b".to_string(), DbValue::Integer(2)),
            ("c".to_string(), DbValue::Integer(3)),
        ]
        .into_iter()
        .collect();

        let bound = command.bind(&values).unwrap();
        let names: Vec<&str> = bound.iter().map(|b| b.invariant_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        // 型マッピング済みは変換され、動的パラメータはそのまま
        assert_eq!(bound[0].value, DbValue::Integer(10));
        assert_eq!(bound[0].store_type.as_deref(), Some("INTEGER"));
        assert_eq!(bound[1].value, DbValue::Integer(2));
        assert_eq!(bound[1].store_type, None);
        assert_eq!(bound[2].value, DbValue::Text("3".to_string()));
    }

    #[test]
    fn test_bind_missing_value() {
        let mut builder = RelationalCommandBuilder::new(mapper());
        builder.parameter_list_mut().add_dynamic("p0", "?1").unwrap();
        let command = builder.build();

        let err = command.bind(&ParameterValues::new()).unwrap_err();
        assert_eq!(
            err,
            ParameterError::MissingValue {
                name: "p0".to_string()
            }
        );
    }

    #[test]
    fn test_raw_sql_without_parameters() {
        let builder = RawSqlCommandBuilder::new(mapper());
        let command = builder.build("SQL COMMAND TEXT");

        assert_eq!(command.command_text(), "SQL COMMAND TEXT");
        assert!(command.parameters().is_empty());
    }

    #[test]
    fn test_raw_sql_with_empty_parameter_list() {
        let builder = RawSqlCommandBuilder::new(mapper());
        let raw = builder.build_with_values("SQL COMMAND TEXT", vec![]).unwrap();

        assert_eq!(raw.command.command_text(), "SQL COMMAND TEXT");
        assert!(raw.command.parameters().is_empty());
        assert!(raw.parameter_values.is_empty());
    }

    #[test]
    fn test_raw_sql_with_parameters() {
        let builder = RawSqlCommandBuilder::new(mapper());
        let raw = builder
            .build_with_values(
                "SQL COMMAND TEXT {0} {1} {2}",
                vec![1_i32.into(), 2_i64.into(), "three".into()],
            )
            .unwrap();

        assert_eq!(raw.command.command_text(), "SQL COMMAND TEXT ?1 ?2 ?3");
        let names: Vec<&str> = raw
            .command
            .parameters()
            .iter()
            .map(|p| p.invariant_name())
            .collect();
        assert_eq!(names, vec!["p0", "p1", "p2"]);

        assert_eq!(raw.parameter_values.len(), 3);
        assert_eq!(raw.parameter_values["p0"], DbValue::Integer(1));
        assert_eq!(raw.parameter_values["p1"], DbValue::Integer(2));
        assert_eq!(
            raw.parameter_values["p2"],
            DbValue::Text("three".to_string())
        );
    }

    #[test]
    fn test_raw_sql_reused_placeholder() {
        let builder = RawSqlCommandBuilder::new(mapper());
        let raw = builder
            .build_with_values("a = {0} OR b = {0}", vec![5_i64.into()])
            .unwrap();

        assert_eq!(raw.command.command_text(), "a = ?1 OR b = ?1");
        assert_eq!(raw.command.parameters().len(), 1);
    }

    #[test]
    fn test_raw_sql_placeholder_out_of_range() {
        let builder = RawSqlCommandBuilder::new(mapper());
        let err = builder
            .build_with_values("x = {1}", vec![DbValue::Null])
            .unwrap_err();

        assert_eq!(err, ParameterError::FormatIndex { index: 1, count: 1 });
    }

    #[test]
    fn test_parameter_name_generator() {
        let mut generator = ParameterNameGenerator::new();
        assert_eq!(generator.generate_next(), "p0");
        assert_eq!(generator.generate_next(), "p1");
        assert_eq!(generator.count(), 2);
    }

    #[test]
    fn test_string_literal() {
        let helper = SqliteSqlGenerationHelper;
        assert_eq!(helper.string_literal("it's"), "'it''s'");
        assert_eq!(helper.parameter_placeholder(0), "?1");
    }
}
