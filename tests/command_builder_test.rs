/// コマンド構築と実行の統合テスト
///
/// パラメータリスト・コマンドビルダー・生SQLビルダーで組み立てたコマンドを
/// 実際のSQLiteファイルに対して実行します。

#[cfg(test)]
mod command_builder_tests {
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::{ConnectOptions, Row};
    use std::sync::Arc;
    use stratum_scaffold::adapters::command_executor::CommandExecutor;
    use stratum_scaffold::adapters::type_mapping::SqliteTypeMapper;
    use stratum_scaffold::core::command::{RawSqlCommandBuilder, RelationalCommandBuilder};
    use stratum_scaffold::core::parameter::{
        DbValue, ParameterValues, PropertyDescriptor, ValueKind, ValueType,
    };
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_composite_parameters_against_file_database() {
        let dir = TempDir::new().unwrap();
        let mut connection = SqliteConnectOptions::new()
            .filename(dir.path().join("ledger.db"))
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::raw_sql(
            "CREATE TABLE entries (account TEXT, period INTEGER, amount NUMERIC, PRIMARY KEY (account, period))",
        )
        .execute(&mut connection)
        .await
        .unwrap();

        let mapper = Arc::new(SqliteTypeMapper);
        let mut builder = RelationalCommandBuilder::new(mapper.clone());
        builder
            .append_line("INSERT INTO entries (account, period, amount)")
            .append("VALUES (?1, ?2, ?3)");
        builder
            .parameter_list_mut()
            .add_composite("key", |inner| {
                inner.add_type_mapped("account", "?1", &ValueType::of(ValueKind::String))?;
                inner.add_type_mapped("period", "?2", &ValueType::of(ValueKind::Int32))
            })
            .unwrap();
        builder
            .parameter_list_mut()
            .add_property(
                "amount",
                "?3",
                &PropertyDescriptor::new("Amount", ValueKind::Decimal, false)
                    .with_store_type("DECIMAL(10,2)"),
            )
            .unwrap();
        let command = builder.build();
        assert_eq!(command.parameters().len(), 2);
        assert!(command.command_text().contains('\n'));

        let mut values = ParameterValues::new();
        values.insert("account".to_string(), DbValue::from("cash"));
        values.insert("period".to_string(), DbValue::from(202401));
        values.insert("amount".to_string(), DbValue::from(12.5));

        let executor = CommandExecutor::new();
        let affected = executor
            .execute_non_query(&mut connection, &command, &values)
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let select = RawSqlCommandBuilder::new(mapper)
            .build_with_values(
                "SELECT amount FROM entries WHERE account = {0} AND period = {1}",
                vec![DbValue::from("cash"), DbValue::from(202401)],
            )
            .unwrap();
        assert_eq!(
            select.command.command_text(),
            "SELECT amount FROM entries WHERE account = ?1 AND period = ?2"
        );

        let rows = executor.fetch_raw(&mut connection, &select).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<f64, _>("amount"), 12.5);
    }

    #[tokio::test]
    async fn test_overflowing_int32_is_rejected_before_execution() {
        let mut builder = RelationalCommandBuilder::new(Arc::new(SqliteTypeMapper));
        builder.append("SELECT ?1");
        builder
            .parameter_list_mut()
            .add_type_mapped("n", "?1", &ValueType::of(ValueKind::Int32))
            .unwrap();
        let command = builder.build();

        let mut values = ParameterValues::new();
        values.insert("n".to_string(), DbValue::from(i64::MAX));

        let err = command.bind(&values).unwrap_err();
        assert!(err.is_conversion());
    }
}
