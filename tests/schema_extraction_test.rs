/// スキーマ抽出の統合テスト
///
/// 一時ディレクトリに実際のSQLiteファイルを作成し、カタログからの抽出結果を検証します。
///
/// テスト内容:
/// - テーブル・カラム・主キー・デフォルト値
/// - インデックス（ユニーク、式インデックス）
/// - 外部キー（複合キー、参照アクション、選択外の参照先）

#[cfg(test)]
mod schema_extraction_tests {
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::{ConnectOptions, Connection};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use stratum_scaffold::core::database_model::{DatabaseModel, ReferentialAction};
    use stratum_scaffold::core::diagnostics::MemoryDiagnosticSink;
    use stratum_scaffold::core::table_selection::TableSelectionSet;
    use stratum_scaffold::services::schema_extractor::SchemaExtractor;
    use tempfile::TempDir;

    const SHOP_DDL: &str = r#"
        CREATE TABLE customers (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT
        );
        CREATE TABLE orders (
            id INTEGER NOT NULL,
            region TEXT NOT NULL,
            customer_id INTEGER REFERENCES customers(id) ON DELETE SET NULL,
            placed_at TEXT DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (id, region)
        );
        CREATE TABLE shipments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL,
            order_region TEXT NOT NULL,
            carrier TEXT,
            FOREIGN KEY (order_id, order_region) REFERENCES orders(id, region) ON DELETE CASCADE
        );
        CREATE INDEX ix_shipments_carrier ON shipments (carrier);
        CREATE INDEX ix_customers_lower_name ON customers (lower(name));
        CREATE TABLE audit_log (id INTEGER PRIMARY KEY, message TEXT);
    "#;

    /// テスト用のSQLiteファイルを作成
    async fn create_database(dir: &Path, file_name: &str, ddl: &str) -> PathBuf {
        let path = dir.join(file_name);
        let mut connection = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::raw_sql(ddl).execute(&mut connection).await.unwrap();
        connection.close().await.unwrap();
        path
    }

    fn connection_string(path: &Path) -> String {
        format!("sqlite://{}", path.display())
    }

    async fn extract(
        path: &Path,
        selection: &TableSelectionSet,
    ) -> (DatabaseModel, Arc<MemoryDiagnosticSink>) {
        let sink = Arc::new(MemoryDiagnosticSink::new());
        let extractor = SchemaExtractor::new(sink.clone());
        let model = extractor
            .extract(&connection_string(path), selection)
            .await
            .unwrap();
        (model, sink)
    }

    #[tokio::test]
    async fn test_extract_tables_and_columns() {
        let dir = TempDir::new().unwrap();
        let path = create_database(dir.path(), "shop.db", SHOP_DDL).await;

        let (model, _) = extract(&path, &TableSelectionSet::all()).await;

        assert_eq!(model.database_name, "shop");
        let names: Vec<&str> = model.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["customers", "orders", "shipments", "audit_log"]);

        let orders = model.find_table("orders").unwrap();
        let columns: Vec<(&str, usize)> = orders
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.ordinal))
            .collect();
        assert_eq!(
            columns,
            vec![("id", 0), ("region", 1), ("customer_id", 2), ("placed_at", 3)]
        );
        assert_eq!(orders.columns[1].primary_key_ordinal, Some(2));
        assert!(!orders.columns[0].is_nullable);
        assert!(orders.columns[2].is_nullable);
        assert_eq!(
            orders.columns[3].default_value.as_deref(),
            Some("CURRENT_TIMESTAMP")
        );

        let primary_key: Vec<&str> = orders.primary_key().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(primary_key, vec!["id", "region"]);

        // INTEGER PRIMARY KEY は NOT NULL 宣言がなくても非NULL
        let customers = model.find_table("customers").unwrap();
        assert!(!customers.columns[0].is_nullable);
        assert!(customers.columns[2].is_nullable);
    }

    #[tokio::test]
    async fn test_extract_indexes() {
        let dir = TempDir::new().unwrap();
        let path = create_database(dir.path(), "shop.db", SHOP_DDL).await;

        let (model, sink) = extract(&path, &TableSelectionSet::all()).await;

        let shipments = model.find_table("shipments").unwrap();
        let carrier_index = shipments
            .indexes
            .iter()
            .find(|i| i.name == "ix_shipments_carrier")
            .unwrap();
        assert!(!carrier_index.is_unique);
        assert_eq!(model.column(carrier_index.columns[0].column).name, "carrier");

        let customers = model.find_table("customers").unwrap();
        let unique_email = customers
            .indexes
            .iter()
            .find(|i| i.is_unique)
            .unwrap();
        assert_eq!(model.column(unique_email.columns[0].column).name, "email");

        let expression_index = customers
            .indexes
            .iter()
            .find(|i| i.name == "ix_customers_lower_name")
            .unwrap();
        assert!(expression_index.columns.is_empty());
        assert_eq!(sink.count("IndexColumnNameEmpty"), 1);
    }

    #[tokio::test]
    async fn test_extract_foreign_keys() {
        let dir = TempDir::new().unwrap();
        let path = create_database(dir.path(), "shop.db", SHOP_DDL).await;

        let (model, _) = extract(&path, &TableSelectionSet::all()).await;

        let shipments = model.find_table("shipments").unwrap();
        assert_eq!(shipments.foreign_keys.len(), 1);
        let foreign_key = &shipments.foreign_keys[0];
        assert_eq!(foreign_key.on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(foreign_key.principal_table(&model).unwrap().name, "orders");

        let pairs: Vec<(&str, Option<&str>)> = foreign_key
            .columns
            .iter()
            .map(|c| {
                (
                    model.column(c.column).name.as_str(),
                    c.principal_column.name(&model),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![("order_id", Some("id")), ("order_region", Some("region"))]
        );

        let orders = model.find_table("orders").unwrap();
        assert_eq!(
            orders.foreign_keys[0].on_delete,
            Some(ReferentialAction::SetNull)
        );
    }

    #[tokio::test]
    async fn test_selection_excludes_principal_table() {
        let dir = TempDir::new().unwrap();
        let path = create_database(dir.path(), "shop.db", SHOP_DDL).await;
        let selection = TableSelectionSet::new(vec!["ORDERS", "Shipments"], Vec::<String>::new());

        let (model, sink) = extract(&path, &selection).await;

        assert_eq!(model.table_count(), 2);
        assert_eq!(sink.count("TableExcluded"), 2);

        let orders = model.find_table("orders").unwrap();
        let foreign_key = &orders.foreign_keys[0];
        assert!(foreign_key.principal_table.is_none());
        assert!(!foreign_key.columns[0].principal_column.is_resolved());
        assert_eq!(foreign_key.columns[0].principal_column.name(&model), Some("id"));
        assert_eq!(sink.count("PrincipalTableNotFound"), 1);

        // 選択外テーブルのインデックスは含まれない
        assert!(model.find_table("customers").is_none());
        assert!(sink.count("IndexExcluded") >= 1);
    }

    #[tokio::test]
    async fn test_foreign_key_without_target_columns() {
        let dir = TempDir::new().unwrap();
        let path = create_database(
            dir.path(),
            "implicit.sqlite3",
            r#"
            CREATE TABLE parent (a INTEGER, b TEXT, PRIMARY KEY (a, b));
            CREATE TABLE child (pa INTEGER, pb TEXT, FOREIGN KEY (pa, pb) REFERENCES parent);
            "#,
        )
        .await;

        let (model, _) = extract(&path, &TableSelectionSet::all()).await;

        assert_eq!(model.database_name, "implicit");
        let child = model.find_table("child").unwrap();
        let targets: Vec<Option<&str>> = child.foreign_keys[0]
            .columns
            .iter()
            .map(|c| c.principal_column.name(&model))
            .collect();
        assert_eq!(targets, vec![Some("a"), Some("b")]);
        assert_eq!(child.foreign_keys[0].on_delete, Some(ReferentialAction::NoAction));
    }

    #[tokio::test]
    async fn test_missing_database_file_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.db");

        let extractor = SchemaExtractor::default();
        let err = extractor
            .extract(&connection_string(&path), &TableSelectionSet::all())
            .await
            .unwrap_err();

        assert!(err.is_connection());
        assert!(!path.exists());
    }
}
