// スキーマ抽出サービス
//
// カタログゲートウェイに対して決まった順序でクエリを発行し、
// データベースモデルを再構築します。
// 後のフェーズは前のフェーズで構築した構造を名前で参照するため、順序は固定です。

use crate::adapters::catalog::{CatalogReader, RawForeignKeyRow, SqliteCatalog};
use crate::adapters::database::{database_name, DatabaseConnectionService};
use crate::core::database_model::{
    ColumnId, DatabaseModel, ForeignKeyColumnModel, ForeignKeyModel, IndexColumnModel,
    IndexModel, NameKey, PrincipalColumn, ReferentialAction, TableId,
};
use crate::core::diagnostics::{DiagnosticSink, ScaffoldEvent, TracingDiagnosticSink};
use crate::core::error::DatabaseError;
use crate::core::table_selection::TableSelection;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 抽出呼び出しごとの作業領域
///
/// テーブル索引とカラム索引を保持し、呼び出し終了時に破棄されます。
struct ExtractionWorkspace {
    model: DatabaseModel,
    tables: HashMap<NameKey, TableId>,
    columns: HashMap<(TableId, NameKey), ColumnId>,
}

impl ExtractionWorkspace {
    fn new(database_name: &str) -> Self {
        Self {
            model: DatabaseModel::new(database_name),
            tables: HashMap::new(),
            columns: HashMap::new(),
        }
    }

    fn table_ids(&self) -> Vec<TableId> {
        self.model.tables.iter().map(|t| t.id).collect()
    }

    fn find_table(&self, name: &str) -> Option<TableId> {
        self.tables.get(&NameKey::new(name)).copied()
    }

    fn find_column(&self, table: TableId, name: &str) -> Option<ColumnId> {
        self.columns.get(&(table, NameKey::new(name))).copied()
    }

    /// 存在しなければカタログの不整合としてエラー
    fn require_column(&self, table: TableId, name: &str) -> Result<ColumnId, DatabaseError> {
        self.find_column(table, name)
            .ok_or_else(|| DatabaseError::MissingColumn {
                table: self.model.table(table).name.clone(),
                column: name.to_string(),
            })
    }

    /// 主キー内の位置からカラムを検索
    fn primary_key_column(&self, table: TableId, position: u32) -> Option<ColumnId> {
        self.model
            .table(table)
            .columns
            .iter()
            .find(|c| c.primary_key_ordinal == Some(position))
            .map(|c| ColumnId {
                table,
                index: c.ordinal,
            })
    }
}

/// スキーマ抽出サービス
///
/// インスタンスが保持するのは診断シンクと接続設定のみです。
#[derive(Clone)]
pub struct SchemaExtractor {
    sink: Arc<dyn DiagnosticSink>,
    connection_service: DatabaseConnectionService,
}

impl std::fmt::Debug for SchemaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaExtractor")
            .field("connection_service", &self.connection_service)
            .finish()
    }
}

impl Default for SchemaExtractor {
    fn default() -> Self {
        Self::new(Arc::new(TracingDiagnosticSink))
    }
}

impl SchemaExtractor {
    /// 新しいSchemaExtractorを作成
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            connection_service: DatabaseConnectionService::new(),
        }
    }

    /// 接続サービスを指定
    pub fn with_connection_service(mut self, service: DatabaseConnectionService) -> Self {
        self.connection_service = service;
        self
    }

    /// 接続文字列からスキーマを抽出
    ///
    /// 接続を開き、全フェーズを実行してから接続を閉じます。
    /// 抽出が失敗した場合も接続は閉じられます。
    pub async fn extract(
        &self,
        connection_string: &str,
        selection: &dyn TableSelection,
    ) -> Result<DatabaseModel, DatabaseError> {
        let options = self.connection_service.connect_options(connection_string)?;
        let name = database_name(&options);

        debug!(database = %name, "Opening catalog connection");
        let mut connection = self.connection_service.open(connection_string).await?;

        let result = {
            let mut catalog = SqliteCatalog::new(&mut connection, name);
            self.extract_from_catalog(&mut catalog, selection).await
        };

        let closed = self.connection_service.close(connection).await;
        let model = result?;
        closed?;
        Ok(model)
    }

    /// カタログゲートウェイからスキーマを抽出
    pub async fn extract_from_catalog(
        &self,
        catalog: &mut dyn CatalogReader,
        selection: &dyn TableSelection,
    ) -> Result<DatabaseModel, DatabaseError> {
        let mut workspace = ExtractionWorkspace::new(catalog.data_source());

        self.read_tables(catalog, selection, &mut workspace).await?;
        self.read_index_stubs(catalog, &mut workspace).await?;
        self.read_columns(catalog, &mut workspace).await?;
        self.read_index_details(catalog, &mut workspace).await?;
        self.read_foreign_keys(catalog, &mut workspace).await?;

        debug!(
            database = %workspace.model.database_name,
            tables = workspace.model.table_count(),
            "Schema extraction finished"
        );
        Ok(workspace.model)
    }

    async fn read_tables(
        &self,
        catalog: &mut dyn CatalogReader,
        selection: &dyn TableSelection,
        workspace: &mut ExtractionWorkspace,
    ) -> Result<(), DatabaseError> {
        for name in catalog.list_tables().await? {
            self.sink.emit(ScaffoldEvent::TableFound {
                table: name.clone(),
            });

            if selection.allows(&name) {
                let key = NameKey::new(&name);
                let id = workspace.model.add_table(name);
                workspace.tables.insert(key, id);
            } else {
                self.sink.emit(ScaffoldEvent::TableExcluded { table: name });
            }
        }
        Ok(())
    }

    async fn read_index_stubs(
        &self,
        catalog: &mut dyn CatalogReader,
        workspace: &mut ExtractionWorkspace,
    ) -> Result<(), DatabaseError> {
        for entry in catalog.list_indexes().await? {
            self.sink.emit(ScaffoldEvent::IndexFound {
                index: entry.name.clone(),
                table: entry.table_name.clone(),
            });

            match workspace.find_table(&entry.table_name) {
                Some(id) => workspace
                    .model
                    .table_mut(id)
                    .indexes
                    .push(IndexModel::new(id, entry.name)),
                None => self.sink.emit(ScaffoldEvent::IndexExcluded {
                    index: entry.name,
                    table: entry.table_name,
                }),
            }
        }
        Ok(())
    }

    async fn read_columns(
        &self,
        catalog: &mut dyn CatalogReader,
        workspace: &mut ExtractionWorkspace,
    ) -> Result<(), DatabaseError> {
        for id in workspace.table_ids() {
            let table_name = workspace.model.table(id).name.clone();

            for row in catalog.describe_columns(&table_name).await? {
                let table = workspace.model.table_mut(id);
                self.sink.emit(ScaffoldEvent::ColumnFound {
                    table: table_name.clone(),
                    column: row.name.clone(),
                    data_type: row.declared_type.clone(),
                    ordinal: table.columns.len(),
                    not_null: row.not_null,
                    primary_key_ordinal: row.primary_key_position,
                    default_value: row.default_value.clone(),
                });

                let key = NameKey::new(&row.name);
                let column = table.add_column(
                    row.name,
                    row.declared_type,
                    row.not_null,
                    row.primary_key_position,
                    row.default_value,
                );
                workspace.columns.insert((id, key), column);
            }
        }
        Ok(())
    }

    async fn read_index_details(
        &self,
        catalog: &mut dyn CatalogReader,
        workspace: &mut ExtractionWorkspace,
    ) -> Result<(), DatabaseError> {
        for id in workspace.table_ids() {
            let table_name = workspace.model.table(id).name.clone();

            for flag in catalog.list_index_flags(&table_name).await? {
                if let Some(index) = workspace.model.table_mut(id).find_index_mut(&flag.name) {
                    index.is_unique = flag.is_unique;
                    self.sink.emit(ScaffoldEvent::UniqueIndexFound {
                        index: flag.name,
                        table: table_name.clone(),
                        is_unique: flag.is_unique,
                    });
                }
            }

            let index_names: Vec<String> = workspace
                .model
                .table(id)
                .indexes
                .iter()
                .map(|i| i.name.clone())
                .collect();

            for (position, index_name) in index_names.iter().enumerate() {
                let mut columns = Vec::new();

                for row in catalog.describe_index_columns(index_name).await? {
                    self.sink.emit(ScaffoldEvent::IndexColumnFound {
                        index: index_name.clone(),
                        table: table_name.clone(),
                        column: row.name.clone(),
                        ordinal: row.sequence,
                    });

                    let column_name = match row.name.as_deref() {
                        Some(name) if !name.is_empty() => name,
                        _ => {
                            self.sink.emit(ScaffoldEvent::IndexColumnNameEmpty {
                                index: index_name.clone(),
                                table: table_name.clone(),
                            });
                            continue;
                        }
                    };

                    columns.push(IndexColumnModel {
                        ordinal: row.sequence,
                        column: workspace.require_column(id, column_name)?,
                    });
                }

                workspace.model.table_mut(id).indexes[position].columns = columns;
            }
        }
        Ok(())
    }

    async fn read_foreign_keys(
        &self,
        catalog: &mut dyn CatalogReader,
        workspace: &mut ExtractionWorkspace,
    ) -> Result<(), DatabaseError> {
        for id in workspace.table_ids() {
            let table_name = workspace.model.table(id).name.clone();
            // 制約IDの初出順を保持
            let mut groups: Vec<(i64, ForeignKeyModel)> = Vec::new();

            for row in catalog.describe_foreign_keys(&table_name).await? {
                self.sink.emit(ScaffoldEvent::ForeignKeyColumnFound {
                    table: table_name.clone(),
                    id: row.id,
                    principal_table: row.principal_table.clone(),
                    from_column: row.from_column.clone(),
                    to_column: row.to_column.clone(),
                    on_delete: row.on_delete.clone(),
                    ordinal: row.sequence,
                });

                let position = match groups.iter().position(|(group_id, _)| *group_id == row.id) {
                    Some(position) => position,
                    None => {
                        let principal_table = workspace.find_table(&row.principal_table);
                        if principal_table.is_none() {
                            self.sink.emit(ScaffoldEvent::PrincipalTableNotFound {
                                id: row.id,
                                table: table_name.clone(),
                                principal_table: row.principal_table.clone(),
                            });
                        }

                        groups.push((
                            row.id,
                            ForeignKeyModel {
                                table: id,
                                principal_table,
                                on_delete: ReferentialAction::parse(&row.on_delete),
                                columns: Vec::new(),
                            },
                        ));
                        groups.len() - 1
                    }
                };

                let foreign_key = &mut groups[position].1;
                let column = workspace.require_column(id, &row.from_column)?;
                let principal_column =
                    resolve_principal_column(workspace, foreign_key.principal_table, &row);

                foreign_key.columns.push(ForeignKeyColumnModel {
                    ordinal: row.sequence,
                    column,
                    principal_column,
                });
            }

            let table = workspace.model.table_mut(id);
            for (_, mut foreign_key) in groups {
                foreign_key.columns.sort_by_key(|c| c.ordinal);
                table.foreign_keys.push(foreign_key);
            }
        }
        Ok(())
    }
}

/// 参照先カラムを解決
///
/// 参照先テーブルが選択外ならカラム名だけのプレースホルダーになります。
/// 参照先カラムの指定がない行は、参照先主キーの `seq + 1` 番目を指します。
fn resolve_principal_column(
    workspace: &ExtractionWorkspace,
    principal_table: Option<TableId>,
    row: &RawForeignKeyRow,
) -> PrincipalColumn {
    let Some(principal_table) = principal_table else {
        return PrincipalColumn::Placeholder {
            name: row.to_column.clone(),
        };
    };

    let resolved = match row.to_column.as_deref() {
        Some(name) => workspace.find_column(principal_table, name),
        None => workspace.primary_key_column(principal_table, row.sequence + 1),
    };

    match resolved {
        Some(column) => PrincipalColumn::Resolved(column),
        None => PrincipalColumn::Placeholder {
            name: row.to_column.clone(),
        },
    }
}
