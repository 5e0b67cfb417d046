// 診断イベント
//
// スキーマ抽出中に発生するイベントと、その受け取り先（シンク）を定義します。
// メッセージの整形はシンク側の責務です。

use std::sync::Mutex;
use tracing::{trace, warn};

/// イベントの重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    /// 詳細トレース
    Trace,
    /// 警告（抽出は継続）
    Warning,
}

/// スキャフォールド診断イベント
#[derive(Debug, Clone, PartialEq)]
pub enum ScaffoldEvent {
    TableFound {
        table: String,
    },
    TableExcluded {
        table: String,
    },
    IndexFound {
        index: String,
        table: String,
    },
    IndexExcluded {
        index: String,
        table: String,
    },
    ColumnFound {
        table: String,
        column: String,
        data_type: String,
        ordinal: usize,
        not_null: bool,
        primary_key_ordinal: u32,
        default_value: Option<String>,
    },
    UniqueIndexFound {
        index: String,
        table: String,
        is_unique: bool,
    },
    IndexColumnFound {
        index: String,
        table: String,
        column: Option<String>,
        ordinal: u32,
    },
    /// 式インデックスなど、カラム名を持たないインデックスメンバー
    IndexColumnNameEmpty {
        index: String,
        table: String,
    },
    ForeignKeyColumnFound {
        table: String,
        id: i64,
        principal_table: String,
        from_column: String,
        to_column: Option<String>,
        on_delete: String,
        ordinal: u32,
    },
    PrincipalTableNotFound {
        id: i64,
        table: String,
        principal_table: String,
    },
}

impl ScaffoldEvent {
    /// イベント名
    pub fn name(&self) -> &'static str {
        match self {
            ScaffoldEvent::TableFound { .. } => "TableFound",
            ScaffoldEvent::TableExcluded { .. } => "TableExcluded",
            ScaffoldEvent::IndexFound { .. } => "IndexFound",
            ScaffoldEvent::IndexExcluded { .. } => "IndexExcluded",
            ScaffoldEvent::ColumnFound { .. } => "ColumnFound",
            ScaffoldEvent::UniqueIndexFound { .. } => "UniqueIndexFound",
            ScaffoldEvent::IndexColumnFound { .. } => "IndexColumnFound",
            ScaffoldEvent::IndexColumnNameEmpty { .. } => "IndexColumnNameEmpty",
            ScaffoldEvent::ForeignKeyColumnFound { .. } => "ForeignKeyColumnFound",
            ScaffoldEvent::PrincipalTableNotFound { .. } => "PrincipalTableNotFound",
        }
    }

    /// イベントの重要度
    pub fn severity(&self) -> EventSeverity {
        match self {
            ScaffoldEvent::IndexColumnNameEmpty { .. } => EventSeverity::Warning,
            _ => EventSeverity::Trace,
        }
    }
}

/// 診断イベントの受け取り先
pub trait DiagnosticSink: Send + Sync {
    /// イベントを受け取る
    fn emit(&self, event: ScaffoldEvent);
}

/// tracing へイベントを出力するシンク
#[derive(Debug, Clone, Default)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn emit(&self, event: ScaffoldEvent) {
        let name = event.name();
        match event {
            ScaffoldEvent::TableFound { table } => trace!(event = name, %table, "Found table"),
            ScaffoldEvent::TableExcluded { table } => {
                trace!(event = name, %table, "Table is not in the selection set, skipping")
            }
            ScaffoldEvent::IndexFound { index, table } => {
                trace!(event = name, %index, %table, "Found index")
            }
            ScaffoldEvent::IndexExcluded { index, table } => trace!(
                event = name,
                %index,
                %table,
                "Index belongs to a table outside the selection set, skipping"
            ),
            ScaffoldEvent::ColumnFound {
                table,
                column,
                data_type,
                ordinal,
                not_null,
                primary_key_ordinal,
                default_value,
            } => trace!(
                event = name,
                %table,
                %column,
                %data_type,
                ordinal,
                not_null,
                primary_key_ordinal,
                default_value = ?default_value,
                "Found column"
            ),
            ScaffoldEvent::UniqueIndexFound {
                index,
                table,
                is_unique,
            } => trace!(event = name, %index, %table, is_unique, "Found index flags"),
            ScaffoldEvent::IndexColumnFound {
                index,
                table,
                column,
                ordinal,
            } => trace!(
                event = name,
                %index,
                %table,
                column = ?column,
                ordinal,
                "Found index column"
            ),
            ScaffoldEvent::IndexColumnNameEmpty { index, table } => warn!(
                event = name,
                %index,
                %table,
                "Found an index column without a name (expression index?), skipping it"
            ),
            ScaffoldEvent::ForeignKeyColumnFound {
                table,
                id,
                principal_table,
                from_column,
                to_column,
                on_delete,
                ordinal,
            } => trace!(
                event = name,
                %table,
                id,
                %principal_table,
                %from_column,
                to_column = ?to_column,
                %on_delete,
                ordinal,
                "Found foreign key column"
            ),
            ScaffoldEvent::PrincipalTableNotFound {
                id,
                table,
                principal_table,
            } => trace!(
                event = name,
                id,
                %table,
                %principal_table,
                "Principal table of foreign key is not in the selection set"
            ),
        }
    }
}

/// イベントをメモリに蓄積するシンク
#[derive(Debug, Default)]
pub struct MemoryDiagnosticSink {
    events: Mutex<Vec<ScaffoldEvent>>,
}

impl MemoryDiagnosticSink {
    /// 新しいMemoryDiagnosticSinkを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 蓄積したイベントのスナップショット（発生順）
    pub fn events(&self) -> Vec<ScaffoldEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// 指定した名前のイベント数
    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl DiagnosticSink for MemoryDiagnosticSink {
    fn emit(&self, event: ScaffoldEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// 複数のシンクへ同じイベントを配信するシンク
pub struct FanOutDiagnosticSink {
    sinks: Vec<std::sync::Arc<dyn DiagnosticSink>>,
}

impl FanOutDiagnosticSink {
    /// 新しいFanOutDiagnosticSinkを作成
    pub fn new(sinks: Vec<std::sync::Arc<dyn DiagnosticSink>>) -> Self {
        Self { sinks }
    }
}

impl DiagnosticSink for FanOutDiagnosticSink {
    fn emit(&self, event: ScaffoldEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}
