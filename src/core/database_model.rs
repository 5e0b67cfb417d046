// データベースモデル
//
// カタログから再構築されたテーブル・カラム・インデックス・外部キーの
// インメモリ表現を提供します。
// テーブルは DatabaseModel が所有し、相互参照は TableId / ColumnId で表します。

use serde::Serialize;
use std::fmt;

/// 大文字小文字を区別しない名前キー
///
/// 名前による相互参照はすべてこのキーで行います。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameKey(String);

impl NameKey {
    /// 名前を正規化してキーを作成
    pub fn new(name: &str) -> Self {
        NameKey(name.to_lowercase())
    }

    /// 正規化済みの文字列
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// テーブルID（DatabaseModel::tables 内の位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableId(pub usize);

/// カラムID（テーブルとテーブル内の位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnId {
    /// 所属テーブル
    pub table: TableId,
    /// TableModel::columns 内の位置
    pub index: usize,
}

/// 参照アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferentialAction {
    /// カタログの ON DELETE 文字列を変換
    ///
    /// 大文字小文字を区別しません。認識できない文字列は None になります。
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim().to_uppercase().as_str() {
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET NULL" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" => Some(ReferentialAction::SetDefault),
            "NO ACTION" => Some(ReferentialAction::NoAction),
            _ => None,
        }
    }

    /// SQLキーワード表現
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// データベースモデル
///
/// 抽出呼び出しごとに新しく構築され、テーブルは発見順に並びます。
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseModel {
    /// データベース名
    pub database_name: String,
    /// テーブル（発見順）
    pub tables: Vec<TableModel>,
}

impl DatabaseModel {
    /// 新しいDatabaseModelを作成
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            tables: Vec::new(),
        }
    }

    /// テーブルを追加してIDを返す
    pub fn add_table(&mut self, name: impl Into<String>) -> TableId {
        let id = TableId(self.tables.len());
        self.tables.push(TableModel::new(id, name));
        id
    }

    /// IDからテーブルを取得
    pub fn table(&self, id: TableId) -> &TableModel {
        &self.tables[id.0]
    }

    /// IDからテーブルを可変で取得
    pub fn table_mut(&mut self, id: TableId) -> &mut TableModel {
        &mut self.tables[id.0]
    }

    /// IDからカラムを取得
    pub fn column(&self, id: ColumnId) -> &ColumnModel {
        &self.tables[id.table.0].columns[id.index]
    }

    /// 名前でテーブルを検索（大文字小文字を区別しない）
    pub fn find_table(&self, name: &str) -> Option<&TableModel> {
        let key = NameKey::new(name);
        self.tables.iter().find(|t| NameKey::new(&t.name) == key)
    }

    /// テーブル数
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// テーブルモデル
#[derive(Debug, Clone, Serialize)]
pub struct TableModel {
    /// 自身のID
    pub id: TableId,
    /// テーブル名
    pub name: String,
    /// カラム（定義順）
    pub columns: Vec<ColumnModel>,
    /// インデックス（発見順）
    pub indexes: Vec<IndexModel>,
    /// 外部キー（制約IDの初出順）
    pub foreign_keys: Vec<ForeignKeyModel>,
}

impl TableModel {
    fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// カラムを追加してIDを返す
    ///
    /// 序数はテーブル内の追加順で 0 から密に採番されます。
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
        not_null: bool,
        primary_key_ordinal: u32,
        default_value: Option<String>,
    ) -> ColumnId {
        let index = self.columns.len();
        self.columns.push(ColumnModel {
            table: self.id,
            name: name.into(),
            data_type: data_type.into(),
            ordinal: index,
            // 主キーに含まれるカラムは NOT NULL 宣言の有無によらず非NULL扱い
            is_nullable: !not_null && primary_key_ordinal == 0,
            primary_key_ordinal: (primary_key_ordinal != 0).then_some(primary_key_ordinal),
            default_value,
        });
        ColumnId {
            table: self.id,
            index,
        }
    }

    /// 名前でカラムを検索（大文字小文字を区別しない）
    pub fn find_column(&self, name: &str) -> Option<&ColumnModel> {
        let key = NameKey::new(name);
        self.columns.iter().find(|c| NameKey::new(&c.name) == key)
    }

    /// 名前でインデックスを検索（大文字小文字を区別しない）
    pub fn find_index_mut(&mut self, name: &str) -> Option<&mut IndexModel> {
        let key = NameKey::new(name);
        self.indexes.iter_mut().find(|i| NameKey::new(&i.name) == key)
    }

    /// 主キーカラム（主キー内の位置順）
    pub fn primary_key(&self) -> Vec<&ColumnModel> {
        let mut columns: Vec<&ColumnModel> = self
            .columns
            .iter()
            .filter(|c| c.primary_key_ordinal.is_some())
            .collect();
        columns.sort_by_key(|c| c.primary_key_ordinal);
        columns
    }
}

/// カラムモデル
#[derive(Debug, Clone, Serialize)]
pub struct ColumnModel {
    /// 所属テーブル
    pub table: TableId,
    /// カラム名
    pub name: String,
    /// カタログ上の型文字列
    pub data_type: String,
    /// テーブル内の序数（0始まり）
    pub ordinal: usize,
    /// NULL許可フラグ
    pub is_nullable: bool,
    /// 主キー内の位置（1始まり）、主キーでない場合はNone
    pub primary_key_ordinal: Option<u32>,
    /// デフォルト値（リテラルまたは式のテキスト）
    pub default_value: Option<String>,
}

/// インデックスモデル
#[derive(Debug, Clone, Serialize)]
pub struct IndexModel {
    /// 所属テーブル
    pub table: TableId,
    /// インデックス名
    pub name: String,
    /// ユニークフラグ
    pub is_unique: bool,
    /// インデックスカラム
    pub columns: Vec<IndexColumnModel>,
}

impl IndexModel {
    /// カラム未設定のインデックスを作成
    pub fn new(table: TableId, name: impl Into<String>) -> Self {
        Self {
            table,
            name: name.into(),
            is_unique: false,
            columns: Vec::new(),
        }
    }
}

/// インデックスカラムモデル
#[derive(Debug, Clone, Serialize)]
pub struct IndexColumnModel {
    /// インデックス内の位置
    pub ordinal: u32,
    /// 対象カラム
    pub column: ColumnId,
}

/// 外部キーモデル
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyModel {
    /// 依存側テーブル
    pub table: TableId,
    /// 参照先テーブル（選択外または未発見の場合はNone）
    pub principal_table: Option<TableId>,
    /// 削除時アクション（認識できない場合はNone）
    pub on_delete: Option<ReferentialAction>,
    /// 外部キーカラム（シーケンス番号順）
    pub columns: Vec<ForeignKeyColumnModel>,
}

impl ForeignKeyModel {
    /// 参照先テーブルを取得
    pub fn principal_table<'m>(&self, model: &'m DatabaseModel) -> Option<&'m TableModel> {
        self.principal_table.map(|id| model.table(id))
    }
}

/// 外部キーカラムモデル
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyColumnModel {
    /// 複合キー内の位置
    pub ordinal: u32,
    /// 依存側カラム
    pub column: ColumnId,
    /// 参照先カラム
    pub principal_column: PrincipalColumn,
}

/// 参照先カラム
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PrincipalColumn {
    /// 参照先テーブルで解決できたカラム
    Resolved(ColumnId),
    /// 解決できなかったカラム（名前のみ）
    Placeholder { name: Option<String> },
}

impl PrincipalColumn {
    /// 参照先カラム名を取得
    pub fn name<'m>(&'m self, model: &'m DatabaseModel) -> Option<&'m str> {
        match self {
            PrincipalColumn::Resolved(id) => Some(model.column(*id).name.as_str()),
            PrincipalColumn::Placeholder { name } => name.as_deref(),
        }
    }

    /// 解決済みかどうか
    pub fn is_resolved(&self) -> bool {
        matches!(self, PrincipalColumn::Resolved(_))
    }
}
