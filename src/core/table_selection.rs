// テーブル選択フィルター
//
// 抽出対象に含めるテーブルを判定する純粋な述語を提供します。

use crate::core::database_model::NameKey;
use std::collections::HashSet;

/// テーブル選択インターフェース
///
/// 発見されたテーブルごとに一度だけ参照されます。副作用を持ってはいけません。
pub trait TableSelection: Send + Sync {
    /// テーブルを抽出対象に含めるかどうか
    fn allows(&self, table_name: &str) -> bool;
}

impl<F> TableSelection for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn allows(&self, table_name: &str) -> bool {
        self(table_name)
    }
}

/// 許可リスト/拒否リストによるテーブル選択
///
/// 許可リストが空の場合はすべてのテーブルを許可します。
/// 拒否リストは許可リストより優先されます。比較は大文字小文字を区別しません。
#[derive(Debug, Clone, Default)]
pub struct TableSelectionSet {
    include: HashSet<NameKey>,
    exclude: HashSet<NameKey>,
}

impl TableSelectionSet {
    /// 新しいTableSelectionSetを作成
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            include: include.into_iter().map(|t| NameKey::new(t.as_ref())).collect(),
            exclude: exclude.into_iter().map(|t| NameKey::new(t.as_ref())).collect(),
        }
    }

    /// すべてのテーブルを許可する選択セット
    pub fn all() -> Self {
        Self::default()
    }

    /// 許可リストが空かどうか
    pub fn includes_everything(&self) -> bool {
        self.include.is_empty()
    }
}

impl TableSelection for TableSelectionSet {
    fn allows(&self, table_name: &str) -> bool {
        let key = NameKey::new(table_name);
        (self.include.is_empty() || self.include.contains(&key)) && !self.exclude.contains(&key)
    }
}
