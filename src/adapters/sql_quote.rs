// SQL識別子クォートユーティリティ
//
// PRAGMAなど、パラメータを使えない箇所に埋め込む識別子と文字列をエスケープします。

/// SQLite用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use stratum_scaffold::adapters::sql_quote::quote_identifier;
/// assert_eq!(quote_identifier("users"), r#""users""#);
/// assert_eq!(quote_identifier(r#"table"name"#), r#""table""name""#);
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// PRAGMA関数呼び出しを組み立てる
///
/// 例: `pragma_call("table_info", "users")` → `PRAGMA table_info("users")`
pub fn pragma_call(pragma: &str, target: &str) -> String {
    format!("PRAGMA {}({})", pragma, quote_identifier(target))
}
