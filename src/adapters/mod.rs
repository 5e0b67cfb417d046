// Adapters
// データベース接続とカタログ読み取りを抽象化

pub mod catalog;
pub mod command_executor;
pub mod database;
pub mod sql_quote;
pub mod type_mapping;
