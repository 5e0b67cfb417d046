// Core Domain
// データベースモデル、テーブル選択、診断イベント、パラメータとコマンドの純粋なロジック

pub mod command;
pub mod config;
pub mod database_model;
pub mod diagnostics;
pub mod error;
pub mod naming;
pub mod parameter;
pub mod table_selection;
