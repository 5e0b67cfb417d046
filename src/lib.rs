// Stratum Scaffoldライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（データベースモデル、テーブル選択、診断イベント、パラメータとコマンド）
// - adapters: データベース接続とカタログ読み取り、コマンド実行
// - services: スキーマ抽出と出力変換

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
