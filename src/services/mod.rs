// Services Layer
// スキーマ抽出と出力変換を行うサービス層

pub mod config_loader;
pub mod model_dto;
pub mod schema_extractor;
