//! # Odyssey API ライブラリ
//!
//! API サーバーの構成要素（設定・エラー・ライフサイクル・
//! ミドルウェア・ハンドラ）を公開する。
//! 統合テストは [`app_builder::build_app`] で本番と同じ
//! パイプラインを組み立てて検証する。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod middleware;
