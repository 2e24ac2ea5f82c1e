//! # リポジトリ
//!
//! リソースごとの永続化操作を trait として定義し、
//! PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: ハンドラは `Arc<dyn …Repository>` 経由で利用し、
//!   テストではモック実装に差し替え可能
//! - **行構造体**: `sqlx::FromRow` の行構造体を経由してドメイン型に復元する。
//!   復元失敗は `InfraError::unexpected` として欠陥扱い

pub mod review_repository;
pub mod tour_repository;
pub mod user_repository;

pub use review_repository::{PostgresReviewRepository, ReviewRepository};
pub use tour_repository::{PostgresTourRepository, TourRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
