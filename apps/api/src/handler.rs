//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各リソースのハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、検証はドメイン層の値オブジェクトに委譲

pub mod health;
pub mod review;
pub mod tour;
pub mod user;

pub use health::health_check;
pub use review::{ReviewState, create_review, delete_review, get_review, list_reviews};
pub use tour::{TourState, create_tour, delete_tour, get_tour, list_tours, update_tour};
pub use user::{UserState, create_user, delete_user, get_user, list_users, update_user};
