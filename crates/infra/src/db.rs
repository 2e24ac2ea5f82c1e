//! # PostgreSQL データベース接続管理
//!
//! データベース接続プールの作成と管理を行う。
//!
//! ## 設計方針
//!
//! - **接続プール**: 毎回接続を張り直すオーバーヘッドを避け、接続を再利用
//! - **sqlx 採用**: 非同期サポート、マイグレーション埋め込み
//! - **遅延接続**: サーバーはデータベース接続の成立を待たずにリッスンを開始する。
//!   最初の接続確立は起動時の readiness プローブ（[`ping`]）が行い、
//!   失敗はプロセスの致命的エラーチャネルに報告される

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

/// 共通の `PgPoolOptions` を返す
///
/// - `max_connections(10)`: 最大接続数。本番環境では負荷に応じて調整
/// - `acquire_timeout(5秒)`: 接続取得のタイムアウト。超過時はエラー
pub fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
}

/// PostgreSQL 接続プールを作成する（即時接続）
///
/// 最初の接続が確立できるまで待つ。マイグレーションツールやテストなど、
/// 接続成立を前提にできる場面で使用する。
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url).await
}

/// PostgreSQL 接続プールを作成する（遅延接続）
///
/// 接続は最初のクエリ実行時に確立される。アプリケーション起動時は
/// こちらを使用し、接続確認は [`ping`] に委ねる。
pub fn connect_lazy(database_url: &str) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url)
}

/// データベースへの疎通を確認する
///
/// プールから接続を取得して `SELECT 1` を実行する。
/// 起動時の readiness プローブとして使用する。
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// データベースマイグレーションを実行する
///
/// `sqlx::migrate!()` マクロで埋め込まれたマイグレーションファイルを
/// 順番に適用する。適用済みのマイグレーションはスキップされる。
///
/// sqlx が PostgreSQL の advisory lock を使用するため、
/// 複数プロセスから同時に呼び出しても安全。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
