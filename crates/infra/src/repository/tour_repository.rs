//! # TourRepository
//!
//! ツアー情報の永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use odyssey_domain::tour::{Difficulty, Tour, TourId, TourName};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// ツアーリポジトリトレイト
///
/// ツアー情報の永続化操作を定義する。
/// インフラ層で具体的な実装を提供し、ハンドラから利用する。
#[async_trait]
pub trait TourRepository: Send + Sync {
    /// ツアー一覧を作成日時の昇順で取得する
    async fn find_all(&self) -> Result<Vec<Tour>, InfraError>;

    /// ID でツアーを検索する
    ///
    /// # 戻り値
    ///
    /// - `Ok(Some(tour))`: ツアーが見つかった場合
    /// - `Ok(None)`: ツアーが見つからない場合
    /// - `Err(_)`: データベースエラー
    async fn find_by_id(&self, id: &TourId) -> Result<Option<Tour>, InfraError>;

    /// ツアーを新規保存する
    async fn insert(&self, tour: &Tour) -> Result<(), InfraError>;

    /// ツアーを更新する
    ///
    /// 対象が存在しない場合は `Ok(false)` を返す。
    async fn update(&self, tour: &Tour) -> Result<bool, InfraError>;

    /// ツアーを削除する
    ///
    /// 対象が存在しない場合は `Ok(false)` を返す。
    async fn delete(&self, id: &TourId) -> Result<bool, InfraError>;
}

/// tours テーブルの行構造体
#[derive(Debug, sqlx::FromRow)]
struct TourRow {
    id: Uuid,
    name: String,
    duration_days: i32,
    max_group_size: i32,
    difficulty: String,
    price: f64,
    summary: Option<String>,
    ratings_average: f64,
    ratings_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TourRow {
    /// 行からドメイン型を復元する
    fn into_tour(self) -> Result<Tour, InfraError> {
        Ok(Tour::from_db(
            TourId::from_uuid(self.id),
            TourName::new(&self.name).map_err(|e| InfraError::unexpected(e.to_string()))?,
            self.duration_days,
            self.max_group_size,
            self.difficulty
                .parse::<Difficulty>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            self.price,
            self.summary,
            self.ratings_average,
            self.ratings_quantity,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// PostgreSQL 実装の TourRepository
#[derive(Debug, Clone)]
pub struct PostgresTourRepository {
    pool: PgPool,
}

impl PostgresTourRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TourRepository for PostgresTourRepository {
    async fn find_all(&self) -> Result<Vec<Tour>, InfraError> {
        let rows = sqlx::query_as::<_, TourRow>(
            r#"
            SELECT
                id, name, duration_days, max_group_size, difficulty,
                price, summary, ratings_average, ratings_quantity,
                created_at, updated_at
            FROM tours
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TourRow::into_tour).collect()
    }

    async fn find_by_id(&self, id: &TourId) -> Result<Option<Tour>, InfraError> {
        let row = sqlx::query_as::<_, TourRow>(
            r#"
            SELECT
                id, name, duration_days, max_group_size, difficulty,
                price, summary, ratings_average, ratings_quantity,
                created_at, updated_at
            FROM tours
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TourRow::into_tour).transpose()
    }

    async fn insert(&self, tour: &Tour) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO tours (
                id, name, duration_days, max_group_size, difficulty,
                price, summary, ratings_average, ratings_quantity,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(tour.id().as_uuid())
        .bind(tour.name().as_str())
        .bind(tour.duration_days())
        .bind(tour.max_group_size())
        .bind(tour.difficulty().to_string())
        .bind(tour.price())
        .bind(tour.summary())
        .bind(tour.ratings_average())
        .bind(tour.ratings_quantity())
        .bind(tour.created_at())
        .bind(tour.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, tour: &Tour) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE tours
            SET name = $2,
                duration_days = $3,
                max_group_size = $4,
                difficulty = $5,
                price = $6,
                summary = $7,
                ratings_average = $8,
                ratings_quantity = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(tour.id().as_uuid())
        .bind(tour.name().as_str())
        .bind(tour.duration_days())
        .bind(tour.max_group_size())
        .bind(tour.difficulty().to_string())
        .bind(tour.price())
        .bind(tour.summary())
        .bind(tour.ratings_average())
        .bind(tour.ratings_quantity())
        .bind(tour.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &TourId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
