//! # ReviewRepository
//!
//! レビュー情報の永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use odyssey_domain::{
    review::{Rating, Review, ReviewBody, ReviewId},
    tour::TourId,
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// レビューリポジトリトレイト
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// レビュー一覧を取得する
    ///
    /// `tour_id` を指定した場合はそのツアーのレビューのみ返す。
    async fn find_all(&self, tour_id: Option<&TourId>) -> Result<Vec<Review>, InfraError>;

    /// ID でレビューを検索する
    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, InfraError>;

    /// レビューを新規保存する
    async fn insert(&self, review: &Review) -> Result<(), InfraError>;

    /// レビューを削除する
    ///
    /// 対象が存在しない場合は `Ok(false)` を返す。
    async fn delete(&self, id: &ReviewId) -> Result<bool, InfraError>;

    /// ツアーの評価集計（平均と件数）を取得する
    ///
    /// レビューが 1 件も無い場合は `Ok(None)` を返す。
    async fn rating_stats(&self, tour_id: &TourId) -> Result<Option<(f64, i64)>, InfraError>;
}

/// reviews テーブルの行構造体
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    tour_id: Uuid,
    user_id: Uuid,
    body: String,
    rating: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewRow {
    /// 行からドメイン型を復元する
    fn into_review(self) -> Result<Review, InfraError> {
        Ok(Review::from_db(
            ReviewId::from_uuid(self.id),
            TourId::from_uuid(self.tour_id),
            UserId::from_uuid(self.user_id),
            ReviewBody::new(&self.body).map_err(|e| InfraError::unexpected(e.to_string()))?,
            Rating::new(self.rating).map_err(|e| InfraError::unexpected(e.to_string()))?,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// PostgreSQL 実装の ReviewRepository
#[derive(Debug, Clone)]
pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn find_all(&self, tour_id: Option<&TourId>) -> Result<Vec<Review>, InfraError> {
        let rows = match tour_id {
            Some(tour_id) => {
                sqlx::query_as::<_, ReviewRow>(
                    r#"
                    SELECT id, tour_id, user_id, body, rating, created_at, updated_at
                    FROM reviews
                    WHERE tour_id = $1
                    ORDER BY created_at
                    "#,
                )
                .bind(tour_id.as_uuid())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ReviewRow>(
                    r#"
                    SELECT id, tour_id, user_id, body, rating, created_at, updated_at
                    FROM reviews
                    ORDER BY created_at
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(ReviewRow::into_review).collect()
    }

    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, InfraError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, tour_id, user_id, body, rating, created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReviewRow::into_review).transpose()
    }

    async fn insert(&self, review: &Review) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, tour_id, user_id, body, rating, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id().as_uuid())
        .bind(review.tour_id().as_uuid())
        .bind(review.user_id().as_uuid())
        .bind(review.body().as_str())
        .bind(review.rating().as_i16())
        .bind(review.created_at())
        .bind(review.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &ReviewId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rating_stats(&self, tour_id: &TourId) -> Result<Option<(f64, i64)>, InfraError> {
        let row = sqlx::query_as::<_, (Option<f64>, i64)>(
            r#"
            SELECT AVG(rating)::DOUBLE PRECISION, COUNT(*)
            FROM reviews
            WHERE tour_id = $1
            "#,
        )
        .bind(tour_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        let (average, count) = row;
        Ok(average.map(|average| (average, count)))
    }
}
