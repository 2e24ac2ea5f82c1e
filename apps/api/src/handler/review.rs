//! # レビューハンドラ
//!
//! レビューリソースの API を提供する。
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/reviews` - レビュー一覧（`?tour=<id>` で絞り込み）
//! - `POST /api/v1/reviews` - レビュー作成
//! - `GET /api/v1/reviews/{id}` - レビュー取得
//! - `DELETE /api/v1/reviews/{id}` - レビュー削除
//!
//! レビューの作成・削除時にツアーの評価集計
//! （`ratings_average` / `ratings_quantity`）を再計算する。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use odyssey_domain::{
    review::{Rating, Review, ReviewBody, ReviewId},
    tour::TourId,
    user::UserId,
};
use odyssey_infra::repository::{ReviewRepository, TourRepository, UserRepository};
use odyssey_shared::{ApiResponse, ListResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// レビュー API の共有状態
pub struct ReviewState {
    pub review_repository: Arc<dyn ReviewRepository>,
    pub tour_repository:   Arc<dyn TourRepository>,
    pub user_repository:   Arc<dyn UserRepository>,
}

// --- リクエスト/レスポンス型 ---

/// レビュー DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: Uuid,
    pub tour: Uuid,
    pub user: Uuid,
    pub review: String,
    pub rating: i16,
    pub created_at: String,
}

impl From<&Review> for ReviewDto {
    fn from(review: &Review) -> Self {
        Self {
            id: *review.id().as_uuid(),
            tour: *review.tour_id().as_uuid(),
            user: *review.user_id().as_uuid(),
            review: review.body().as_str().to_string(),
            rating: review.rating().as_i16(),
            created_at: review.created_at().to_rfc3339(),
        }
    }
}

/// レビュー一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListReviewsQuery {
    /// 絞り込み対象のツアー ID
    pub tour: Option<Uuid>,
}

/// レビュー作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub tour:   Uuid,
    pub user:   Uuid,
    pub review: String,
    pub rating: i16,
}

// --- ハンドラ ---

/// GET /api/v1/reviews
///
/// レビュー一覧を取得する。`tour` クエリパラメータで絞り込み可能。
pub async fn list_reviews(
    State(state): State<Arc<ReviewState>>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tour_id = query.tour.map(TourId::from_uuid);
    let reviews = state.review_repository.find_all(tour_id.as_ref()).await?;
    let items: Vec<ReviewDto> = reviews.iter().map(ReviewDto::from).collect();

    Ok((StatusCode::OK, Json(ListResponse::new(items))))
}

/// POST /api/v1/reviews
///
/// レビューを作成する。参照先のツアーとユーザーが存在することを検証し、
/// 作成後にツアーの評価集計を再計算する。
pub async fn create_review(
    State(state): State<Arc<ReviewState>>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tour_id = TourId::from_uuid(req.tour);
    let user_id = UserId::from_uuid(req.user);

    let mut tour = state
        .tour_repository
        .find_by_id(&tour_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ツアーが見つかりません: {tour_id}")))?;

    state
        .user_repository
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ユーザーが見つかりません: {user_id}")))?;

    let review = Review::new(
        ReviewId::new(),
        tour_id,
        user_id,
        ReviewBody::new(req.review)?,
        Rating::new(req.rating)?,
        chrono::Utc::now(),
    );

    state.review_repository.insert(&review).await?;

    // 評価集計の再計算
    if let Some((average, quantity)) = state.review_repository.rating_stats(&tour_id).await? {
        tour.set_ratings(average, quantity as i32, chrono::Utc::now());
        state.tour_repository.update(&tour).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ReviewDto::from(&review))),
    ))
}

/// GET /api/v1/reviews/{id}
///
/// レビューを取得する。
pub async fn get_review(
    State(state): State<Arc<ReviewState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = ReviewId::from_uuid(id);
    let review = state
        .review_repository
        .find_by_id(&review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("レビューが見つかりません: {review_id}")))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(ReviewDto::from(&review))),
    ))
}

/// DELETE /api/v1/reviews/{id}
///
/// レビューを削除し、ツアーの評価集計を再計算する。
pub async fn delete_review(
    State(state): State<Arc<ReviewState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = ReviewId::from_uuid(id);
    let review = state
        .review_repository
        .find_by_id(&review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("レビューが見つかりません: {review_id}")))?;

    state.review_repository.delete(&review_id).await?;

    // 評価集計の再計算（レビューが無くなった場合は初期値に戻す）
    if let Some(mut tour) = state.tour_repository.find_by_id(review.tour_id()).await? {
        let (average, quantity) = state
            .review_repository
            .rating_stats(review.tour_id())
            .await?
            .unwrap_or((4.5, 0));
        tour.set_ratings(average, quantity as i32, chrono::Utc::now());
        state.tour_repository.update(&tour).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}
