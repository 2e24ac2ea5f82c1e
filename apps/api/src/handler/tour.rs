//! # ツアーハンドラ
//!
//! ツアーリソースの CRUD API を提供する。
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/tours` - ツアー一覧
//! - `POST /api/v1/tours` - ツアー作成
//! - `GET /api/v1/tours/{id}` - ツアー取得
//! - `PATCH /api/v1/tours/{id}` - ツアー更新
//! - `DELETE /api/v1/tours/{id}` - ツアー削除

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use odyssey_domain::tour::{Difficulty, Tour, TourId, TourName, TourUpdate};
use odyssey_infra::repository::TourRepository;
use odyssey_shared::{ApiResponse, ListResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// ツアー API の共有状態
pub struct TourState {
    pub tour_repository: Arc<dyn TourRepository>,
}

// --- リクエスト/レスポンス型 ---

/// ツアー DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDto {
    pub id: Uuid,
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub price: f64,
    pub summary: Option<String>,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Tour> for TourDto {
    fn from(tour: &Tour) -> Self {
        Self {
            id: *tour.id().as_uuid(),
            name: tour.name().as_str().to_string(),
            duration: tour.duration_days(),
            max_group_size: tour.max_group_size(),
            difficulty: tour.difficulty().to_string(),
            price: tour.price(),
            summary: tour.summary().map(|s| s.to_string()),
            ratings_average: tour.ratings_average(),
            ratings_quantity: tour.ratings_quantity(),
            created_at: tour.created_at().to_rfc3339(),
            updated_at: tour.updated_at().to_rfc3339(),
        }
    }
}

/// ツアー作成リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourRequest {
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub price: f64,
    pub summary: Option<String>,
}

/// ツアー更新リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourRequest {
    pub name: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<String>,
    pub price: Option<f64>,
    pub summary: Option<String>,
}

// --- ハンドラ ---

/// GET /api/v1/tours
///
/// ツアー一覧を取得する。
pub async fn list_tours(
    State(state): State<Arc<TourState>>,
) -> Result<impl IntoResponse, ApiError> {
    let tours = state.tour_repository.find_all().await?;
    let items: Vec<TourDto> = tours.iter().map(TourDto::from).collect();

    Ok((StatusCode::OK, Json(ListResponse::new(items))))
}

/// POST /api/v1/tours
///
/// ツアーを作成する。
///
/// ## レスポンス
///
/// - `201 Created`: 作成されたツアー
/// - `400 Bad Request`: バリデーション失敗
pub async fn create_tour(
    State(state): State<Arc<TourState>>,
    Json(req): Json<CreateTourRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tour = Tour::new(
        TourId::new(),
        TourName::new(req.name)?,
        req.duration,
        req.max_group_size,
        req.difficulty.parse::<Difficulty>()?,
        req.price,
        req.summary,
        chrono::Utc::now(),
    )?;

    state.tour_repository.insert(&tour).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(TourDto::from(&tour)))))
}

/// GET /api/v1/tours/{id}
///
/// ツアーを取得する。
pub async fn get_tour(
    State(state): State<Arc<TourState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tour_id = TourId::from_uuid(id);
    let tour = state
        .tour_repository
        .find_by_id(&tour_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ツアーが見つかりません: {tour_id}")))?;

    Ok((StatusCode::OK, Json(ApiResponse::new(TourDto::from(&tour)))))
}

/// PATCH /api/v1/tours/{id}
///
/// ツアーを部分更新する。
pub async fn update_tour(
    State(state): State<Arc<TourState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTourRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tour_id = TourId::from_uuid(id);
    let mut tour = state
        .tour_repository
        .find_by_id(&tour_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ツアーが見つかりません: {tour_id}")))?;

    let update = TourUpdate {
        name: req.name.map(TourName::new).transpose()?,
        duration_days: req.duration,
        max_group_size: req.max_group_size,
        difficulty: req
            .difficulty
            .map(|d| d.parse::<Difficulty>())
            .transpose()?,
        price: req.price,
        summary: req.summary,
    };
    tour.apply_update(update, chrono::Utc::now())?;

    state.tour_repository.update(&tour).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(TourDto::from(&tour)))))
}

/// DELETE /api/v1/tours/{id}
///
/// ツアーを削除する。
///
/// ## レスポンス
///
/// - `204 No Content`: 削除成功
/// - `404 Not Found`: ツアーが見つからない
pub async fn delete_tour(
    State(state): State<Arc<TourState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tour_id = TourId::from_uuid(id);
    let deleted = state.tour_repository.delete(&tour_id).await?;

    if !deleted {
        return Err(ApiError::NotFound(format!(
            "ツアーが見つかりません: {tour_id}"
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
