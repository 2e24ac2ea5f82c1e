//! # ユーザーハンドラ
//!
//! ユーザーリソースの CRUD API を提供する。
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/users` - アクティブユーザー一覧
//! - `POST /api/v1/users` - ユーザー作成
//! - `GET /api/v1/users/{id}` - ユーザー取得
//! - `PATCH /api/v1/users/{id}` - ユーザー更新
//! - `DELETE /api/v1/users/{id}` - ユーザー削除

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use odyssey_domain::user::{Email, User, UserId, UserName, UserRole, UserUpdate};
use odyssey_infra::repository::UserRepository;
use odyssey_shared::{ApiResponse, ListResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// ユーザー API の共有状態
pub struct UserState {
    pub user_repository: Arc<dyn UserRepository>,
}

// --- リクエスト/レスポンス型 ---

/// ユーザー DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub created_at: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            name: user.name().as_str().to_string(),
            email: user.email().as_str().to_string(),
            role: user.role().to_string(),
            active: user.is_active(),
            created_at: user.created_at().to_rfc3339(),
        }
    }
}

/// ユーザー作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name:  String,
    pub email: String,
    pub role:  Option<String>,
}

/// ユーザー更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name:   Option<String>,
    pub email:  Option<String>,
    pub role:   Option<String>,
    pub active: Option<bool>,
}

// --- ハンドラ ---

/// GET /api/v1/users
///
/// アクティブユーザー一覧を取得する。
pub async fn list_users(
    State(state): State<Arc<UserState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.user_repository.find_all_active().await?;
    let items: Vec<UserDto> = users.iter().map(UserDto::from).collect();

    Ok((StatusCode::OK, Json(ListResponse::new(items))))
}

/// POST /api/v1/users
///
/// ユーザーを作成する。`role` を省略すると一般ユーザーになる。
pub async fn create_user(
    State(state): State<Arc<UserState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = match req.role {
        Some(role) => role.parse::<UserRole>()?,
        None => UserRole::User,
    };

    let user = User::new(
        UserId::new(),
        UserName::new(req.name)?,
        Email::new(req.email)?,
        role,
        chrono::Utc::now(),
    );

    state.user_repository.insert(&user).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(UserDto::from(&user)))))
}

/// GET /api/v1/users/{id}
///
/// ユーザーを取得する。
pub async fn get_user(
    State(state): State<Arc<UserState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from_uuid(id);
    let user = state
        .user_repository
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ユーザーが見つかりません: {user_id}")))?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from(&user)))))
}

/// PATCH /api/v1/users/{id}
///
/// ユーザーを部分更新する。
pub async fn update_user(
    State(state): State<Arc<UserState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from_uuid(id);
    let mut user = state
        .user_repository
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ユーザーが見つかりません: {user_id}")))?;

    let update = UserUpdate {
        name:   req.name.map(UserName::new).transpose()?,
        email:  req.email.map(Email::new).transpose()?,
        role:   req.role.map(|r| r.parse::<UserRole>()).transpose()?,
        active: req.active,
    };
    user.apply_update(update, chrono::Utc::now());

    state.user_repository.update(&user).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(UserDto::from(&user)))))
}

/// DELETE /api/v1/users/{id}
///
/// ユーザーを削除する。
pub async fn delete_user(
    State(state): State<Arc<UserState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from_uuid(id);
    let deleted = state.user_repository.delete(&user_id).await?;

    if !deleted {
        return Err(ApiError::NotFound(format!(
            "ユーザーが見つかりません: {user_id}"
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
