//! # API エラー定義
//!
//! アプリケーションエラーと、HTTP レスポンスへの変換（終端エラーハンドラ）を定義する。
//!
//! ## エラー分類
//!
//! - **運用エラー（operational）**: 想定内の失敗（NotFound、バリデーション等）。
//!   メッセージをそのままクライアントに返してよい。
//! - **欠陥（defect）**: それ以外すべて（DB 障害、プログラミングミス）。
//!   詳細はサーバーログにのみ残し、クライアントには固定メッセージだけを返す。
//!
//! すべてのパイプライン内エラーはこの型に集約され、`IntoResponse` が
//! 唯一のレスポンス整形箇所となる。ハンドラ外で生成されたエラーレスポンスは
//! [`crate::middleware::error_formatter`] が同じエンベロープに整形する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use odyssey_domain::DomainError;
use odyssey_infra::InfraError;
use odyssey_shared::ErrorResponse;
use thiserror::Error;

/// API 層で発生するエラー
///
/// ステータスコード・`status` 分類（4xx = `"fail"` / 5xx = `"error"`）・
/// 運用フラグはバリアントから機械的に決まる。
#[derive(Debug, Error)]
pub enum ApiError {
    /// リソースが見つからない（運用エラー）
    #[error("{0}")]
    NotFound(String),

    /// 不正なリクエスト（運用エラー）
    #[error("{0}")]
    BadRequest(String),

    /// リクエストボディが大きすぎる（運用エラー）
    #[error("{0}")]
    PayloadTooLarge(String),

    /// ドメイン層エラー（運用エラー）
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// インフラ層エラー（欠陥）
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// 内部エラー（欠陥)
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP ステータスコードを返す
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Domain(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Infra(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 運用上想定されるエラーかどうか
    ///
    /// false の場合は欠陥として扱い、メッセージをクライアントに返さない。
    pub fn is_operational(&self) -> bool {
        !matches!(self, ApiError::Infra(_) | ApiError::Internal(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if self.is_operational() {
            ErrorResponse::from_status(status.as_u16(), self.to_string())
        } else {
            // 欠陥: 詳細はサーバーログにのみ残す
            match &self {
                ApiError::Infra(e) => {
                    tracing::error!(error = %e, span_trace = %e.span_trace(), "インフラ層エラー");
                }
                other => {
                    tracing::error!(error = %other, "内部エラー");
                }
            }
            ErrorResponse::internal_error()
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_運用エラーはメッセージをそのまま返す() {
        let error = ApiError::NotFound("Can't find /nope on this server!".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "Can't find /nope on this server!");
    }

    #[tokio::test]
    async fn test_欠陥は固定メッセージだけを返す() {
        let error = ApiError::Internal("接続プールが破棄された".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Something went very wrong!");
    }

    #[tokio::test]
    async fn test_ドメインバリデーションエラーは400になる() {
        let error = ApiError::from(DomainError::Validation("価格が不正".to_string()));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["status"], "fail");
    }

    #[test]
    fn test_運用フラグの分類() {
        assert!(ApiError::NotFound(String::new()).is_operational());
        assert!(ApiError::BadRequest(String::new()).is_operational());
        assert!(ApiError::Domain(DomainError::Validation(String::new())).is_operational());
        assert!(!ApiError::Internal(String::new()).is_operational());
    }
}
