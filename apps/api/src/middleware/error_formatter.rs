//! # 終端エラーフォーマッタ
//!
//! ハンドラ外で生成されたエラーレスポンス（ボディ上限の 413、抽出器の拒否など）を
//! `{ "status": …, "message": … }` エンベロープに整形する。
//!
//! ハンドラが返す [`crate::error::ApiError`] はすでに JSON エンベロープなので
//! 通過させる。レートリミッタの 429 は固定の平文コントラクトであり、
//! こちらも整形しない。
//!
//! ## 契約
//!
//! - このミドルウェアは決して失敗しない
//! - どんな上流のエラーに対しても、ちょうど 1 つのレスポンスを返す
//! - 5xx のメッセージ詳細はサーバーログにのみ残す

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use odyssey_shared::ErrorResponse;

/// 外来エラーレスポンスを読み取る際のボディ上限
const FOREIGN_BODY_LIMIT: usize = 64 * 1024;

/// 終端エラーフォーマッタミドルウェア
pub async fn format_foreign_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    // レートリミッタは固定の平文コントラクト
    if status == StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    // すでにエンベロープ化されたエラー（ApiError 由来）は通過させる
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        return response;
    }

    reshape(response).await
}

/// 平文エラーレスポンスをエンベロープに整形する
async fn reshape(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    let status = parts.status;

    let text = axum::body::to_bytes(body, FOREIGN_BODY_LIMIT)
        .await
        .ok()
        .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
        .filter(|text| !text.trim().is_empty());

    let envelope = if status.is_server_error() {
        // 欠陥: 詳細はログにのみ残す
        if let Some(text) = &text {
            tracing::error!(status = %status, detail = %text, "パイプライン外のサーバーエラー");
        }
        ErrorResponse::internal_error()
    } else {
        let message = text
            .or_else(|| status.canonical_reason().map(|reason| reason.to_string()))
            .unwrap_or_else(|| "リクエストを処理できませんでした".to_string());
        ErrorResponse::from_status(status.as_u16(), message)
    };

    let bytes = serde_json::to_vec(&envelope).unwrap_or_default();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware::from_fn, routing::get};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt as _;

    use super::*;

    fn test_app() -> Router {
        Router::new()
            .route(
                "/plain-error",
                get(|| async { (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported") }),
            )
            .route(
                "/json-error",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        [(header::CONTENT_TYPE, "application/json")],
                        r#"{"status":"fail","message":"not here"}"#,
                    )
                }),
            )
            .route(
                "/limited",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            )
            .route(
                "/server-error",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db exploded: secret") }),
            )
            .layer(from_fn(format_foreign_errors))
    }

    async fn get_json(path: &str) -> (StatusCode, serde_json::Value) {
        let response = test_app()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), FOREIGN_BODY_LIMIT)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_平文エラーがエンベロープに整形される() {
        let (status, json) = get_json("/plain-error").await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "unsupported");
    }

    #[tokio::test]
    async fn test_json済みエラーは変更されない() {
        let (status, json) = get_json("/json-error").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "not here");
    }

    #[tokio::test]
    async fn test_429は平文のまま通過する() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/limited")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = axum::body::to_bytes(response.into_body(), FOREIGN_BODY_LIMIT)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"slow down");
    }

    #[tokio::test]
    async fn test_5xxは詳細を隠して固定メッセージになる() {
        let (status, json) = get_json("/server-error").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Something went very wrong!");
    }
}
