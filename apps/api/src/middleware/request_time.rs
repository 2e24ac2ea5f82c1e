//! # リクエスト到着時刻ミドルウェア
//!
//! リクエスト extensions に到着時刻を記録する軽量なタップ。

use axum::{extract::Request, middleware::Next, response::Response};
use chrono::{DateTime, Utc};

/// リクエストの到着時刻
///
/// ハンドラからは `Extension<RequestTime>` で取得できる。
#[derive(Debug, Clone, Copy)]
pub struct RequestTime(pub DateTime<Utc>);

/// リクエストに到着時刻を記録するミドルウェア
pub async fn stamp_request_time(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestTime(Utc::now()));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Json, Router, body::Body, middleware::from_fn, routing::get};
    use tower::ServiceExt as _;

    use super::*;

    #[tokio::test]
    async fn test_到着時刻がextensionsに記録される() {
        let app = Router::new()
            .route(
                "/",
                get(|Extension(time): Extension<RequestTime>| async move {
                    Json(serde_json::json!({ "requested_at": time.0.to_rfc3339() }))
                }),
            )
            .layer(from_fn(stamp_request_time));

        let before = Utc::now();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_success());

        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let stamped: DateTime<Utc> = json["requested_at"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        assert!(stamped >= before);
        assert!(stamped <= Utc::now());
    }
}
