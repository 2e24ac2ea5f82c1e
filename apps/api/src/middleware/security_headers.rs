//! # セキュリティヘッダーミドルウェア
//!
//! すべてのレスポンスに固定のセキュリティヘッダーを付与する。

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// レスポンスにセキュリティヘッダーを付与する
///
/// 付与するヘッダー:
///
/// | ヘッダー | 値 |
/// |---------|-----|
/// | `X-DNS-Prefetch-Control` | `off` |
/// | `X-Frame-Options` | `SAMEORIGIN` |
/// | `Strict-Transport-Security` | `max-age=15552000; includeSubDomains` |
/// | `X-Download-Options` | `noopen` |
/// | `X-Content-Type-Options` | `nosniff` |
/// | `X-XSS-Protection` | `1; mode=block` |
pub async fn set_security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_DNS_PREFETCH_CONTROL,
        HeaderValue::from_static("off"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=15552000; includeSubDomains"),
    );
    headers.insert(
        HeaderName::from_static("x-download-options"),
        HeaderValue::from_static("noopen"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );

    response
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt as _;

    use super::*;

    fn test_app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn(set_security_headers))
    }

    #[tokio::test]
    async fn test_全セキュリティヘッダーが付与される() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["x-dns-prefetch-control"], "off");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(
            headers["strict-transport-security"],
            "max-age=15552000; includeSubDomains"
        );
        assert_eq!(headers["x-download-options"], "noopen");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
    }
}
