//! # 入力サニタイズミドルウェア
//!
//! インジェクション系ペイロードに対して、独立した 2 つのパスで
//! JSON ボディとクエリ文字列を無害化する:
//!
//! 1. **クエリ演算子の除去**: `$` で始まる、または `.` を含むキーを
//!    オブジェクトから再帰的に取り除く
//! 2. **スクリプトの除去**: `<script>` 要素とインライン `on*=` 属性を
//!    文字列値から取り除く
//!
//! どちらのパスも冪等であること（無害化済みの入力をもう一度通しても
//! 結果が変わらないこと）を保証する。除去によってタグが再構成される
//! 入力があるため、スクリプト除去は固定点に達するまで繰り返す。

use std::sync::LazyLock;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, header, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use url::form_urlencoded;

use crate::{config::BODY_LIMIT_BYTES, error::ApiError};

/// `<script …>…</script>` 要素にマッチする正規表現
static SCRIPT_ELEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());

/// 閉じタグを持たない `<script …>` 開始タグにマッチする正規表現
static SCRIPT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?script\b[^>]*>").unwrap());

/// インラインイベントハンドラ属性（`onclick=` 等）にマッチする正規表現
static EVENT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\son\w+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap());

/// 入力サニタイズミドルウェア
///
/// クエリ文字列と JSON ボディの両方に 2 つのパスを適用する。
/// JSON として解釈できないボディはそのまま通す（後段の抽出器が拒否する）。
pub async fn sanitize_request(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    // クエリ文字列の無害化
    if let Some(query) = parts.uri.query() {
        let sanitized = sanitize_query(query);
        if sanitized != query
            && let Some(uri) = rewrite_query(&parts.uri, &sanitized)
        {
            parts.uri = uri;
        }
    }

    // JSON ボディの無害化
    let is_json = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let body = if is_json {
        let bytes = match axum::body::to_bytes(body, BODY_LIMIT_BYTES).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return ApiError::PayloadTooLarge(
                    "リクエストボディが上限サイズを超えています".to_string(),
                )
                .into_response();
            }
        };

        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(mut value) => {
                sanitize_value(&mut value);
                let sanitized =
                    serde_json::to_vec(&value).unwrap_or_else(|_| bytes.to_vec());
                parts
                    .headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(sanitized.len()));
                Body::from(sanitized)
            }
            Err(_) => Body::from(bytes),
        }
    } else {
        body
    };

    next.run(Request::from_parts(parts, body)).await
}

/// クエリ演算子キーかどうか
fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// JSON 値を再帰的に無害化する
///
/// オブジェクトから演算子キーを取り除き、文字列値からスクリプトを除去する。
fn sanitize_value(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|key, _| !is_operator_key(key));
            for child in map.values_mut() {
                sanitize_value(child);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                sanitize_value(item);
            }
        }
        serde_json::Value::String(s) => {
            let cleaned = strip_scripts(s);
            if cleaned != *s {
                *s = cleaned;
            }
        }
        _ => {}
    }
}

/// クエリ文字列を無害化する
///
/// 演算子キーのパラメータを取り除き、値からスクリプトを除去する。
fn sanitize_query(query: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if is_operator_key(&key) {
            continue;
        }
        serializer.append_pair(&key, &strip_scripts(&value));
    }
    serializer.finish()
}

/// 文字列からスクリプト要素とイベントハンドラ属性を除去する
///
/// 1 回の除去で新たなタグが再構成される入力があるため、
/// 固定点に達するまで繰り返す。これにより冪等性が保証される。
fn strip_scripts(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let pass = SCRIPT_ELEMENT_RE.replace_all(&current, "");
        let pass = SCRIPT_TAG_RE.replace_all(&pass, "");
        let pass = EVENT_ATTR_RE.replace_all(&pass, "").into_owned();

        if pass == current {
            return current;
        }
        current = pass;
    }
}

/// URI のクエリ部分を差し替える
fn rewrite_query(uri: &axum::http::Uri, query: &str) -> Option<axum::http::Uri> {
    let path = uri.path();
    let path_and_query = if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    axum::http::Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // ===== 演算子キー除去テスト =====

    #[test]
    fn test_演算子キーが再帰的に除去される() {
        let mut value = serde_json::json!({
            "email": {"$gt": ""},
            "name": "Jonas",
            "nested": {"a.b": 1, "ok": {"$ne": null}},
        });

        sanitize_value(&mut value);

        assert_eq!(
            value,
            serde_json::json!({
                "email": {},
                "name": "Jonas",
                "nested": {"ok": {}},
            })
        );
    }

    #[test]
    fn test_演算子キー除去は冪等() {
        let mut once = serde_json::json!({"email": {"$gt": ""}, "name": "Jonas"});
        sanitize_value(&mut once);

        let mut twice = once.clone();
        sanitize_value(&mut twice);

        assert_eq!(once, twice);
    }

    // ===== スクリプト除去テスト =====

    #[test]
    fn test_script要素が除去される() {
        assert_eq!(
            strip_scripts("hello <script>alert('xss')</script> world"),
            "hello  world"
        );
    }

    #[test]
    fn test_イベントハンドラ属性が除去される() {
        assert_eq!(
            strip_scripts(r#"<div onclick="steal()">text</div>"#),
            "<div>text</div>"
        );
    }

    #[test]
    fn test_タグが再構成される入力でも冪等() {
        // 内側の script 要素を除去すると外側に <script> が再構成される入力
        let tricky = "<scr<script>x</script>ipt>alert(1)</scr</script>ipt>";

        let once = strip_scripts(tricky);
        let twice = strip_scripts(&once);

        assert_eq!(once, twice);
        assert!(!once.to_lowercase().contains("<script"));
    }

    #[test]
    fn test_無害な文字列は変更されない() {
        assert_eq!(strip_scripts("ただのテキスト <b>bold</b>"), "ただのテキスト <b>bold</b>");
    }

    // ===== クエリ文字列テスト =====

    #[test]
    fn test_クエリの演算子キーが除去される() {
        let sanitized = sanitize_query("name=Jonas&$gt=1&sort=price");

        assert_eq!(sanitized, "name=Jonas&sort=price");
    }

    #[test]
    fn test_クエリのサニタイズは冪等() {
        let once = sanitize_query("name=%3Cscript%3Ealert(1)%3C%2Fscript%3E&$gt=1");
        let twice = sanitize_query(&once);

        assert_eq!(once, twice);
    }
}
