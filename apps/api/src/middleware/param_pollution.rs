//! # パラメータ汚染ガードミドルウェア
//!
//! 重複したクエリパラメータを「最後の値が勝つ」規則で collapse する。
//! 配列として受け取ることを許可したフィールド（ホワイトリスト）だけは
//! すべての出現を順序を保って残す。

use axum::{
    extract::Request,
    http::uri::PathAndQuery,
    middleware::Next,
    response::Response,
};
use url::form_urlencoded;

/// 配列としての複数出現を許可するフィールド
///
/// ツアー検索で範囲・複数指定に使われるフィールドのみ許可する。
const ARRAY_FIELDS: &[&str] = &[
    "duration",
    "ratingsAverage",
    "ratingsQuantity",
    "maxGroupSize",
    "difficulty",
    "price",
];

/// パラメータ汚染ガードミドルウェア
pub async fn dedupe_query_params(mut request: Request, next: Next) -> Response {
    if let Some(query) = request.uri().query() {
        let deduped = dedupe_query(query);
        if deduped != query
            && let Some(uri) = rewrite_query(request.uri(), &deduped)
        {
            *request.uri_mut() = uri;
        }
    }

    next.run(request).await
}

/// 重複パラメータを collapse したクエリ文字列を返す
///
/// ホワイトリスト外のキーは最後の出現だけが（その位置で）残る。
fn dedupe_query(query: &str) -> String {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (index, (key, value)) in pairs.iter().enumerate() {
        if !ARRAY_FIELDS.contains(&key.as_str()) {
            let is_last = !pairs[index + 1..].iter().any(|(k, _)| k == key);
            if !is_last {
                continue;
            }
        }
        serializer.append_pair(key, value);
    }
    serializer.finish()
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

    #[test]
    fn test_ホワイトリスト外の重複は最後の値だけが残る() {
        assert_eq!(dedupe_query("sort=price&sort=duration"), "sort=duration");
    }

    #[test]
    fn test_ホワイトリストのフィールドは全出現が順序を保って残る() {
        assert_eq!(
            dedupe_query("price=100&price=200&price=300"),
            "price=100&price=200&price=300"
        );
    }

    #[test]
    fn test_混在クエリで両方の規則が適用される() {
        assert_eq!(
            dedupe_query("sort=price&duration=5&sort=name&duration=9"),
            "duration=5&sort=name&duration=9"
        );
    }

    #[test]
    fn test_重複が無ければ変更されない() {
        assert_eq!(dedupe_query("sort=price&limit=10"), "sort=price&limit=10");
    }
}
