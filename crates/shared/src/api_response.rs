//! # API レスポンスエンベロープ
//!
//! 公開 API の統一レスポンス形式 `{ "status": "success", "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 成功レスポンスの `status` フィールド値
const STATUS_SUCCESS: &str = "success";

/// 公開 API の統一レスポンス型
///
/// すべての公開 API エンドポイントは成功時に
/// `{ "status": "success", "data": T }` 形式でレスポンスを返す。
///
/// ## 使用例
///
/// ```
/// use odyssey_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert_eq!(response.status, "success");
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data:   T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data,
        }
    }
}

/// 一覧系エンドポイント用のレスポンス型
///
/// `data` に加えて件数（`results`）を含む。
/// ページネーションは提供しない（一覧はクエリパラメータで絞り込む）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub status:  String,
    pub results: usize,
    pub data:    Vec<T>,
}

impl<T> ListResponse<T> {
    /// 要素列から `ListResponse` を作成する
    ///
    /// `results` は `data` の件数から自動で設定される。
    pub fn new(data: Vec<T>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            results: data.len(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_serializeを正しいjson形状にする() {
        let response = ApiResponse::new("hello");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "status": "success", "data": "hello" })
        );
    }

    #[test]
    fn test_deserializeでjsonからオブジェクトに変換する() {
        let json = r#"{"status": "success", "data": "world"}"#;
        let response: ApiResponse<String> = serde_json::from_str(json).unwrap();

        assert_eq!(response.data, "world");
    }

    #[test]
    fn test_list_responseがresultsに件数を設定する() {
        let response = ListResponse::new(vec!["a", "b", "c"]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "results": 3,
                "data": ["a", "b", "c"],
            })
        );
    }

    #[test]
    fn test_list_responseが空の一覧で件数0を返す() {
        let response: ListResponse<i32> = ListResponse::new(Vec::new());

        assert_eq!(response.results, 0);
        assert!(response.data.is_empty());
    }
}
