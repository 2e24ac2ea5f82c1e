//! # エラーレスポンスエンベロープ
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は api クレートの責務（shared に axum 依存を入れない）
//! - `status` フィールドはステータスコードから機械的に分類する:
//!   4xx は `"fail"`（クライアント起因）、それ以外は `"error"`（サーバー起因）
//! - 500 の `message` は固定文言（内部情報を漏らさないため）

use serde::{Deserialize, Serialize};

/// 4xx 系エラーの `status` 分類
const STATUS_FAIL: &str = "fail";

/// 5xx 系エラーの `status` 分類
const STATUS_ERROR: &str = "error";

/// 欠陥（defect）をクライアントに報告する際の固定メッセージ
pub const GENERIC_ERROR_MESSAGE: &str = "Something went very wrong!";

/// エラーレスポンス
///
/// すべてのパイプライン内エラーはこの形式でクライアントに返る:
///
/// ```json
/// { "status": "fail", "message": "Can't find /nope on this server!" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status:  String,
    pub message: String,
}

impl ErrorResponse {
    /// ステータスコードとメッセージからエラーレスポンスを作成する
    ///
    /// `status` 分類は 4xx → `"fail"`、それ以外 → `"error"`。
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let status = if (400..500).contains(&status_code) {
            STATUS_FAIL
        } else {
            STATUS_ERROR
        };

        Self {
            status:  status.to_string(),
            message: message.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_status(400, message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_status(404, message)
    }

    /// 413 Payload Too Large
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::from_status(413, message)
    }

    /// 429 Too Many Requests
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::from_status(429, message)
    }

    /// 500 Internal Server Error
    ///
    /// message は固定値。欠陥の詳細はサーバーログにのみ残す。
    pub fn internal_error() -> Self {
        Self::from_status(500, GENERIC_ERROR_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_4xxがfailに分類される() {
        assert_eq!(ErrorResponse::from_status(400, "").status, "fail");
        assert_eq!(ErrorResponse::from_status(404, "").status, "fail");
        assert_eq!(ErrorResponse::from_status(429, "").status, "fail");
        assert_eq!(ErrorResponse::from_status(499, "").status, "fail");
    }

    #[test]
    fn test_5xxがerrorに分類される() {
        assert_eq!(ErrorResponse::from_status(500, "").status, "error");
        assert_eq!(ErrorResponse::from_status(503, "").status, "error");
    }

    #[test]
    fn test_internal_errorが固定メッセージを返す() {
        let error = ErrorResponse::internal_error();

        assert_eq!(error.status, "error");
        assert_eq!(error.message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_jsonシリアライズが正しい形状になる() {
        let error = ErrorResponse::not_found("Can't find /nope on this server!");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": "fail",
                "message": "Can't find /nope on this server!",
            })
        );
    }

    #[test]
    fn test_jsonデシリアライズが正しく動作する() {
        let json = r#"{"status": "fail", "message": "not found"}"#;
        let error: ErrorResponse = serde_json::from_str(json).unwrap();

        assert_eq!(error.status, "fail");
        assert_eq!(error.message, "not found");
    }
}
