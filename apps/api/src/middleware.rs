//! # ミドルウェア
//!
//! リクエストパイプラインを構成するミドルウェアを提供する。
//! 適用順序は [`crate::app_builder`] が固定する。

pub mod error_formatter;
pub mod param_pollution;
pub mod rate_limit;
pub mod request_time;
pub mod sanitize;
pub mod security_headers;

pub use error_formatter::format_foreign_errors;
pub use param_pollution::dedupe_query_params;
pub use rate_limit::{RATE_LIMIT_MESSAGE, RateLimitState, enforce_rate_limit};
pub use request_time::{RequestTime, stamp_request_time};
pub use sanitize::sanitize_request;
pub use security_headers::set_security_headers;
