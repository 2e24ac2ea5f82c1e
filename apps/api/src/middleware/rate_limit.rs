//! # レートリミットミドルウェア
//!
//! `/api` 配下のリクエストをクライアント IP ごとの固定ウィンドウカウンタで制限する。
//!
//! ## アルゴリズム
//!
//! - ウィンドウはクライアントごとに最初のリクエスト時刻から始まる固定幅
//! - ウィンドウ境界を超えた最初のリクエストでカウンタはリセットされる
//! - 上限を超えたリクエストは 429 と固定の平文メッセージで拒否される
//!
//! カウンタテーブルはプロセス内で唯一のリクエスト横断の共有可変状態であり、
//! インターリーブするリクエスト間でのカウント漏れを防ぐため
//! 単一のロックで増分を原子的に行う。

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;

/// 上限超過時にクライアントへ返す固定メッセージ
pub const RATE_LIMIT_MESSAGE: &str =
    "Too many requests from this IP. Please try again in an hour.";

/// レート制限の対象となるパスプレフィックス
const RATE_LIMITED_PREFIX: &str = "/api";

/// 期限切れウィンドウの掃除を始めるテーブルサイズ
const PRUNE_THRESHOLD: usize = 10_000;

/// 判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// 許可
    Allowed,
    /// 上限超過
    Limited,
}

/// クライアントごとのウィンドウ状態
#[derive(Debug)]
struct WindowState {
    started_at: Instant,
    count:      u32,
}

/// 固定ウィンドウレートリミッタ
///
/// クライアント IP ごとにウィンドウ内のリクエスト数を数える。
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window:       Duration,
    windows:      Mutex<HashMap<IpAddr, WindowState>>,
}

impl FixedWindowLimiter {
    /// 新しいリミッタを作成する
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// リクエストを数え、許可するかどうかを判定する
    ///
    /// 増分と判定はロック内で行われ、同一キーを共有する
    /// リクエスト間でカウントが失われることはない。
    pub fn check(&self, client: IpAddr, now: Instant) -> RateLimitDecision {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // テーブルが肥大化した場合のみ期限切れウィンドウを掃除する
        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, state| now.duration_since(state.started_at) < window);
        }

        let state = windows.entry(client).or_insert(WindowState {
            started_at: now,
            count:      0,
        });

        // ウィンドウ境界でカウンタをリセット
        if now.duration_since(state.started_at) >= self.window {
            state.started_at = now;
            state.count = 0;
        }

        if state.count >= self.max_requests {
            return RateLimitDecision::Limited;
        }

        state.count += 1;
        RateLimitDecision::Allowed
    }
}

/// レートリミットミドルウェアの共有状態
#[derive(Debug, Clone)]
pub struct RateLimitState {
    limiter: Arc<FixedWindowLimiter>,
}

impl RateLimitState {
    /// 設定からリミッタ状態を作成する
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            limiter: Arc::new(FixedWindowLimiter::new(config.max_requests, config.window)),
        }
    }
}

/// レートリミットミドルウェア
///
/// `/api` 配下以外のパスは制限しない。
pub async fn enforce_rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with(RATE_LIMITED_PREFIX) {
        return next.run(request).await;
    }

    let client = client_ip(&request);
    match state.limiter.check(client, Instant::now()) {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited => {
            tracing::warn!(%client, "レート制限を超過しました");
            (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE).into_response()
        }
    }
}

/// リクエストからクライアント IP を決定する
///
/// プロキシ経由のデプロイでは `X-Forwarded-For` の先頭エントリを使用し、
/// 直接接続ではピアアドレスにフォールバックする。
fn client_ip(request: &Request) -> IpAddr {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());

    if let Some(ip) = forwarded {
        return ip;
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn client(n: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, n))
    }

    #[test]
    fn test_上限以内のリクエストは許可される() {
        let limiter = FixedWindowLimiter::new(100, Duration::from_secs(3600));
        let now = Instant::now();

        for _ in 0..100 {
            assert_eq!(limiter.check(client(1), now), RateLimitDecision::Allowed);
        }
    }

    #[test]
    fn test_101回目のリクエストが拒否される() {
        let limiter = FixedWindowLimiter::new(100, Duration::from_secs(3600));
        let now = Instant::now();

        for _ in 0..100 {
            limiter.check(client(1), now);
        }

        assert_eq!(limiter.check(client(1), now), RateLimitDecision::Limited);
    }

    #[test]
    fn test_ウィンドウ境界でカウンタがリセットされる() {
        let window = Duration::from_secs(3600);
        let limiter = FixedWindowLimiter::new(100, window);
        let start = Instant::now();

        for _ in 0..100 {
            limiter.check(client(1), start);
        }
        assert_eq!(limiter.check(client(1), start), RateLimitDecision::Limited);

        // 次のウィンドウでは再び許可される
        let next_window = start + window;
        assert_eq!(
            limiter.check(client(1), next_window),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn test_クライアントごとに独立して数えられる() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(3600));
        let now = Instant::now();

        assert_eq!(limiter.check(client(1), now), RateLimitDecision::Allowed);
        assert_eq!(limiter.check(client(1), now), RateLimitDecision::Limited);
        // 別クライアントは影響を受けない
        assert_eq!(limiter.check(client(2), now), RateLimitDecision::Allowed);
    }
}
