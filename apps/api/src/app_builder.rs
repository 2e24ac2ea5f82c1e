//! # アプリケーション構築
//!
//! リクエストパイプラインの組み立てを行う。
//!
//! ## パイプラインの段（外側 → 内側）
//!
//! 1. セキュリティヘッダー付与
//! 2. 終端エラーフォーマッタ
//! 3. Request ID 付与 + リクエストログ（開発環境のみ）
//! 4. レートリミット（`/api` 配下）
//! 5. ボディサイズ上限（10KB）
//! 6. 入力サニタイズ（演算子除去・スクリプト除去）
//! 7. パラメータ汚染ガード
//! 8. 到着時刻スタンプ
//! 9. リソースルーティング（tours / users / reviews）
//! 10. 静的ファイル配信 + 404 フォールバック
//!
//! どの段でエラーが発生しても、終端エラーハンドラ
//! （[`crate::error::ApiError`] の `IntoResponse` と終端フォーマッタ）が
//! ちょうど 1 つのレスポンスを生成する。

use std::sync::Arc;

use axum::{
    Router,
    handler::HandlerWithoutStateExt as _,
    http::Uri,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use odyssey_infra::repository::{
    PostgresReviewRepository,
    PostgresTourRepository,
    PostgresUserRepository,
    ReviewRepository,
    TourRepository,
    UserRepository,
};
use odyssey_shared::observability::{MakeRequestUuidV7, make_request_span};
use sqlx::PgPool;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    config::{AppConfig, BODY_LIMIT_BYTES},
    error::ApiError,
    handler::{
        ReviewState,
        TourState,
        UserState,
        create_review,
        create_tour,
        create_user,
        delete_review,
        delete_tour,
        delete_user,
        get_review,
        get_tour,
        get_user,
        health_check,
        list_reviews,
        list_tours,
        list_users,
        update_tour,
        update_user,
    },
    middleware::{
        RateLimitState,
        dedupe_query_params,
        enforce_rate_limit,
        format_foreign_errors,
        sanitize_request,
        set_security_headers,
        stamp_request_time,
    },
};

/// どのルートにもマッチしなかったリクエストを 404 に合成する
///
/// 静的ファイルにもマッチしなかったパスがここに到達する。
async fn handle_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Can't find {uri} on this server!"))
}

/// アプリケーションルーターを構築する
///
/// ミドルウェアの適用順序はこの関数だけが決める。
pub fn build_app(config: &AppConfig, pool: PgPool) -> Router {
    // リポジトリと共有状態
    let tour_repository: Arc<dyn TourRepository> =
        Arc::new(PostgresTourRepository::new(pool.clone()));
    let user_repository: Arc<dyn UserRepository> =
        Arc::new(PostgresUserRepository::new(pool.clone()));
    let review_repository: Arc<dyn ReviewRepository> =
        Arc::new(PostgresReviewRepository::new(pool));

    let tour_state = Arc::new(TourState {
        tour_repository: tour_repository.clone(),
    });
    let user_state = Arc::new(UserState {
        user_repository: user_repository.clone(),
    });
    let review_state = Arc::new(ReviewState {
        review_repository,
        tour_repository,
        user_repository,
    });

    let rate_limit_state = RateLimitState::new(&config.rate_limit);

    // 静的ファイル配信。ファイルにもマッチしなければ 404 を合成する。
    // GET/HEAD 以外のメソッドもフォールバック（404 合成）に流す
    let static_service = ServeDir::new(&config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(handle_not_found.into_service());

    // ルーター構築
    let router = Router::new()
        .route("/health", get(health_check))
        // ツアー API
        .route("/api/v1/tours", get(list_tours).post(create_tour))
        .route(
            "/api/v1/tours/{id}",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
        .with_state(tour_state)
        // ユーザー API
        .route("/api/v1/users", get(list_users).post(create_user))
        .route(
            "/api/v1/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .with_state(user_state)
        // レビュー API
        .route("/api/v1/reviews", get(list_reviews).post(create_review))
        .route(
            "/api/v1/reviews/{id}",
            get(get_review).delete(delete_review),
        )
        .with_state(review_state)
        .fallback_service(static_service);

    // ミドルウェア適用（後に layer したものが外側になる）
    let router = router
        .layer(from_fn(stamp_request_time))
        .layer(from_fn(dedupe_query_params))
        .layer(from_fn(sanitize_request))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(from_fn_with_state(rate_limit_state, enforce_rate_limit))
        .layer(PropagateRequestIdLayer::x_request_id());

    // リクエストログは開発環境でのみ有効にする
    let router = if config.run_mode.is_development() {
        router.layer(TraceLayer::new_for_http().make_span_with(make_request_span))
    } else {
        router
    };

    router
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(from_fn(format_foreign_errors))
        .layer(from_fn(set_security_headers))
}
