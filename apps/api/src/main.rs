//! # Odyssey API サーバー
//!
//! ツアー予約 REST API のエントリーポイント。
//!
//! ## 役割
//!
//! - **プロセスブートストラップ**: 設定読み込み、データベース接続、リッスン開始
//! - **致命的エラー処理**: 回復不能な状態でプロセスを確実に終了させる
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `PORT` | No | ポート番号（デフォルト: `3000`） |
//! | `APP_ENV` | No | `development` でリクエストログ有効 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL テンプレート（`<PASSWORD>` を含む） |
//! | `DATABASE_PASSWORD` | テンプレート依存 | プレースホルダに差し込むパスワード |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（.env ファイルを使用）
//! cargo run -p odyssey-api
//!
//! # 本番環境（環境変数を直接指定）
//! APP_ENV=production PORT=3000 DATABASE_URL=postgres://... cargo run -p odyssey-api --release
//! ```
//!
//! ## シャットダウン
//!
//! | 契機 | 挙動 | 終了コード |
//! |------|------|-----------|
//! | 捕捉されない同期的欠陥（panic） | 直ちに終了（排出なし） | 1 |
//! | 未処理の非同期エラー（DB 接続失敗等） | 新規受付停止 → 排出（上限 10 秒） → 終了 | 1 |

use std::{
    future::IntoFuture as _,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Context as _;
use odyssey_api::{app_builder, config::AppConfig, lifecycle};
use odyssey_infra::db;
use odyssey_shared::observability::{self, LogFormat};
use sqlx::PgPool;
use tokio::{net::TcpListener, sync::oneshot};

/// API サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングと panic フックの初期化
/// 3. アプリケーション設定の読み込み
/// 4. 接続プールの作成と readiness プローブの起動
/// 5. ルーターの構築と HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    // トレーシング初期化
    observability::init_tracing(LogFormat::from_env());
    let _app_span = tracing::info_span!("app", service = "api").entered();

    // 捕捉されない同期的欠陥のフック（プロセス全体で有効）
    lifecycle::install_panic_hook();

    // 設定読み込み
    let config = AppConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!("API サーバーを起動します: {}:{}", config.host, config.port);

    // 致命的エラーチャネル
    let (fatal, fatal_rx) = lifecycle::fatal_error_channel();

    // データベース接続（遅延）。最初の接続確立は readiness プローブが行い、
    // 失敗は未処理の非同期エラーとして致命的エラーチャネルに報告される
    let pool =
        db::connect_lazy(&config.database_url).context("接続プールの作成に失敗しました")?;
    spawn_db_probe(pool.clone(), fatal.clone());

    // ルーター構築
    let app = app_builder::build_app(&config, pool);

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("API サーバーが起動しました: {addr}");

    // 未処理の非同期エラーで graceful shutdown を開始する。
    // 新規接続の受付を止め、処理中のリクエストの完了を待ってから終了する
    let draining = Arc::new(AtomicBool::new(false));
    let (drain_tx, mut drain_rx) = oneshot::channel::<()>();
    let shutdown = {
        let draining = draining.clone();
        async move {
            let error = fatal_rx.wait().await;
            tracing::error!(
                error = %error,
                "未処理の非同期エラーが発生しました。graceful shutdown を開始します"
            );
            draining.store(true, Ordering::SeqCst);
            let _ = drain_tx.send(());
        }
    };

    let mut serve = std::pin::pin!(
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .into_future()
    );

    tokio::select! {
        result = &mut serve => {
            result?;
            // 排出が間に合って serve が先に完了した場合も終了コードは 1
            if draining.load(Ordering::SeqCst) {
                tracing::info!("排出が完了しました。終了します");
                std::process::exit(1);
            }
        }
        _ = &mut drain_rx => {
            // 排出には上限を設ける（処理が終わらないハンドラに終了を阻止させない）
            if tokio::time::timeout(lifecycle::DRAIN_TIMEOUT, &mut serve)
                .await
                .is_err()
            {
                tracing::error!("排出期限を超過しました。処理中のリクエストを破棄して終了します");
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// データベース readiness プローブを起動する
///
/// 疎通確認とマイグレーションを行い、失敗を致命的エラーとして報告する。
/// 自動リトライは行わない。
fn spawn_db_probe(pool: PgPool, fatal: lifecycle::FatalErrorHandle) {
    tokio::spawn(async move {
        match db_ready(&pool).await {
            Ok(()) => tracing::info!("データベースに接続しました"),
            Err(error) => fatal.report(error),
        }
    });
}

/// データベースの疎通確認とマイグレーション適用
async fn db_ready(pool: &PgPool) -> anyhow::Result<()> {
    db::ping(pool)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(pool)
        .await
        .context("マイグレーションの実行に失敗しました")?;
    Ok(())
}
