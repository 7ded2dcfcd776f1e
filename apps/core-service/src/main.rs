//! # Core Service サーバー
//!
//! 申請の承認フローを実行する内部サービス。
//!
//! ## アクセス制御
//!
//! 内部ネットワークからのみアクセス可能とする。認証はゲートウェイが行い、
//! 検証済みの操作主体を `X-User-Id` / `X-Actor-Id` / `X-Is-Admin` ヘッダーで渡す。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | No | ポート番号（デフォルト: `8080`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `DB_MAX_CONNECTIONS` | No | 接続プールの最大接続数（デフォルト: `10`） |
//! | `DB_ACQUIRE_TIMEOUT_SECS` | No | 接続取得のタイムアウト秒（デフォルト: `5`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo run -p shonin-core-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use shonin_core_service::{
    app_builder::build_app,
    config::CoreConfig,
    handler::RequestHandlerState,
    usecase::{RequestUseCaseDeps, RequestUseCaseImpl},
};
use shonin_domain::clock::SystemClock;
use shonin_infra::{
    db::{self, PgTransactionManager},
    repository::{
        PostgresApprovalHistoryRepository,
        PostgresRequestRepository,
        PostgresWorkflowRepository,
        PostgresWorkflowStepRepository,
    },
};
use shonin_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("core-service"));

    let config = CoreConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Core Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.db_acquire_timeout,
    )
    .await
    .context("データベース接続に失敗しました")?;
    tracing::info!("データベースに接続しました");

    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("マイグレーションを適用しました");

    let usecase = RequestUseCaseImpl::new(RequestUseCaseDeps {
        request_repo:  Arc::new(PostgresRequestRepository::new(pool.clone())),
        workflow_repo: Arc::new(PostgresWorkflowRepository::new(pool.clone())),
        step_repo:     Arc::new(PostgresWorkflowStepRepository::new(pool.clone())),
        history_repo:  Arc::new(PostgresApprovalHistoryRepository::new(pool.clone())),
        tx_manager:    Arc::new(PgTransactionManager::new(pool)),
        clock:         Arc::new(SystemClock),
    });
    let app = build_app(Arc::new(RequestHandlerState { usecase }));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("不正なバインドアドレスです")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} へのバインドに失敗しました"))?;
    tracing::info!("Core Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .await
        .context("サーバーが異常終了しました")?;

    Ok(())
}
