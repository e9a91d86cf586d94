use plu_lookup::{build_router, AppConfig, AppState};
use tracing::info;

// ========================================
// メイン
// ========================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ログ初期化
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.listen_addr.clone();
    info!("🔌 Backend: {} ({})", config.backend_url, config.backend);

    // セッション全体で共有するキャッシュ
    let state = AppState::new(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 PLU Lookup listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
