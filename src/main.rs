use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use customer_directory::search::MatchMode;
use customer_directory::state::AppState;
use customer_directory::{api, config, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "customer_directory=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config()?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let pool = db::connect(&database_url, app_config.database.max_connections).await?;

    db::run_migrations(&pool).await?;
    db::ensure_admin_user(&pool, &app_config).await?;

    if app_config.search.match_mode == MatchMode::Contains {
        tracing::warn!("Search match mode is `contains`: customer searches cannot use the lower-case indexes");
    }

    let state = Arc::new(AppState::new(pool, app_config.clone()));

    // Seed customers on first run / 首次运行导入客户
    if let Some(seed_file) = app_config.database.seed_file.as_deref().filter(|s| !s.is_empty()) {
        if state.customers.count().await? == 0 {
            state.customers.import_file(Path::new(seed_file)).await?;
        }
    }

    let app = api::router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
