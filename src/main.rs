use std::sync::Arc;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, Router},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkvault::{
    config::Config,
    routes,
    services::{AuthService, BookmarkService, ChangeFeedService, Database},
    state::AppState,
    utils::middleware::auth_middleware,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "linkvault=debug,tower_http=debug".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Linkvault service...");

    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化数据库连接
    let db = Arc::new(match Database::new(&config).await {
        Ok(db) => {
            match db.verify_connection().await {
                Ok(_) => {
                    info!("Database connection established successfully");
                    db
                }
                Err(e) => {
                    warn!("Database connection failed: {}", e);
                    return Err(anyhow::anyhow!("Database connection failed"));
                }
            }
        }
        Err(e) => {
            error!("Failed to create database connection: {}", e);
            return Err(anyhow::anyhow!("Database initialization failed"));
        }
    });

    // 初始化服务
    let auth_service = AuthService::new(&config).await?;
    let change_feed = ChangeFeedService::new(config.feed_channel_capacity);
    let bookmark_service = BookmarkService::new(db.clone(), change_feed.clone()).await?;

    // 创建应用状态
    let app_state = Arc::new(AppState {
        config: config.clone(),
        db,
        auth_service,
        bookmark_service,
        change_feed,
    });

    // 启动后台任务
    start_background_tasks(app_state.clone());

    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(
            config.cors_allowed_origins
                .split(',')
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        );

    // 构建应用路由
    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/bookmarks", routes::bookmarks::router())
        .nest("/api/feed", routes::feed::router())
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // 启动服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "Linkvault is running!"
}

fn start_background_tasks(app_state: Arc<AppState>) {
    info!("Starting background tasks...");

    // 清理过期会话缓存任务
    let auth_state = app_state;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));

        loop {
            interval.tick().await;
            if let Err(e) = auth_state.auth_service.cleanup_expired_sessions().await {
                error!("Failed to cleanup expired sessions: {}", e);
            }
        }
    });

    info!("Background tasks started successfully");
}
