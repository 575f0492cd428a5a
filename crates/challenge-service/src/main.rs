//! 斋月挑战赛服务入口

use anyhow::{Context, bail};
use challenge_service::{
    email::build_email_sender,
    notifier::build_owner_notifier,
    routes,
    state::{AppState, Repositories},
    worker::{AnnouncementDeliveryWorker, HeartbeatWorker},
};
use challenge_shared::{config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "challenge-secret-key-change-in-production";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 配置错误时直接退出，避免以默认密钥和数据库启动
    let config = AppConfig::load("challenge-service").context("加载配置失败")?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting challenge-service on {}", config.server_addr());

    // 生产环境必须注入 CHALLENGE_AUTH__JWT_SECRET
    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        if config.is_production() {
            bail!("CHALLENGE_AUTH__JWT_SECRET must be set in production environment");
        }
        warn!("Using default JWT secret - set CHALLENGE_AUTH__JWT_SECRET for production");
    }

    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let email = build_email_sender(&config.email).context("初始化邮件发送器失败")?;
    let notifier = build_owner_notifier(&config.notifier).context("初始化所有者通知失败")?;
    if config.email.endpoint.is_none() {
        warn!("邮件服务未配置，所有邮件发送将失败");
    }

    let repos = Repositories::postgres(&db);
    let state = AppState::new(db.clone(), &config, repos, email, notifier);

    // 心跳扫描 Worker
    let heartbeat = HeartbeatWorker::new(
        state.realtime.clone(),
        config.realtime.heartbeat_interval_seconds,
    );
    tokio::spawn(async move {
        heartbeat.run().await;
    });

    // 公告投递 Worker
    if config.delivery.enabled {
        let delivery = AnnouncementDeliveryWorker::new(
            state.announcement_service.clone(),
            config.delivery.poll_interval_seconds,
            config.delivery.batch_size,
        );
        tokio::spawn(async move {
            delivery.run().await;
        });
    } else {
        info!("公告投递 Worker 已禁用");
    }

    for warning in config.production_warnings() {
        warn!("{}", warning);
    }
    info!("CORS allowed_origins: {}", config.server.cors_origins);

    let app = routes::build_app(state, &config.server);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
