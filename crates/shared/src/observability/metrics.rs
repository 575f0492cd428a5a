//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标
///
/// 描述信息会出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "activity_submissions_total",
        "Total number of daily activity submissions"
    );
    metrics::describe_histogram!(
        "activity_submission_points",
        "Points awarded per daily activity submission"
    );

    metrics::describe_counter!(
        "leaderboard_broadcasts_total",
        "Total number of leaderboard broadcasts"
    );
    metrics::describe_counter!(
        "leaderboard_broadcast_messages_total",
        "Per-connection leaderboard messages by outcome"
    );
    metrics::describe_gauge!(
        "realtime_connections",
        "Currently registered realtime connections"
    );

    metrics::describe_counter!("emails_sent_total", "Outbound emails by kind and outcome");
    metrics::describe_counter!(
        "announcement_deliveries_total",
        "Processed announcement deliveries by outcome"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录每日活动提交
#[inline]
pub fn record_activity_submission(updated: bool, points: i64) {
    metrics::counter!(
        "activity_submissions_total",
        "kind" => if updated { "update" } else { "create" }
    )
    .increment(1);

    metrics::histogram!("activity_submission_points").record(points as f64);
}

/// 记录一次排行榜广播
#[inline]
pub fn record_leaderboard_broadcast(sent: usize, failed: usize) {
    metrics::counter!("leaderboard_broadcasts_total").increment(1);
    metrics::counter!("leaderboard_broadcast_messages_total", "outcome" => "sent")
        .increment(sent as u64);
    metrics::counter!("leaderboard_broadcast_messages_total", "outcome" => "failed")
        .increment(failed as u64);
}

/// 更新实时连接数
#[inline]
pub fn set_realtime_connections(count: usize) {
    metrics::gauge!("realtime_connections").set(count as f64);
}

/// 记录邮件发送
#[inline]
pub fn record_email(kind: &str, success: bool) {
    metrics::counter!(
        "emails_sent_total",
        "kind" => kind.to_string(),
        "status" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

/// 记录公告投递
#[inline]
pub fn record_announcement_delivery(outcome: &str) {
    metrics::counter!(
        "announcement_deliveries_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
