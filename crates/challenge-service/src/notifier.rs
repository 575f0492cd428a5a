//! 站点所有者通知
//!
//! 关键事件（新提交、排行榜发布、管理员发信）推送给所有者。
//! 通知失败只记录日志，不影响业务请求。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use challenge_shared::config::NotifierConfig;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct OwnerNotification<'a> {
    title: &'a str,
    content: &'a str,
}

/// 所有者通知器，返回是否送达
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OwnerNotifier: Send + Sync {
    async fn notify(&self, title: &str, content: &str) -> bool;
}

/// 通过 HTTP 推送通知
pub struct HttpOwnerNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOwnerNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl OwnerNotifier for HttpOwnerNotifier {
    async fn notify(&self, title: &str, content: &str) -> bool {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&OwnerNotification { title, content });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(title, "所有者通知已发送");
                true
            }
            Ok(resp) => {
                warn!(title, status = resp.status().as_u16(), "所有者通知被拒绝");
                false
            }
            Err(e) => {
                warn!(title, error = %e, "所有者通知发送失败");
                false
            }
        }
    }
}

/// 未配置时仅记录日志
pub struct LogOwnerNotifier;

#[async_trait]
impl OwnerNotifier for LogOwnerNotifier {
    async fn notify(&self, title: &str, content: &str) -> bool {
        info!(title, content, "所有者通知（未配置推送端点）");
        false
    }
}

/// 按配置构造通知器
pub fn build_owner_notifier(config: &NotifierConfig) -> reqwest::Result<Arc<dyn OwnerNotifier>> {
    match &config.endpoint {
        Some(endpoint) if !endpoint.is_empty() => Ok(Arc::new(HttpOwnerNotifier::new(
            endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?)),
        _ => Ok(Arc::new(LogOwnerNotifier)),
    }
}
