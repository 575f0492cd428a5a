use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use challenge_shared::config::EmailConfig;
use challenge_shared::observability::metrics;
use serde::Serialize;
use tracing::{info, warn};

/// 待发送邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// 邮件发送错误
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("邮件服务未配置")]
    NotConfigured,

    #[error("邮件请求失败: {0}")]
    Request(String),

    #[error("邮件服务拒绝请求 (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// 邮件发送器
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// 发送邮件；`kind` 仅用于日志和指标
    async fn send(&self, kind: &'static str, message: EmailMessage) -> Result<(), EmailError>;
}

/// 通过 HTTP 邮件服务发送
///
/// POST `{to, subject, html}`，使用 Bearer 密钥认证。
pub struct HttpEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpEmailSender {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmailError::Request(format!("创建 HTTP 客户端失败: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    async fn post(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmailError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, kind: &'static str, message: EmailMessage) -> Result<(), EmailError> {
        let result = self.post(&message).await;
        metrics::record_email(kind, result.is_ok());

        match &result {
            Ok(()) => info!(kind, to = %message.to, "邮件发送成功"),
            Err(e) => warn!(kind, to = %message.to, error = %e, "邮件发送失败"),
        }

        result
    }
}

/// 未配置邮件服务时使用
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(&self, kind: &'static str, message: EmailMessage) -> Result<(), EmailError> {
        warn!(kind, to = %message.to, "邮件服务未配置，跳过发送");
        metrics::record_email(kind, false);
        Err(EmailError::NotConfigured)
    }
}

/// 按配置构造邮件发送器
pub fn build_email_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>, EmailError> {
    match &config.endpoint {
        Some(endpoint) if !endpoint.is_empty() => Ok(Arc::new(HttpEmailSender::new(
            endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?)),
        _ => Ok(Arc::new(DisabledEmailSender)),
    }
}
