//! 邮件发送
//!
//! `EmailSender` 抽象发送行为：配置了端点时走 HTTP 邮件服务，否则使用关闭状态的实现。

mod sender;
pub mod templates;

pub use sender::{
    DisabledEmailSender, EmailError, EmailMessage, EmailSender, HttpEmailSender, build_email_sender,
};

#[cfg(test)]
pub use sender::MockEmailSender;
