//! 斋月挑战赛服务
//!
//! 参与者记录每日功课，服务按固定积分表计分并维护排行榜。
//!
//! ## 核心功能
//!
//! - **积分计算**：纯函数 [`scoring::score`]，11 项活动的固定倍率
//! - **每日活动**：按 (用户, 日期) 提交、覆盖、删除
//! - **排行榜**：实时计算、WebSocket 推送（心跳保活）、快照发布与历史查询
//! - **账号**：邮箱密码注册登录、会话 Cookie、密码重置
//! - **管理后台**：用户汇总、单独发信、公告发送与投递统计
//!
//! ## 模块结构
//!
//! - `scoring`: 积分表与计分函数
//! - `models` / `repository`: 实体与 PostgreSQL 仓储
//! - `service`: 业务服务
//! - `realtime`: WebSocket 连接登记与广播
//! - `email` / `notifier`: 出站邮件与所有者通知
//! - `handlers` / `routes` / `middleware`: HTTP 层
//! - `worker`: 心跳扫描与公告投递后台任务

pub mod auth;
pub mod dto;
pub mod email;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notifier;
pub mod realtime;
pub mod repository;
pub mod routes;
pub mod scoring;
pub mod service;
pub mod state;
pub mod worker;

pub use dto::ApiResponse;
pub use error::{ApiError, Result};
pub use models::{DailyActivity, LeaderboardEntry, User, UserRole};
pub use scoring::{ActivityCounts, ActivityKind, score};
