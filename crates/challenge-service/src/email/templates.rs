//! 邮件 HTML 模板
//!
//! 所有用户可控文本在插入前做 HTML 转义。

use chrono::NaiveDate;

use super::EmailMessage;
use crate::models::LeaderboardEntry;
use crate::scoring::{ActivityKind, point_table};

const BRAND: &str = "Ramadan Challenge";

/// 转义 HTML 特殊字符
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 多行纯文本转为段落
fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(|block| format!("<p>{}</p>", escape_html(block).replace('\n', "<br>")))
        .collect()
}

fn layout(heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{BRAND}</title></head>
<body style="font-family: Arial, sans-serif; color: #1f2937; max-width: 600px; margin: 0 auto;">
  <div style="background: #064e3b; color: #fef3c7; padding: 24px; text-align: center;">
    <h1>&#127769; {BRAND}</h1>
    <p>{heading}</p>
  </div>
  <div style="padding: 24px;">
{body}
  </div>
  <div style="padding: 16px; font-size: 12px; color: #6b7280; text-align: center;">
    <p>{BRAND} Tracker | May your Ramadan be blessed with countless good deeds</p>
    <p>This is an automated email. Please do not reply to this message.</p>
  </div>
</body>
</html>"#
    )
}

fn activity_label(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::DailyPrayer => "Daily prayer",
        ActivityKind::Tahajud => "Tahajud",
        ActivityKind::Tarawih20 => "Tarawih (20 rakat)",
        ActivityKind::Tarawih8 => "Tarawih (8 rakat)",
        ActivityKind::Fasting => "Full-day fast",
        ActivityKind::QuranArabic => "Quran page (Arabic)",
        ActivityKind::QuranOtherLanguage => "Quran page (other language)",
        ActivityKind::IslamicBook => "Islamic book page",
        ActivityKind::OtherBook => "Other book page",
        ActivityKind::Podcast => "Podcast minute",
        ActivityKind::Salawat => "Salawat",
    }
}

/// 欢迎邮件，附带积分规则
pub fn welcome(to: &str, name: &str, dashboard_url: &str) -> EmailMessage {
    let rows: String = point_table()
        .iter()
        .map(|entry| {
            let rate = if entry.rate.per_units == 1 {
                format!("{} points", entry.rate.points)
            } else {
                format!("{} point per {}", entry.rate.points, entry.rate.per_units)
            };
            format!(
                "      <tr><td>{}</td><td>{}</td></tr>\n",
                activity_label(entry.kind),
                rate
            )
        })
        .collect();

    let body = format!(
        r#"    <h2>Welcome, {name}!</h2>
    <p>Alhamdulillah! We're excited to have you join the {BRAND}. Track your spiritual journey, compete with fellow believers and earn rewards for your dedication during this blessed month.</p>
    <h2>How Points Work</h2>
    <table>
{rows}    </table>
    <h2>Prizes</h2>
    <p>The top 5 participants will receive rewards at the end of Ramadan.</p>
    <p><a href="{url}">Open your dashboard</a></p>"#,
        name = escape_html(name),
        url = escape_html(dashboard_url),
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Welcome to the {BRAND}!"),
        html: layout("Welcome to Your Spiritual Journey", &body),
    }
}

/// 密码重置邮件
pub fn password_reset(to: &str, name: &str, reset_url: &str) -> EmailMessage {
    let body = format!(
        r#"    <h2>Password Reset Request</h2>
    <p>Assalamu Alaikum {name},</p>
    <p>We received a request to reset your password. Click the link below to choose a new one. The link expires in 1 hour.</p>
    <p><a href="{url}">Reset your password</a></p>
    <p>If you did not request this, you can safely ignore this email.</p>"#,
        name = escape_html(name),
        url = escape_html(reset_url),
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("{BRAND} - Password Reset"),
        html: layout("Password Reset", &body),
    }
}

/// 管理员单独发送的消息
pub fn admin_message(to: &str, name: &str, subject: &str, message: &str) -> EmailMessage {
    let body = format!(
        "    <p>Assalamu Alaikum {},</p>\n{}",
        escape_html(name),
        paragraphs(message)
    );

    EmailMessage {
        to: to.to_string(),
        subject: subject.to_string(),
        html: layout("Message from the organizers", &body),
    }
}

/// 公告邮件
pub fn announcement(to: &str, name: &str, title: &str, content: &str) -> EmailMessage {
    let body = format!(
        "    <h2>{}</h2>\n    <p>Assalamu Alaikum {},</p>\n{}",
        escape_html(title),
        escape_html(name),
        paragraphs(content)
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("{BRAND} Announcement: {title}"),
        html: layout("Announcement", &body),
    }
}

/// 排行榜发布通知
pub fn leaderboard_published(
    to: &str,
    name: &str,
    date: NaiveDate,
    top: &[LeaderboardEntry],
    leaderboard_url: &str,
) -> EmailMessage {
    let rows: String = top
        .iter()
        .map(|e| {
            format!(
                "      <tr><td>#{}</td><td>{}</td><td>{}</td></tr>\n",
                e.rank,
                escape_html(&e.user_name),
                e.total_points
            )
        })
        .collect();

    let body = format!(
        r#"    <p>Assalamu Alaikum {name},</p>
    <p>The leaderboard for {date} has been published.</p>
    <table>
{rows}    </table>
    <p><a href="{url}">See the full leaderboard</a></p>"#,
        name = escape_html(name),
        date = date.format("%Y-%m-%d"),
        url = escape_html(leaderboard_url),
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("{BRAND} Leaderboard - {}", date.format("%Y-%m-%d")),
        html: layout("Leaderboard Published", &body),
    }
}
