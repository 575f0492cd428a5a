//! 密码重置 Token
//!
//! 明文 Token 只出现在邮件链接中，数据库只保存其 SHA-256 摘要。

use rand::RngCore;
use sha2::{Digest, Sha256};

/// 生成 32 字节随机 Token，返回 64 位十六进制字符串
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// 计算 Token 的 SHA-256 十六进制摘要
pub fn hash_reset_token(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
