//! 影像编码
//!
//! 把二进制影像转换为可传输的base64文本，并补齐到4的整数倍长度

use std::sync::OnceLock;

use base64::Engine as _;
use medscan_core::{Result, ScanError, ScanFile};
use regex::Regex;
use serde::Serialize;

/// 编码后的影像载荷
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

fn data_url_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^data:(.*,)?").expect("static regex"))
}

/// 标准base64编码
pub fn encode_bytes(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// 去掉 `data:<mime>;base64,` 前缀
pub fn strip_data_url_prefix(input: &str) -> &str {
    match data_url_prefix().find(input) {
        Some(m) => &input[m.end()..],
        None => input,
    }
}

/// 用 `=` 补齐长度到4的整数倍
pub fn pad_base64(mut encoded: String) -> String {
    let rem = encoded.len() % 4;
    if rem > 0 {
        encoded.push_str(&"=".repeat(4 - rem));
    }
    encoded
}

/// 编码上传的影像文件
pub fn encode_scan(scan: &ScanFile) -> Result<EncodedImage> {
    if scan.is_empty() {
        return Err(ScanError::Read("Error reading file".to_string()));
    }

    Ok(EncodedImage {
        mime_type: scan.mime_type.clone(),
        data: pad_base64(encode_bytes(&scan.bytes)),
    })
}

/// 解析浏览器生成的data URL
///
/// 前缀中的MIME类型优先；没有前缀时使用 `fallback_mime`。
pub fn encode_data_url(data_url: &str, fallback_mime: &str) -> Result<EncodedImage> {
    let payload = strip_data_url_prefix(data_url).trim();
    if payload.is_empty() {
        return Err(ScanError::Read("Error reading file".to_string()));
    }

    let mime_type = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split([';', ',']).next())
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback_mime)
        .to_string();

    Ok(EncodedImage {
        mime_type,
        data: pad_base64(payload.to_string()),
    })
}
