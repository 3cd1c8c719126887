//! 错误定义模块

use thiserror::Error;

/// 分析失败时展示给用户的通用提示
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to analyze image. Please ensure you are online and try again.";

/// 离线状态下的提示
pub const OFFLINE_MESSAGE: &str =
    "Offline Mode: Cannot perform AI Analysis. Please check internet connection.";

/// 缺少API密钥时的提示
pub const MISSING_API_KEY_MESSAGE: &str =
    "API Key is missing. Please check your environment configuration.";

/// 上传非图像文件时的提示
pub const UNSUPPORTED_MEDIA_MESSAGE: &str = "Please upload an image file (JPEG, PNG).";

/// 患者表单缺少姓名或年龄时的提示
pub const INCOMPLETE_PATIENT_MESSAGE: &str = "Please enter the patient's name and age.";

/// MedScan系统统一错误类型
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("{}", OFFLINE_MESSAGE)]
    Offline,

    #[error("文件读取错误: {0}")]
    Read(String),

    #[error("不支持的文件类型: {0}")]
    UnsupportedMedia(String),

    #[error("传输错误: {0}")]
    Transport(String),

    #[error("No response from AI")]
    NoResponse,

    #[error("解析错误: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("响应格式错误: {0}")]
    MalformedResponse(String),

    #[error("认证错误: {0}")]
    Authentication(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },
}

impl ScanError {
    /// 转换为展示给用户的单一提示信息
    ///
    /// 传输、空响应、解析和格式错误统一为通用提示，原始细节只写入日志。
    pub fn user_message(&self) -> String {
        match self {
            ScanError::Config(msg) => msg.clone(),
            ScanError::Offline => OFFLINE_MESSAGE.to_string(),
            ScanError::UnsupportedMedia(_) => UNSUPPORTED_MEDIA_MESSAGE.to_string(),
            ScanError::Authentication(msg) | ScanError::Validation(msg) => msg.clone(),
            ScanError::NotFound(msg) => msg.clone(),
            ScanError::InvalidStateTransition { .. } => self.to_string(),
            ScanError::Read(_)
            | ScanError::Io(_)
            | ScanError::Transport(_)
            | ScanError::NoResponse
            | ScanError::Parse(_)
            | ScanError::MalformedResponse(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// MedScan系统统一结果类型
pub type Result<T> = std::result::Result<T, ScanError>;
