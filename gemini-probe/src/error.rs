//! Error definitions for the probe.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// 探测失败分类（从最具体到最宽泛）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 当前密钥下模型不可用（404）。
    NotFound,
    /// 该模型配额已耗尽（429）。
    QuotaExhausted,
    /// 其他错误。
    Other,
}

impl FailureKind {
    /// 按错误内容分类，用于选择输出消息。
    #[must_use]
    pub fn classify(error: &Error) -> Self {
        match error {
            Error::ApiError { status: 404, .. } => Self::NotFound,
            Error::ApiError { status: 429, .. } => Self::QuotaExhausted,
            _ => Self::Other,
        }
    }
}
