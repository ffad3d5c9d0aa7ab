use thiserror::Error;

use crate::models::JobStatus;

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {message}")]
    ConnectionFailed { port: u16, message: String },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
}

/// 单个岗位的失败原因，只影响这一个岗位
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    #[error("unsupported platform: {url}")]
    UnsupportedPlatform { url: String },
    #[error("application form not found: {selector}")]
    FormNotFound { selector: String },
    #[error("submit control not found: {selector}")]
    SubmitControlNotFound { selector: String },
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("page error: {0}")]
    Page(String),
    #[error("actor busy with job {0}")]
    ActorBusy(String),
    #[error("bridge failure: {0}")]
    Bridge(#[from] BridgeError),
}

/// 跨上下文消息错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// 在调用方自己的超时内没有收到回复
    #[error("no response from {to} within {timeout_ms}ms")]
    Timeout { to: String, timeout_ms: u64 },
    /// 接收方上下文已经不存在
    #[error("context {0} unreachable")]
    Unreachable(String),
    /// 收到了不符合协议的回复
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// 会话错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("已有自动投递会话在运行")]
    AlreadyRunning,
    #[error("岗位队列为空")]
    EmptyQueue,
}

/// 状态迁移错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("岗位 {job_id} 状态不能从 {from} 变为 {to}")]
pub struct TransitionError {
    pub job_id: String,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// 后端 API 错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}")]
    BadResponse { endpoint: String, status: u16 },
}

/// 本地存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("读取存储文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入存储文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("存储内容解析失败 (键: {key}): {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {message}")]
    FileReadFailed { path: String, message: String },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl JobFailure {
    /// 页面层错误统一转成岗位失败
    pub fn page(err: impl std::fmt::Display) -> Self {
        JobFailure::Page(err.to_string())
    }
}
