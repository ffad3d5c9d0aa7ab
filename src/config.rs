use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::error::ConfigError;

/// 提交方式
///
/// 提交不可撤销，默认由用户在页面上亲自点提交
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// 填完后自动点击提交
    Autonomous,
    /// 填完后等待页面上的提交事件
    #[default]
    Supervised,
}

impl FromStr for SubmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "autonomous" | "auto" => Ok(SubmissionMode::Autonomous),
            "supervised" | "manual" => Ok(SubmissionMode::Supervised),
            other => Err(format!("未知的提交方式: {}", other)),
        }
    }
}

impl std::fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SubmissionMode::Autonomous => "autonomous",
            SubmissionMode::Supervised => "supervised",
        })
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自行启动浏览器（否则连接已打开的浏览器）
    pub launch_browser: bool,
    /// 启动时是否无头
    pub headless: bool,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    // --- 后端配置 ---
    pub backend_base_url: String,
    pub backend_token: Option<String>,
    pub session_id: Option<String>,
    /// 本地键值存储文件
    pub store_path: String,
    // --- 流程配置 ---
    pub submission_mode: SubmissionMode,
    /// 表单容器等待时间
    pub form_timeout_ms: u64,
    /// 单个字段等待时间
    pub field_timeout_ms: u64,
    /// 提交按钮等待时间
    pub submit_timeout_ms: u64,
    /// 点击提交后的等待时间
    pub settle_ms: u64,
    /// 岗位之间的间隔
    pub inter_job_delay_ms: u64,
    /// 出错后的间隔
    pub error_delay_ms: u64,
    /// 单个岗位流程的超时，不设置时自动模式为 120 秒，监督模式无限等待
    pub pipeline_timeout_ms: Option<u64>,
    /// DOM 轮询间隔（无法订阅变更时使用）
    pub poll_interval_ms: u64,
    /// 字段之间的停顿，方便人眼跟随
    pub field_pause_ms: u64,
    pub resume_path: Option<String>,
    /// 读取不到资料时是否使用兜底资料
    pub use_fallback_profile: bool,
    /// 是否先填写通用字段
    pub fill_common_fields: bool,
    /// 承载岗位列表的网页，用于网页交接
    pub handoff_page_url: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            launch_browser: false,
            headless: false,
            chrome_executable: None,
            backend_base_url: "http://localhost:8000".to_string(),
            backend_token: None,
            session_id: None,
            store_path: "jobflow_store.json".to_string(),
            submission_mode: SubmissionMode::Supervised,
            form_timeout_ms: 10_000,
            field_timeout_ms: 5_000,
            submit_timeout_ms: 5_000,
            settle_ms: 3_000,
            inter_job_delay_ms: 3_000,
            error_delay_ms: 1_000,
            pipeline_timeout_ms: None,
            poll_interval_ms: 250,
            field_pause_ms: 300,
            resume_path: None,
            use_fallback_profile: true,
            fill_common_fields: false,
            handoff_page_url: None,
            verbose_logging: false,
            output_log_file: "jobflow_run.log".to_string(),
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 配置文件（JOBFLOW_CONFIG）+ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("JOBFLOW_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取，缺失的字段取默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(base.browser_debug_port),
            launch_browser: env_parse("LAUNCH_BROWSER").unwrap_or(base.launch_browser),
            headless: env_parse("HEADLESS").unwrap_or(base.headless),
            chrome_executable: env_string("CHROME_EXECUTABLE").or(base.chrome_executable),
            backend_base_url: env_string("BACKEND_BASE_URL").unwrap_or(base.backend_base_url),
            backend_token: env_string("BACKEND_TOKEN").or(base.backend_token),
            session_id: env_string("SESSION_ID").or(base.session_id),
            store_path: env_string("STORE_PATH").unwrap_or(base.store_path),
            submission_mode: env_parse("SUBMISSION_MODE").unwrap_or(base.submission_mode),
            form_timeout_ms: env_parse("FORM_TIMEOUT_MS").unwrap_or(base.form_timeout_ms),
            field_timeout_ms: env_parse("FIELD_TIMEOUT_MS").unwrap_or(base.field_timeout_ms),
            submit_timeout_ms: env_parse("SUBMIT_TIMEOUT_MS").unwrap_or(base.submit_timeout_ms),
            settle_ms: env_parse("SETTLE_MS").unwrap_or(base.settle_ms),
            inter_job_delay_ms: env_parse("INTER_JOB_DELAY_MS").unwrap_or(base.inter_job_delay_ms),
            error_delay_ms: env_parse("ERROR_DELAY_MS").unwrap_or(base.error_delay_ms),
            pipeline_timeout_ms: env_parse("PIPELINE_TIMEOUT_MS").or(base.pipeline_timeout_ms),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS").unwrap_or(base.poll_interval_ms),
            field_pause_ms: env_parse("FIELD_PAUSE_MS").unwrap_or(base.field_pause_ms),
            resume_path: env_string("RESUME_PATH").or(base.resume_path),
            use_fallback_profile: env_parse("USE_FALLBACK_PROFILE").unwrap_or(base.use_fallback_profile),
            fill_common_fields: env_parse("FILL_COMMON_FIELDS").unwrap_or(base.fill_common_fields),
            handoff_page_url: env_string("HANDOFF_PAGE_URL").or(base.handoff_page_url),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(base.verbose_logging),
            output_log_file: env_string("OUTPUT_LOG_FILE").unwrap_or(base.output_log_file),
        }
    }

    pub fn form_timeout(&self) -> Duration {
        Duration::from_millis(self.form_timeout_ms)
    }

    pub fn field_timeout(&self) -> Duration {
        Duration::from_millis(self.field_timeout_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn inter_job_delay(&self) -> Duration {
        Duration::from_millis(self.inter_job_delay_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn field_pause(&self) -> Duration {
        Duration::from_millis(self.field_pause_ms)
    }

    /// 控制端等待页面流程回复的时间，`None` 表示无限等待
    pub fn pipeline_timeout(&self) -> Option<Duration> {
        match (self.pipeline_timeout_ms, self.submission_mode) {
            (Some(ms), _) => Some(Duration::from_millis(ms)),
            (None, SubmissionMode::Autonomous) => Some(Duration::from_secs(120)),
            (None, SubmissionMode::Supervised) => None,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("⚠️ 环境变量 {} 的值 '{}' 无法解析，使用默认值", name, raw);
            None
        }
    }
}
