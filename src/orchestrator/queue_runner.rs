//! 岗位队列执行器 - 编排层
//!
//! 一次只处理一个岗位：激活页面 → 把岗位交给页面执行者 → 等待结果 →
//! 同步状态 → 间隔一段时间 → 下一个。单个岗位失败不会中断队列，
//! 停止请求只在两个岗位之间生效。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::actor::PageContext;
use crate::bridge::{BridgeSender, ContextId, Message};
use crate::config::Config;
use crate::error::{BridgeError, JobFailure};
use crate::models::{
    AutomationSession, CandidateProfile, JobDescriptor, JobStatus, ProgressEvent, RunOutcome,
    RunSummary,
};
use crate::services::{is_supported, StatusReporter};
use crate::utils::logging;

/// 队列节奏设置
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// 单个岗位流程的等待上限，`None` 表示无限等待（监督模式）
    pub pipeline_timeout: Option<Duration>,
    pub inter_job_delay: Duration,
    /// 失败后的间隔，比正常间隔短
    pub error_delay: Duration,
    pub log_file: Option<String>,
}

impl RunnerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pipeline_timeout: config.pipeline_timeout(),
            inter_job_delay: config.inter_job_delay(),
            error_delay: config.error_delay(),
            log_file: Some(config.output_log_file.clone()),
        }
    }
}

pub struct JobQueueRunner {
    session: AutomationSession,
    profile: CandidateProfile,
    context: Arc<Mutex<PageContext>>,
    sender: BridgeSender,
    reporter: StatusReporter,
    stop: Arc<AtomicBool>,
    settings: RunnerSettings,
}

impl JobQueueRunner {
    pub fn new(
        session: AutomationSession,
        profile: CandidateProfile,
        context: Arc<Mutex<PageContext>>,
        sender: BridgeSender,
        reporter: StatusReporter,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            session,
            profile,
            context,
            sender,
            reporter,
            stop: Arc::new(AtomicBool::new(false)),
            settings,
        }
    }

    /// 共享停止标志，置位后在下一个岗位之前结束
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub async fn run(mut self) -> RunSummary {
        // 整个运行期间独占标签页
        let context = self.context.clone();
        let mut context = context.lock().await;

        self.session.start();
        let total = self.session.len();
        info!("{}", "=".repeat(60));
        info!("▶ 开始投递 {} 个岗位", total);
        info!("{}", "=".repeat(60));

        let outcome = loop {
            // ========== 1. 检查 ==========
            if !self.session.has_remaining() {
                break RunOutcome::Completed;
            }
            if self.stop.load(Ordering::SeqCst) {
                info!("⏹ 已停止，剩余岗位保持当前状态");
                break RunOutcome::Stopped;
            }

            let index = self.session.cursor();
            let Some(job) = self.session.current_mut() else {
                break RunOutcome::Completed;
            };

            // ========== 2. 标记处理中 ==========
            if let Err(e) = job.begin_processing() {
                warn!("跳过岗位: {}", e);
                self.session.advance();
                continue;
            }
            let job = job.clone();
            info!("\n{}", "─".repeat(60));
            info!(
                "[岗位 {}/{}] {} @ {}",
                index + 1,
                total,
                logging::truncate_text(&job.title, 40),
                job.company
            );
            self.publish(&job, index, total, "processing");

            // ========== 3. 交给页面执行者 ==========
            // 不支持的平台直接失败，不打开页面
            let result = if !is_supported(&job.link) {
                Err(JobFailure::UnsupportedPlatform {
                    url: job.link.clone(),
                }
                .to_string())
            } else {
                match context.activate(&job.link).await {
                    Ok(()) => self.dispatch(&job).await,
                    Err(failure) => Err(failure.to_string()),
                }
            };

            // ========== 4. 记录结果 ==========
            let Some(current) = self.session.current_mut() else {
                break RunOutcome::Completed;
            };
            let transition = match &result {
                Ok(()) => current.mark_applied(),
                Err(cause) => current.mark_error(cause.clone()),
            };
            if let Err(e) = transition {
                error!("状态迁移失败: {}", e);
            }
            let finished = current.clone();

            match &result {
                Ok(()) => info!("[岗位 {}/{}] ✅ 已投递", index + 1, total),
                Err(cause) => error!("[岗位 {}/{}] ❌ 失败: {}", index + 1, total, cause),
            }

            // ========== 5. 同步状态 ==========
            self.reporter.report(self.session.session_id(), &finished);
            if let Some(path) = &self.settings.log_file {
                if let Err(e) = logging::append_job_result(path, &finished) {
                    debug!("写入运行日志失败: {}", e);
                }
            }
            let message = finished.error.clone().unwrap_or_else(|| "applied".to_string());
            self.publish(&finished, index, total, &message);

            // ========== 6. 间隔 ==========
            self.session.advance();
            if self.session.has_remaining() && !self.stop.load(Ordering::SeqCst) {
                let delay = if result.is_ok() {
                    self.settings.inter_job_delay
                } else {
                    self.settings.error_delay
                };
                debug!("等待 {}ms 后处理下一个岗位", delay.as_millis());
                sleep(delay).await;
            }
        };

        self.session.finish(outcome);
        let summary = RunSummary::from_session(self.session.clone(), outcome);
        info!(
            "■ 投递结束 ({:?}): 成功 {} / 失败 {} / 未处理 {}",
            summary.outcome, summary.applied, summary.failed, summary.pending
        );
        self.sender.notify(
            ContextId::Ui,
            Message::AutomationFinished {
                summary: summary.clone(),
            },
        );
        summary
    }

    /// 请求页面执行者处理岗位并等待结束报告
    async fn dispatch(&self, job: &JobDescriptor) -> Result<(), String> {
        let request = Message::ApplyToJob {
            job: job.clone(),
            profile: Some(self.profile.clone()),
        };
        let reply = self
            .sender
            .request(ContextId::Actor, request, self.settings.pipeline_timeout)
            .await
            .map_err(|e| JobFailure::from(e).to_string())?;

        match reply {
            Message::JobApplied {
                job_id,
                status: JobStatus::Applied,
                ..
            } if job_id == job.id => Ok(()),
            Message::JobApplied { job_id, error, .. } if job_id == job.id => {
                Err(error.unwrap_or_else(|| "application failed".to_string()))
            }
            other => Err(JobFailure::from(BridgeError::UnexpectedReply(
                other.action().to_string(),
            ))
            .to_string()),
        }
    }

    fn publish(&self, job: &JobDescriptor, index: usize, total: usize, message: &str) {
        let event = ProgressEvent {
            job: job.clone(),
            index,
            total,
            status: job.status,
            message: message.to_string(),
            at: chrono::Utc::now(),
        };
        self.sender.notify(ContextId::Ui, Message::Progress { event });
    }
}
