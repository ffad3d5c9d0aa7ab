//! 控制端 - 编排层
//!
//! 接收界面的开始 / 停止请求，保证同一时间只有一个投递会话

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::actor::PageContext;
use crate::bridge::{BridgeSender, Inbox, Message};
use crate::error::SessionError;
use crate::models::{
    AutomationSession, CandidateProfile, JobDescriptor, JobId, JobStatus, RunSummary,
};
use crate::orchestrator::queue_runner::{JobQueueRunner, RunnerSettings};
use crate::services::StatusReporter;

/// 会话占用标志，运行结束（包括任务被取消）时自动释放
struct SessionGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

struct Inner {
    busy: Arc<AtomicBool>,
    stop: StdMutex<Option<Arc<AtomicBool>>>,
    session_id: StdMutex<Option<String>>,
    context: Arc<Mutex<PageContext>>,
    sender: BridgeSender,
    reporter: StatusReporter,
    profile: CandidateProfile,
    settings: RunnerSettings,
}

/// 控制端，克隆后共享
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

impl Controller {
    pub fn new(
        context: Arc<Mutex<PageContext>>,
        sender: BridgeSender,
        reporter: StatusReporter,
        profile: CandidateProfile,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                busy: Arc::new(AtomicBool::new(false)),
                stop: StdMutex::new(None),
                session_id: StdMutex::new(None),
                context,
                sender,
                reporter,
                profile,
                settings,
            }),
        }
    }

    /// 开始请求没有带会话 ID 时使用的默认值
    pub fn with_session_id(self, session_id: Option<String>) -> Self {
        *lock(&self.inner.session_id) = session_id;
        self
    }

    /// 有会话在跑且没有被要求停止
    pub fn is_running(&self) -> bool {
        self.is_busy() && !self.stop_requested()
    }

    /// 会话占用尚未释放（停止后当前岗位仍在收尾时也为 true）
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    fn stop_requested(&self) -> bool {
        lock(&self.inner.stop)
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// 开始一个会话；已有会话在运行时拒绝
    pub fn start(
        &self,
        session_id: Option<String>,
        jobs: Vec<JobDescriptor>,
    ) -> Result<JoinHandle<RunSummary>, SessionError> {
        if jobs.is_empty() {
            return Err(SessionError::EmptyQueue);
        }
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("⚠️ 已有投递会话在运行，拒绝新的开始请求");
            return Err(SessionError::AlreadyRunning);
        }
        let guard = SessionGuard {
            busy: self.inner.busy.clone(),
        };
        let stop = Arc::new(AtomicBool::new(false));
        *lock(&self.inner.stop) = Some(stop.clone());

        let session = AutomationSession::new(session_id.clone(), jobs);
        if let Err(e) = self.inner.reporter.store().set_jobs(session.queue()) {
            warn!("保存岗位列表失败: {}", e);
        }
        *lock(&self.inner.session_id) = session_id;

        let runner = JobQueueRunner::new(
            session,
            self.inner.profile.clone(),
            self.inner.context.clone(),
            self.inner.sender.clone(),
            self.inner.reporter.clone(),
            self.inner.settings.clone(),
        )
        .with_stop_flag(stop);

        info!("▶ 投递会话已开始");
        Ok(tokio::spawn(async move {
            let _guard = guard;
            runner.run().await
        }))
    }

    /// 请求停止，当前岗位完成后生效
    pub fn stop(&self) -> bool {
        match lock(&self.inner.stop).as_ref() {
            Some(flag) if self.is_busy() => {
                flag.store(true, Ordering::SeqCst);
                info!("⏹ 已请求停止，当前岗位完成后结束");
                true
            }
            _ => {
                debug!("没有运行中的会话，忽略停止请求");
                false
            }
        }
    }

    /// 处理控制端收件箱直到桥接关闭
    pub async fn serve(&self, mut inbox: Inbox) {
        while let Some(envelope) = inbox.recv().await {
            match envelope.message {
                Message::StartJobAutomation { jobs, session_id } => {
                    let session_id = session_id.or_else(|| lock(&self.inner.session_id).clone());
                    if let Err(e) = self.start(session_id, jobs) {
                        self.inner.sender.notify(
                            envelope.from,
                            Message::StartRejected {
                                reason: e.to_string(),
                            },
                        );
                    }
                }
                Message::StopJobAutomation => {
                    self.stop();
                }
                Message::JobApplied {
                    job_id,
                    status,
                    error,
                } => self.record_out_of_band(job_id, status, error),
                other => debug!("控制端忽略消息: {}", other.action()),
            }
        }
        debug!("控制端收件箱已关闭");
    }

    /// 队列之外的 jobApplied 通知（例如用户手动在页面上投递）
    fn record_out_of_band(&self, job_id: JobId, status: JobStatus, error: Option<String>) {
        let store = self.inner.reporter.store();
        let mut job = store
            .jobs()
            .ok()
            .and_then(|jobs| jobs.into_iter().find(|j| j.id == job_id))
            .unwrap_or_else(|| JobDescriptor::new(job_id.clone(), "", "", ""));
        if let Err(e) = job.settle(status, error) {
            warn!("忽略队列外的状态通知: {}", e);
            return;
        }

        info!("📨 收到岗位 {} 的状态: {}", job_id, status);
        let session_id = lock(&self.inner.session_id).clone();
        self.inner.reporter.report(session_id.as_deref(), &job);
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
