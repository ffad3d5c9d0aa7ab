use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::{JobDescriptor, JobStatus};

/// 会话状态机：Idle → Running → {Completed, Stopped}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Stopped,
}

/// 一次自动投递会话
///
/// 由队列执行器独占，状态只通过这里的方法迁移
#[derive(Debug, Clone)]
pub struct AutomationSession {
    session_id: Option<String>,
    queue: Vec<JobDescriptor>,
    cursor: usize,
    state: SessionState,
}

impl AutomationSession {
    /// 加载队列，所有岗位重置为 pending
    pub fn new(session_id: Option<String>, mut jobs: Vec<JobDescriptor>) -> Self {
        for job in jobs.iter_mut() {
            job.reset();
        }
        Self {
            session_id,
            queue: jobs,
            cursor: 0,
            state: SessionState::Idle,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue(&self) -> &[JobDescriptor] {
        &self.queue
    }

    pub fn into_jobs(self) -> Vec<JobDescriptor> {
        self.queue
    }

    /// Idle → Running
    pub fn start(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Running;
        }
    }

    /// 当前游标指向的岗位
    pub fn current_mut(&mut self) -> Option<&mut JobDescriptor> {
        self.queue.get_mut(self.cursor)
    }

    pub fn has_remaining(&self) -> bool {
        self.cursor < self.queue.len()
    }

    /// 游标只增不减
    pub fn advance(&mut self) {
        if self.cursor < self.queue.len() {
            self.cursor += 1;
        }
    }

    /// Running → Completed / Stopped
    pub fn finish(&mut self, outcome: RunOutcome) {
        if self.state == SessionState::Running {
            self.state = match outcome {
                RunOutcome::Completed => SessionState::Completed,
                RunOutcome::Stopped => SessionState::Stopped,
            };
        }
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.queue.iter().filter(|j| j.status == status).count()
    }
}

/// 队列结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Stopped,
}

/// 进度事件，推给 UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job: JobDescriptor,
    pub index: usize,
    pub total: usize,
    pub status: JobStatus,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// 一次运行的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub applied: usize,
    pub failed: usize,
    pub pending: usize,
    pub jobs: Vec<JobDescriptor>,
}

impl RunSummary {
    pub fn from_session(session: AutomationSession, outcome: RunOutcome) -> Self {
        let applied = session.count(JobStatus::Applied);
        let failed = session.count(JobStatus::Error);
        let pending = session.count(JobStatus::Pending);
        Self {
            outcome,
            applied,
            failed,
            pending,
            jobs: session.into_jobs(),
        }
    }
}
