//! 状态同步 - 业务能力层
//!
//! 本地存储同步更新，远端后端异步推送，推送失败只记日志

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clients::BackendClient;
use crate::models::{JobDescriptor, JobId, JobStatus};
use crate::services::local_store::LocalStore;

/// 远端状态接收方
#[async_trait]
pub trait RemoteStatusSink: Send + Sync {
    async fn push_status(&self, session_id: &str, job_id: &JobId, status: JobStatus) -> Result<()>;
}

#[async_trait]
impl RemoteStatusSink for BackendClient {
    async fn push_status(&self, session_id: &str, job_id: &JobId, status: JobStatus) -> Result<()> {
        self.update_status(session_id, job_id, status).await?;
        Ok(())
    }
}

/// 状态同步器
///
/// 本地状态是界面的唯一依据，远端只是尽力同步
#[derive(Clone)]
pub struct StatusReporter {
    store: LocalStore,
    remote: Option<Arc<dyn RemoteStatusSink>>,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl StatusReporter {
    pub fn new(store: LocalStore, remote: Option<Arc<dyn RemoteStatusSink>>) -> Self {
        Self {
            store,
            remote,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// 上报一次状态变化
    pub fn report(&self, session_id: Option<&str>, job: &JobDescriptor) {
        match self
            .store
            .update_job_status(&job.id, job.status, job.error.as_deref())
        {
            Ok(true) => {}
            Ok(false) => debug!("本地岗位列表中没有岗位 {}，跳过本地更新", job.id),
            Err(e) => warn!("更新本地岗位 {} 状态失败: {}", job.id, e),
        }

        let (Some(remote), Some(session_id)) = (self.remote.clone(), session_id) else {
            return;
        };

        let session_id = session_id.to_string();
        let job_id = job.id.clone();
        let status = job.status;
        let handle = tokio::spawn(async move {
            match remote.push_status(&session_id, &job_id, status).await {
                Ok(()) => debug!("✓ 岗位 {} 状态 {} 已同步到后端", job_id, status),
                Err(e) => warn!("⚠️ 岗位 {} 状态同步失败: {:#}", job_id, e),
            }
        });

        let mut in_flight = self.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// 等待所有未完成的远端推送
    pub async fn flush(&self) {
        let handles: Vec<_> = self.lock().drain(..).collect();
        if handles.is_empty() {
            return;
        }
        debug!("等待 {} 个状态推送完成", handles.len());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("状态推送任务异常退出: {}", e);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
