//! 本地键值存储 - 业务能力层
//!
//! JSON 文件持久化，供控制端和界面共享会话 ID、岗位列表和候选人资料

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::{CandidateProfile, JobDescriptor, JobId, JobStatus};

pub const KEY_SESSION_ID: &str = "sessionId";
pub const KEY_JOBS: &str = "jobs";
pub const KEY_USER_PROFILE: &str = "userProfile";
pub const KEY_SELECTED_JOBS: &str = "selectedJobs";

/// 本地存储，克隆后共享同一份数据
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: Option<PathBuf>,
    data: Arc<Mutex<Map<String, Value>>>,
}

impl LocalStore {
    /// 打开存储文件，文件不存在时从空白开始
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Decode {
                key: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("存储文件 {} 不存在，从空白开始", path.display());
                Map::new()
            }
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self {
            path: Some(path),
            data: Arc::new(Mutex::new(data)),
        })
    }

    /// 不落盘的存储（测试和一次性运行）
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Arc::new(Mutex::new(Map::new())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let data = self.lock();
        match data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })?;
        let mut data = self.lock();
        data.insert(key.to_string(), value);
        self.persist(&data)
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.lock();
        if data.remove(key).is_some() {
            self.persist(&data)?;
        }
        Ok(())
    }

    pub fn session_id(&self) -> Result<Option<String>, StoreError> {
        self.get(KEY_SESSION_ID)
    }

    pub fn set_session_id(&self, session_id: &str) -> Result<(), StoreError> {
        self.set(KEY_SESSION_ID, &session_id)
    }

    pub fn jobs(&self) -> Result<Vec<JobDescriptor>, StoreError> {
        Ok(self.get(KEY_JOBS)?.unwrap_or_default())
    }

    pub fn set_jobs(&self, jobs: &[JobDescriptor]) -> Result<(), StoreError> {
        self.set(KEY_JOBS, &jobs)
    }

    pub fn selected_jobs(&self) -> Result<Vec<JobDescriptor>, StoreError> {
        Ok(self.get(KEY_SELECTED_JOBS)?.unwrap_or_default())
    }

    pub fn set_selected_jobs(&self, jobs: &[JobDescriptor]) -> Result<(), StoreError> {
        self.set(KEY_SELECTED_JOBS, &jobs)
    }

    pub fn profile(&self) -> Result<Option<CandidateProfile>, StoreError> {
        self.get(KEY_USER_PROFILE)
    }

    pub fn set_profile(&self, profile: &CandidateProfile) -> Result<(), StoreError> {
        self.set(KEY_USER_PROFILE, profile)
    }

    /// 更新已存岗位列表里某个岗位的状态
    ///
    /// 列表里没有这个岗位时返回 `false`
    pub fn update_job_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        error: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut jobs = self.jobs()?;
        let Some(job) = jobs.iter_mut().find(|j| &j.id == job_id) else {
            return Ok(false);
        };
        job.status = status;
        job.error = error.map(str::to_string);
        self.set_jobs(&jobs)?;
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        // 锁中毒后继续使用
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(data).map_err(|source| StoreError::Decode {
            key: path.display().to_string(),
            source,
        })?;
        // 先写同目录的临时文件再改名，中途失败不会留下半个文件
        let staging = staging_path(path);
        std::fs::write(&staging, content)
            .and_then(|()| std::fs::rename(&staging, path))
            .map_err(|source| {
                let _ = std::fs::remove_file(&staging);
                warn!("写入存储文件 {} 失败: {}", path.display(), source);
                StoreError::WriteFailed {
                    path: path.display().to_string(),
                    source,
                }
            })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
