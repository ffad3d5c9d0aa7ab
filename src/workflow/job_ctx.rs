//! 岗位处理上下文
//!
//! 封装"我正在处理队列里第几个岗位"这一信息，只用于日志

use std::fmt::Display;

use crate::models::{JobDescriptor, JobId};

#[derive(Debug, Clone)]
pub struct JobCtx {
    pub job_id: JobId,
    /// 队列中的位置（从1开始）
    pub index: usize,
    pub total: usize,
    pub company: String,
}

impl JobCtx {
    pub fn new(job: &JobDescriptor, index: usize, total: usize) -> Self {
        Self {
            job_id: job.id.clone(),
            index,
            total,
            company: job.company.clone(),
        }
    }

    /// 不在队列里的单次任务
    pub fn single(job: &JobDescriptor) -> Self {
        Self::new(job, 1, 1)
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[岗位 #{} {}/{} @{}]",
            self.job_id, self.index, self.total, self.company
        )
    }
}
