//! 岗位投递流程 - 流程层
//!
//! 核心职责：定义"一个岗位"的完整处理流程
//!
//! 流程顺序：
//! 1. 识别平台（不支持的平台立即失败）
//! 2. 等待申请表单出现
//! 3. 按策略表填写
//! 4. 提交，或等待用户提交

use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::error::JobFailure;
use crate::infrastructure::PageDriver;
use crate::models::{CandidateProfile, FillReport, JobDescriptor};
use crate::services::{
    classify, strategy_for, ElementWaiter, FormFiller, SubmissionController, SubmitSignal,
};
use crate::workflow::job_ctx::JobCtx;

/// 岗位投递流程
///
/// - 不持有页面，页面由执行者传入
/// - 只依赖业务能力（services）
#[derive(Debug, Clone)]
pub struct ApplyFlow {
    waiter: ElementWaiter,
    filler: FormFiller,
    submission: SubmissionController,
    form_timeout: Duration,
}

impl ApplyFlow {
    pub fn new(
        waiter: ElementWaiter,
        filler: FormFiller,
        submission: SubmissionController,
        form_timeout: Duration,
    ) -> Self {
        Self {
            waiter,
            filler,
            submission,
            form_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ElementWaiter::new(config.poll_interval()),
            FormFiller::from_config(config),
            SubmissionController::from_config(config),
            config.form_timeout(),
        )
    }

    pub async fn run(
        &self,
        page: &dyn PageDriver,
        job: &JobDescriptor,
        profile: &CandidateProfile,
        signal: &SubmitSignal,
        ctx: &JobCtx,
    ) -> Result<FillReport, JobFailure> {
        // ========== 1. 识别平台 ==========
        let variant = classify(&job.link);
        if !variant.is_supported() {
            error!("{} ❌ 不支持的平台: {}", ctx, job.link);
            return Err(JobFailure::UnsupportedPlatform {
                url: job.link.clone(),
            });
        }
        info!("{} 🧭 平台: {} | {}", ctx, variant, job.title);

        // ========== 2. 等待表单 ==========
        let strategy = strategy_for(variant);
        if !self
            .waiter
            .wait_for(page, strategy.form_selector, self.form_timeout)
            .await
            .is_found()
        {
            error!("{} ❌ 申请表单未出现 ({}ms)", ctx, self.form_timeout.as_millis());
            return Err(JobFailure::FormNotFound {
                selector: strategy.form_selector.to_string(),
            });
        }

        // ========== 3. 填表 ==========
        let report = self.filler.fill(page, variant, profile, job).await;

        // ========== 4. 提交 ==========
        self.submission
            .submit(page, strategy.submit_selector, signal)
            .await?;
        info!("{} ✓ 投递流程结束", ctx);

        Ok(report)
    }

    /// 只填当前页面的表单，不提交
    pub async fn fill_current_page(
        &self,
        page: &dyn PageDriver,
        profile: &CandidateProfile,
    ) -> Result<FillReport, JobFailure> {
        let url = page
            .current_url()
            .await
            .map_err(JobFailure::page)?
            .unwrap_or_default();
        let variant = classify(&url);
        info!("📝 手动填表: {} ({})", url, variant);

        let job = JobDescriptor::new("current-page", "advertised", "your company", url);
        Ok(self.filler.fill(page, variant, profile, &job).await)
    }
}
