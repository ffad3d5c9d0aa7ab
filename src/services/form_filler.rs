//! 表单填写 - 业务能力层
//!
//! 按策略表逐个字段等待并写入，缺失或失败的字段只记录、不中断

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::PageDriver;
use crate::models::{CandidateProfile, FillReport, JobDescriptor, PlatformVariant, SkipReason};
use crate::services::element_waiter::{ElementWaiter, WaitOutcome};
use crate::services::field_strategy::{self, FieldKind, FieldMap, FieldSpec};

/// 表单填写器
#[derive(Debug, Clone)]
pub struct FormFiller {
    waiter: ElementWaiter,
    field_timeout: Duration,
    field_pause: Duration,
    fill_common_fields: bool,
}

impl FormFiller {
    pub fn new(waiter: ElementWaiter, field_timeout: Duration, field_pause: Duration) -> Self {
        Self {
            waiter,
            field_timeout,
            field_pause,
            fill_common_fields: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ElementWaiter::new(config.poll_interval()),
            config.field_timeout(),
            config.field_pause(),
        )
        .with_common_fields(config.fill_common_fields)
    }

    /// 平台字段之前先填一轮通用字段
    pub fn with_common_fields(mut self, enabled: bool) -> Self {
        self.fill_common_fields = enabled;
        self
    }

    /// 按平台策略填表
    pub async fn fill(
        &self,
        page: &dyn PageDriver,
        variant: PlatformVariant,
        profile: &CandidateProfile,
        job: &JobDescriptor,
    ) -> FillReport {
        let strategy = field_strategy::strategy_for(variant);
        let mut report = FillReport::default();

        // 未知平台的策略本身就是通用字段表，不重复填
        if self.fill_common_fields && variant.is_supported() {
            let common: Vec<FieldSpec> = field_strategy::common_fields()
                .iter()
                .filter(|c| !strategy.fields.iter().any(|f| f.selector == c.selector))
                .copied()
                .collect();
            debug!("先填通用字段 {} 个", common.len());
            report.merge(self.fill_with(page, &common, profile, job).await);
        }

        report.merge(self.fill_with(page, strategy.fields, profile, job).await);

        info!(
            "[岗位 {}] 填表完成: 已填 {} 个，跳过 {} 个",
            job.id,
            report.filled_count(),
            report.skipped_count()
        );
        report
    }

    /// 按给定字段表填写，顺序与表一致
    pub async fn fill_with(
        &self,
        page: &dyn PageDriver,
        fields: &FieldMap,
        profile: &CandidateProfile,
        job: &JobDescriptor,
    ) -> FillReport {
        let mut report = FillReport::default();

        for (index, field) in fields.iter().enumerate() {
            if index > 0 && !self.field_pause.is_zero() {
                sleep(self.field_pause).await;
            }

            let Some(value) = (field.value)(profile, job) else {
                debug!("字段 {} 没有可用的值，跳过", field.name);
                report.record_skipped(field.name, field.selector, SkipReason::NoValue);
                continue;
            };

            let element = match self.waiter.wait_for(page, field.selector, self.field_timeout).await {
                WaitOutcome::Found(element) => element,
                WaitOutcome::TimedOut => {
                    debug!("字段 {} 未出现: {}", field.name, field.selector);
                    report.record_skipped(field.name, field.selector, SkipReason::NotFound);
                    continue;
                }
            };

            let result = if field.kind == FieldKind::File || element.is_file_input() {
                page.upload_file(field.selector, &value).await
            } else {
                page.fill_value(field.selector, &value).await
            };

            match result {
                Ok(()) => {
                    debug!("✓ 已填写 {}", field.name);
                    report.record_filled(field.name, field.selector);
                }
                Err(e) => {
                    warn!("填写字段 {} 失败: {}", field.name, e);
                    report.record_skipped(
                        field.name,
                        field.selector,
                        SkipReason::FillFailed {
                            message: e.to_string(),
                        },
                    );
                }
            }
        }

        report
    }
}
