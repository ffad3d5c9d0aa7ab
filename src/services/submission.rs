//! 提交控制 - 业务能力层
//!
//! 自动模式直接点击提交按钮；监督模式挂起等待用户自己提交

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{Config, SubmissionMode};
use crate::error::JobFailure;
use crate::infrastructure::PageDriver;
use crate::services::element_waiter::{ElementWaiter, WaitOutcome};

/// 外部"已提交"信号
///
/// 由桥接层收到 `jobSubmitted` 时触发，等待中的监督模式据此结束
#[derive(Debug, Clone)]
pub struct SubmitSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl SubmitSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// 通知一次提交
    pub fn notify(&self) {
        self.tx.send_modify(|count| *count += 1);
    }

    /// 只关心订阅之后的通知
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        let mut rx = self.tx.subscribe();
        rx.borrow_and_update();
        rx
    }
}

impl Default for SubmitSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// 提交控制器
#[derive(Debug, Clone)]
pub struct SubmissionController {
    mode: SubmissionMode,
    waiter: ElementWaiter,
    submit_timeout: Duration,
    settle: Duration,
    poll_interval: Duration,
}

impl SubmissionController {
    pub fn new(mode: SubmissionMode, waiter: ElementWaiter) -> Self {
        Self {
            mode,
            waiter,
            submit_timeout: Duration::from_secs(5),
            settle: Duration::from_secs(3),
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.submission_mode, ElementWaiter::new(config.poll_interval()))
            .with_timings(config.submit_timeout(), config.settle(), config.poll_interval())
    }

    pub fn with_timings(mut self, submit_timeout: Duration, settle: Duration, poll: Duration) -> Self {
        self.submit_timeout = submit_timeout;
        self.settle = settle;
        self.poll_interval = poll.max(Duration::from_millis(1));
        self
    }

    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    /// 提交或等待提交
    ///
    /// 自动模式成功只代表"已触发提交"，不代表对方已受理
    pub async fn submit(
        &self,
        page: &dyn PageDriver,
        submit_selector: &str,
        signal: &SubmitSignal,
    ) -> Result<(), JobFailure> {
        match self.mode {
            SubmissionMode::Autonomous => self.submit_autonomously(page, submit_selector).await,
            SubmissionMode::Supervised => self.await_user_submit(page, signal).await,
        }
    }

    async fn submit_autonomously(
        &self,
        page: &dyn PageDriver,
        submit_selector: &str,
    ) -> Result<(), JobFailure> {
        if let WaitOutcome::TimedOut = self
            .waiter
            .wait_for(page, submit_selector, self.submit_timeout)
            .await
        {
            return Err(JobFailure::SubmitControlNotFound {
                selector: submit_selector.to_string(),
            });
        }

        page.click(submit_selector).await.map_err(JobFailure::page)?;
        info!("🚀 已点击提交，等待 {}ms", self.settle.as_millis());
        sleep(self.settle).await;
        Ok(())
    }

    async fn await_user_submit(
        &self,
        page: &dyn PageDriver,
        signal: &SubmitSignal,
    ) -> Result<(), JobFailure> {
        let mut submitted = signal.subscribe();
        page.arm_submit_listener().await.map_err(JobFailure::page)?;
        info!("⏸ 表单已填好，等待用户确认并提交...");

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = submitted.changed() => {
                    if changed.is_ok() {
                        info!("✓ 收到提交信号");
                        return Ok(());
                    }
                }
                _ = ticker.tick() => {
                    match page.submit_observed().await {
                        Ok(true) => {
                            info!("✓ 页面已提交");
                            return Ok(());
                        }
                        Ok(false) => {}
                        Err(e) => debug!("检查提交状态失败: {}", e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_only_counts_notifications_after_subscribe() {
        let signal = SubmitSignal::new();
        signal.notify();

        let mut rx = signal.subscribe();
        assert!(!rx.has_changed().unwrap());

        signal.notify();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 2);
    }
}
