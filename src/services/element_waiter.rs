//! 元素等待 - 业务能力层
//!
//! 等待选择器出现，结果只有 Found / TimedOut 两种，不会报错

use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::debug;

use crate::infrastructure::{ElementInfo, PageDriver};

/// 等待结果，超时是正常结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Found(ElementInfo),
    TimedOut,
}

impl WaitOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, WaitOutcome::Found(_))
    }

    pub fn into_element(self) -> Option<ElementInfo> {
        match self {
            WaitOutcome::Found(el) => Some(el),
            WaitOutcome::TimedOut => None,
        }
    }
}

/// 元素等待器
///
/// 先立即检查；不存在时订阅 DOM 变更，每批变更重新检查一次，
/// 同时按轮询间隔兜底检查。订阅随等待结束被释放
#[derive(Debug, Clone)]
pub struct ElementWaiter {
    poll_interval: Duration,
}

impl ElementWaiter {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// 在 `limit` 内等待选择器出现
    pub async fn wait_for(
        &self,
        page: &dyn PageDriver,
        selector: &str,
        limit: Duration,
    ) -> WaitOutcome {
        match timeout(limit, self.wait_until_present(page, selector)).await {
            Ok(element) => WaitOutcome::Found(element),
            Err(_) => {
                debug!("等待 {} 超时 ({}ms)", selector, limit.as_millis());
                WaitOutcome::TimedOut
            }
        }
    }

    async fn wait_until_present(&self, page: &dyn PageDriver, selector: &str) -> ElementInfo {
        if let Some(element) = probe(page, selector).await {
            return element;
        }

        let mut subscription = match page.observe_mutations().await {
            Ok(sub) => Some(sub),
            Err(e) => {
                debug!("无法订阅 DOM 变更，改为轮询: {}", e);
                None
            }
        };

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            // 订阅建立之后再查一次，避免漏掉订阅前发生的变更
            if let Some(element) = probe(page, selector).await {
                return element;
            }

            let lost = match subscription.as_mut() {
                Some(sub) => {
                    tokio::select! {
                        batch = sub.next_batch() => batch.is_none(),
                        _ = ticker.tick() => false,
                    }
                }
                None => {
                    ticker.tick().await;
                    false
                }
            };
            if lost {
                debug!("DOM 变更订阅已失效，改为轮询");
                subscription = None;
            }
        }
    }
}

impl Default for ElementWaiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

/// 查询失败（如页面正在跳转）按不存在处理
async fn probe(page: &dyn PageDriver, selector: &str) -> Option<ElementInfo> {
    match page.query(selector).await {
        Ok(found) => found,
        Err(e) => {
            debug!("查询 {} 失败: {}", selector, e);
            None
        }
    }
}
