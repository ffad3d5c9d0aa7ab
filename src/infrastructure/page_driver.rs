//! 页面驱动接口 - 基础设施层
//!
//! 页面内执行者只通过这个 trait 接触 DOM，生产环境由 `ChromePage` 实现

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// 查询到的元素摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// 标签名（小写）
    pub tag: String,
    /// input 的 type 属性
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
}

impl ElementInfo {
    pub fn new(tag: impl Into<String>, input_type: Option<&str>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            input_type: input_type.map(|t| t.to_ascii_lowercase()),
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self::new("input", Some(input_type))
    }

    pub fn textarea() -> Self {
        Self::new("textarea", None)
    }

    pub fn is_file_input(&self) -> bool {
        self.tag == "input" && self.input_type.as_deref() == Some("file")
    }
}

/// DOM 变更订阅
///
/// 每收到一批变更就产生一次通知；被 drop 时恰好释放一次底层观察者
pub struct MutationSubscription {
    batches: mpsc::UnboundedReceiver<()>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl MutationSubscription {
    pub fn new(
        batches: mpsc::UnboundedReceiver<()>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            batches,
            release: Some(Box::new(release)),
        }
    }

    /// 等待下一批变更，观察者失效时返回 `None`
    pub async fn next_batch(&mut self) -> Option<()> {
        self.batches.recv().await
    }
}

impl Drop for MutationSubscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// 页面驱动
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航并等待加载完成
    async fn navigate(&self, url: &str) -> Result<()>;

    /// 当前页面地址
    async fn current_url(&self) -> Result<Option<String>>;

    /// 立即查询选择器，不等待
    async fn query(&self, selector: &str) -> Result<Option<ElementInfo>>;

    /// 订阅整个文档的 DOM 变更
    async fn observe_mutations(&self) -> Result<MutationSubscription>;

    /// 清空、聚焦、赋值，并派发 input / change 事件
    async fn fill_value(&self, selector: &str, value: &str) -> Result<()>;

    /// 文件上传（不能用赋值代替）
    async fn upload_file(&self, selector: &str, path: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// 监听页面级 submit 事件
    async fn arm_submit_listener(&self) -> Result<()>;

    /// 自上次 arm 以来是否观察到提交
    async fn submit_observed(&self) -> Result<bool>;
}
