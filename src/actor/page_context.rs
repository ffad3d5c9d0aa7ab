//! 页面上下文
//!
//! 持有标签页，激活时导航并接入一个全新的执行者

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::actor::page_actor::PageActor;
use crate::bridge::{Bridge, ContextId};
use crate::error::JobFailure;
use crate::infrastructure::PageDriver;
use crate::workflow::ApplyFlow;

pub struct PageContext {
    page: Arc<dyn PageDriver>,
    bridge: Bridge,
    flow: ApplyFlow,
    actor: Option<JoinHandle<()>>,
}

impl PageContext {
    pub fn new(page: Arc<dyn PageDriver>, bridge: Bridge, flow: ApplyFlow) -> Self {
        Self {
            page,
            bridge,
            flow,
            actor: None,
        }
    }

    pub fn page(&self) -> &Arc<dyn PageDriver> {
        &self.page
    }

    /// 导航到岗位链接并接入新执行者
    pub async fn activate(&mut self, url: &str) -> Result<(), JobFailure> {
        info!("🌐 打开 {}", url);
        self.page
            .navigate(url)
            .await
            .map_err(|e| JobFailure::Navigation(format!("{}: {:#}", url, e)))?;
        self.attach_actor();
        Ok(())
    }

    /// 在当前页面上接入新执行者，替换旧的
    pub fn attach_actor(&mut self) {
        let (sender, inbox) = self.bridge.attach(ContextId::Actor).split();
        let actor = PageActor::new(self.page.clone(), self.flow.clone(), sender, inbox);
        if let Some(previous) = self.actor.replace(tokio::spawn(actor.run())) {
            debug!("旧执行者已替换 (已退出: {})", previous.is_finished());
        }
    }
}
