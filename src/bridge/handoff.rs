//! 外部页面交接通道
//!
//! 宿主网页通过 CDP binding `jobflowHandoff` 发来 JSON 帧：
//! 握手、传递会话 ID、把选中的岗位交给自动投递

use anyhow::Result;
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::hub::{BridgeSender, ContextId};
use crate::bridge::message::Message;
use crate::models::JobDescriptor;
use crate::services::LocalStore;

pub const HANDOFF_BINDING: &str = "jobflowHandoff";

const REPLY_JS: &str = r#"(reply) => {
    window.dispatchEvent(new CustomEvent('jobflowHandoffReply', { detail: reply }));
    return true;
}"#;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Inbound {
    Ping,
    SetSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    BeginApplying {
        jobs: Vec<JobDescriptor>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Outbound {
    Pong,
    SessionSet {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    ApplyingStarted {
        count: usize,
    },
    Error {
        message: String,
    },
}

/// 交接通道
///
/// 以界面上下文的身份把 `startJobAutomation` 发给控制端
#[derive(Clone)]
pub struct HandoffChannel {
    store: LocalStore,
    sender: BridgeSender,
}

impl HandoffChannel {
    pub fn new(store: LocalStore, sender: BridgeSender) -> Self {
        Self { store, sender }
    }

    /// 处理一帧，返回要回给页面的帧；未知类型不回复
    pub fn handle(&self, raw: &str) -> Option<String> {
        let reply = match serde_json::from_str::<Inbound>(raw) {
            Ok(Inbound::Ping) => Outbound::Pong,
            Ok(Inbound::SetSession { session_id }) => self.set_session(session_id),
            Ok(Inbound::BeginApplying { jobs }) => self.begin_applying(jobs),
            Ok(Inbound::Other) => {
                debug!("忽略未知交接帧: {}", raw);
                return None;
            }
            Err(e) => {
                warn!("交接帧格式错误: {}", e);
                Outbound::Error {
                    message: format!("malformed frame: {}", e),
                }
            }
        };
        serde_json::to_string(&reply).ok()
    }

    fn set_session(&self, session_id: String) -> Outbound {
        let session_id = session_id.trim().to_string();
        if session_id.is_empty() {
            return Outbound::Error {
                message: "empty session id".to_string(),
            };
        }
        match self.store.set_session_id(&session_id) {
            Ok(()) => {
                info!("🔗 已接收会话 ID: {}", session_id);
                Outbound::SessionSet { session_id }
            }
            Err(e) => Outbound::Error {
                message: e.to_string(),
            },
        }
    }

    fn begin_applying(&self, jobs: Vec<JobDescriptor>) -> Outbound {
        if jobs.is_empty() {
            return Outbound::Error {
                message: "no jobs selected".to_string(),
            };
        }
        if let Err(e) = self.store.set_selected_jobs(&jobs) {
            return Outbound::Error {
                message: e.to_string(),
            };
        }

        let count = jobs.len();
        let session_id = self.store.session_id().ok().flatten();
        info!("📥 宿主页面交来 {} 个岗位", count);
        self.sender.notify(
            ContextId::Controller,
            Message::StartJobAutomation { jobs, session_id },
        );
        Outbound::ApplyingStarted { count }
    }

    /// 在宿主页面上安装 binding 并转发收到的帧
    pub async fn serve_on_page(self, page: Page) -> Result<JoinHandle<()>> {
        page.execute(AddBindingParams::new(HANDOFF_BINDING)).await?;
        let mut events = page.event_listener::<EventBindingCalled>().await?;
        info!("🔗 交接通道已在宿主页面上就绪");

        Ok(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.name != HANDOFF_BINDING {
                    continue;
                }
                let Some(reply) = self.handle(&event.payload) else {
                    continue;
                };
                let script = format!("({})({})", REPLY_JS, reply);
                if let Err(e) = page.evaluate(script).await {
                    debug!("回复宿主页面失败: {}", e);
                }
            }
        }))
    }
}
