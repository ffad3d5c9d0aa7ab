//! 消息中枢
//!
//! 三个上下文（界面、控制端、页面执行者）之间只交换消息，不共享状态。
//! 通知不需要回复；请求登记一个待定回调，收到匹配的回复时完成。
//! 同一发送方到同一接收方的消息保持顺序。

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::bridge::message::Message;
use crate::error::BridgeError;

/// 执行上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextId {
    Ui,
    Controller,
    Actor,
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextId::Ui => "ui",
            ContextId::Controller => "controller",
            ContextId::Actor => "actor",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Notify,
    Request,
}

/// 回复地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTo {
    pub to: ContextId,
    pub correlation: u64,
}

/// 投递到收件箱的消息
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: ContextId,
    pub kind: EnvelopeKind,
    pub correlation: Option<u64>,
    pub message: Message,
}

impl Envelope {
    /// 请求才有回复地址
    pub fn reply_to(&self) -> Option<ReplyTo> {
        match (self.kind, self.correlation) {
            (EnvelopeKind::Request, Some(correlation)) => Some(ReplyTo {
                to: self.from,
                correlation,
            }),
            _ => None,
        }
    }
}

struct Route {
    generation: u64,
    tx: mpsc::UnboundedSender<Envelope>,
}

struct Pending {
    to: ContextId,
    generation: u64,
    tx: oneshot::Sender<Message>,
}

#[derive(Default)]
struct Hub {
    routes: Mutex<HashMap<ContextId, Route>>,
    pending: Mutex<HashMap<u64, Pending>>,
    next_correlation: AtomicU64,
    next_generation: AtomicU64,
}

/// 消息中枢，克隆后共享
#[derive(Clone, Default)]
pub struct Bridge {
    hub: Arc<Hub>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接入一个上下文，替换同名的旧上下文
    ///
    /// 旧上下文的收件箱随即关闭，发给它但尚未回复的请求以 `Unreachable` 结束
    pub fn attach(&self, context: ContextId) -> Endpoint {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = self.hub.next_generation.fetch_add(1, Ordering::Relaxed);

        let mut routes = lock(&self.hub.routes);
        if let Some(old) = routes.insert(context, Route { generation, tx }) {
            let mut pending = lock(&self.hub.pending);
            let before = pending.len();
            pending.retain(|_, p| !(p.to == context && p.generation == old.generation));
            debug!(
                "上下文 {} 已替换，丢弃 {} 个待回复请求",
                context,
                before - pending.len()
            );
        }
        drop(routes);

        Endpoint {
            context,
            bridge: self.clone(),
            rx,
        }
    }

    /// 上下文是否在线
    pub fn is_attached(&self, context: ContextId) -> bool {
        lock(&self.hub.routes)
            .get(&context)
            .is_some_and(|route| !route.tx.is_closed())
    }

    /// 以某个上下文的身份发消息，不需要接入（外部页面、测试）
    pub fn sender_as(&self, context: ContextId) -> BridgeSender {
        BridgeSender {
            from: context,
            bridge: self.clone(),
        }
    }

    fn deliver(&self, to: ContextId, envelope: Envelope) -> bool {
        let routes = lock(&self.hub.routes);
        match routes.get(&to) {
            Some(route) => route.tx.send(envelope).is_ok(),
            None => false,
        }
    }

    fn register(&self, to: ContextId, envelope: Envelope) -> Option<oneshot::Receiver<Message>> {
        let Some(correlation) = envelope.correlation else {
            return None;
        };
        let routes = lock(&self.hub.routes);
        let route = routes.get(&to)?;
        let (tx, rx) = oneshot::channel();
        lock(&self.hub.pending).insert(
            correlation,
            Pending {
                to,
                generation: route.generation,
                tx,
            },
        );
        if route.tx.send(envelope).is_err() {
            lock(&self.hub.pending).remove(&correlation);
            return None;
        }
        Some(rx)
    }

    fn resolve(&self, correlation: u64, message: Message) -> bool {
        let Some(pending) = lock(&self.hub.pending).remove(&correlation) else {
            return false;
        };
        pending.tx.send(message).is_ok()
    }

    fn forget(&self, correlation: u64) {
        lock(&self.hub.pending).remove(&correlation);
    }

    fn next_correlation(&self) -> u64 {
        self.hub.next_correlation.fetch_add(1, Ordering::Relaxed)
    }
}

/// 上下文在中枢上的接入点
pub struct Endpoint {
    context: ContextId,
    bridge: Bridge,
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Endpoint {
    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn split(self) -> (BridgeSender, Inbox) {
        (
            BridgeSender {
                from: self.context,
                bridge: self.bridge,
            },
            Inbox { rx: self.rx },
        )
    }
}

/// 收件箱
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Inbox {
    /// 上下文被替换后返回 `None`
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

/// 发送端，可克隆
#[derive(Clone)]
pub struct BridgeSender {
    from: ContextId,
    bridge: Bridge,
}

impl BridgeSender {
    pub fn context(&self) -> ContextId {
        self.from
    }

    /// 发送通知，接收方不存在时静默丢弃
    pub fn notify(&self, to: ContextId, message: Message) {
        let action = message.action();
        let envelope = Envelope {
            from: self.from,
            kind: EnvelopeKind::Notify,
            correlation: None,
            message,
        };
        if !self.bridge.deliver(to, envelope) {
            debug!("{} → {} 的 {} 已丢弃（接收方不在线）", self.from, to, action);
        }
    }

    /// 发送请求并等待回复
    ///
    /// `timeout` 为 `None` 时无限等待；接收方不在线或在回复前被替换时返回 `Unreachable`
    pub async fn request(
        &self,
        to: ContextId,
        message: Message,
        timeout: Option<Duration>,
    ) -> Result<Message, BridgeError> {
        let correlation = self.bridge.next_correlation();
        debug!("{} → {} 请求 #{} {}", self.from, to, correlation, message.action());

        let envelope = Envelope {
            from: self.from,
            kind: EnvelopeKind::Request,
            correlation: Some(correlation),
            message,
        };
        let Some(reply) = self.bridge.register(to, envelope) else {
            return Err(BridgeError::Unreachable(to.to_string()));
        };

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, reply).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.bridge.forget(correlation);
                    return Err(BridgeError::Timeout {
                        to: to.to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => reply.await,
        };

        outcome.map_err(|_| BridgeError::Unreachable(to.to_string()))
    }

    /// 回复请求，请求方已放弃时静默丢弃
    pub fn respond(&self, reply_to: ReplyTo, message: Message) {
        let action = message.action();
        if !self.bridge.resolve(reply_to.correlation, message) {
            debug!(
                "{} → {} 的回复 #{} {} 已丢弃（请求方已放弃）",
                self.from, reply_to.to, reply_to.correlation, action
            );
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
