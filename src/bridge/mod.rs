//! 跨上下文消息桥

pub mod handoff;
pub mod hub;
pub mod message;

pub use handoff::HandoffChannel;
pub use hub::{Bridge, BridgeSender, ContextId, Endpoint, Envelope, EnvelopeKind, Inbox, ReplyTo};
pub use message::{decode, Message};
