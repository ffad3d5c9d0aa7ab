//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! app (界面：开始 / 停止 / 进度)
//!     ↓ bridge
//! controller (单会话守卫)
//!     ↓
//! queue_runner (处理 Vec<JobDescriptor>)
//!     ↓ bridge
//! actor::PageActor → workflow::ApplyFlow (处理单个岗位)
//!     ↓
//! services (能力层：classify / wait / fill / submit / report)
//!     ↓
//! infrastructure (基础设施：PageDriver / JsExecutor)
//! ```
//!
//! 编排层只做调度和统计，不碰 DOM

pub mod app;
pub mod controller;
pub mod queue_runner;

pub use app::App;
pub use controller::Controller;
pub use queue_runner::{JobQueueRunner, RunnerSettings};
