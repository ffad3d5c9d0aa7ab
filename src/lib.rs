//! # JobFlow Automation
//!
//! 在各招聘平台（Ashby / Greenhouse / Lever）上自动填写并提交岗位申请
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力接口，`ChromePage` 为 CDP 实现
//!
//! ### ② 业务能力层（Services）
//! - `PlatformClassifier` - URL → 平台
//! - `ElementWaiter` - 等待选择器出现
//! - `FormFiller` + 策略表 - 按平台填表
//! - `SubmissionController` - 自动提交 / 等待用户提交
//! - `StatusReporter` / `LocalStore` / `ProfileResolver`
//!
//! ### ③ 流程层（Workflow）
//! - `ApplyFlow` - 单个岗位：识别 → 等表单 → 填写 → 提交
//!
//! ### ④ 上下文与编排（Actor / Bridge / Orchestration）
//! - `bridge/` - 界面、控制端、页面执行者之间的消息桥
//! - `actor/` - 页面执行者，每次导航重新接入
//! - `orchestrator/` - 控制端、队列执行器、应用入口

pub mod actor;
pub mod bridge;
pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, SubmissionMode};
pub use error::JobFailure;
pub use infrastructure::{ChromePage, JsExecutor, PageDriver};
pub use models::{CandidateProfile, JobDescriptor, JobStatus, PlatformVariant};
pub use orchestrator::{App, Controller, JobQueueRunner};
