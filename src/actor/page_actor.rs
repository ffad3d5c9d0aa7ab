//! 页面内执行者
//!
//! 每次页面激活都会接入一个新的执行者，旧执行者的收件箱随之关闭。
//! 执行者一次只跑一个岗位流程，流程在独立任务里运行，收件箱保持响应
//! （`jobSubmitted` 需要在流程挂起时送达）。

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bridge::{BridgeSender, ContextId, Envelope, Inbox, Message, ReplyTo};
use crate::error::JobFailure;
use crate::infrastructure::PageDriver;
use crate::models::{CandidateProfile, FillReport, JobDescriptor, JobId, JobStatus};
use crate::services::SubmitSignal;
use crate::workflow::{ApplyFlow, JobCtx};

struct InFlight {
    job_id: JobId,
    handle: JoinHandle<()>,
}

pub struct PageActor {
    page: Arc<dyn PageDriver>,
    flow: ApplyFlow,
    sender: BridgeSender,
    inbox: Inbox,
    signal: SubmitSignal,
    in_flight: Option<InFlight>,
}

impl PageActor {
    pub fn new(page: Arc<dyn PageDriver>, flow: ApplyFlow, sender: BridgeSender, inbox: Inbox) -> Self {
        Self {
            page,
            flow,
            sender,
            inbox,
            signal: SubmitSignal::new(),
            in_flight: None,
        }
    }

    /// 处理收件箱直到被替换
    pub async fn run(mut self) {
        debug!("页面执行者已接入");
        while let Some(envelope) = self.inbox.recv().await {
            self.handle(envelope);
        }

        // 页面已离开，旧流程随页面一起结束
        if let Some(in_flight) = self.in_flight.take() {
            if !in_flight.handle.is_finished() {
                debug!("执行者被替换，终止岗位 {} 的流程", in_flight.job_id);
                in_flight.handle.abort();
            }
        }
        debug!("页面执行者已退出");
    }

    fn handle(&mut self, envelope: Envelope) {
        let reply_to = envelope.reply_to();
        match envelope.message {
            Message::ApplyToJob { job, profile } => self.apply(job, profile, reply_to),
            Message::JobSubmitted => {
                debug!("收到 jobSubmitted 信号");
                self.signal.notify();
            }
            Message::FillJobApplication { candidate_info } => self.fill_only(candidate_info, reply_to),
            other => debug!("执行者忽略消息: {}", other.action()),
        }
    }

    fn busy_with(&self) -> Option<&JobId> {
        self.in_flight
            .as_ref()
            .filter(|f| !f.handle.is_finished())
            .map(|f| &f.job_id)
    }

    fn apply(&mut self, job: JobDescriptor, profile: Option<CandidateProfile>, reply_to: Option<ReplyTo>) {
        if let Some(current) = self.busy_with() {
            warn!("执行者正在处理岗位 {}，拒绝岗位 {}", current, job.id);
            let failure = JobFailure::ActorBusy(current.to_string());
            let message = Message::JobApplied {
                job_id: job.id,
                status: JobStatus::Error,
                error: Some(failure.to_string()),
            };
            reply(&self.sender, reply_to, message);
            return;
        }

        let profile = profile.unwrap_or_else(|| {
            warn!("⚠️ applyToJob 没有携带候选人资料，使用兜底资料");
            CandidateProfile::fallback()
        });

        let page = self.page.clone();
        let flow = self.flow.clone();
        let signal = self.signal.clone();
        let sender = self.sender.clone();
        let job_id = job.id.clone();

        let handle = tokio::spawn(async move {
            let ctx = JobCtx::single(&job);
            let outcome = flow.run(page.as_ref(), &job, &profile, &signal, &ctx).await;
            let message = match outcome {
                Ok(report) => {
                    info!(
                        "{} ✓ 已完成 (填写 {} / 跳过 {})",
                        ctx,
                        report.filled_count(),
                        report.skipped_count()
                    );
                    Message::JobApplied {
                        job_id: job.id,
                        status: JobStatus::Applied,
                        error: None,
                    }
                }
                Err(failure) => {
                    error!("{} ❌ {}", ctx, failure);
                    Message::JobApplied {
                        job_id: job.id,
                        status: JobStatus::Error,
                        error: Some(failure.to_string()),
                    }
                }
            };
            reply(&sender, reply_to, message);
        });

        self.in_flight = Some(InFlight { job_id, handle });
    }

    fn fill_only(&mut self, profile: CandidateProfile, reply_to: Option<ReplyTo>) {
        if let Some(current) = self.busy_with() {
            warn!("执行者正在处理岗位 {}，忽略手动填表", current);
            reply(
                &self.sender,
                reply_to,
                Message::FillCompleted {
                    report: FillReport::default(),
                },
            );
            return;
        }

        let page = self.page.clone();
        let flow = self.flow.clone();
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            let report = match flow.fill_current_page(page.as_ref(), &profile).await {
                Ok(report) => report,
                Err(failure) => {
                    warn!("手动填表失败: {}", failure);
                    FillReport::default()
                }
            };
            reply(&sender, reply_to, Message::FillCompleted { report });
        });

        self.in_flight = Some(InFlight {
            job_id: JobId::new("current-page"),
            handle,
        });
    }
}

/// 有回复地址就回复，否则以通知形式交给控制端
fn reply(sender: &BridgeSender, reply_to: Option<ReplyTo>, message: Message) {
    match reply_to {
        Some(reply_to) => sender.respond(reply_to, message),
        None => sender.notify(ContextId::Controller, message),
    }
}
