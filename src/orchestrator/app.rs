//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：运行日志、本地存储、候选人资料、浏览器
//! 2. **上下文装配**：消息桥、页面执行者、控制端、可选的交接通道
//! 3. **界面**：发出开始请求，打印进度，Ctrl+C 请求停止
//! 4. **收尾**：等待状态推送完成，输出统计

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::actor::PageContext;
use crate::bridge::{Bridge, BridgeSender, ContextId, HandoffChannel, Inbox, Message};
use crate::browser;
use crate::clients::BackendClient;
use crate::config::Config;
use crate::infrastructure::{ChromePage, JsExecutor, PageDriver};
use crate::models::{JobDescriptor, ProfileOrigin, ProgressEvent, RunSummary};
use crate::orchestrator::controller::Controller;
use crate::orchestrator::queue_runner::RunnerSettings;
use crate::services::{LocalStore, ProfileResolver, RemoteStatusSink, StatusReporter};
use crate::utils::logging;
use crate::workflow::ApplyFlow;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    store: LocalStore,
    backend: BackendClient,
    reporter: StatusReporter,
    session_id: Option<String>,
    ui_sender: BridgeSender,
    ui_inbox: Inbox,
    _controller: JoinHandle<()>,
    handoff: Option<JoinHandle<()>>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let store = LocalStore::open(&config.store_path)
            .with_context(|| format!("无法打开本地存储 {}", config.store_path))?;
        let backend = BackendClient::from_config(&config);

        let session_id = match config.session_id.clone() {
            Some(id) => {
                if let Err(e) = store.set_session_id(&id) {
                    warn!("保存会话 ID 失败: {}", e);
                }
                Some(id)
            }
            None => store.session_id().unwrap_or_default(),
        };

        let resolved = ProfileResolver::new(&store, config.use_fallback_profile)
            .with_backend(&backend, config.backend_token.as_deref())
            .with_resume(config.resume_path.clone())
            .resolve()
            .await?;
        if resolved.origin == ProfileOrigin::Fallback {
            warn!("⚠️ 本次运行使用的是兜底资料，提交前请确认");
        }

        // 连接浏览器
        let (browser, page) = browser::acquire_browser(&config).await?;
        let driver: Arc<dyn PageDriver> = Arc::new(ChromePage::new(JsExecutor::new(page)));

        // 装配三个上下文
        let bridge = Bridge::new();
        let mut context = PageContext::new(driver, bridge.clone(), ApplyFlow::from_config(&config));
        context.attach_actor();

        let remote: Arc<dyn RemoteStatusSink> = Arc::new(backend.clone());
        let reporter = StatusReporter::new(store.clone(), Some(remote));

        let (controller_sender, controller_inbox) = bridge.attach(ContextId::Controller).split();
        let controller = Controller::new(
            Arc::new(Mutex::new(context)),
            controller_sender,
            reporter.clone(),
            resolved.profile,
            RunnerSettings::from_config(&config),
        )
        .with_session_id(session_id.clone());
        let controller_task = tokio::spawn(async move { controller.serve(controller_inbox).await });

        let (ui_sender, ui_inbox) = bridge.attach(ContextId::Ui).split();

        let handoff = match &config.handoff_page_url {
            Some(url) => {
                let host_page = browser::open_page(&browser, url).await?;
                let channel = HandoffChannel::new(store.clone(), bridge.sender_as(ContextId::Ui));
                Some(channel.serve_on_page(host_page).await?)
            }
            None => None,
        };

        Ok(Self {
            config,
            _browser: browser,
            store,
            backend,
            reporter,
            session_id,
            ui_sender,
            ui_inbox,
            _controller: controller_task,
            handoff,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        let jobs = self.load_jobs().await;

        if jobs.is_empty() {
            if self.handoff.is_none() {
                warn!("⚠️ 没有待投递的岗位，程序结束");
                return Ok(());
            }
            info!("⏳ 没有待投递的岗位，等待宿主页面交来岗位...");
        } else {
            logging::log_jobs_loaded(jobs.len(), self.config.inter_job_delay_ms);
            self.ui_sender.notify(
                ContextId::Controller,
                Message::StartJobAutomation {
                    jobs,
                    session_id: self.session_id.clone(),
                },
            );
        }

        let summary = self.watch_progress().await;

        self.reporter.flush().await;
        if let Some(summary) = summary {
            logging::print_final_stats(&summary, &self.config.output_log_file);
        }
        if let Some(handoff) = self.handoff.take() {
            handoff.abort();
        }
        Ok(())
    }

    /// 会话 ID 存在时从后端拉取，否则使用本地选中的岗位
    async fn load_jobs(&self) -> Vec<JobDescriptor> {
        info!("\n📁 正在加载待投递的岗位...");
        if let Some(session_id) = &self.session_id {
            match self.backend.fetch_jobs(session_id).await {
                Ok(jobs) => {
                    if let Err(e) = self.store.set_jobs(&jobs) {
                        warn!("保存岗位列表失败: {}", e);
                    }
                    return jobs;
                }
                Err(e) => warn!("⚠️ 从后端加载岗位失败，改用本地选中的岗位: {}", e),
            }
        }
        self.store.selected_jobs().unwrap_or_else(|e| {
            error!("读取本地选中的岗位失败: {}", e);
            Vec::new()
        })
    }

    /// 界面循环：打印进度，第一次 Ctrl+C 请求停止，第二次直接退出
    async fn watch_progress(&mut self) -> Option<RunSummary> {
        let mut stop_requested = false;
        loop {
            tokio::select! {
                envelope = self.ui_inbox.recv() => {
                    let envelope = envelope?;
                    match envelope.message {
                        Message::Progress { event } => print_progress(&event),
                        Message::AutomationFinished { summary } => return Some(summary),
                        Message::StartRejected { reason } => {
                            error!("❌ 开始请求被拒绝: {}", reason);
                            return None;
                        }
                        _ => {}
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    if stop_requested {
                        warn!("再次收到 Ctrl+C，立即退出");
                        return None;
                    }
                    stop_requested = true;
                    info!("⏹ 收到 Ctrl+C，当前岗位完成后停止（再按一次立即退出）");
                    self.ui_sender.notify(ContextId::Controller, Message::StopJobAutomation);
                }
            }
        }
    }
}

fn print_progress(event: &ProgressEvent) {
    info!(
        "📈 [{}/{}] #{} {} → {} ({})",
        event.index + 1,
        event.total,
        event.job.id,
        logging::truncate_text(&event.job.title, 30),
        event.status,
        event.message
    );
}
