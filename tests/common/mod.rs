#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use jobflow_automation::actor::PageContext;
use jobflow_automation::bridge::{Bridge, BridgeSender, ContextId, Inbox, Message};
use jobflow_automation::config::{Config, SubmissionMode};
use jobflow_automation::infrastructure::{ElementInfo, MutationSubscription, PageDriver};
use jobflow_automation::models::{
    CandidateProfile, JobDescriptor, JobId, JobStatus, ProgressEvent, RunSummary,
};
use jobflow_automation::orchestrator::{Controller, RunnerSettings};
use jobflow_automation::services::{LocalStore, RemoteStatusSink, StatusReporter};
use jobflow_automation::workflow::ApplyFlow;

pub const FORM: &str = r#"form[data-testid="application-form"]"#;
pub const SUBMIT: &str = r#"button[type="submit"]"#;

#[derive(Default)]
struct State {
    url: Option<String>,
    dom: HashMap<String, ElementInfo>,
    filled: Vec<(String, String)>,
    uploads: Vec<(String, String)>,
    clicks: Vec<String>,
    navigations: Vec<String>,
    failing: HashSet<String>,
    armed: bool,
    submitted: bool,
}

#[derive(Default)]
struct Inner {
    fixtures: Mutex<HashMap<String, Vec<(String, ElementInfo)>>>,
    state: Mutex<State>,
    observers: Mutex<HashMap<u64, mpsc::UnboundedSender<()>>>,
    next_observer: AtomicU64,
    navigate_delay: Mutex<Duration>,
}

/// 内存页面：按 URL 加载预设的 DOM，记录所有写入
#[derive(Clone, Default)]
pub struct MemoryPage {
    inner: Arc<Inner>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个 URL 预设 DOM
    pub fn with_fixture(self, url: &str, elements: Vec<(&str, ElementInfo)>) -> Self {
        let elements = elements
            .into_iter()
            .map(|(selector, el)| (selector.to_string(), el))
            .collect();
        self.inner
            .fixtures
            .lock()
            .unwrap()
            .insert(url.to_string(), elements);
        self
    }

    pub fn with_navigate_delay(self, delay: Duration) -> Self {
        *self.inner.navigate_delay.lock().unwrap() = delay;
        self
    }

    /// 直接修改当前 DOM
    pub fn insert(&self, selector: &str, element: ElementInfo) {
        self.inner
            .state
            .lock()
            .unwrap()
            .dom
            .insert(selector.to_string(), element);
        self.notify_observers();
    }

    /// 一段时间后插入元素，模拟异步渲染
    pub fn insert_later(&self, selector: &str, element: ElementInfo, delay: Duration) {
        let page = self.clone();
        let selector = selector.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            page.insert(&selector, element);
        });
    }

    /// 写入某个选择器时报错
    pub fn fail_on(&self, selector: &str) {
        self.inner
            .state
            .lock()
            .unwrap()
            .failing
            .insert(selector.to_string());
    }

    /// 模拟用户在页面上点了提交
    pub fn user_submits(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if state.armed {
            state.submitted = true;
        }
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.inner.state.lock().unwrap().filled.clone()
    }

    pub fn filled_value(&self, selector: &str) -> Option<String> {
        self.filled()
            .into_iter()
            .rev()
            .find(|(s, _)| s == selector)
            .map(|(_, v)| v)
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.inner.state.lock().unwrap().uploads.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.inner.state.lock().unwrap().clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.inner.state.lock().unwrap().navigations.clone()
    }

    pub fn is_armed(&self) -> bool {
        self.inner.state.lock().unwrap().armed
    }

    /// 当前未释放的 DOM 变更订阅数
    pub fn active_observers(&self) -> usize {
        self.inner.observers.lock().unwrap().len()
    }

    fn notify_observers(&self) {
        let observers = self.inner.observers.lock().unwrap();
        for tx in observers.values() {
            let _ = tx.send(());
        }
    }
}

#[async_trait]
impl PageDriver for MemoryPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let delay = *self.inner.navigate_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let dom = self
            .inner
            .fixtures
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default();
        {
            let mut state = self.inner.state.lock().unwrap();
            state.url = Some(url.to_string());
            state.dom = dom.into_iter().collect();
            state.navigations.push(url.to_string());
            state.armed = false;
            state.submitted = false;
        }
        self.notify_observers();
        Ok(())
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.inner.state.lock().unwrap().url.clone())
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementInfo>> {
        Ok(self.inner.state.lock().unwrap().dom.get(selector).cloned())
    }

    async fn observe_mutations(&self) -> Result<MutationSubscription> {
        let id = self.inner.next_observer.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.observers.lock().unwrap().insert(id, tx);

        let inner = self.inner.clone();
        Ok(MutationSubscription::new(rx, move || {
            inner.observers.lock().unwrap().remove(&id);
        }))
    }

    async fn fill_value(&self, selector: &str, value: &str) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        if state.failing.contains(selector) {
            return Err(anyhow!("element detached: {}", selector));
        }
        if !state.dom.contains_key(selector) {
            return Err(anyhow!("element not found: {}", selector));
        }
        state.filled.push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn upload_file(&self, selector: &str, path: &str) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        if !state.dom.get(selector).is_some_and(|el| el.is_file_input()) {
            return Err(anyhow!("not a file input: {}", selector));
        }
        state.uploads.push((selector.to_string(), path.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        if !state.dom.contains_key(selector) {
            return Err(anyhow!("element not found: {}", selector));
        }
        state.clicks.push(selector.to_string());
        if selector == SUBMIT {
            state.submitted = true;
        }
        Ok(())
    }

    async fn arm_submit_listener(&self) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        state.armed = true;
        state.submitted = false;
        Ok(())
    }

    async fn submit_observed(&self) -> Result<bool> {
        Ok(self.inner.state.lock().unwrap().submitted)
    }
}

// ========== 预设页面 ==========

pub fn lever_form() -> Vec<(&'static str, ElementInfo)> {
    vec![
        (FORM, ElementInfo::new("form", None)),
        (r#"input[name="firstName"]"#, ElementInfo::input("text")),
        (r#"input[name="lastName"]"#, ElementInfo::input("text")),
        (r#"input[name="email"]"#, ElementInfo::input("email")),
        (r#"input[name="phone"]"#, ElementInfo::input("tel")),
        (r#"textarea[name="coverLetter"]"#, ElementInfo::textarea()),
        (r#"input[name="resume"]"#, ElementInfo::input("file")),
        (SUBMIT, ElementInfo::new("button", None)),
    ]
}

pub fn job(id: &str, title: &str, company: &str, link: &str) -> JobDescriptor {
    JobDescriptor::new(id, title, company, link)
}

/// 所有等待都缩短到毫秒级
pub fn fast_config(mode: SubmissionMode) -> Config {
    Config {
        submission_mode: mode,
        form_timeout_ms: 300,
        field_timeout_ms: 40,
        submit_timeout_ms: 100,
        settle_ms: 5,
        inter_job_delay_ms: 10,
        error_delay_ms: 5,
        pipeline_timeout_ms: Some(5_000),
        poll_interval_ms: 10,
        field_pause_ms: 0,
        ..Config::default()
    }
}

// ========== 远端状态记录 ==========

#[derive(Default)]
pub struct RecordingSink {
    pushes: Mutex<Vec<(String, JobId, JobStatus)>>,
}

impl RecordingSink {
    pub fn pushes(&self) -> Vec<(String, JobId, JobStatus)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStatusSink for RecordingSink {
    async fn push_status(&self, session_id: &str, job_id: &JobId, status: JobStatus) -> Result<()> {
        self.pushes
            .lock()
            .unwrap()
            .push((session_id.to_string(), job_id.clone(), status));
        Ok(())
    }
}

// ========== 三个上下文装配 ==========

pub struct Harness {
    pub bridge: Bridge,
    pub page: MemoryPage,
    pub controller: Controller,
    pub reporter: StatusReporter,
    pub store: LocalStore,
    pub sink: Arc<RecordingSink>,
    pub ui: BridgeSender,
    pub ui_inbox: Inbox,
}

impl Harness {
    /// 需要在 tokio 运行时里调用
    pub fn new(page: MemoryPage, config: &Config) -> Self {
        let bridge = Bridge::new();
        let driver: Arc<dyn PageDriver> = Arc::new(page.clone());
        let mut context = PageContext::new(driver, bridge.clone(), ApplyFlow::from_config(config));
        context.attach_actor();

        let store = LocalStore::in_memory();
        let sink = Arc::new(RecordingSink::default());
        let remote: Arc<dyn RemoteStatusSink> = sink.clone();
        let reporter = StatusReporter::new(store.clone(), Some(remote));

        let settings = RunnerSettings {
            log_file: None,
            ..RunnerSettings::from_config(config)
        };
        let (controller_sender, controller_inbox) = bridge.attach(ContextId::Controller).split();
        let controller = Controller::new(
            Arc::new(tokio::sync::Mutex::new(context)),
            controller_sender,
            reporter.clone(),
            CandidateProfile::fallback(),
            settings,
        );
        let serving = controller.clone();
        tokio::spawn(async move { serving.serve(controller_inbox).await });

        let (ui, ui_inbox) = bridge.attach(ContextId::Ui).split();

        Self {
            bridge,
            page,
            controller,
            reporter,
            store,
            sink,
            ui,
            ui_inbox,
        }
    }

    /// 下一条发给界面的消息
    pub async fn next_ui_message(&mut self) -> Message {
        tokio::time::timeout(Duration::from_secs(5), self.ui_inbox.recv())
            .await
            .expect("界面在 5 秒内没有收到消息")
            .expect("界面收件箱已关闭")
            .message
    }

    /// 等待会话占用释放（汇总先于释放送达界面）
    pub async fn wait_idle(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.controller.is_busy() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("会话没有结束");
    }

    /// 收集进度直到运行结束
    pub async fn collect_run(&mut self) -> (Vec<ProgressEvent>, RunSummary) {
        let mut events = Vec::new();
        loop {
            match self.next_ui_message().await {
                Message::Progress { event } => events.push(event),
                Message::AutomationFinished { summary } => return (events, summary),
                other => panic!("界面收到意外消息: {:?}", other),
            }
        }
    }
}
