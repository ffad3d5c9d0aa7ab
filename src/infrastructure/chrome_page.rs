//! Chromium 页面驱动 - 基础设施层
//!
//! 通过 `JsExecutor` 在页面里执行脚本，通过 CDP binding 接收
//! MutationObserver 批次和页面级 submit 事件

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use futures::StreamExt;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::page_driver::{ElementInfo, MutationSubscription, PageDriver};

const MUTATION_BINDING: &str = "__jobflowMutation";
const SUBMIT_BINDING: &str = "__jobflowSubmit";

const QUERY_JS: &str = r#"(selector) => {
    const el = document.querySelector(selector);
    if (!el) return null;
    return {
        tag: el.tagName.toLowerCase(),
        type: el.tagName === 'INPUT' ? (el.type || null) : null
    };
}"#;

const OBSERVE_JS: &str = r#"(args) => {
    window.__jobflowObservers = window.__jobflowObservers || {};
    const observer = new MutationObserver(() => {
        try { window[args.binding](String(args.id)); } catch (e) {}
    });
    observer.observe(document.documentElement || document, {
        childList: true,
        subtree: true,
        attributes: true
    });
    window.__jobflowObservers[args.id] = observer;
    return true;
}"#;

const DISCONNECT_JS: &str = r#"(id) => {
    const observers = window.__jobflowObservers || {};
    if (observers[id]) {
        observers[id].disconnect();
        delete observers[id];
    }
    return true;
}"#;

// React 等框架劫持了 value 属性，需要走原型上的 setter 才能被识别为真实输入
const FILL_JS: &str = r#"(args) => {
    const el = document.querySelector(args.selector);
    if (!el) throw new Error('element not found: ' + args.selector);
    const descriptor = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value');
    const assign = (v) => descriptor && descriptor.set ? descriptor.set.call(el, v) : (el.value = v);
    assign('');
    el.focus();
    assign(args.value);
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}"#;

const ARM_SUBMIT_JS: &str = r#"(binding) => {
    if (window.__jobflowSubmitArmed) return true;
    window.__jobflowSubmitArmed = true;
    document.addEventListener('submit', () => {
        try { window[binding]('submit'); } catch (e) {}
    }, true);
    return true;
}"#;

/// Chromium 页面驱动
pub struct ChromePage {
    executor: JsExecutor,
    next_observer: AtomicU64,
    submit_seen: Arc<AtomicBool>,
    submit_listener: Mutex<Option<JoinHandle<()>>>,
}

impl ChromePage {
    pub fn new(executor: JsExecutor) -> Self {
        Self {
            executor,
            next_observer: AtomicU64::new(1),
            submit_seen: Arc::new(AtomicBool::new(false)),
            submit_listener: Mutex::new(None),
        }
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    /// 启动一次 submit binding 的监听任务
    async fn ensure_submit_listener(&self) -> Result<()> {
        let mut guard = self.submit_listener.lock().await;
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(());
        }

        let page = self.executor.page();
        page.execute(AddBindingParams::new(SUBMIT_BINDING)).await?;
        let mut events = page.event_listener::<EventBindingCalled>().await?;
        let seen = self.submit_seen.clone();

        *guard = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.name == SUBMIT_BINDING {
                    debug!("页面触发了 submit 事件");
                    seen.store(true, Ordering::SeqCst);
                }
            }
        }));
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.executor.page();
        page.goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        page.wait_for_navigation().await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.executor.page().url().await?)
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementInfo>> {
        self.executor.call_as(QUERY_JS, &selector).await
    }

    async fn observe_mutations(&self) -> Result<MutationSubscription> {
        let page = self.executor.page().clone();
        page.execute(AddBindingParams::new(MUTATION_BINDING)).await?;
        let mut events = page.event_listener::<EventBindingCalled>().await?;

        let id = self.next_observer.fetch_add(1, Ordering::SeqCst);
        self.executor
            .call(OBSERVE_JS, &json!({ "binding": MUTATION_BINDING, "id": id }))
            .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let payload = id.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    event = events.next() => match event {
                        Some(ev) if ev.name == MUTATION_BINDING && ev.payload == payload => {
                            if tx.send(()).is_err() {
                                break;
                            }
                        }
                        Some(_) => continue,
                        None => break,
                    },
                }
            }
        });

        let executor = self.executor.clone();
        Ok(MutationSubscription::new(rx, move || {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = executor.call(DISCONNECT_JS, &id).await {
                        debug!("断开 MutationObserver #{} 失败: {}", id, e);
                    }
                });
            }
        }))
    }

    async fn fill_value(&self, selector: &str, value: &str) -> Result<()> {
        self.executor
            .call(FILL_JS, &json!({ "selector": selector, "value": value }))
            .await?;
        Ok(())
    }

    async fn upload_file(&self, selector: &str, path: &str) -> Result<()> {
        let page = self.executor.page();
        let element = page.find_element(selector).await?;
        let params = SetFileInputFilesParams::builder()
            .files(vec![path.to_string()])
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(|e| anyhow!("构建文件上传参数失败: {}", e))?;
        page.execute(params).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self.executor.page().find_element(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn arm_submit_listener(&self) -> Result<()> {
        self.submit_seen.store(false, Ordering::SeqCst);
        self.ensure_submit_listener().await?;
        let armed = self.executor.call(ARM_SUBMIT_JS, &SUBMIT_BINDING).await?;
        if armed != json!(true) {
            warn!("⚠️ submit 监听安装返回异常: {}", armed);
        }
        Ok(())
    }

    async fn submit_observed(&self) -> Result<bool> {
        Ok(self.submit_seen.load(Ordering::SeqCst))
    }
}
