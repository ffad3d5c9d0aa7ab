use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::BrowserError;

/// 连接到已经打开的浏览器（需要以 --remote-debugging-port 启动）
///
/// 优先复用地址包含 `prefer_url` 的标签页，否则新建空白页
pub async fn connect_to_browser(port: u16, prefer_url: Option<&str>) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("🔌 正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        BrowserError::ConnectionFailed {
            port,
            message: e.to_string(),
        }
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    if let Some(wanted) = prefer_url {
        let pages = browser.pages().await?;
        debug!("获取到 {} 个页面", pages.len());
        for p in pages.iter() {
            if let Ok(Some(url)) = p.url().await {
                if url.contains(wanted) {
                    info!("✓ 复用已有标签页: {}", url);
                    return Ok((browser, p.clone()));
                }
            }
        }
    }

    let page = open_page(&browser, "about:blank").await?;
    Ok((browser, page))
}

/// 新建标签页
pub async fn open_page(browser: &Browser, url: &str) -> Result<Page> {
    debug!("创建新页面: {}", url);
    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        e
    })?;
    Ok(page)
}
