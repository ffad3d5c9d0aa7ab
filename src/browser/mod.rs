pub mod connection;
pub mod headless;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::Config;

pub use connection::{connect_to_browser, open_page};
pub use headless::launch_browser;

/// 按配置连接或启动浏览器
pub async fn acquire_browser(config: &Config) -> Result<(Browser, Page)> {
    if config.launch_browser {
        launch_browser(config).await
    } else {
        connect_to_browser(config.browser_debug_port, None).await
    }
}
