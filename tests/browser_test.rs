//! 真实浏览器测试
//!
//! 需要先以 `--remote-debugging-port=9222` 启动 Chrome

use jobflow_automation::browser::connect_to_browser;
use jobflow_automation::config::Config;
use jobflow_automation::infrastructure::{ChromePage, JsExecutor, PageDriver};
use jobflow_automation::services::ElementWaiter;
use jobflow_automation::utils::logging;
use std::time::Duration;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    logging::init(true);

    let config = Config::from_env();
    let result = connect_to_browser(config.browser_debug_port, None).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_chrome_page_waits_and_fills() {
    logging::init(true);

    let config = Config::from_env();
    let (_browser, page) = connect_to_browser(config.browser_debug_port, None)
        .await
        .expect("连接浏览器失败");
    let driver = ChromePage::new(JsExecutor::new(page));

    driver
        .navigate("data:text/html,<form><input name=\"email\" type=\"email\"></form>")
        .await
        .expect("导航失败");

    let waiter = ElementWaiter::new(Duration::from_millis(100));
    let found = waiter
        .wait_for(&driver, r#"input[name="email"]"#, Duration::from_secs(5))
        .await;
    assert!(found.is_found());

    driver
        .fill_value(r#"input[name="email"]"#, "john.doe@example.com")
        .await
        .expect("填写失败");
    let value = driver
        .executor()
        .eval(r#"document.querySelector('input[name="email"]').value"#)
        .await
        .expect("读取输入框失败");
    assert_eq!(value, serde_json::json!("john.doe@example.com"));

    let missing = waiter
        .wait_for(&driver, "#missing", Duration::from_millis(300))
        .await;
    assert!(!missing.is_found());
}
