//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 eval() 能力
/// - 不认识岗位 / 表单
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航、CDP 命令等操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果，Promise 会被等待
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value().unwrap_or(JsonValue::Null);
        Ok(json_value)
    }

    /// 以 `(args) => {...}` 形式调用函数，参数经 JSON 注入，避免拼接转义问题
    pub async fn call<A: Serialize>(&self, function: &str, args: &A) -> Result<JsonValue> {
        let args_json = serde_json::to_string(args)?;
        self.eval(format!("({})({})", function, args_json)).await
    }

    /// 调用函数并把返回值反序列化为指定类型
    pub async fn call_as<A: Serialize, T: DeserializeOwned>(
        &self,
        function: &str,
        args: &A,
    ) -> Result<T> {
        let json_value = self.call(function, args).await?;
        let typed_value =
            serde_json::from_value(json_value).context("JS 返回值与期望的类型不符")?;
        Ok(typed_value)
    }
}
