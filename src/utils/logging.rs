use anyhow::Result;
/// 日志工具模块
///
/// 提供 tracing 初始化、运行日志文件和控制台输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{JobDescriptor, RunSummary};

/// 初始化 tracing
///
/// 设置了 `RUST_LOG` 时以它为准，否则按 verbose 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},chromiumoxide=warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件（覆盖旧文件）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n岗位投递日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加一个岗位的结果
pub fn append_job_result(log_file_path: &str, job: &JobDescriptor) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(
        file,
        "[{}] #{} {} @ {} → {}{}",
        chrono::Local::now().format("%H:%M:%S"),
        job.id,
        truncate_text(&job.title, 40),
        job.company,
        job.status,
        job.error
            .as_deref()
            .map(|e| format!(" ({})", e))
            .unwrap_or_default()
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 岗位自动投递");
    info!("📋 提交模式: {}", config.submission_mode);
    info!("🌐 后端地址: {}", config.backend_base_url);
    info!("{}", "=".repeat(60));
}

/// 记录队列加载信息
pub fn log_jobs_loaded(total: usize, delay_ms: u64) {
    info!("✓ 找到 {} 个待投递的岗位", total);
    info!("💡 岗位之间间隔 {}ms，一次只处理一个\n", delay_ms);
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 投递结束统计 ({:?})", summary.outcome);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已投递: {}/{}", summary.applied, summary.jobs.len());
    info!("❌ 失败: {}", summary.failed);
    info!("⏸ 未处理: {}", summary.pending);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
