//! 岗位队列端到端测试（内存页面，不需要浏览器）

mod common;

use common::{fast_config, job, lever_form, Harness, MemoryPage, SUBMIT};
use jobflow_automation::bridge::{ContextId, Message};
use jobflow_automation::config::SubmissionMode;
use jobflow_automation::error::SessionError;
use jobflow_automation::models::{JobId, JobStatus, RunOutcome};
use std::time::Duration;
use tokio_test::assert_ok;

const LEVER_URL: &str = "https://jobs.lever.co/acme/1";

fn start(harness: &Harness, jobs: Vec<jobflow_automation::JobDescriptor>) {
    harness.ui.notify(
        ContextId::Controller,
        Message::StartJobAutomation {
            jobs,
            session_id: Some("s-1".to_string()),
        },
    );
}

async fn wait_until_armed(page: &MemoryPage) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !page.is_armed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("提交监听没有就绪");
}

#[tokio::test]
async fn test_lever_applied_and_unknown_platform_errored() {
    let page = MemoryPage::new().with_fixture(LEVER_URL, lever_form());
    let mut harness = Harness::new(page, &fast_config(SubmissionMode::Autonomous));

    start(
        &harness,
        vec![
            job("1", "SWE", "Acme", LEVER_URL),
            job("2", "X", "Y", "https://unknown.example/2"),
        ],
    );
    let (_, summary) = harness.collect_run().await;

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.jobs[0].status, JobStatus::Applied);
    assert_eq!(summary.jobs[1].status, JobStatus::Error);
    assert!(summary.jobs[1]
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("unsupported platform"));
    // 不支持的平台不打开页面
    assert_eq!(harness.page.navigations(), vec![LEVER_URL.to_string()]);

    // Lever 字段表按顺序写入，并点了提交
    assert_eq!(
        harness.page.filled_value(r#"input[name="firstName"]"#).as_deref(),
        Some("John")
    );
    assert_eq!(
        harness.page.filled_value(r#"input[name="email"]"#).as_deref(),
        Some("john.doe@example.com")
    );
    let letter = harness
        .page
        .filled_value(r#"textarea[name="coverLetter"]"#)
        .unwrap_or_default();
    assert!(letter.contains("SWE"));
    assert!(letter.contains("Acme"));
    assert_eq!(harness.page.clicks(), vec![SUBMIT.to_string()]);

    harness.reporter.flush().await;
    let pushes = harness.sink.pushes();
    assert!(pushes.contains(&("s-1".to_string(), JobId::from("1"), JobStatus::Applied)));
    assert!(pushes.contains(&("s-1".to_string(), JobId::from("2"), JobStatus::Error)));
}

#[tokio::test]
async fn test_every_job_terminal_and_one_processing_at_a_time() {
    let page = MemoryPage::new()
        .with_fixture(LEVER_URL, lever_form())
        .with_fixture("https://jobs.lever.co/acme/3", lever_form());
    let mut harness = Harness::new(page, &fast_config(SubmissionMode::Autonomous));

    start(
        &harness,
        vec![
            job("1", "SWE", "Acme", LEVER_URL),
            job("2", "X", "Y", "https://unknown.example/2"),
            // 没有预设 DOM，表单等待超时
            job("4", "PM", "Acme", "https://boards.greenhouse.io/acme/4"),
            job("3", "SRE", "Acme", "https://jobs.lever.co/acme/3"),
        ],
    );
    let (events, summary) = harness.collect_run().await;

    assert!(summary.jobs.iter().all(|j| j.status.is_terminal()));
    assert_eq!(summary.pending, 0);
    assert_eq!(summary.applied, 2);
    assert_eq!(summary.failed, 2);

    // 每个岗位先 processing 再终态，下一个岗位开始前上一个已结束
    let mut open: Option<usize> = None;
    for event in &events {
        match event.status {
            JobStatus::Processing => {
                assert!(open.is_none(), "同时有两个岗位在处理");
                open = Some(event.index);
            }
            status if status.is_terminal() => {
                assert_eq!(open.take(), Some(event.index));
            }
            other => panic!("意外的进度状态: {}", other),
        }
    }
    assert_eq!(events.len(), 8);
    assert_eq!(events[0].total, 4);

    // 本地存储与汇总一致
    let stored = harness.store.jobs().unwrap();
    assert!(stored.iter().all(|j| j.status.is_terminal()));
    harness.wait_idle().await;
}

#[tokio::test]
async fn test_second_start_rejected_while_running() {
    let page = MemoryPage::new().with_fixture(LEVER_URL, lever_form());
    let mut harness = Harness::new(page, &fast_config(SubmissionMode::Supervised));

    start(&harness, vec![job("1", "SWE", "Acme", LEVER_URL)]);
    wait_until_armed(&harness.page).await;
    assert!(harness.controller.is_running());

    let second = harness
        .controller
        .start(None, vec![job("9", "Other", "Co", LEVER_URL)]);
    assert!(matches!(second, Err(SessionError::AlreadyRunning)));

    // 通过消息桥再请求一次，界面收到拒绝
    start(&harness, vec![job("9", "Other", "Co", LEVER_URL)]);
    loop {
        match harness.next_ui_message().await {
            Message::StartRejected { reason } => {
                assert_eq!(reason, SessionError::AlreadyRunning.to_string());
                break;
            }
            Message::Progress { .. } => {}
            other => panic!("界面收到意外消息: {:?}", other),
        }
    }

    harness.page.user_submits();
    let (_, summary) = harness.collect_run().await;
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.jobs.len(), 1);
}

#[tokio::test]
async fn test_empty_queue_rejected() {
    let page = MemoryPage::new();
    let harness = Harness::new(page, &fast_config(SubmissionMode::Autonomous));
    assert!(matches!(
        harness.controller.start(None, Vec::new()),
        Err(SessionError::EmptyQueue)
    ));
    harness.wait_idle().await;
}

#[tokio::test]
async fn test_stop_lets_in_flight_job_finish() {
    let page = MemoryPage::new()
        .with_fixture(LEVER_URL, lever_form())
        .with_fixture("https://jobs.lever.co/acme/2", lever_form());
    let mut harness = Harness::new(page, &fast_config(SubmissionMode::Supervised));

    start(
        &harness,
        vec![
            job("1", "SWE", "Acme", LEVER_URL),
            job("2", "SRE", "Acme", "https://jobs.lever.co/acme/2"),
            job("3", "X", "Y", "https://unknown.example/3"),
        ],
    );
    wait_until_armed(&harness.page).await;

    assert!(harness.controller.is_running());
    harness
        .ui
        .notify(ContextId::Controller, Message::StopJobAutomation);
    // 等控制端处理完停止请求再让用户提交
    tokio::time::sleep(Duration::from_millis(50)).await;
    // 停止后立即不算运行中，但会话占用要等当前岗位结束
    assert!(!harness.controller.is_running());
    assert!(harness.controller.is_busy());
    assert!(matches!(
        harness.controller.start(None, vec![job("9", "Other", "Co", LEVER_URL)]),
        Err(SessionError::AlreadyRunning)
    ));
    harness.page.user_submits();

    let (_, summary) = harness.collect_run().await;
    assert_eq!(summary.outcome, RunOutcome::Stopped);
    assert_eq!(summary.jobs[0].status, JobStatus::Applied);
    assert_eq!(summary.jobs[1].status, JobStatus::Pending);
    assert_eq!(summary.jobs[2].status, JobStatus::Pending);
    assert_eq!(harness.page.navigations(), vec![LEVER_URL.to_string()]);
    harness.wait_idle().await;
}

#[tokio::test]
async fn test_supervised_completes_on_job_submitted_message() {
    let page = MemoryPage::new().with_fixture(LEVER_URL, lever_form());
    let mut harness = Harness::new(page, &fast_config(SubmissionMode::Supervised));

    start(&harness, vec![job("1", "SWE", "Acme", LEVER_URL)]);
    wait_until_armed(&harness.page).await;

    // 监督模式下不会自动点提交
    assert!(harness.page.clicks().is_empty());
    harness.ui.notify(ContextId::Actor, Message::JobSubmitted);

    let (_, summary) = harness.collect_run().await;
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.applied, 1);
    assert!(harness.page.clicks().is_empty());
}

#[tokio::test]
async fn test_out_of_band_job_applied_is_reported() {
    let page = MemoryPage::new();
    let harness = Harness::new(page, &fast_config(SubmissionMode::Autonomous));
    assert_ok!(harness.store.set_jobs(&[job("5", "SWE", "Acme", LEVER_URL)]));

    harness.ui.notify(
        ContextId::Controller,
        Message::JobApplied {
            job_id: JobId::from("5"),
            status: JobStatus::Applied,
            error: None,
        },
    );

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let stored = harness.store.jobs().unwrap();
            if stored[0].status == JobStatus::Applied {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("本地状态没有更新");
}

#[tokio::test]
async fn test_direct_stop_clears_running_at_once() {
    let page = MemoryPage::new().with_fixture(LEVER_URL, lever_form());
    let mut harness = Harness::new(page, &fast_config(SubmissionMode::Supervised));

    assert!(!harness.controller.stop());
    let handle = assert_ok!(harness
        .controller
        .start(None, vec![job("1", "SWE", "Acme", LEVER_URL)]));
    wait_until_armed(&harness.page).await;

    assert!(harness.controller.stop());
    assert!(!harness.controller.is_running());

    harness.page.user_submits();
    let (_, summary) = harness.collect_run().await;
    assert_eq!(summary.applied, 1);
    assert_ok!(handle.await);
    harness.wait_idle().await;
    assert!(!harness.controller.is_busy());
}

#[tokio::test]
async fn test_out_of_band_status_cannot_regress_or_reopen_jobs() {
    let page = MemoryPage::new();
    let harness = Harness::new(page, &fast_config(SubmissionMode::Autonomous));
    let mut applied = job("1", "SWE", "Acme", LEVER_URL);
    applied.begin_processing().unwrap();
    applied.mark_applied().unwrap();
    assert_ok!(harness
        .store
        .set_jobs(&[applied, job("2", "SRE", "Acme", "https://jobs.lever.co/acme/2")]));

    for (id, status) in [
        ("1", JobStatus::Processing),
        ("2", JobStatus::Processing),
        ("1", JobStatus::Error),
        ("2", JobStatus::Pending),
    ] {
        harness.ui.notify(
            ContextId::Controller,
            Message::JobApplied {
                job_id: JobId::from(id),
                status,
                error: Some("late".to_string()),
            },
        );
    }
    // 最后一条合法通知处理完，前面的也都处理过了
    harness.ui.notify(
        ContextId::Controller,
        Message::JobApplied {
            job_id: JobId::from("2"),
            status: JobStatus::Error,
            error: Some("closed".to_string()),
        },
    );

    tokio::time::timeout(Duration::from_secs(2), async {
        while harness.store.jobs().unwrap()[1].status != JobStatus::Error {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("本地状态没有更新");

    let stored = harness.store.jobs().unwrap();
    assert_eq!(stored[0].status, JobStatus::Applied);
    assert!(stored[0].error.is_none());
    assert_eq!(stored[1].error.as_deref(), Some("closed"));
}
