//! 跨上下文消息
//!
//! 扁平的带标签载荷，`action` 字段区分类型，未知标签解码为 `Unknown`

use serde::{Deserialize, Serialize};

use crate::models::{
    CandidateProfile, FillReport, JobDescriptor, JobId, JobStatus, ProgressEvent, RunSummary,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// 控制端 → 页面执行者：投递一个岗位
    #[serde(rename_all = "camelCase")]
    ApplyToJob {
        job: JobDescriptor,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        profile: Option<CandidateProfile>,
    },
    /// 页面执行者 → 控制端：岗位结束
    #[serde(rename_all = "camelCase")]
    JobApplied {
        job_id: JobId,
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 页面观察到用户提交
    JobSubmitted,
    /// 界面 → 控制端：开始投递
    #[serde(rename_all = "camelCase")]
    StartJobAutomation {
        jobs: Vec<JobDescriptor>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    /// 界面 → 控制端：当前岗位结束后停止
    StopJobAutomation,
    /// 控制端 → 页面执行者：只填表不提交
    #[serde(rename_all = "camelCase")]
    FillJobApplication { candidate_info: CandidateProfile },
    FillCompleted { report: FillReport },
    /// 控制端 → 界面
    Progress { event: ProgressEvent },
    AutomationFinished { summary: RunSummary },
    StartRejected { reason: String },
    #[serde(other)]
    Unknown,
}

impl Message {
    /// 消息标签，用于日志
    pub fn action(&self) -> &'static str {
        match self {
            Message::ApplyToJob { .. } => "applyToJob",
            Message::JobApplied { .. } => "jobApplied",
            Message::JobSubmitted => "jobSubmitted",
            Message::StartJobAutomation { .. } => "startJobAutomation",
            Message::StopJobAutomation => "stopJobAutomation",
            Message::FillJobApplication { .. } => "fillJobApplication",
            Message::FillCompleted { .. } => "fillCompleted",
            Message::Progress { .. } => "progress",
            Message::AutomationFinished { .. } => "automationFinished",
            Message::StartRejected { .. } => "startRejected",
            Message::Unknown => "unknown",
        }
    }
}

/// 解码外部传来的原始消息
pub fn decode(raw: &str) -> serde_json::Result<Message> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_applied_wire_shape() {
        let msg = Message::JobApplied {
            job_id: JobId::from(3_i64),
            status: JobStatus::Error,
            error: Some("unsupported platform: https://x".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "action": "jobApplied",
                "jobId": 3,
                "status": "error",
                "error": "unsupported platform: https://x"
            })
        );
    }

    #[test]
    fn test_decode_apply_to_job_without_profile() {
        let msg = decode(
            r#"{"action": "applyToJob", "job": {"id": "7", "title": "SWE", "company": "Acme", "link": "https://jobs.lever.co/acme/7"}}"#,
        )
        .unwrap();
        match msg {
            Message::ApplyToJob { job, profile } => {
                assert_eq!(job.id.as_str(), "7");
                assert!(profile.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unit_and_unknown_tags() {
        assert_eq!(decode(r#"{"action": "jobSubmitted"}"#).unwrap(), Message::JobSubmitted);
        assert_eq!(decode(r#"{"action": "openPopup", "x": 1}"#).unwrap(), Message::Unknown);
        assert!(decode(r#"{"no_action": true}"#).is_err());
    }

    #[test]
    fn test_fill_job_application_uses_candidate_info_key() {
        let msg = decode(
            r#"{"action": "fillJobApplication", "candidateInfo": {"firstName": "A", "lastName": "B", "email": "e", "phone": "p"}}"#,
        )
        .unwrap();
        assert_eq!(msg.action(), "fillJobApplication");
    }
}
