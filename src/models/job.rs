use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::TransitionError;

/// 岗位 ID
///
/// 后端返回整数 ID，网页端的选择可能是字符串，两种都接受。
/// 记住收到时的形态，序列化时原样写回；比较只看文本
#[derive(Debug, Clone)]
pub struct JobId {
    raw: String,
    numeric: bool,
}

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            raw: id.into(),
            numeric: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 是否以整数形式收到
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }
}

impl PartialEq for JobId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for JobId {}

impl Hash for JobId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self {
            raw: id.to_string(),
            numeric: true,
        }
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for JobId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // 整数 ID 按整数回写，后端 update-status 需要整数
        if self.numeric {
            if let Ok(n) = self.raw.parse::<i64>() {
                return serializer.serialize_i64(n);
            }
            if let Ok(n) = self.raw.parse::<u64>() {
                return serializer.serialize_u64(n);
            }
        }
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Visitor;

        struct JobIdVisitor;

        impl<'de> Visitor<'de> for JobIdVisitor {
            type Value = JobId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer job id")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(JobId::new(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(JobId::from(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(JobId {
                    raw: value.to_string(),
                    numeric: true,
                })
            }
        }

        deserializer.deserialize_any(JobIdVisitor)
    }
}

/// 岗位状态
///
/// 只允许 pending → processing → {applied, error}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Applied,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Applied => "applied",
            JobStatus::Error => "error",
        }
    }

    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Applied | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 待投递的岗位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub link: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobDescriptor {
    pub fn new(
        id: impl Into<JobId>,
        title: impl Into<String>,
        company: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company: company.into(),
            link: link.into(),
            status: JobStatus::Pending,
            error: None,
        }
    }

    /// 队列加载时重置为 pending
    pub fn reset(&mut self) {
        self.status = JobStatus::Pending;
        self.error = None;
    }

    /// pending → processing
    pub fn begin_processing(&mut self) -> Result<(), TransitionError> {
        self.transition(JobStatus::Processing)
    }

    /// processing → applied
    pub fn mark_applied(&mut self) -> Result<(), TransitionError> {
        self.transition(JobStatus::Applied)?;
        self.error = None;
        Ok(())
    }

    /// processing → error，记录原因
    pub fn mark_error(&mut self, cause: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(JobStatus::Error)?;
        self.error = Some(cause.into());
        Ok(())
    }

    /// 队列之外收到的结果：只接受终态，且已是终态的岗位不再改动
    pub fn settle(&mut self, to: JobStatus, cause: Option<String>) -> Result<(), TransitionError> {
        if !to.is_terminal() || self.status.is_terminal() {
            return Err(TransitionError {
                job_id: self.id.to_string(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.error = match to {
            JobStatus::Error => cause,
            _ => None,
        };
        Ok(())
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), TransitionError> {
        let allowed = matches!(
            (self.status, to),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Applied)
                | (JobStatus::Processing, JobStatus::Error)
        );
        if !allowed {
            return Err(TransitionError {
                job_id: self.id.to_string(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_accepts_number_and_string() {
        let job: JobDescriptor = serde_json::from_str(
            r#"{"id": 42, "title": "SWE", "company": "Acme", "link": "https://jobs.lever.co/acme/1", "location": "Remote"}"#,
        )
        .unwrap();
        assert_eq!(job.id.as_str(), "42");
        assert_eq!(job.status, JobStatus::Pending);

        let job: JobDescriptor = serde_json::from_str(
            r#"{"id": "abc-1", "title": "SWE", "company": "Acme", "link": "x", "status": "applied"}"#,
        )
        .unwrap();
        assert_eq!(job.id.as_str(), "abc-1");
        assert_eq!(job.status, JobStatus::Applied);
    }

    #[test]
    fn test_numeric_job_id_serializes_as_number() {
        let value = serde_json::to_value(JobId::from(7_i64)).unwrap();
        assert_eq!(value, serde_json::json!(7));

        let value = serde_json::to_value(JobId::from("x-7")).unwrap();
        assert_eq!(value, serde_json::json!("x-7"));
    }

    #[test]
    fn test_string_id_keeps_its_wire_form() {
        // 看起来像数字的字符串 ID 不能被改写
        for raw in ["007", "+5", "12"] {
            let json = serde_json::json!({"id": raw, "title": "SWE", "company": "Acme", "link": "x"});
            let job: JobDescriptor = serde_json::from_value(json).unwrap();
            assert!(!job.id.is_numeric());

            let back = serde_json::to_value(&job).unwrap();
            assert_eq!(back["id"], serde_json::json!(raw));
            let again: JobDescriptor = serde_json::from_value(back).unwrap();
            assert_eq!(again.id, JobId::from(raw));
        }

        let job: JobDescriptor =
            serde_json::from_str(r#"{"id": 12, "title": "SWE", "company": "Acme", "link": "x"}"#)
                .unwrap();
        assert!(job.id.is_numeric());
        assert_eq!(serde_json::to_value(&job).unwrap()["id"], serde_json::json!(12));
    }

    #[test]
    fn test_numeric_and_string_ids_compare_by_text() {
        assert_eq!(JobId::from(7_i64), JobId::from("7"));
        assert_ne!(JobId::from(7_i64), JobId::from("007"));
    }

    #[test]
    fn test_status_transitions() {
        let mut job = JobDescriptor::new("1", "SWE", "Acme", "https://jobs.lever.co/acme/1");

        assert!(job.mark_applied().is_err());
        job.begin_processing().unwrap();
        assert!(job.begin_processing().is_err());
        job.mark_error("unsupported platform").unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("unsupported platform"));
        assert!(job.mark_applied().is_err());

        job.reset();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_settle_accepts_only_terminal_on_open_job() {
        let mut job = JobDescriptor::new("1", "SWE", "Acme", "https://jobs.lever.co/acme/1");

        assert!(job.settle(JobStatus::Processing, None).is_err());
        assert!(job.settle(JobStatus::Pending, None).is_err());
        assert_eq!(job.status, JobStatus::Pending);

        job.settle(JobStatus::Applied, Some("ignored".to_string())).unwrap();
        assert_eq!(job.status, JobStatus::Applied);
        assert!(job.error.is_none());

        // 终态不能回退，也不能改成另一个终态
        assert!(job.settle(JobStatus::Processing, None).is_err());
        assert!(job.settle(JobStatus::Error, Some("late".to_string())).is_err());
        assert_eq!(job.status, JobStatus::Applied);

        let mut job = JobDescriptor::new("2", "SRE", "Acme", "x");
        job.begin_processing().unwrap();
        job.settle(JobStatus::Error, Some("closed".to_string())).unwrap();
        assert_eq!(job.error.as_deref(), Some("closed"));
    }
}
