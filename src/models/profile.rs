use serde::{Deserialize, Serialize};

/// 候选人资料
///
/// 由控制端持有，填表时只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// 求职信模板，可以包含 `{{title}}` 等占位符，也可以是纯文本段落
    #[serde(default, alias = "coverLetter")]
    pub cover_letter_template: String,
    /// 简历文件路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_reference: Option<String>,
}

impl CandidateProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// 兜底资料（仅在配置允许时使用）
    pub fn fallback() -> Self {
        Self {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            phone: "+1234567890".to_string(),
            cover_letter_template: "I am confident that my background and skills would make me a valuable addition to your organization.".to_string(),
            resume_reference: None,
        }
    }

    /// 覆盖简历路径（配置里的 RESUME_PATH 优先）
    pub fn with_resume(mut self, resume: Option<String>) -> Self {
        if resume.is_some() {
            self.resume_reference = resume;
        }
        self
    }
}

/// 后端 `/profile` 返回的用户资料
#[derive(Debug, Clone, Deserialize)]
pub struct BackendProfile {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl BackendProfile {
    /// 转换为候选人资料，姓名按第一个空白拆分
    pub fn into_candidate(self) -> CandidateProfile {
        let full_name = self.full_name.unwrap_or_default();
        let mut parts = full_name.trim().splitn(2, char::is_whitespace);
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.next().unwrap_or_default().trim().to_string();

        CandidateProfile {
            first_name,
            last_name,
            email: self.email,
            phone: self.phone.unwrap_or_default(),
            cover_letter_template: String::new(),
            resume_reference: None,
        }
    }
}

/// 资料来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileOrigin {
    /// 本地存储
    Stored,
    /// 后端 `/profile`
    Backend,
    /// 兜底资料
    Fallback,
}

/// 解析后的资料及其来源
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub profile: CandidateProfile,
    pub origin: ProfileOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_profile_splits_name() {
        let backend: BackendProfile = serde_json::from_str(
            r#"{"id": 3, "email": "ada@example.com", "full_name": "Ada  King Lovelace", "phone": "555"}"#,
        )
        .unwrap();
        let profile = backend.into_candidate();
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.last_name, "King Lovelace");
        assert_eq!(profile.phone, "555");
    }

    #[test]
    fn test_backend_profile_without_name() {
        let backend: BackendProfile =
            serde_json::from_str(r#"{"email": "x@example.com"}"#).unwrap();
        let profile = backend.into_candidate();
        assert_eq!(profile.first_name, "");
        assert_eq!(profile.full_name(), "");
    }

    #[test]
    fn test_profile_accepts_legacy_cover_letter_key() {
        let profile: CandidateProfile = serde_json::from_str(
            r#"{"firstName": "A", "lastName": "B", "email": "e", "phone": "p", "coverLetter": "hi"}"#,
        )
        .unwrap();
        assert_eq!(profile.cover_letter_template, "hi");
        assert!(profile.resume_reference.is_none());
    }
}
