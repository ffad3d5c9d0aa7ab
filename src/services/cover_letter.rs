//! 求职信生成
//!
//! 模板占位符：`{{title}}` `{{company}}` `{{first_name}}` `{{last_name}}`
//! `{{full_name}}` `{{pitch}}`，未知占位符原样保留

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::models::{CandidateProfile, JobDescriptor};

const DEFAULT_TEMPLATE: &str = "Dear Hiring Manager,

I am writing to express my interest in the {{title}} position at {{company}}.

Based on the job description, I believe my skills and experience align well with your requirements. I am excited about the opportunity to contribute to your team and help drive success at {{company}}.

{{pitch}}

Thank you for considering my application. I look forward to discussing how I can add value to your organization.

Best regards,
{{full_name}}";

const DEFAULT_PITCH: &str =
    "I am confident that my background and skills would make me a valuable addition to your organization.";

fn placeholder_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").ok())
        .as_ref()
}

/// 为岗位生成求职信
///
/// 资料里的模板含占位符时整体替换默认模板，否则作为 `{{pitch}}` 段落插入
pub fn render(job: &JobDescriptor, profile: &CandidateProfile) -> String {
    let Some(re) = placeholder_regex() else {
        return DEFAULT_TEMPLATE.to_string();
    };

    let custom = profile.cover_letter_template.trim();
    let (template, pitch) = if re.is_match(custom) {
        (custom, DEFAULT_PITCH)
    } else if custom.is_empty() {
        (DEFAULT_TEMPLATE, DEFAULT_PITCH)
    } else {
        (DEFAULT_TEMPLATE, custom)
    };

    let full_name = profile.full_name();
    re.replace_all(template, |caps: &Captures| {
        match caps[1].to_ascii_lowercase().as_str() {
            "title" => job.title.clone(),
            "company" => job.company.clone(),
            "first_name" => profile.first_name.clone(),
            "last_name" => profile.last_name.clone(),
            "full_name" => full_name.clone(),
            "pitch" => pitch.to_string(),
            _ => caps[0].to_string(),
        }
    })
    .into_owned()
}
