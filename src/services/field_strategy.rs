//! 填表策略 - 业务能力层
//!
//! 每个平台一张声明式的 选择器 → 取值函数 表，外加通用兜底表

use crate::models::{CandidateProfile, JobDescriptor, PlatformVariant};
use crate::services::cover_letter;

/// 字段取值函数，返回 `None` 表示资料里没有这个值
pub type ValueFn = fn(&CandidateProfile, &JobDescriptor) -> Option<String>;

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// 文件字段走上传，不能赋值
    File,
}

/// 单个字段的声明
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub selector: &'static str,
    pub kind: FieldKind,
    pub value: ValueFn,
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .field("kind", &self.kind)
            .finish()
    }
}

/// 有序的字段表
pub type FieldMap = [FieldSpec];

/// 一个平台的完整策略
#[derive(Debug, Clone, Copy)]
pub struct PlatformStrategy {
    pub variant: PlatformVariant,
    /// 表单容器，等待时间较长
    pub form_selector: &'static str,
    pub submit_selector: &'static str,
    pub fields: &'static FieldMap,
}

const APPLICATION_FORM: &str = r#"form[data-testid="application-form"]"#;
const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;

fn first_name(p: &CandidateProfile, _: &JobDescriptor) -> Option<String> {
    non_empty(&p.first_name)
}

fn last_name(p: &CandidateProfile, _: &JobDescriptor) -> Option<String> {
    non_empty(&p.last_name)
}

fn full_name(p: &CandidateProfile, _: &JobDescriptor) -> Option<String> {
    non_empty(&p.full_name())
}

fn email(p: &CandidateProfile, _: &JobDescriptor) -> Option<String> {
    non_empty(&p.email)
}

fn phone(p: &CandidateProfile, _: &JobDescriptor) -> Option<String> {
    non_empty(&p.phone)
}

fn cover_letter(p: &CandidateProfile, job: &JobDescriptor) -> Option<String> {
    Some(cover_letter::render(job, p))
}

fn resume(p: &CandidateProfile, _: &JobDescriptor) -> Option<String> {
    p.resume_reference.as_deref().and_then(non_empty)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

static ASHBY_FIELDS: [FieldSpec; 6] = [
    FieldSpec { name: "first_name", selector: r#"input[name="firstName"]"#, kind: FieldKind::Text, value: first_name },
    FieldSpec { name: "last_name", selector: r#"input[name="lastName"]"#, kind: FieldKind::Text, value: last_name },
    FieldSpec { name: "email", selector: r#"input[name="email"]"#, kind: FieldKind::Text, value: email },
    FieldSpec { name: "phone", selector: r#"input[name="phone"]"#, kind: FieldKind::Text, value: phone },
    FieldSpec { name: "cover_letter", selector: r#"textarea[name="coverLetter"]"#, kind: FieldKind::Text, value: cover_letter },
    FieldSpec { name: "resume", selector: r#"input[type="file"]"#, kind: FieldKind::File, value: resume },
];

static GREENHOUSE_FIELDS: [FieldSpec; 6] = [
    FieldSpec { name: "first_name", selector: r#"input[name="first_name"]"#, kind: FieldKind::Text, value: first_name },
    FieldSpec { name: "last_name", selector: r#"input[name="last_name"]"#, kind: FieldKind::Text, value: last_name },
    FieldSpec { name: "email", selector: r#"input[name="email"]"#, kind: FieldKind::Text, value: email },
    FieldSpec { name: "phone", selector: r#"input[name="phone"]"#, kind: FieldKind::Text, value: phone },
    FieldSpec { name: "cover_letter", selector: r#"textarea[name="cover_letter"]"#, kind: FieldKind::Text, value: cover_letter },
    FieldSpec { name: "resume", selector: r#"input[name="resume"]"#, kind: FieldKind::File, value: resume },
];

static LEVER_FIELDS: [FieldSpec; 6] = [
    FieldSpec { name: "first_name", selector: r#"input[name="firstName"]"#, kind: FieldKind::Text, value: first_name },
    FieldSpec { name: "last_name", selector: r#"input[name="lastName"]"#, kind: FieldKind::Text, value: last_name },
    FieldSpec { name: "email", selector: r#"input[name="email"]"#, kind: FieldKind::Text, value: email },
    FieldSpec { name: "phone", selector: r#"input[name="phone"]"#, kind: FieldKind::Text, value: phone },
    FieldSpec { name: "cover_letter", selector: r#"textarea[name="coverLetter"]"#, kind: FieldKind::Text, value: cover_letter },
    FieldSpec { name: "resume", selector: r#"input[name="resume"]"#, kind: FieldKind::File, value: resume },
];

/// 通用字段：跨平台都可能出现的输入框
static COMMON_FIELDS: [FieldSpec; 4] = [
    FieldSpec { name: "email", selector: r#"input[type="email"]"#, kind: FieldKind::Text, value: email },
    FieldSpec { name: "phone", selector: r#"input[type="tel"]"#, kind: FieldKind::Text, value: phone },
    FieldSpec { name: "full_name", selector: r#"input[placeholder*="name" i]"#, kind: FieldKind::Text, value: full_name },
    FieldSpec { name: "email", selector: r#"input[placeholder*="email" i]"#, kind: FieldKind::Text, value: email },
];

static ASHBY: PlatformStrategy = PlatformStrategy {
    variant: PlatformVariant::Ashby,
    form_selector: APPLICATION_FORM,
    submit_selector: SUBMIT_BUTTON,
    fields: &ASHBY_FIELDS,
};

static GREENHOUSE: PlatformStrategy = PlatformStrategy {
    variant: PlatformVariant::Greenhouse,
    form_selector: APPLICATION_FORM,
    submit_selector: SUBMIT_BUTTON,
    fields: &GREENHOUSE_FIELDS,
};

static LEVER: PlatformStrategy = PlatformStrategy {
    variant: PlatformVariant::Lever,
    form_selector: APPLICATION_FORM,
    submit_selector: SUBMIT_BUTTON,
    fields: &LEVER_FIELDS,
};

static GENERIC: PlatformStrategy = PlatformStrategy {
    variant: PlatformVariant::Unknown,
    form_selector: "form",
    submit_selector: SUBMIT_BUTTON,
    fields: &COMMON_FIELDS,
};

/// 策略表：平台 → 策略，未知平台返回通用兜底策略
pub fn strategy_for(variant: PlatformVariant) -> &'static PlatformStrategy {
    match variant {
        PlatformVariant::Ashby => &ASHBY,
        PlatformVariant::Greenhouse => &GREENHOUSE,
        PlatformVariant::Lever => &LEVER,
        PlatformVariant::Unknown => &GENERIC,
    }
}

/// 通用字段表
pub fn common_fields() -> &'static FieldMap {
    &COMMON_FIELDS
}
