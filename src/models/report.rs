use serde::{Deserialize, Serialize};

/// 字段跳过原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    /// 等待超时，页面上没有这个字段
    NotFound,
    /// 资料里没有对应的值
    NoValue,
    /// 写入时页面报错
    FillFailed { message: String },
}

/// 单个字段的填写结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    pub name: String,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl FieldOutcome {
    pub fn is_filled(&self) -> bool {
        self.skipped.is_none()
    }
}

/// 填表报告，部分完成也是正常结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    pub fields: Vec<FieldOutcome>,
}

impl FillReport {
    pub fn record_filled(&mut self, name: &str, selector: &str) {
        self.fields.push(FieldOutcome {
            name: name.to_string(),
            selector: selector.to_string(),
            skipped: None,
        });
    }

    pub fn record_skipped(&mut self, name: &str, selector: &str, reason: SkipReason) {
        self.fields.push(FieldOutcome {
            name: name.to_string(),
            selector: selector.to_string(),
            skipped: Some(reason),
        });
    }

    pub fn filled(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.fields.iter().filter(|f| f.is_filled())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.fields.iter().filter(|f| !f.is_filled())
    }

    pub fn filled_count(&self) -> usize {
        self.filled().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// 合并另一份报告（通用字段 + 平台字段）
    pub fn merge(&mut self, other: FillReport) {
        self.fields.extend(other.fields);
    }
}
