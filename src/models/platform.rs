use serde::{Deserialize, Serialize};
use std::fmt;

/// 招聘平台（ATS）类型
///
/// 只从 URL 推导，不做存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformVariant {
    Ashby,
    Greenhouse,
    Lever,
    Unknown,
}

impl PlatformVariant {
    pub fn name(self) -> &'static str {
        match self {
            PlatformVariant::Ashby => "ashby",
            PlatformVariant::Greenhouse => "greenhouse",
            PlatformVariant::Lever => "lever",
            PlatformVariant::Unknown => "unknown",
        }
    }

    pub fn is_supported(self) -> bool {
        self != PlatformVariant::Unknown
    }
}

impl fmt::Display for PlatformVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
