//! 平台识别 - 业务能力层
//!
//! URL → 招聘平台，纯函数

use phf::phf_ordered_map;
use reqwest::Url;

use crate::models::PlatformVariant;

/// 域名片段注册表，按声明顺序匹配，先匹配先得
static PLATFORM_REGISTRY: phf::OrderedMap<&'static str, PlatformVariant> = phf_ordered_map! {
    "jobs.ashbyhq.com" => PlatformVariant::Ashby,
    "boards.greenhouse.io" => PlatformVariant::Greenhouse,
    "jobs.lever.co" => PlatformVariant::Lever,
    "jobs.eu.lever.co" => PlatformVariant::Lever,
};

/// 识别 URL 所属的平台
///
/// 只看 host + path，查询参数里出现的域名不算
pub fn classify(url: &str) -> PlatformVariant {
    let haystack = match Url::parse(url.trim()) {
        Ok(parsed) => format!(
            "{}{}",
            parsed.host_str().unwrap_or_default(),
            parsed.path()
        ),
        Err(_) => {
            let raw = url.trim();
            raw.split(['?', '#']).next().unwrap_or(raw).to_string()
        }
    }
    .to_ascii_lowercase();

    PLATFORM_REGISTRY
        .entries()
        .find(|(domain, _)| haystack.contains(*domain))
        .map(|(_, variant)| *variant)
        .unwrap_or(PlatformVariant::Unknown)
}

/// 是否为受支持的平台
pub fn is_supported(url: &str) -> bool {
    classify(url).is_supported()
}
