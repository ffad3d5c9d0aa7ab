//! 候选人资料解析 - 业务能力层
//!
//! 本地存储 → 后端 → 兜底资料（需配置允许）

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::clients::BackendClient;
use crate::models::{CandidateProfile, ProfileOrigin, ResolvedProfile};
use crate::services::local_store::LocalStore;

pub struct ProfileResolver<'a> {
    store: &'a LocalStore,
    backend: Option<&'a BackendClient>,
    token: Option<&'a str>,
    allow_fallback: bool,
    resume_path: Option<String>,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(store: &'a LocalStore, allow_fallback: bool) -> Self {
        Self {
            store,
            backend: None,
            token: None,
            allow_fallback,
            resume_path: None,
        }
    }

    /// 配置了访问令牌时才会请求后端
    pub fn with_backend(mut self, backend: &'a BackendClient, token: Option<&'a str>) -> Self {
        self.backend = Some(backend);
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_resume(mut self, resume_path: Option<String>) -> Self {
        self.resume_path = resume_path;
        self
    }

    pub async fn resolve(&self) -> Result<ResolvedProfile> {
        let resolved = self.resolve_inner().await?;
        Ok(ResolvedProfile {
            profile: resolved.profile.with_resume(self.resume_path.clone()),
            origin: resolved.origin,
        })
    }

    async fn resolve_inner(&self) -> Result<ResolvedProfile> {
        match self.store.profile() {
            Ok(Some(profile)) => {
                info!("✓ 使用本地存储的候选人资料: {}", profile.full_name());
                return Ok(ResolvedProfile {
                    profile,
                    origin: ProfileOrigin::Stored,
                });
            }
            Ok(None) => {}
            Err(e) => warn!("本地候选人资料无法解析，忽略: {}", e),
        }

        if let (Some(backend), Some(token)) = (self.backend, self.token) {
            match backend.fetch_profile(token).await {
                Ok(remote) => {
                    let profile = remote.into_candidate();
                    if let Err(e) = self.store.set_profile(&profile) {
                        warn!("保存候选人资料失败: {}", e);
                    }
                    info!("✓ 已从后端获取候选人资料: {}", profile.full_name());
                    return Ok(ResolvedProfile {
                        profile,
                        origin: ProfileOrigin::Backend,
                    });
                }
                Err(e) => warn!("⚠️ 从后端获取候选人资料失败: {}", e),
            }
        }

        if !self.allow_fallback {
            bail!("没有可用的候选人资料，且未启用兜底资料 (USE_FALLBACK_PROFILE=false)");
        }

        warn!("⚠️ 未找到候选人资料，使用兜底资料 (John Doe)，请尽快配置真实资料");
        Ok(ResolvedProfile {
            profile: CandidateProfile::fallback(),
            origin: ProfileOrigin::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stored_profile_wins() {
        let store = LocalStore::in_memory();
        let stored = CandidateProfile {
            first_name: "Ada".to_string(),
            ..CandidateProfile::fallback()
        };
        store.set_profile(&stored).unwrap();

        let resolved = ProfileResolver::new(&store, true).resolve().await.unwrap();
        assert_eq!(resolved.origin, ProfileOrigin::Stored);
        assert_eq!(resolved.profile.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_fallback_is_explicit() {
        let store = LocalStore::in_memory();

        let resolved = ProfileResolver::new(&store, true)
            .with_resume(Some("/tmp/cv.pdf".to_string()))
            .resolve()
            .await
            .unwrap();
        assert_eq!(resolved.origin, ProfileOrigin::Fallback);
        assert_eq!(resolved.profile.resume_reference.as_deref(), Some("/tmp/cv.pdf"));

        assert!(ProfileResolver::new(&store, false).resolve().await.is_err());
    }

    #[tokio::test]
    async fn test_backend_without_token_is_not_called() {
        let store = LocalStore::in_memory();
        // 端口 9 上没有服务，真的发请求会失败并落到兜底
        let backend = BackendClient::new("http://127.0.0.1:9");

        let resolved = ProfileResolver::new(&store, true)
            .with_backend(&backend, None)
            .resolve()
            .await
            .unwrap();
        assert_eq!(resolved.origin, ProfileOrigin::Fallback);
    }
}
