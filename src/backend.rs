//! Interchangeable analysis backends
//!
//! Profiling and matching go through [`AnalysisBackend`] so the orchestrator
//! never branches on which implementation it holds.

use async_trait::async_trait;
use tracing::info;

use crate::archive::NormalizedConversation;
use crate::catalog::SkillCatalog;
use crate::config::{AnalysisMode, Config};
use crate::error::Result;
use crate::matcher::{self, SkillRecommendation};
use crate::profile::{self, UserProfile};
use crate::remote::RemoteBackend;
use crate::traffic::TrafficLog;

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Short identifier shown in reports and logs
    fn name(&self) -> &'static str;

    async fn build_profile(&self, conversations: &[NormalizedConversation]) -> Result<UserProfile>;

    /// Recommendations ranked by relevance, at most eight
    async fn recommend(
        &self,
        profile: &UserProfile,
        catalog: &SkillCatalog,
    ) -> Result<Vec<SkillRecommendation>>;
}

/// Deterministic keyword heuristics; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

#[async_trait]
impl AnalysisBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn build_profile(&self, conversations: &[NormalizedConversation]) -> Result<UserProfile> {
        Ok(profile::build_profile(conversations))
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        catalog: &SkillCatalog,
    ) -> Result<Vec<SkillRecommendation>> {
        Ok(matcher::match_skills(profile, catalog))
    }
}

/// Pick the backend named by `config.mode`.
pub fn backend_from_config(config: &Config, traffic: TrafficLog) -> Result<Box<dyn AnalysisBackend>> {
    let backend: Box<dyn AnalysisBackend> = match config.mode {
        AnalysisMode::Local => Box::new(LocalBackend),
        AnalysisMode::Remote => Box::new(RemoteBackend::from_config(&config.remote, traffic)?),
    };
    info!("Using {} analysis backend", backend.name());
    Ok(backend)
}
