//! Analysis orchestration
//!
//! Runs normalize → profile → recommend → enrich strictly in sequence and
//! exposes the run state so a caller can tell in-progress, completed and
//! failed runs apart. Only one run may be in flight per [`Analyzer`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::archive::{self, RawConversation};
use crate::backend::AnalysisBackend;
use crate::catalog::SkillCatalog;
use crate::error::{ProfilerError, Result};
use crate::matcher::{self, EnrichedRecommendation};
use crate::profile::UserProfile;
use crate::traffic::TrafficLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Normalizing,
    Profiling,
    Matching,
    Enriching,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Running { phase: Phase },
    Completed,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub backend: String,
    pub conversation_count: usize,
    pub profile: UserProfile,
    pub recommendations: Vec<EnrichedRecommendation>,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Analyzer {
    catalog: Arc<SkillCatalog>,
    backend: Box<dyn AnalysisBackend>,
    traffic: TrafficLog,
    state: RwLock<AnalysisState>,
    in_flight: AtomicBool,
}

impl Analyzer {
    pub fn new(
        catalog: Arc<SkillCatalog>,
        backend: Box<dyn AnalysisBackend>,
        traffic: TrafficLog,
    ) -> Self {
        Self {
            catalog,
            backend,
            traffic,
            state: RwLock::new(AnalysisState::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn traffic(&self) -> &TrafficLog {
        &self.traffic
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub async fn state(&self) -> AnalysisState {
        self.state.read().await.clone()
    }

    async fn set_state(&self, state: AnalysisState) {
        *self.state.write().await = state;
    }

    async fn enter(&self, phase: Phase) {
        self.set_state(AnalysisState::Running { phase }).await;
    }

    /// Analyze an archive. A failed run returns the error and no report.
    pub async fn run(&self, raw: &[RawConversation]) -> Result<AnalysisReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProfilerError::AnalysisInProgress);
        }
        let _guard = InFlight(&self.in_flight);

        self.traffic.reset().await;
        match self.run_phases(raw).await {
            Ok(report) => {
                self.set_state(AnalysisState::Completed).await;
                info!(
                    "Analysis complete: {} conversations, {} recommendations",
                    report.conversation_count,
                    report.recommendations.len()
                );
                Ok(report)
            }
            Err(e) => {
                error!("Analysis failed: {}", e);
                self.set_state(AnalysisState::Failed {
                    message: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    async fn run_phases(&self, raw: &[RawConversation]) -> Result<AnalysisReport> {
        self.enter(Phase::Normalizing).await;
        let conversations = archive::normalize(raw);

        self.enter(Phase::Profiling).await;
        let profile = self.backend.build_profile(&conversations).await?;

        self.enter(Phase::Matching).await;
        let recommendations = self.backend.recommend(&profile, &self.catalog).await?;

        self.enter(Phase::Enriching).await;
        let recommendations = matcher::enrich(&recommendations, &self.catalog);

        Ok(AnalysisReport {
            backend: self.backend.name().to_string(),
            conversation_count: conversations.len(),
            profile,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::RawMessage;
    use crate::backend::LocalBackend;
    use crate::matcher::SkillRecommendation;
    use crate::profile;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn analyzer(backend: Box<dyn AnalysisBackend>) -> Analyzer {
        Analyzer::new(
            Arc::new(SkillCatalog::builtin().unwrap()),
            backend,
            TrafficLog::default(),
        )
    }

    fn debugging_archive() -> Vec<RawConversation> {
        let text = "function bug debug error ".repeat(8);
        vec![RawConversation {
            uuid: "c1".to_string(),
            name: Some("Debug React useEffect infinite loop".to_string()),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            chat_messages: Some(vec![RawMessage {
                uuid: "m1".to_string(),
                sender: "human".to_string(),
                text,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            }]),
        }]
    }

    #[tokio::test]
    async fn test_local_run_completes() {
        let analyzer = analyzer(Box::new(LocalBackend));
        assert_eq!(analyzer.state().await, AnalysisState::Idle);

        let report = analyzer.run(&debugging_archive()).await.unwrap();
        assert_eq!(report.backend, "local");
        assert_eq!(report.conversation_count, 1);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.skill.skill_id == "systematic-debugging"));
        assert_eq!(analyzer.state().await, AnalysisState::Completed);
    }

    struct FailingBackend;

    #[async_trait]
    impl AnalysisBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn build_profile(&self, _: &[archive::NormalizedConversation]) -> Result<UserProfile> {
            Err(ProfilerError::Network {
                label: "profile".to_string(),
                message: "connection refused".to_string(),
            })
        }

        async fn recommend(
            &self,
            _: &UserProfile,
            _: &SkillCatalog,
        ) -> Result<Vec<SkillRecommendation>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_run_sets_failed_state() {
        let analyzer = analyzer(Box::new(FailingBackend));
        let err = analyzer.run(&debugging_archive()).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));

        match analyzer.state().await {
            AnalysisState::Failed { message } => assert!(message.contains("connection refused")),
            other => panic!("unexpected state {:?}", other),
        }

        // The guard is released after a failure
        let again = analyzer.run(&[]).await.unwrap_err();
        assert!(matches!(again, ProfilerError::Network { .. }));
    }

    /// Blocks in profiling until released.
    struct GatedBackend {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AnalysisBackend for GatedBackend {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn build_profile(
            &self,
            conversations: &[archive::NormalizedConversation],
        ) -> Result<UserProfile> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(profile::build_profile(conversations))
        }

        async fn recommend(
            &self,
            _: &UserProfile,
            _: &SkillCatalog,
        ) -> Result<Vec<SkillRecommendation>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let analyzer = Arc::new(analyzer(Box::new(GatedBackend {
            entered: entered.clone(),
            release: release.clone(),
        })));

        let first = {
            let analyzer = analyzer.clone();
            tokio::spawn(async move { analyzer.run(&[]).await })
        };
        entered.notified().await;

        assert_eq!(
            analyzer.state().await,
            AnalysisState::Running {
                phase: Phase::Profiling
            }
        );
        let second = analyzer.run(&[]).await.unwrap_err();
        assert!(matches!(second, ProfilerError::AnalysisInProgress));

        release.notify_one();
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.conversation_count, 0);
        assert!(report.recommendations.is_empty());
        assert_eq!(analyzer.state().await, AnalysisState::Completed);
    }
}
