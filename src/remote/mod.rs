//! Remote analysis backend
//!
//! Sends the profiling and matching jobs to the Anthropic Messages API and
//! parses the replies into the same shapes the local backend produces.
//! Any reply that does not parse into those shapes fails the run.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

pub use client::AnthropicClient;

use crate::archive::NormalizedConversation;
use crate::backend::AnalysisBackend;
use crate::catalog::SkillCatalog;
use crate::config::RemoteConfig;
use crate::error::{ProfilerError, Result};
use crate::matcher::{SkillRecommendation, MAX_RECOMMENDATIONS};
use crate::profile::{
    UserProfile, MAX_ARTIFACTS, MAX_DOMAINS, MAX_PATTERNS, MAX_REPEATED_REQUESTS, MAX_SKILL_GAPS,
};
use crate::traffic::TrafficLog;

pub const PROFILE_PHASE: &str = "profile";
pub const MATCH_PHASE: &str = "match";

lazy_static! {
    /// Opening fence (or a bare fence) at the start of a line, with its language tag
    static ref RE_FENCE_OPEN: Regex = Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_-]*").unwrap();
}

const FENCE: &str = "```";

/// Remove every markdown code-fence marker from a reply.
///
/// Line-leading fences lose their language tag too; fences anywhere else
/// (a closing fence glued to the JSON, a one-line fenced reply) are dropped.
pub fn strip_code_fences(text: &str) -> String {
    RE_FENCE_OPEN
        .replace_all(text, "")
        .replace(FENCE, "")
        .trim()
        .to_string()
}

pub fn parse_profile(text: &str) -> Result<UserProfile> {
    let profile: UserProfile = serde_json::from_str(&strip_code_fences(text))
        .map_err(|e| malformed_profile(e.to_string()))?;
    validate_profile(&profile)?;
    Ok(profile)
}

fn malformed_profile(details: String) -> ProfilerError {
    ProfilerError::MalformedResponse {
        phase: PROFILE_PHASE.to_string(),
        details,
    }
}

/// Reject profiles whose lists or percentages fall outside what the local
/// synthesizer can produce.
pub fn validate_profile(profile: &UserProfile) -> Result<()> {
    let limits = [
        ("primary_domains", profile.primary_domains.len(), MAX_DOMAINS),
        ("work_patterns", profile.work_patterns.len(), MAX_PATTERNS),
        ("artifact_types", profile.artifact_types.len(), MAX_ARTIFACTS),
        ("repeated_requests", profile.repeated_requests.len(), MAX_REPEATED_REQUESTS),
        ("skill_gaps", profile.skill_gaps.len(), MAX_SKILL_GAPS),
    ];
    if let Some((field, len, max)) = limits.iter().find(|(_, len, max)| len > max) {
        return Err(malformed_profile(format!(
            "{} has {} entries, at most {} allowed",
            field, len, max
        )));
    }

    if let Some(share) = profile.usage_breakdown.iter().find(|s| s.percentage > 100) {
        return Err(malformed_profile(format!(
            "usage percentage {} for {} is above 100",
            share.percentage, share.category
        )));
    }
    Ok(())
}

/// Parse and validate a recommendation array.
///
/// Scores must lie in [0, 1]. The list is re-sorted (stable) by score and
/// cut to [`MAX_RECOMMENDATIONS`].
pub fn parse_recommendations(text: &str) -> Result<Vec<SkillRecommendation>> {
    let malformed = |details: String| ProfilerError::MalformedResponse {
        phase: MATCH_PHASE.to_string(),
        details,
    };

    let mut recs: Vec<SkillRecommendation> =
        serde_json::from_str(&strip_code_fences(text)).map_err(|e| malformed(e.to_string()))?;

    if let Some(bad) = recs
        .iter()
        .find(|r| !(0.0..=1.0).contains(&r.relevance_score))
    {
        return Err(malformed(format!(
            "relevance_score {} for {} is outside [0, 1]",
            bad.relevance_score, bad.skill_id
        )));
    }

    recs.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    recs.truncate(MAX_RECOMMENDATIONS);
    Ok(recs)
}

pub struct RemoteBackend {
    client: AnthropicClient,
    max_tokens: u32,
}

impl RemoteBackend {
    pub fn new(client: AnthropicClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    pub fn from_config(config: &RemoteConfig, traffic: TrafficLog) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProfilerError::MissingApiKey)?;
        let client = AnthropicClient::new(api_key, &config.api_base, &config.model, traffic);
        Ok(Self::new(client, config.max_tokens))
    }

    pub fn client(&self) -> &AnthropicClient {
        &self.client
    }
}

#[async_trait]
impl AnalysisBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn build_profile(&self, conversations: &[NormalizedConversation]) -> Result<UserProfile> {
        let prompt = prompts::profile_prompt(conversations)?;
        let reply = self
            .client
            .complete(PROFILE_PHASE, &prompt, self.max_tokens)
            .await?;
        let profile = parse_profile(&reply)?;
        info!(
            "Remote profile: {} domains via {}",
            profile.primary_domains.len(),
            self.client.model()
        );
        Ok(profile)
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        catalog: &SkillCatalog,
    ) -> Result<Vec<SkillRecommendation>> {
        let prompt = prompts::matching_prompt(profile, catalog)?;
        let reply = self
            .client
            .complete(MATCH_PHASE, &prompt, self.max_tokens)
            .await?;
        let recs = parse_recommendations(&reply)?;
        info!("Remote matcher returned {} recommendations", recs.len());
        Ok(recs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_JSON: &str = r#"{
        "primary_domains": ["Software Development"],
        "work_patterns": ["Debugging & Troubleshooting"],
        "artifact_types": ["Code Files"],
        "repeated_requests": [],
        "skill_gaps": [],
        "usage_breakdown": [{"category": "Software Development", "percentage": 100}],
        "persona_summary": "Builds things."
    }"#;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  ```\n{}\n```  \n"), "{}");
        assert_eq!(strip_code_fences("[1]"), "[1]");
    }

    #[test]
    fn test_strip_closing_fence_on_json_line() {
        let text = "```json\n[{\"skill_id\": \"a\", \"relevance_score\": 0.5, \"reasoning\": \"r\"}]```";
        assert_eq!(parse_recommendations(text).unwrap()[0].skill_id, "a");
    }

    #[test]
    fn test_strip_single_line_fenced_reply() {
        let text = "```json [{\"skill_id\": \"a\", \"relevance_score\": 0.5, \"reasoning\": \"r\"}] ```";
        assert_eq!(parse_recommendations(text).unwrap()[0].skill_id, "a");
        assert_eq!(strip_code_fences("```{}```"), "{}");
    }

    #[test]
    fn test_parse_fenced_profile() {
        let fenced = format!("```json\n{}\n```", PROFILE_JSON);
        let profile = parse_profile(&fenced).unwrap();
        assert_eq!(profile.top_domain(), Some("Software Development"));
        assert_eq!(profile.usage_breakdown[0].percentage, 100);
    }

    #[test]
    fn test_partial_profile_is_rejected() {
        let err = parse_profile(r#"{"primary_domains": ["X"]}"#).unwrap_err();
        assert!(matches!(err, ProfilerError::MalformedResponse { ref phase, .. } if phase == PROFILE_PHASE));
    }

    fn profile_with(field: &str, value: serde_json::Value) -> String {
        let mut json: serde_json::Value = serde_json::from_str(PROFILE_JSON).unwrap();
        json[field] = value;
        json.to_string()
    }

    fn assert_profile_rejected(text: &str) {
        let err = parse_profile(text).unwrap_err();
        assert!(matches!(err, ProfilerError::MalformedResponse { ref phase, .. } if phase == PROFILE_PHASE));
    }

    fn names(n: usize) -> serde_json::Value {
        (0..n).map(|i| format!("item {}", i)).collect()
    }

    #[test]
    fn test_too_many_domains_rejected() {
        assert_profile_rejected(&profile_with("primary_domains", names(MAX_DOMAINS + 4)));
        assert!(parse_profile(&profile_with("primary_domains", names(MAX_DOMAINS))).is_ok());
    }

    #[test]
    fn test_too_many_patterns_rejected() {
        assert_profile_rejected(&profile_with("work_patterns", names(MAX_PATTERNS + 1)));
    }

    #[test]
    fn test_too_many_artifacts_rejected() {
        assert_profile_rejected(&profile_with("artifact_types", names(MAX_ARTIFACTS + 1)));
    }

    #[test]
    fn test_too_many_repeated_requests_rejected() {
        assert_profile_rejected(&profile_with("repeated_requests", names(MAX_REPEATED_REQUESTS + 1)));
    }

    #[test]
    fn test_too_many_skill_gaps_rejected() {
        assert_profile_rejected(&profile_with("skill_gaps", names(MAX_SKILL_GAPS + 2)));
    }

    #[test]
    fn test_percentage_above_hundred_rejected() {
        assert_profile_rejected(&profile_with(
            "usage_breakdown",
            serde_json::json!([{"category": "Software Development", "percentage": 900}]),
        ));
    }

    #[test]
    fn test_parse_recommendations_sorts_and_caps() {
        let items: Vec<String> = (0..10)
            .map(|i| {
                format!(
                    r#"{{"skill_id": "s{}", "relevance_score": {}, "reasoning": "r"}}"#,
                    i,
                    i as f64 / 10.0
                )
            })
            .collect();
        let text = format!("[{}]", items.join(","));
        let recs = parse_recommendations(&text).unwrap();
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs[0].skill_id, "s9");
        assert!(recs
            .windows(2)
            .all(|w| w[0].relevance_score >= w[1].relevance_score));
    }

    #[test]
    fn test_full_confidence_allowed() {
        let recs = parse_recommendations(
            r#"[{"skill_id": "a", "relevance_score": 1.0, "reasoning": "perfect"}]"#,
        )
        .unwrap();
        assert_eq!(recs[0].relevance_score, 1.0);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let err = parse_recommendations(
            r#"[{"skill_id": "a", "relevance_score": 1.5, "reasoning": "too sure"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProfilerError::MalformedResponse { .. }));
    }

    #[test]
    fn test_missing_field_rejected() {
        assert!(parse_recommendations(r#"[{"skill_id": "a", "relevance_score": 0.5}]"#).is_err());
        assert!(parse_recommendations("Sure! Here are some skills.").is_err());
    }
}
