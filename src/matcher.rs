//! Skill matching
//!
//! Scores catalog entries against a [`UserProfile`] by tag overlap:
//!
//! - Tags are split into lower-cased alphanumeric tokens; the connector words
//!   `and`, `the`, `of`, `for` are dropped.
//! - Two tokens match when they are equal, or when the shorter one has at
//!   least [`MIN_PREFIX_CHARS`] characters and is a prefix of the longer one
//!   (`debug` matches `debugging`, `dev` matches nothing but `dev`).
//! - Two tags overlap when any of their tokens match.
//!
//! Every (entry domain, profile domain) overlap adds [`MatchWeights::domain`],
//! every (entry pattern, profile pattern) overlap adds
//! [`MatchWeights::pattern`]. The sum is capped below 1.0, which only the
//! remote backend may assert. Equal scores keep catalog order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{SkillCatalog, SkillCatalogEntry};
use crate::profile::UserProfile;

/// Maximum number of recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 8;

/// Reasoning keeps at most this many distinct fragments
const MAX_REASONS: usize = 2;

/// Shortest token allowed to match as a prefix
pub const MIN_PREFIX_CHARS: usize = 4;

const CONNECTORS: &[&str] = &["and", "the", "of", "for"];

/// Scoring weights for tag overlaps
pub struct MatchWeights {
    /// Entry domain overlaps a profile domain
    pub domain: f64,
    /// Entry work pattern overlaps a profile work pattern
    pub pattern: f64,
    /// Maximum heuristic score
    pub capped_max: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            domain: 0.35,
            pattern: 0.15,
            capped_max: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecommendation {
    pub skill_id: String,
    pub relevance_score: f64,
    pub reasoning: String,
}

/// A recommendation joined with its catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecommendation {
    #[serde(flatten)]
    pub recommendation: SkillRecommendation,
    pub skill: SkillCatalogEntry,
}

// ============================================================================
// Token overlap
// ============================================================================

fn tokens(tag: &str) -> Vec<String> {
    tag.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|t| !t.is_empty() && !CONNECTORS.contains(t))
        .map(str::to_string)
        .collect()
}

fn tokens_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.chars().count() >= MIN_PREFIX_CHARS && long.starts_with(short)
}

/// Whether two tags share a token (exactly or by prefix).
pub fn tags_overlap(a: &str, b: &str) -> bool {
    let b_tokens = tokens(b);
    tokens(a)
        .iter()
        .any(|ta| b_tokens.iter().any(|tb| tokens_match(ta, tb)))
}

// ============================================================================
// Scoring
// ============================================================================

fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

fn reasoning(fragments: &[String], profile: &UserProfile) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for fragment in fragments {
        if !distinct.contains(&fragment.as_str()) {
            distinct.push(fragment);
        }
        if distinct.len() == MAX_REASONS {
            break;
        }
    }

    if distinct.is_empty() {
        return format!(
            "General-purpose skill that complements your work in {}.",
            profile.top_domain().unwrap_or("your everyday work")
        );
    }

    let joined = distinct.join(" and ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => joined,
    }
}

/// Score one catalog entry; `None` when nothing overlaps.
pub fn score_entry(
    entry: &SkillCatalogEntry,
    profile: &UserProfile,
    weights: &MatchWeights,
) -> Option<SkillRecommendation> {
    let mut score = 0.0;
    let mut fragments: Vec<String> = Vec::new();

    for domain in &entry.domains {
        for profile_domain in &profile.primary_domains {
            if tags_overlap(domain, profile_domain) {
                score += weights.domain;
                fragments.push(format!("matches your focus on {}", profile_domain));
            }
        }
    }

    for pattern in &entry.work_patterns {
        for profile_pattern in &profile.work_patterns {
            if tags_overlap(pattern, profile_pattern) {
                score += weights.pattern;
                fragments.push(format!("fits your {} work", profile_pattern.to_lowercase()));
            }
        }
    }

    if score <= 0.0 {
        return None;
    }

    Some(SkillRecommendation {
        skill_id: entry.skill_id.clone(),
        relevance_score: round2(score.min(weights.capped_max)),
        reasoning: reasoning(&fragments, profile),
    })
}

/// Every positive-score entry, best first, catalog order on ties.
pub fn rank(profile: &UserProfile, catalog: &SkillCatalog) -> Vec<SkillRecommendation> {
    let weights = MatchWeights::default();
    let mut ranked: Vec<SkillRecommendation> = catalog
        .entries()
        .iter()
        .filter_map(|entry| score_entry(entry, profile, &weights))
        .collect();

    // `sort_by` is stable
    ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    ranked
}

/// Top [`MAX_RECOMMENDATIONS`] recommendations for a profile.
pub fn match_skills(profile: &UserProfile, catalog: &SkillCatalog) -> Vec<SkillRecommendation> {
    let mut ranked = rank(profile, catalog);
    debug!("{} of {} skills scored above zero", ranked.len(), catalog.len());
    ranked.truncate(MAX_RECOMMENDATIONS);
    ranked
}

/// Join recommendations with catalog entries, dropping unknown ids.
pub fn enrich(
    recommendations: &[SkillRecommendation],
    catalog: &SkillCatalog,
) -> Vec<EnrichedRecommendation> {
    recommendations
        .iter()
        .filter_map(|rec| match catalog.get(&rec.skill_id) {
            Some(skill) => Some(EnrichedRecommendation {
                recommendation: rec.clone(),
                skill: skill.clone(),
            }),
            None => {
                debug!("Dropping recommendation for unknown skill {}", rec.skill_id);
                None
            }
        })
        .collect()
}
