//! Profile synthesis
//!
//! Turns a [`Classification`] plus the conversations themselves into a
//! [`UserProfile`]. Output is a pure function of the input; serializing the
//! same profile twice yields identical bytes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::archive::NormalizedConversation;
use crate::classifier::{self, surfaced, CategoryScore, Classification};
use crate::corpus;

pub const MAX_DOMAINS: usize = 6;
pub const MAX_PATTERNS: usize = 8;
pub const MAX_ARTIFACTS: usize = 5;
pub const MAX_REPEATED_REQUESTS: usize = 5;
pub const MAX_SKILL_GAPS: usize = 5;

/// Title words must be longer than this to count as a repeated request.
const MIN_TITLE_WORD_CHARS: usize = 4;

/// Conversation count at which a user is described as a power user.
const POWER_USER_CONVERSATIONS: usize = 100;

/// Below this a category counts as absent for gap rules.
const GAP_LOW: usize = 3;

/// At or above this a category counts as a strong signal for gap rules.
const GAP_STRONG: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageShare {
    pub category: String,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub primary_domains: Vec<String>,
    pub work_patterns: Vec<String>,
    pub artifact_types: Vec<String>,
    pub repeated_requests: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub usage_breakdown: Vec<UsageShare>,
    pub persona_summary: String,
}

impl UserProfile {
    pub fn top_domain(&self) -> Option<&str> {
        self.primary_domains.first().map(String::as_str)
    }

    pub fn top_pattern(&self) -> Option<&str> {
        self.work_patterns.first().map(String::as_str)
    }
}

// ============================================================================
// Skill gap rules
// ============================================================================

/// A skill-gap suggestion emitted when `applies` holds for the raw scores.
pub struct GapRule {
    pub applies: fn(&Classification) -> bool,
    pub message: &'static str,
}

/// Evaluated in order; at most [`MAX_SKILL_GAPS`] messages are kept.
pub static GAP_RULES: &[GapRule] = &[
    GapRule {
        applies: |c: &Classification| {
            c.domain_score(classifier::DOMAIN_DATA) < GAP_LOW
                && c.total_domain_score() >= GAP_STRONG
        },
        message: "Data analysis barely appears in your conversations. A data-analysis skill could help you turn spreadsheets and metrics into decisions.",
    },
    GapRule {
        applies: |c: &Classification| {
            c.domain_score(classifier::DOMAIN_SOFTWARE) >= GAP_STRONG
                && c.pattern_score(classifier::PATTERN_DEBUGGING) < GAP_LOW
        },
        message: "You build a lot of software but rarely debug with the assistant. A systematic debugging skill could shorten your fix cycles.",
    },
    GapRule {
        applies: |c: &Classification| {
            c.domain_score(classifier::DOMAIN_SOFTWARE) >= GAP_STRONG
                && c.pattern_score(classifier::PATTERN_REVIEW) < GAP_LOW
        },
        message: "Your code seldom gets a second look. A code-review skill could catch problems before they ship.",
    },
    GapRule {
        applies: |c: &Classification| {
            c.domain_score(classifier::DOMAIN_WRITING) >= GAP_STRONG
                && c.pattern_score(classifier::PATTERN_EDITING) < GAP_LOW
        },
        message: "You draft plenty of text but rarely revise it. An editing skill could sharpen tone and structure.",
    },
    GapRule {
        applies: |c: &Classification| {
            c.domain_score(classifier::DOMAIN_RESEARCH) >= GAP_STRONG
                && c.pattern_score(classifier::PATTERN_SUMMARIZATION) < GAP_LOW
        },
        message: "You research a lot without condensing what you find. A summarization skill could turn reading into takeaways.",
    },
    GapRule {
        applies: |c: &Classification| {
            c.domain_score(classifier::DOMAIN_BUSINESS) >= GAP_STRONG
                && c.artifact_score(classifier::ARTIFACT_PRESENTATIONS) == 0
        },
        message: "Your business work never produces presentations. A slide-deck skill could help you communicate strategy.",
    },
    GapRule {
        applies: |c: &Classification| {
            c.total_domain_score() >= GAP_STRONG
                && c.pattern_score(classifier::PATTERN_PLANNING) < GAP_LOW
        },
        message: "Planning rarely comes up in your requests. A project-planning skill could break large goals into steps.",
    },
    GapRule {
        applies: |c: &Classification| {
            c.domain_score(classifier::DOMAIN_SOFTWARE) >= GAP_STRONG
                && c.artifact_score(classifier::ARTIFACT_DOCUMENTS) == 0
        },
        message: "Your technical work leaves no documentation behind. A technical-writing skill could help document what you build.",
    },
];

fn skill_gaps(classification: &Classification) -> Vec<String> {
    GAP_RULES
        .iter()
        .filter(|rule| (rule.applies)(classification))
        .take(MAX_SKILL_GAPS)
        .map(|rule| rule.message.to_string())
        .collect()
}

// ============================================================================
// Heuristics
// ============================================================================

/// Percentages are relative to the surfaced categories only, so a large
/// score outside the top slice is not reflected. Rounding is per entry and
/// the total may drift from 100.
fn usage_breakdown(domains: &[&CategoryScore]) -> Vec<UsageShare> {
    let total: usize = domains.iter().map(|c| c.score).sum();
    if total == 0 {
        return Vec::new();
    }

    domains
        .iter()
        .map(|c| UsageShare {
            category: c.name.clone(),
            percentage: (c.score as f64 * 100.0 / total as f64).round() as u32,
        })
        .collect()
}

fn repeated_requests(conversations: &[NormalizedConversation]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for conv in conversations.iter().filter(|c| !c.untitled) {
        let title = conv.title.to_lowercase();
        for word in title
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|w| w.chars().count() > MIN_TITLE_WORD_CHARS)
        {
            let count = counts.entry(word.to_string()).or_insert(0);
            if *count == 0 {
                first_seen.push(word.to_string());
            }
            *count += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = first_seen
        .into_iter()
        .map(|w| {
            let n = counts.get(&w).copied().unwrap_or(0);
            (w, n)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(MAX_REPEATED_REQUESTS)
        .map(|(word, n)| {
            format!(
                "You often ask about \"{}\" ({} conversation {})",
                word,
                n,
                plural(n, "title", "titles")
            )
        })
        .collect()
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn persona_summary(
    conversations: &[NormalizedConversation],
    top_domain: Option<&str>,
    top_pattern: Option<&str>,
) -> String {
    let conversation_count = conversations.len();
    let message_count: usize = conversations.iter().map(|c| c.message_count).sum();
    let user_kind = if conversation_count >= POWER_USER_CONVERSATIONS {
        "power"
    } else {
        "regular"
    };

    format!(
        "A {} user with {} {} and {} {}. Most of the work centers on {}, and the most common request type is {}.",
        user_kind,
        conversation_count,
        plural(conversation_count, "conversation", "conversations"),
        message_count,
        plural(message_count, "message", "messages"),
        top_domain.unwrap_or("general topics"),
        top_pattern
            .map(str::to_lowercase)
            .unwrap_or_else(|| "general assistance".to_string())
    )
}

// ============================================================================
// Entry points
// ============================================================================

/// Assemble a profile from classifier output and the source conversations.
pub fn synthesize(
    classification: &Classification,
    conversations: &[NormalizedConversation],
) -> UserProfile {
    let domains = surfaced(&classification.domains, MAX_DOMAINS);
    let names = |scores: Vec<&CategoryScore>| -> Vec<String> {
        scores.into_iter().map(|c| c.name.clone()).collect()
    };

    let primary_domains = names(domains.clone());
    let work_patterns = names(surfaced(&classification.patterns, MAX_PATTERNS));
    let artifact_types = names(surfaced(&classification.artifacts, MAX_ARTIFACTS));

    let persona_summary = persona_summary(
        conversations,
        primary_domains.first().map(String::as_str),
        work_patterns.first().map(String::as_str),
    );

    UserProfile {
        usage_breakdown: usage_breakdown(&domains),
        primary_domains,
        work_patterns,
        artifact_types,
        repeated_requests: repeated_requests(conversations),
        skill_gaps: skill_gaps(classification),
        persona_summary,
    }
}

/// Run flattener, classifier and synthesizer over normalized conversations.
pub fn build_profile(conversations: &[NormalizedConversation]) -> UserProfile {
    let buffer = corpus::flatten(conversations);
    let classification = classifier::classify(&buffer);
    let profile = synthesize(&classification, conversations);

    info!(
        "Built profile: {} domains, {} patterns, {} artifacts, {} gaps",
        profile.primary_domains.len(),
        profile.work_patterns.len(),
        profile.artifact_types.len(),
        profile.skill_gaps.len()
    );
    profile
}
