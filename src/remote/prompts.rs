use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive::NormalizedConversation;
use crate::catalog::{SkillCatalog, SkillSource};
use crate::error::{ProfilerError, Result};
use crate::profile::UserProfile;

/// Most conversations embedded in the profiling prompt
pub const SAMPLE_LIMIT: usize = 40;

/// Leading messages kept per sampled conversation
pub const MESSAGES_PER_SAMPLE: usize = 4;

/// Characters kept per message preview
pub const PREVIEW_CHARS: usize = 200;

#[derive(Serialize)]
struct SampledConversation<'a> {
    title: &'a str,
    message_count: usize,
    created: String,
    messages: Vec<SampledMessage<'a>>,
}

#[derive(Serialize)]
struct SampledMessage<'a> {
    sender: &'a str,
    text: String,
}

#[derive(Serialize)]
struct CatalogLine<'a> {
    id: &'a str,
    name: &'a str,
    source: SkillSource,
    domains: &'a [String],
    work_patterns: &'a [String],
    description: &'a str,
}

/// Evenly strided sample of at most [`SAMPLE_LIMIT`] conversations, in order.
pub fn sample(conversations: &[NormalizedConversation]) -> Vec<&NormalizedConversation> {
    let n = conversations.len();
    if n <= SAMPLE_LIMIT {
        return conversations.iter().collect();
    }
    (0..SAMPLE_LIMIT)
        .map(|i| &conversations[i * n / SAMPLE_LIMIT])
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn creation_date(timestamp: &str) -> String {
    match timestamp.parse::<DateTime<Utc>>() {
        Ok(dt) => dt.format("%Y-%m-%d").to_string(),
        Err(_) if timestamp.is_empty() => "unknown".to_string(),
        Err(_) => timestamp.to_string(),
    }
}

fn encode<T: Serialize>(phase: &str, value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ProfilerError::MalformedResponse {
        phase: phase.to_string(),
        details: format!("cannot encode prompt data: {}", e),
    })
}

pub fn profile_prompt(conversations: &[NormalizedConversation]) -> Result<String> {
    let sampled: Vec<SampledConversation> = sample(conversations)
        .into_iter()
        .map(|conv| SampledConversation {
            title: &conv.title,
            message_count: conv.message_count,
            created: creation_date(&conv.created_at),
            messages: conv
                .messages
                .iter()
                .take(MESSAGES_PER_SAMPLE)
                .map(|m| SampledMessage {
                    sender: &m.sender,
                    text: truncate_chars(&m.text, PREVIEW_CHARS),
                })
                .collect(),
        })
        .collect();

    Ok(format!(
        r#"You are analyzing a person's AI assistant usage. Below is a sample of {sampled} of their {total} conversations.

{data}

Build a usage profile. Respond with ONLY a JSON object (no markdown code fences) with exactly these fields:
{{
  "primary_domains": ["most significant topical domain first, at most 6"],
  "work_patterns": ["recurring task types, most common first, at most 8"],
  "artifact_types": ["kinds of output requested, at most 5"],
  "repeated_requests": ["sentences describing requests they make again and again"],
  "skill_gaps": ["sentences describing skills that would help them, at most 5"],
  "usage_breakdown": [{{"category": "domain name", "percentage": 0}}],
  "persona_summary": "one short paragraph describing how they use the assistant"
}}
Percentages are integers that sum to roughly 100 across the listed domains."#,
        sampled = sampled.len(),
        total = conversations.len(),
        data = encode("profile", &sampled)?,
    ))
}

pub fn matching_prompt(profile: &UserProfile, catalog: &SkillCatalog) -> Result<String> {
    let lines: Vec<CatalogLine> = catalog
        .entries()
        .iter()
        .map(|e| CatalogLine {
            id: &e.skill_id,
            name: &e.name,
            source: e.source,
            domains: &e.domains,
            work_patterns: &e.work_patterns,
            description: &e.description,
        })
        .collect();

    Ok(format!(
        r#"Match this user profile against the skill catalog.

User profile:
{profile}

Skill catalog:
{catalog}

Respond with ONLY a JSON array (no markdown code fences) of at most 8 objects, ordered by relevance_score descending:
[{{"skill_id": "id from the catalog", "relevance_score": 0.0, "reasoning": "one sentence on why it fits"}}]
relevance_score is a number between 0 and 1."#,
        profile = encode("match", profile)?,
        catalog = encode("match", &lines)?,
    ))
}
