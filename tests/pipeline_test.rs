//! End-to-end tests for the local heuristic pipeline

use std::sync::Arc;

use skill_profiler::archive::{self, UNTITLED};
use skill_profiler::catalog::SkillCatalog;
use skill_profiler::classifier::{self, KEYWORD_CAP};
use skill_profiler::matcher;
use skill_profiler::profile::build_profile;
use skill_profiler::sample::sample_conversations;
use skill_profiler::{AnalysisState, Analyzer, LocalBackend, TrafficLog};

fn analyzer() -> Analyzer {
    Analyzer::new(
        Arc::new(SkillCatalog::builtin().unwrap()),
        Box::new(LocalBackend),
        TrafficLog::default(),
    )
}

fn debugging_archive_json() -> String {
    let text = "This function has a bug. I need to debug the error. ".repeat(6);
    serde_json::json!([{
        "uuid": "7f1c",
        "name": "Debug React useEffect infinite loop",
        "created_at": "2024-04-01T12:00:00Z",
        "updated_at": "2024-04-01T12:30:00Z",
        "chat_messages": [
            {"uuid": "a", "sender": "human", "text": text, "created_at": "2024-04-01T12:00:00Z"},
            {"uuid": "b", "sender": "assistant", "text": text, "created_at": "2024-04-01T12:01:00Z"}
        ]
    }])
    .to_string()
}

#[tokio::test]
async fn test_debugging_conversation_end_to_end() {
    let raw = archive::parse_archive(debugging_archive_json().as_bytes()).unwrap();
    let report = analyzer().run(&raw).await.unwrap();
    let profile = &report.profile;

    assert_eq!(profile.top_domain(), Some(classifier::DOMAIN_SOFTWARE));
    assert!(profile
        .work_patterns
        .iter()
        .any(|p| p.to_lowercase().contains("debug")));

    // Every catalog entry tagged with development must surface
    let catalog = SkillCatalog::builtin().unwrap();
    let ranked = matcher::rank(profile, &catalog);
    for entry in catalog
        .entries()
        .iter()
        .filter(|e| e.domains.iter().any(|d| d.contains("development")))
    {
        let rec = ranked
            .iter()
            .find(|r| r.skill_id == entry.skill_id)
            .unwrap_or_else(|| panic!("{} not recommended", entry.skill_id));
        assert!(rec.relevance_score > 0.0);
    }

    assert_eq!(
        report.recommendations[0].skill.skill_id,
        "systematic-debugging"
    );
}

#[tokio::test]
async fn test_empty_archive_end_to_end() {
    let raw = archive::parse_archive(b"[]").unwrap();
    let analyzer = analyzer();
    let report = analyzer.run(&raw).await.unwrap();

    assert_eq!(report.conversation_count, 0);
    assert!(report.profile.usage_breakdown.is_empty());
    assert!(report.profile.primary_domains.is_empty());
    assert!(report.recommendations.is_empty());
    assert_eq!(analyzer.state().await, AnalysisState::Completed);
}

#[test]
fn test_missing_name_gets_placeholder() {
    let raw = archive::parse_archive(
        br#"{"uuid": "n1", "created_at": "2024-01-01T00:00:00Z", "chat_messages": []}"#,
    )
    .unwrap();
    let normalized = archive::normalize(&raw);
    assert_eq!(normalized[0].title, UNTITLED);
    assert!(!normalized[0].title.is_empty());
}

#[test]
fn test_normalize_preserves_count_and_order() {
    let raw = sample_conversations();
    let normalized = archive::normalize(&raw);
    assert_eq!(normalized.len(), raw.len());
    for (n, r) in normalized.iter().zip(&raw) {
        assert_eq!(n.id, r.uuid);
        assert_eq!(n.message_count, n.messages.len());
    }
}

#[test]
fn test_profile_is_byte_identical_across_runs() {
    let normalized = archive::normalize(&sample_conversations());
    let first = serde_json::to_string(&build_profile(&normalized)).unwrap();
    let second = serde_json::to_string(&build_profile(&normalized)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_repeated_keyword_is_capped() {
    let text = "spreadsheet ".repeat(1000);
    let raw = archive::parse_archive(
        serde_json::json!({"uuid": "x", "name": "x", "chat_messages": [{"text": text}]})
            .to_string()
            .as_bytes(),
    )
    .unwrap();
    let buffer = skill_profiler::corpus::flatten(&archive::normalize(&raw));
    let classification = classifier::classify(&buffer);
    assert_eq!(
        classification.domain_score(classifier::DOMAIN_DATA),
        KEYWORD_CAP
    );
    assert_eq!(
        classification.artifact_score(classifier::ARTIFACT_SPREADSHEETS),
        KEYWORD_CAP
    );
}

#[test]
fn test_zero_score_categories_never_surface() {
    let normalized = archive::normalize(&sample_conversations());
    let buffer = skill_profiler::corpus::flatten(&normalized);
    let classification = classifier::classify(&buffer);
    let profile = build_profile(&normalized);

    for name in &profile.primary_domains {
        assert!(classification.domain_score(name) > 0);
    }
    for name in &profile.work_patterns {
        assert!(classification.pattern_score(name) > 0);
    }
    for name in &profile.artifact_types {
        assert!(classification.artifact_score(name) > 0);
    }
}

#[test]
fn test_heuristic_scores_bounded_and_sorted() {
    let catalog = SkillCatalog::builtin().unwrap();
    let profile = build_profile(&archive::normalize(&sample_conversations()));
    let recs = matcher::match_skills(&profile, &catalog);

    assert!(!recs.is_empty());
    assert!(recs.len() <= matcher::MAX_RECOMMENDATIONS);
    assert!(recs
        .iter()
        .all(|r| (0.0..=0.95).contains(&r.relevance_score)));
    assert!(recs
        .windows(2)
        .all(|w| w[0].relevance_score >= w[1].relevance_score));

    let enriched = matcher::enrich(&recs, &catalog);
    assert!(enriched.len() <= recs.len());
}

#[test]
fn test_export_then_normalize_matches_direct_normalize() {
    let raw = sample_conversations();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.json");

    archive::write_archive(&path, &raw).unwrap();
    let reread = archive::read_archive(&path).unwrap();
    assert_eq!(archive::normalize(&reread), archive::normalize(&raw));
}

#[test]
fn test_input_errors_before_analysis() {
    assert!(archive::parse_archive(b"not json").unwrap_err().is_input_error());
    assert!(archive::parse_archive(b"PK\x03\x04").unwrap_err().is_input_error());
    assert!(archive::parse_archive(b"\"text\"").unwrap_err().is_input_error());
}
