//! Keyword classifier
//!
//! Scores three fixed keyword dictionaries (domains, work patterns, artifact
//! types) against a lower-cased scanning buffer. A keyword matches at a word
//! boundary on its left side only, so `debug` counts inside `debugging` but
//! not inside `undebuggable`. Each keyword contributes at most
//! [`KEYWORD_CAP`] occurrences to its category.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Maximum occurrences a single keyword contributes to its category.
pub const KEYWORD_CAP: usize = 50;

pub type KeywordTable = [(&'static str, &'static [&'static str])];

// ============================================================================
// Category names referenced elsewhere (gap rules, tests)
// ============================================================================

pub const DOMAIN_SOFTWARE: &str = "Software Development";
pub const DOMAIN_WRITING: &str = "Writing & Content";
pub const DOMAIN_DATA: &str = "Data Analysis";
pub const DOMAIN_RESEARCH: &str = "Research & Learning";
pub const DOMAIN_BUSINESS: &str = "Business & Strategy";
pub const DOMAIN_DESIGN: &str = "Design & Creative";
pub const DOMAIN_PERSONAL: &str = "Personal Productivity";

pub const PATTERN_DEBUGGING: &str = "Debugging & Troubleshooting";
pub const PATTERN_CODE_GENERATION: &str = "Code Generation";
pub const PATTERN_EXPLANATION: &str = "Explanation & Learning";
pub const PATTERN_EDITING: &str = "Editing & Refinement";
pub const PATTERN_BRAINSTORMING: &str = "Brainstorming & Ideation";
pub const PATTERN_REVIEW: &str = "Analysis & Review";
pub const PATTERN_PLANNING: &str = "Planning & Strategy";
pub const PATTERN_SUMMARIZATION: &str = "Summarization";

pub const ARTIFACT_CODE: &str = "Code Files";
pub const ARTIFACT_DOCUMENTS: &str = "Documents & Reports";
pub const ARTIFACT_SPREADSHEETS: &str = "Spreadsheets & Data";
pub const ARTIFACT_PRESENTATIONS: &str = "Presentations";
pub const ARTIFACT_MESSAGES: &str = "Emails & Messages";
pub const ARTIFACT_VISUALS: &str = "Diagrams & Visuals";
pub const ARTIFACT_WEB: &str = "Web Pages & UI";
pub const ARTIFACT_CONFIG: &str = "Structured Data & Configs";

// ============================================================================
// Dictionaries (order is the tie-break order)
// ============================================================================

pub static DOMAIN_KEYWORDS: &KeywordTable = &[
    (
        DOMAIN_SOFTWARE,
        &[
            "code", "function", "bug", "debug", "error", "api", "javascript", "typescript",
            "python", "rust", "react", "database", "sql", "compile", "git", "variable",
            "class", "frontend", "backend", "server", "script", "algorithm", "deploy",
        ],
    ),
    (
        DOMAIN_WRITING,
        &[
            "write", "writing", "essay", "article", "blog", "draft", "story", "paragraph",
            "tone", "grammar", "headline", "newsletter", "proofread", "copywriting", "novel",
        ],
    ),
    (
        DOMAIN_DATA,
        &[
            "data", "dataset", "csv", "excel", "spreadsheet", "chart", "statistic",
            "analysis", "pandas", "regression", "metric", "dashboard", "visualiz",
            "correlation", "pivot",
        ],
    ),
    (
        DOMAIN_RESEARCH,
        &[
            "research", "explain", "learn", "understand", "concept", "theory", "study",
            "paper", "history", "science", "citation", "literature", "definition",
        ],
    ),
    (
        DOMAIN_BUSINESS,
        &[
            "business", "strategy", "market", "customer", "revenue", "startup", "pitch",
            "product", "sales", "pricing", "competitor", "investor", "roadmap", "stakeholder",
        ],
    ),
    (
        DOMAIN_DESIGN,
        &[
            "design", "logo", "color", "layout", "ux", "brand", "creative", "illustration",
            "font", "typography", "poem", "music", "figma", "aesthetic",
        ],
    ),
    (
        DOMAIN_PERSONAL,
        &[
            "schedule", "habit", "travel", "recipe", "health", "workout", "budget",
            "routine", "todo", "calendar", "meal", "vacation", "fitness",
        ],
    ),
];

pub static PATTERN_KEYWORDS: &KeywordTable = &[
    (
        PATTERN_DEBUGGING,
        &[
            "debug", "fix", "error", "bug", "issue", "broken", "crash", "not working",
            "troubleshoot", "stack trace", "exception", "fails",
        ],
    ),
    (
        PATTERN_CODE_GENERATION,
        &[
            "implement", "write a function", "create a", "build", "generate", "scaffold",
            "boilerplate", "component", "code for",
        ],
    ),
    (
        PATTERN_EXPLANATION,
        &[
            "explain", "what is", "how does", "why does", "understand", "teach",
            "walk me through", "difference between", "what are",
        ],
    ),
    (
        PATTERN_EDITING,
        &[
            "edit", "rewrite", "improve", "revise", "polish", "proofread", "shorten",
            "rephrase", "refactor", "clean up",
        ],
    ),
    (
        PATTERN_BRAINSTORMING,
        &[
            "brainstorm", "ideas", "suggest", "alternatives", "options", "come up with",
            "what if", "inspiration",
        ],
    ),
    (
        PATTERN_REVIEW,
        &[
            "analyze", "analyse", "review", "evaluate", "compare", "assess", "critique",
            "pros and cons", "audit", "feedback",
        ],
    ),
    (
        PATTERN_PLANNING,
        &[
            "plan", "roadmap", "strategy", "steps", "outline", "prioritize", "milestone",
            "timeline", "organize",
        ],
    ),
    (
        PATTERN_SUMMARIZATION,
        &[
            "summarize", "summarise", "summary", "tl;dr", "key points", "condense", "recap",
            "overview", "takeaways",
        ],
    ),
];

pub static ARTIFACT_KEYWORDS: &KeywordTable = &[
    (
        ARTIFACT_CODE,
        &[
            "function", "class", "module", "script", ".py", ".js", ".ts", ".rs", "snippet",
            "repository", "library",
        ],
    ),
    (
        ARTIFACT_DOCUMENTS,
        &[
            "document", "report", "memo", "proposal", "whitepaper", "docx", "pdf", "resume",
            "cover letter",
        ],
    ),
    (
        ARTIFACT_SPREADSHEETS,
        &["spreadsheet", "excel", "csv", "table", "xlsx", "formula", "google sheets"],
    ),
    (
        ARTIFACT_PRESENTATIONS,
        &["presentation", "slide", "deck", "powerpoint", "pptx", "keynote"],
    ),
    (
        ARTIFACT_MESSAGES,
        &["email", "message", "reply", "letter", "slack", "announcement", "linkedin post"],
    ),
    (
        ARTIFACT_VISUALS,
        &["diagram", "chart", "flowchart", "graph", "mermaid", "svg", "mockup", "wireframe"],
    ),
    (
        ARTIFACT_WEB,
        &["html", "css", "landing page", "website", "webpage", "tailwind", "web app"],
    ),
    (
        ARTIFACT_CONFIG,
        &["json", "yaml", "schema", "config", "toml", "xml", "openapi"],
    ),
];

// ============================================================================
// Compiled dictionaries
// ============================================================================

#[derive(Debug)]
struct CompiledCategory {
    name: &'static str,
    matchers: Vec<Regex>,
}

/// A keyword dictionary compiled to case-insensitive, left-anchored matchers.
#[derive(Debug)]
pub struct KeywordDictionary {
    categories: Vec<CompiledCategory>,
}

impl KeywordDictionary {
    pub fn new(table: &KeywordTable) -> Self {
        let categories = table
            .iter()
            .map(|&(name, keywords)| CompiledCategory {
                name,
                matchers: keywords.iter().map(|kw| keyword_matcher(kw)).collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Score every category and rank them by score, highest first.
    ///
    /// Zero-score categories are included; equal scores keep dictionary order.
    pub fn score(&self, buffer: &str) -> Vec<CategoryScore> {
        let mut scores: Vec<CategoryScore> = self
            .categories
            .par_iter()
            .map(|category| CategoryScore {
                name: category.name.to_string(),
                score: category
                    .matchers
                    .iter()
                    .map(|re| re.find_iter(buffer).take(KEYWORD_CAP).count())
                    .sum(),
            })
            .collect();

        // `sort_by` is stable
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores
    }
}

fn keyword_matcher(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}", regex::escape(keyword)))
        .expect("escaped keyword is always a valid pattern")
}

lazy_static! {
    static ref DOMAINS: KeywordDictionary = KeywordDictionary::new(DOMAIN_KEYWORDS);
    static ref PATTERNS: KeywordDictionary = KeywordDictionary::new(PATTERN_KEYWORDS);
    static ref ARTIFACTS: KeywordDictionary = KeywordDictionary::new(ARTIFACT_KEYWORDS);
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub name: String,
    pub score: usize,
}

/// Ranked raw scores for all three dictionaries, zero scores included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub domains: Vec<CategoryScore>,
    pub patterns: Vec<CategoryScore>,
    pub artifacts: Vec<CategoryScore>,
}

impl Classification {
    pub fn domain_score(&self, name: &str) -> usize {
        lookup(&self.domains, name)
    }

    pub fn pattern_score(&self, name: &str) -> usize {
        lookup(&self.patterns, name)
    }

    pub fn artifact_score(&self, name: &str) -> usize {
        lookup(&self.artifacts, name)
    }

    pub fn total_domain_score(&self) -> usize {
        self.domains.iter().map(|c| c.score).sum()
    }
}

fn lookup(scores: &[CategoryScore], name: &str) -> usize {
    scores
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.score)
        .unwrap_or(0)
}

/// Non-zero categories, in ranked order, at most `limit`.
pub fn surfaced(scores: &[CategoryScore], limit: usize) -> Vec<&CategoryScore> {
    scores.iter().filter(|c| c.score > 0).take(limit).collect()
}

/// Classify a scanning buffer against the built-in dictionaries.
pub fn classify(buffer: &str) -> Classification {
    let classification = Classification {
        domains: DOMAINS.score(buffer),
        patterns: PATTERNS.score(buffer),
        artifacts: ARTIFACTS.score(buffer),
    };

    debug!(
        "Top domain: {:?}, top pattern: {:?}, top artifact: {:?}",
        classification.domains.first(),
        classification.patterns.first(),
        classification.artifacts.first()
    );
    classification
}
