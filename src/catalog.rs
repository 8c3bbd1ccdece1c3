//! Skill catalog
//!
//! Static reference data: loaded once, never mutated, shared read-only
//! (behind an `Arc`) by every analysis run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProfilerError, Result};

/// Catalog compiled into the binary
const BUILTIN_CATALOG: &str = include_str!("../data/skills.json");

/// Where a skill definition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSource {
    Anthropic,
    Community,
    Partner,
}

impl SkillSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillSource::Anthropic => "anthropic",
            SkillSource::Community => "community",
            SkillSource::Partner => "partner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCatalogEntry {
    pub skill_id: String,
    pub name: String,
    pub source: SkillSource,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub work_patterns: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    entries: Vec<SkillCatalogEntry>,
    by_id: HashMap<String, usize>,
}

impl SkillCatalog {
    /// Build a catalog, rejecting duplicate skill ids.
    pub fn from_entries(entries: Vec<SkillCatalogEntry>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if by_id.insert(entry.skill_id.clone(), i).is_some() {
                return Err(ProfilerError::DuplicateSkill(entry.skill_id.clone()));
            }
        }
        Ok(Self { entries, by_id })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<SkillCatalogEntry> =
            serde_json::from_str(json).map_err(|e| ProfilerError::CatalogParse(e.to_string()))?;
        Self::from_entries(entries)
    }

    pub fn builtin() -> Result<Self> {
        let catalog = Self::from_json(BUILTIN_CATALOG)?;
        debug!("Loaded {} built-in skills", catalog.len());
        Ok(catalog)
    }

    /// Load a catalog file (a JSON array of entries)
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ProfilerError::CatalogRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let catalog = Self::from_json(&content)?;
        info!("Loaded {} skills from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn entries(&self) -> &[SkillCatalogEntry] {
        &self.entries
    }

    pub fn get(&self, skill_id: &str) -> Option<&SkillCatalogEntry> {
        self.by_id.get(skill_id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
