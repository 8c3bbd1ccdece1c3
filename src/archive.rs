//! Chat-export archive loading, normalization and export.
//!
//! An archive is a single JSON value: either one conversation object or an
//! array of them. Everything except the top-level shape is tolerated:
//! missing or `null` fields become empty strings or empty message lists,
//! and unknown fields are ignored.

use std::fs;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ProfilerError, Result};

/// Title used when a conversation has no (or an empty) name.
pub const UNTITLED: &str = "Untitled conversation";

/// Sender value for user-authored messages.
pub const SENDER_HUMAN: &str = "human";

/// Sender value for model-authored messages.
pub const SENDER_ASSISTANT: &str = "assistant";

/// Local file header magic of a zip archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

// ============================================================================
// Raw (export) shape
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConversation {
    #[serde(default, deserialize_with = "nullable_string")]
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable_string")]
    pub created_at: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub updated_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_messages: Option<Vec<RawMessage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default, deserialize_with = "nullable_string")]
    pub uuid: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub sender: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub text: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub created_at: String,
}

/// Accepts a string or `null`; `null` becomes the empty string.
fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        other => Err(D::Error::custom(format!(
            "expected a string, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Normalized shape
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMessage {
    pub sender: String,
    pub text: String,
    pub timestamp: String,
}

impl NormalizedMessage {
    pub fn is_human(&self) -> bool {
        self.sender == SENDER_HUMAN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedConversation {
    pub id: String,
    pub title: String,
    /// The title is the [`UNTITLED`] placeholder, not a name from the archive
    #[serde(skip)]
    pub untitled: bool,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: usize,
    pub messages: Vec<NormalizedMessage>,
}

impl From<&RawConversation> for NormalizedConversation {
    fn from(raw: &RawConversation) -> Self {
        let (title, untitled) = match raw.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => (name.to_string(), false),
            _ => (UNTITLED.to_string(), true),
        };

        let messages: Vec<NormalizedMessage> = raw
            .chat_messages
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|m| NormalizedMessage {
                sender: m.sender.clone(),
                text: m.text.clone(),
                timestamp: m.created_at.clone(),
            })
            .collect();

        Self {
            id: raw.uuid.clone(),
            title,
            untitled,
            created_at: raw.created_at.clone(),
            updated_at: raw.updated_at.clone(),
            message_count: messages.len(),
            messages,
        }
    }
}

impl From<&NormalizedConversation> for RawConversation {
    fn from(conv: &NormalizedConversation) -> Self {
        Self {
            uuid: conv.id.clone(),
            name: (!conv.untitled).then(|| conv.title.clone()),
            created_at: conv.created_at.clone(),
            updated_at: conv.updated_at.clone(),
            chat_messages: Some(
                conv.messages
                    .iter()
                    .map(|m| RawMessage {
                        uuid: String::new(),
                        sender: m.sender.clone(),
                        text: m.text.clone(),
                        created_at: m.timestamp.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Normalize raw conversations, preserving input order.
pub fn normalize(raw: &[RawConversation]) -> Vec<NormalizedConversation> {
    let normalized: Vec<NormalizedConversation> =
        raw.iter().map(NormalizedConversation::from).collect();
    debug!(
        "Normalized {} conversations ({} messages)",
        normalized.len(),
        normalized.iter().map(|c| c.message_count).sum::<usize>()
    );
    normalized
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse archive bytes into raw conversations.
///
/// Accepts a single conversation object or an array of them. Zip content,
/// invalid JSON and any other top-level shape are rejected.
pub fn parse_archive(bytes: &[u8]) -> Result<Vec<RawConversation>> {
    if bytes.starts_with(ZIP_MAGIC) {
        return Err(ProfilerError::ZipArchive);
    }

    let value: Value = serde_json::from_slice(bytes)?;
    match value {
        Value::Object(_) => Ok(vec![conversation_from_value(value, 0)?]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                if item.is_object() {
                    conversation_from_value(item, i)
                } else {
                    Err(ProfilerError::UnrecognizedArchive(format!(
                        "item {} is {}, expected a conversation object",
                        i,
                        json_type_name(&item)
                    )))
                }
            })
            .collect(),
        other => Err(ProfilerError::UnrecognizedArchive(format!(
            "top-level value is {}, expected a conversation object or an array of them",
            json_type_name(&other)
        ))),
    }
}

fn conversation_from_value(value: Value, index: usize) -> Result<RawConversation> {
    serde_json::from_value(value).map_err(|e| {
        ProfilerError::UnrecognizedArchive(format!("conversation {}: {}", index, e))
    })
}

/// Read and parse an archive file.
pub fn read_archive(path: &Path) -> Result<Vec<RawConversation>> {
    let is_zip_name = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip_name {
        return Err(ProfilerError::ZipArchive);
    }

    let bytes = fs::read(path).map_err(|source| ProfilerError::ArchiveRead {
        path: path.to_path_buf(),
        source,
    })?;
    let conversations = parse_archive(&bytes)?;

    info!(
        "Loaded {} conversations from {:?} ({} bytes)",
        conversations.len(),
        path,
        bytes.len()
    );
    Ok(conversations)
}

// ============================================================================
// Export
// ============================================================================

/// Serialize conversations back to the archive JSON shape.
pub fn export_archive(conversations: &[RawConversation]) -> Result<String> {
    serde_json::to_string_pretty(conversations).map_err(|e| std::io::Error::from(e).into())
}

/// Write conversations as a downloadable archive file.
pub fn write_archive(path: &Path, conversations: &[RawConversation]) -> Result<()> {
    let json = export_archive(conversations)?;
    fs::write(path, json)?;
    info!("Wrote {} conversations to {:?}", conversations.len(), path);
    Ok(())
}
