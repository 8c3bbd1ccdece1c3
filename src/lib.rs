//! Skill Profiler - usage profiles and skill recommendations from chat exports
//!
//! Pipeline:
//! - [`archive`]: parse and normalize a conversation export (one object or an array)
//! - [`corpus`]: flatten titles and messages into one lower-cased buffer
//! - [`classifier`]: score domain, work-pattern and artifact keyword dictionaries
//! - [`profile`]: assemble a [`UserProfile`] with usage shares, repeated requests and gaps
//! - [`matcher`]: rank catalog skills against the profile
//!
//! Profiling and matching run behind [`AnalysisBackend`]: the deterministic
//! [`LocalBackend`] or the [`RemoteBackend`] that asks the Anthropic API for
//! the same shapes. [`Analyzer`] sequences the stages for one run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use skill_profiler::{archive, Analyzer, LocalBackend, SkillCatalog, TrafficLog};
//!
//! # async fn demo() -> skill_profiler::Result<()> {
//! let raw = archive::read_archive(std::path::Path::new("conversations.json"))?;
//! let analyzer = Analyzer::new(
//!     Arc::new(SkillCatalog::builtin()?),
//!     Box::new(LocalBackend),
//!     TrafficLog::default(),
//! );
//! let report = analyzer.run(&raw).await?;
//! println!("{}", report.profile.persona_summary);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod backend;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod profile;
pub mod remote;
pub mod sample;
pub mod traffic;

pub use archive::{NormalizedConversation, RawConversation};
pub use backend::{backend_from_config, AnalysisBackend, LocalBackend};
pub use catalog::{SkillCatalog, SkillCatalogEntry, SkillSource};
pub use config::{AnalysisMode, Config};
pub use error::{ProfilerError, Result};
pub use matcher::{EnrichedRecommendation, SkillRecommendation};
pub use pipeline::{AnalysisReport, AnalysisState, Analyzer};
pub use profile::UserProfile;
pub use remote::{AnthropicClient, RemoteBackend};
pub use traffic::{RequestRecord, TrafficLog};
