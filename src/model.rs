//! Core data types shared across the router: the skill index on the wire,
//! the validated in-memory form, and the transient per-invocation score
//! records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A literal-phrase or pattern list split by language, always structurally
/// complete: a missing set on the wire deserializes as empty, never as an
/// absent/optional field callers have to branch on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LangSet {
    #[serde(default)]
    pub en: Vec<String>,
    #[serde(default)]
    pub zh: Vec<String>,
}

/// One entry in the registry index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(default)]
    pub trigger_keywords: LangSet,
    #[serde(default)]
    pub intent_patterns: LangSet,
    #[serde(default)]
    pub negative_keywords: LangSet,
    pub body_path: String,
    pub body_hash: String,
}

/// The full catalog of skills, without bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub generated_at: String,
    pub skills: Vec<SkillDescriptor>,
}

impl Index {
    /// Look up a descriptor by id. First match wins on a duplicate id; the
    /// authoring toolchain, not this router, owns uniqueness.
    pub fn find(&self, id: &str) -> Option<&SkillDescriptor> {
        self.skills.iter().find(|s| s.id == id)
    }
}

/// Raw wire shape for a registry index document. Kept distinct from
/// [`Index`] so the one parsing boundary in [`crate::registry`] is the only
/// place that has to reason about an under-specified document; everywhere
/// else sees the validated type.
#[derive(Debug, Deserialize)]
pub struct RawIndex {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub skills: Vec<SkillDescriptor>,
}

/// Per-skill, per-prompt scoring output. Lives only for the duration of one
/// routing invocation.
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub skill_id: String,
    pub level2: f64,
    pub level3: f64,
    pub level4: f64,
    pub level5: f64,
    pub excluded: bool,
    pub weighted_total: f64,
}

impl ScoreRecord {
    pub fn is_eligible(&self, threshold: f64) -> bool {
        !self.excluded && self.weighted_total >= threshold
    }
}

/// The stdin envelope: `{"prompt": "..."}`. Unknown fields are ignored by
/// `serde` default behavior.
#[derive(Debug, Deserialize)]
pub struct HookInput {
    pub prompt: String,
}

/// The stdout envelope on a match: `{"systemMessage": "..."}`.
#[derive(Debug, Serialize)]
pub struct HookOutput {
    #[serde(rename = "systemMessage")]
    pub system_message: String,
}
