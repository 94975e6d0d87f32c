//! Knowledge-base entries and long-term learned facts.
//!
//! Both are owned by the persistence collaborator; the engine reads them to
//! compose prompt context and appends facts it extracts from exchanges.

use serde::{Deserialize, Serialize};

/// A curated knowledge-base entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Server-assigned identity.
    pub id: String,
    /// Entry name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Entry content injected into prompts.
    pub content: String,
    /// Whether the entry participates in context composition.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Priority; entries are consumed in descending order.
    #[serde(default = "default_priority")]
    pub priority: i64,
}

fn default_active() -> bool {
    true
}

fn default_priority() -> i64 {
    1
}

/// A fact learned from a past exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedFact {
    /// Server-assigned identity.
    pub id: String,
    /// The remembered fact.
    pub fact: String,
}

/// Concatenated content of the active entries, newline-separated.
///
/// Returns an empty string when no entry is active — the caller treats that
/// the same as "no knowledge retrieved".
#[must_use]
pub fn active_content(entries: &[KnowledgeEntry]) -> String {
    entries
        .iter()
        .filter(|e| e.active)
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt block listing the active entries with name and priority headers.
/// Empty string when nothing is active.
#[must_use]
pub fn knowledge_block(entries: &[KnowledgeEntry]) -> String {
    let active: Vec<&KnowledgeEntry> = entries.iter().filter(|e| e.active).collect();
    if active.is_empty() {
        return String::new();
    }
    let body = active
        .iter()
        .map(|e| format!("--- {} (Priority: {}) ---\n{}\n", e.name, e.priority, e.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n### Knowledge Bases:\n{body}\n")
}

/// Prompt block listing learned facts as bullet lines. Empty string when
/// there are none.
#[must_use]
pub fn memory_block(facts: &[LearnedFact]) -> String {
    if facts.is_empty() {
        return String::new();
    }
    let lines = facts
        .iter()
        .map(|f| format!("- {}", f.fact))
        .collect::<Vec<_>>()
        .join("\n");
    format!("### Core Memory:\n{lines}\n")
}

/// Learned facts joined as plain lines (pipeline synthesis context).
#[must_use]
pub fn fact_lines(facts: &[LearnedFact]) -> String {
    facts
        .iter()
        .map(|f| f.fact.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
