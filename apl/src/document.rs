//! APL document model
//!
//! A parsed APL document is an ordered table of steps. Each step carries an
//! optional `pre` phase, a prompt block split into role segments, and an
//! optional `post` phase. Steps are read-only after parsing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Chat role of a prompt segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Developer,
    ToolResult,
}

impl Role {
    /// Parse a role heading name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "developer" => Some(Role::Developer),
            "tool_result" => Some(Role::ToolResult),
            _ => None,
        }
    }

    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Developer => "developer",
            Role::ToolResult => "tool_result",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prompt phase content: ordered role segments plus a concatenated per-role view
///
/// Duplicate role headings yield distinct entries in `segments`; `roles` keeps
/// the newline-joined per-role concatenation for compatibility. A prompt block
/// with no role headings holds its raw body in `content` and a single implicit
/// `user` segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptBlock {
    /// Raw body when no role headings were present, empty otherwise
    pub content: String,
    /// Ordered `(role, text)` segments in heading order
    pub segments: Vec<(Role, String)>,
    /// Per-role concatenated view (segments joined with `\n`)
    pub roles: HashMap<Role, String>,
}

impl PromptBlock {
    /// Append a segment, maintaining the concatenated per-role view
    pub(crate) fn push_segment(&mut self, role: Role, text: String) {
        match self.roles.get_mut(&role) {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&text);
            }
            None => {
                self.roles.insert(role, text.clone());
            }
        }
        self.segments.push((role, text));
    }

    /// True when the block satisfies the prompt-presence rule
    pub fn is_present(&self) -> bool {
        !self.segments.is_empty() || !self.content.is_empty()
    }
}

/// One named unit of work: `(identifier, pre, prompt, post)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub identifier: String,
    /// Raw template text of the pre phase, if declared
    pub pre: Option<String>,
    pub prompt: PromptBlock,
    /// Raw template text of the post phase, if declared
    pub post: Option<String>,
}

impl Step {
    pub(crate) fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            pre: None,
            prompt: PromptBlock::default(),
            post: None,
        }
    }
}

/// Ordered step table of a parsed document
///
/// Insertion order is template order; it is used only to pick the initial
/// step (the first one). Transitions are explicit via `next_step`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    steps: Vec<Step>,
}

impl Document {
    /// The initial step (first in template order)
    pub fn first(&self) -> Option<&Step> {
        self.steps.first()
    }

    /// Look up a step by identifier
    pub fn get(&self, identifier: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.identifier == identifier)
    }

    /// True if a step with this identifier exists
    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate steps in template order
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub(crate) fn get_mut(&mut self, identifier: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.identifier == identifier)
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Re-serialise the step table to canonical APL source
    ///
    /// Re-parsing the result yields an equal `Document`: step order, phase
    /// presence and role segment order are preserved.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            if let Some(pre) = &step.pre {
                out.push_str(&format!("# pre: {}\n", step.identifier));
                out.push_str(pre);
                out.push('\n');
            }
            out.push_str(&format!("# prompt: {}\n", step.identifier));
            if !step.prompt.content.is_empty() {
                out.push_str(&step.prompt.content);
                out.push('\n');
            } else {
                for (role, text) in &step.prompt.segments {
                    out.push_str(&format!("## {}\n", role));
                    if !text.is_empty() {
                        out.push_str(text);
                        out.push('\n');
                    }
                }
            }
            if let Some(post) = &step.post {
                out.push_str(&format!("# post: {}\n", step.identifier));
                out.push_str(post);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!(Role::parse("System"), Some(Role::System));
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("tool_result"), Some(Role::ToolResult));
        assert_eq!(Role::parse("narrator"), None);
    }

    #[test]
    fn test_push_segment_concatenates_duplicate_roles() {
        let mut block = PromptBlock::default();
        block.push_segment(Role::System, "A".to_string());
        block.push_segment(Role::User, "B".to_string());
        block.push_segment(Role::System, "C".to_string());

        assert_eq!(block.segments.len(), 3);
        assert_eq!(block.roles[&Role::System], "A\nC");
        assert_eq!(block.roles[&Role::User], "B");
    }

    #[test]
    fn test_document_first_and_lookup() {
        let mut doc = Document::default();
        doc.push(Step::new("alpha"));
        doc.push(Step::new("beta"));

        assert_eq!(doc.first().map(|s| s.identifier.as_str()), Some("alpha"));
        assert!(doc.contains("beta"));
        assert!(!doc.contains("gamma"));
    }
}
