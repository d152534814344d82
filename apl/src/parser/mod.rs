//! APL parser and static validator
//!
//! Splits a document into steps and phases, splits prompt phases into ordered
//! role segments, and enforces the naming and structural rules. All
//! violations surface as [`ValidationError`] before a run ever starts.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::document::{Document, Role, Step};

mod error;
pub mod relaxed;
pub mod reserved;

pub use error::ValidationError;
pub use relaxed::lower;
pub use reserved::{RESERVED_VARIABLES, check_reserved_variables};

/// `# pre: name` / `# prompt: name` / `# post: name`, case-insensitive on the
/// phase word, whitespace-tolerant
pub(crate) static PHASE_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#\s*(pre|prompt|post)\s*:\s*(.*?)\s*$").expect("phase heading pattern")
});

/// `## system` etc., only meaningful inside a prompt phase
static ROLE_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*##\s*(system|user|assistant|developer|tool_result)\s*[:\-]?\s*$")
        .expect("role heading pattern")
});

/// Step identifiers: no colon, no hash, no line break
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\n\r#:]+$").expect("identifier pattern"));

/// Parse a canonical (already-lowered) document into the ordered step table
///
/// Runs the reserved-variable scan first, then splits steps and phases.
pub fn parse_document(source: &str) -> Result<Document, ValidationError> {
    check_reserved_variables(source)?;
    parse_steps(source)
}

fn parse_steps(source: &str) -> Result<Document, ValidationError> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut doc = Document::default();
    // Phases already declared, per (identifier, phase) pair
    let mut declared: HashSet<(String, &'static str)> = HashSet::new();
    // The step the most recent heading opened; headings for any other
    // existing identifier are non-contiguous re-entries
    let mut open_step: Option<String> = None;

    let mut i = 0;
    while i < lines.len() {
        let Some(caps) = PHASE_HEADING_RE.captures(lines[i]) else {
            i += 1;
            continue;
        };

        let heading = lines[i];
        let phase: &'static str = match caps[1].to_ascii_lowercase().as_str() {
            "pre" => "pre",
            "prompt" => "prompt",
            _ => "post",
        };
        let identifier = match caps[2].trim() {
            "" => "default",
            other => other,
        };

        if heading.contains("{{")
            || heading.contains("}}")
            || heading.contains("{%")
            || heading.contains("%}")
        {
            return Err(ValidationError::InvalidHeading(heading.trim().to_string()));
        }
        if !IDENTIFIER_RE.is_match(identifier) {
            return Err(ValidationError::InvalidIdentifier(identifier.to_string()));
        }
        if identifier == "return" {
            return Err(ValidationError::ReservedIdentifier);
        }
        // A `pre` heading always opens a step, so one for an existing
        // identifier is a duplicate even when contiguous; prompt/post may
        // only extend the step the previous heading opened.
        if doc.contains(identifier) && (phase == "pre" || open_step.as_deref() != Some(identifier)) {
            return Err(ValidationError::DuplicateStep(identifier.to_string()));
        }
        if !declared.insert((identifier.to_string(), phase)) {
            return Err(ValidationError::DuplicatePhase {
                phase,
                identifier: identifier.to_string(),
            });
        }

        if !doc.contains(identifier) {
            doc.push(Step::new(identifier));
        }
        open_step = Some(identifier.to_string());
        debug!(step = identifier, phase, "parsed phase heading");

        i += 1;
        let step = doc
            .get_mut(identifier)
            .ok_or_else(|| ValidationError::InvalidIdentifier(identifier.to_string()))?;
        match phase {
            "prompt" => i = parse_prompt_body(&lines, i, step),
            "pre" => {
                let (content, next) = collect_body(&lines, i);
                step.pre = Some(content);
                i = next;
            }
            _ => {
                let (content, next) = collect_body(&lines, i);
                step.post = Some(content);
                i = next;
            }
        }
    }

    for step in doc.iter() {
        if !step.prompt.is_present() {
            return Err(ValidationError::MissingPrompt(step.identifier.clone()));
        }
    }

    Ok(doc)
}

/// Consume lines until the next phase heading, joining them with `\n` and
/// stripping trailing whitespace
fn collect_body<'a>(lines: &[&'a str], start: usize) -> (String, usize) {
    let mut i = start;
    let mut body: Vec<&'a str> = Vec::new();
    while i < lines.len() && !PHASE_HEADING_RE.is_match(lines[i]) {
        body.push(lines[i]);
        i += 1;
    }
    (body.join("\n").trim_end().to_string(), i)
}

/// Parse a prompt body into role segments
///
/// A role heading flushes the running buffer into a `(role, text)` segment.
/// Lines before the first role heading are kept only when the block contains
/// no role headings at all, in which case the whole body is one implicit
/// `user` segment.
fn parse_prompt_body(lines: &[&str], start: usize, step: &mut Step) -> usize {
    let mut current_role: Option<Role> = None;
    let mut buf: Vec<&str> = Vec::new();
    let mut i = start;

    while i < lines.len() && !PHASE_HEADING_RE.is_match(lines[i]) {
        if let Some(caps) = ROLE_HEADING_RE.captures(lines[i]) {
            flush_segment(step, current_role, &buf);
            current_role = Role::parse(&caps[1]);
            buf.clear();
        } else {
            buf.push(lines[i]);
        }
        i += 1;
    }
    flush_segment(step, current_role, &buf);

    if step.prompt.segments.is_empty() {
        let content = buf.join("\n").trim_end().to_string();
        step.prompt.content = content.clone();
        step.prompt.push_segment(Role::User, content);
    }

    i
}

fn flush_segment(step: &mut Step, role: Option<Role>, buf: &[&str]) {
    if let Some(role) = role {
        if !buf.is_empty() {
            step.prompt
                .push_segment(role, buf.join("\n").trim_end().to_string());
        }
    }
}
