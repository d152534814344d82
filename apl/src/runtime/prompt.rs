//! Prompt phase execution
//!
//! Renders each role segment, lifts line-anchored attachments into multipart
//! content, assembles the chat messages, describes the allowed tools and
//! calls the selected provider. Provider and render failures are recoverable:
//! they are recorded into `errors` and leave the result fields empty.

use std::sync::LazyLock;

use minijinja::Environment;
use regex::Regex;
use tracing::debug;

use crate::context::{self, ContextHandle};
use crate::document::{PromptBlock, Role};
use crate::provider::{AttachmentKind, ChatMessage, ContentPart, ProviderRegistry};
use crate::template;
use crate::tools::ToolRegistry;

use super::response;

/// `@<kind> <https-url>` on its own line, starting at column 0
static ATTACHMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@(image_url|audio_input|file)\s+(https://\S+)\s*$").expect("attachment pattern")
});

/// Run the prompt phase for one step
pub(crate) async fn run_prompt_phase(
    env: &Environment<'static>,
    prompt: &PromptBlock,
    handle: &ContextHandle,
    tools: &ToolRegistry,
    providers: &ProviderRegistry,
) {
    let mut messages = Vec::with_capacity(prompt.segments.len());
    for (role, text) in &prompt.segments {
        match template::render(env, text, handle) {
            Ok(rendered) => messages.push(build_message(*role, &rendered)),
            Err(e) => {
                let mut ctx = context::lock(handle);
                ctx.errors.push(format!("Prompt phase error: {e}"));
                ctx.clear_results();
                return;
            }
        }
    }

    let model = {
        let mut ctx = context::lock(handle);
        ctx.prompts = messages;
        let allowed = ctx.allowed_tools();
        ctx.tools = if allowed.is_empty() {
            Vec::new()
        } else {
            tools.describe(&allowed)
        };
        ctx.model()
    };

    let provider = providers.resolve(&model);
    // Hand the provider a cloned view so the context lock is not held
    // across the await
    let view = context::lock(handle).clone();
    debug!(%model, prompts = view.prompts.len(), "calling provider");
    match provider.complete(&view).await {
        Ok(envelope) => response::process_response(envelope, handle, tools).await,
        Err(e) => {
            let mut ctx = context::lock(handle);
            ctx.errors.push(format!("Prompt phase error: {e}"));
            ctx.clear_results();
        }
    }
}

/// Split rendered text into an attachment-aware chat message
fn build_message(role: Role, rendered: &str) -> ChatMessage {
    let mut text_lines: Vec<&str> = Vec::new();
    let mut attachments: Vec<ContentPart> = Vec::new();

    for line in rendered.split('\n') {
        let is_comment = line.trim_start().starts_with("{#");
        match ATTACHMENT_RE.captures(line) {
            Some(caps) if !is_comment => {
                if let Some(kind) = AttachmentKind::parse(&caps[1]) {
                    attachments.push(ContentPart::attachment(kind, &caps[2]));
                    continue;
                }
                text_lines.push(line);
            }
            _ => text_lines.push(line),
        }
    }

    let text = text_lines.join("\n").trim().to_string();
    if attachments.is_empty() {
        ChatMessage::text(role, text)
    } else {
        let mut parts = Vec::with_capacity(attachments.len() + 1);
        if !text.is_empty() {
            parts.push(ContentPart::text(text));
        }
        parts.extend(attachments);
        ChatMessage::parts(role, parts)
    }
}
