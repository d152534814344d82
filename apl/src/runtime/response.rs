//! Provider response processing
//!
//! Applies a normalized envelope to the context: extracts text and media
//! parts, dispatches tool calls, stores usage, and handles the JSON output
//! modes.

use serde_json::Value;
use tracing::debug;

use crate::context::{self, ContextHandle};
use crate::provider::{ContentPart, MessageContent, ProviderResponse, ResponseMessage};
use crate::schema;
use crate::tools::ToolRegistry;

/// Apply a provider envelope to the context
pub(crate) async fn process_response(
    envelope: ProviderResponse,
    handle: &ContextHandle,
    tools: &ToolRegistry,
) {
    let message: ResponseMessage = {
        let mut ctx = context::lock(handle);
        ctx.result_image_urls.clear();
        ctx.result_audio_inputs.clear();
        ctx.result_files.clear();

        match envelope.choices.into_iter().next() {
            Some(choice) => choice.message,
            None => {
                ctx.errors
                    .push("Response processing error: no choices in provider response".to_string());
                return;
            }
        }
    };

    let mut text = String::new();
    let mut image_urls = Vec::new();
    let mut audio_inputs = Vec::new();
    let mut files = Vec::new();
    match message.content {
        Some(MessageContent::Text(content)) => text = content,
        Some(MessageContent::Parts(parts)) => {
            let mut text_parts = Vec::new();
            for part in parts {
                match part {
                    ContentPart::Text { text } => text_parts.push(text),
                    ContentPart::ImageUrl { image_url } => image_urls.push(image_url.url),
                    ContentPart::AudioInput { audio_input } => audio_inputs.push(audio_input.url),
                    ContentPart::File { file } => files.push(file.url),
                }
            }
            text = text_parts.join("\n");
        }
        None => {}
    }

    {
        let mut ctx = context::lock(handle);
        ctx.result_text = text;
        ctx.result_role = message.role;
        ctx.result_image_urls = image_urls;
        ctx.result_audio_inputs = audio_inputs;
        ctx.result_files = files;
        if let Some(usage) = envelope.usage {
            ctx.usage = Some(usage);
        }
    }

    // Tool calls run outside the lock; handlers may take it themselves
    let results = if message.tool_calls.is_empty() {
        Vec::new()
    } else {
        debug!(count = message.tool_calls.len(), "dispatching tool calls");
        tools.dispatch(&message.tool_calls, handle).await
    };

    let mut ctx = context::lock(handle);
    ctx.result_tool_calls = results;

    ctx.result_json = None;
    let output_mode = ctx.output_mode();
    let structured = output_mode.as_deref() == Some("structured_output");
    if matches!(output_mode.as_deref(), Some("json") | Some("structured_output"))
        && !ctx.result_text.trim().is_empty()
    {
        match serde_json::from_str::<Value>(&ctx.result_text) {
            Ok(parsed) => {
                if structured {
                    if let Some(output_structure) = ctx.output_structure() {
                        let mut failures = Vec::new();
                        schema::validate_schema(&parsed, &output_structure, &mut failures);
                        ctx.errors.extend(failures);
                    }
                }
                ctx.result_json = Some(parsed);
            }
            Err(e) => ctx.errors.push(format!("Invalid JSON output: {e}")),
        }
    }
}
