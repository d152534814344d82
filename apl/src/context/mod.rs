//! Shared run context
//!
//! The executor owns one [`Context`] per run. Executor-maintained state lives
//! in named struct fields; user-settable keys live in the open `vars` map.
//! Template helpers mutate the context in place through a per-run
//! [`ContextHandle`]; there is no process-global state.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::provider::ChatMessage;
use crate::tools::ToolCallResult;

pub(crate) mod path;

/// Default model when the caller sets none
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Names of the executor-maintained context variables
pub const EXECUTOR_FIELDS: &[&str] = &[
    "prev_step",
    "current_step",
    "next_step",
    "result_text",
    "result_json",
    "result_tool_calls",
    "result_image_urls",
    "result_audio_inputs",
    "result_files",
    "result_role",
    "usage",
    "runs",
    "global_runs",
    "time_elapsed",
    "time_elapsed_global",
    "errors",
    "prompts",
    "tools",
    "context",
    "context_history",
];

/// The per-run context shared by every phase of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub prev_step: Option<String>,
    pub current_step: Option<String>,
    pub next_step: Option<String>,
    pub result_text: String,
    pub result_json: Option<Value>,
    pub result_tool_calls: Vec<ToolCallResult>,
    pub result_image_urls: Vec<String>,
    pub result_audio_inputs: Vec<String>,
    pub result_files: Vec<String>,
    pub result_role: String,
    /// Opaque usage envelope from the provider
    pub usage: Option<Value>,
    /// Prompt-phase invocations of the current step
    pub runs: u64,
    /// Prompt-phase invocations across the whole run
    pub global_runs: u64,
    /// Milliseconds since the current step started
    pub time_elapsed: f64,
    /// Milliseconds since the run started
    pub time_elapsed_global: f64,
    /// Recoverable errors of the current step
    pub errors: Vec<String>,
    /// Messages sent to the provider for the current step
    pub prompts: Vec<ChatMessage>,
    /// Tool descriptors offered to the provider for the current step
    pub tools: Vec<Value>,
    /// Deep-cloned snapshots, one per completed step
    pub history: Vec<Value>,
    /// User-settable variables and ad-hoc keys
    pub vars: Map<String, Value>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let mut vars = Map::new();
        vars.insert("model".to_string(), json!(DEFAULT_MODEL));
        vars.insert("temperature".to_string(), Value::Null);
        vars.insert("allowed_tools".to_string(), json!([]));
        vars.insert("output_mode".to_string(), Value::Null);
        vars.insert("output_structure".to_string(), Value::Null);
        vars.insert("max_tokens".to_string(), Value::Null);
        vars.insert("top_p".to_string(), Value::Null);
        vars.insert("presence_penalty".to_string(), Value::Null);
        vars.insert("frequency_penalty".to_string(), Value::Null);
        vars.insert("top_k".to_string(), Value::Null);
        vars.insert("repetition_penalty".to_string(), Value::Null);
        vars.insert("stop_sequences".to_string(), json!([]));
        vars.insert("seed".to_string(), Value::Null);
        vars.insert("logit_bias".to_string(), json!({}));

        Self {
            prev_step: None,
            current_step: None,
            next_step: None,
            result_text: String::new(),
            result_json: None,
            result_tool_calls: Vec::new(),
            result_image_urls: Vec::new(),
            result_audio_inputs: Vec::new(),
            result_files: Vec::new(),
            result_role: String::new(),
            usage: None,
            runs: 0,
            global_runs: 0,
            time_elapsed: 0.0,
            time_elapsed_global: 0.0,
            errors: Vec::new(),
            prompts: Vec::new(),
            tools: Vec::new(),
            history: Vec::new(),
            vars,
        }
    }

    /// The model the next provider call targets
    pub fn model(&self) -> String {
        self.vars
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MODEL)
            .to_string()
    }

    /// Tool names the current step may call
    pub fn allowed_tools(&self) -> Vec<String> {
        self.vars
            .get("allowed_tools")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Requested output mode, if any (`"text"`, `"json"`, `"structured_output"`)
    pub fn output_mode(&self) -> Option<String> {
        self.vars
            .get("output_mode")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// JSON Schema for structured output, if configured
    pub fn output_structure(&self) -> Option<Value> {
        match self.vars.get("output_structure") {
            Some(Value::Null) | None => None,
            Some(schema) => Some(schema.clone()),
        }
    }

    /// Read a user variable by plain key
    pub fn var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Resolve a dotted path across executor fields and user variables
    pub fn get_value(&self, full_path: &str) -> Option<Value> {
        let (head, rest) = match full_path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (full_path, None),
        };
        let root = if EXECUTOR_FIELDS.contains(&head) {
            self.field_value(head)
        } else {
            self.vars.get(head)?.clone()
        };
        match rest {
            None => Some(root),
            Some(rest) => path::get_path(&root, rest).cloned(),
        }
    }

    /// Assign a dotted path, routing named executor fields through typed
    /// setters and everything else into the open map
    pub fn set_value(&mut self, full_path: &str, value: Value) -> Result<(), String> {
        let (head, rest) = match full_path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (full_path, None),
        };

        if EXECUTOR_FIELDS.contains(&head) {
            return match rest {
                None => self.set_field(head, value),
                Some(rest) => match head {
                    "result_json" => {
                        let slot = self.result_json.get_or_insert(Value::Null);
                        path::set_path(slot, rest, value);
                        Ok(())
                    }
                    "usage" => {
                        let slot = self.usage.get_or_insert(Value::Null);
                        path::set_path(slot, rest, value);
                        Ok(())
                    }
                    _ => Err(format!("cannot write into executor field '{head}'")),
                },
            };
        }

        match rest {
            None => {
                self.vars.insert(head.to_string(), value);
                Ok(())
            }
            Some(rest) => {
                let slot = self
                    .vars
                    .entry(head.to_string())
                    .or_insert(Value::Null);
                path::set_path(slot, rest, value);
                Ok(())
            }
        }
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "prev_step" => json!(self.prev_step),
            "current_step" => json!(self.current_step),
            "next_step" => json!(self.next_step),
            "result_text" => json!(self.result_text),
            "result_json" => self.result_json.clone().unwrap_or(Value::Null),
            "result_tool_calls" => {
                serde_json::to_value(&self.result_tool_calls).unwrap_or(Value::Null)
            }
            "result_image_urls" => json!(self.result_image_urls),
            "result_audio_inputs" => json!(self.result_audio_inputs),
            "result_files" => json!(self.result_files),
            "result_role" => json!(self.result_role),
            "usage" => self.usage.clone().unwrap_or(Value::Null),
            "runs" => json!(self.runs),
            "global_runs" => json!(self.global_runs),
            "time_elapsed" => json!(self.time_elapsed),
            "time_elapsed_global" => json!(self.time_elapsed_global),
            "errors" => json!(self.errors),
            "prompts" => serde_json::to_value(&self.prompts).unwrap_or(Value::Null),
            "tools" => json!(self.tools),
            "context" => Value::Object(self.full_map()),
            "context_history" => Value::Array(self.history.clone()),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), String> {
        fn de<T: serde::de::DeserializeOwned>(field: &str, value: Value) -> Result<T, String> {
            serde_json::from_value(value).map_err(|e| format!("invalid value for '{field}': {e}"))
        }
        match name {
            "prev_step" => self.prev_step = de(name, value)?,
            "current_step" => self.current_step = de(name, value)?,
            "next_step" => self.next_step = de(name, value)?,
            "result_text" => self.result_text = de(name, value)?,
            "result_json" => {
                self.result_json = if value.is_null() { None } else { Some(value) }
            }
            "result_tool_calls" => self.result_tool_calls = de(name, value)?,
            "result_image_urls" => self.result_image_urls = de(name, value)?,
            "result_audio_inputs" => self.result_audio_inputs = de(name, value)?,
            "result_files" => self.result_files = de(name, value)?,
            "result_role" => self.result_role = de(name, value)?,
            "usage" => self.usage = if value.is_null() { None } else { Some(value) },
            "runs" => self.runs = de(name, value)?,
            "global_runs" => self.global_runs = de(name, value)?,
            "time_elapsed" => self.time_elapsed = de(name, value)?,
            "time_elapsed_global" => self.time_elapsed_global = de(name, value)?,
            "errors" => self.errors = de(name, value)?,
            "prompts" => self.prompts = de(name, value)?,
            "tools" => self.tools = de(name, value)?,
            "context" | "context_history" => {
                return Err(format!("'{name}' is maintained by the executor"));
            }
            other => return Err(format!("unknown executor field '{other}'")),
        }
        Ok(())
    }

    /// Reset every provider-result field to its empty state
    pub fn clear_results(&mut self) {
        self.result_text.clear();
        self.result_role.clear();
        self.result_json = None;
        self.result_tool_calls.clear();
        self.result_image_urls.clear();
        self.result_audio_inputs.clear();
        self.result_files.clear();
    }

    /// Deep-cloned view of the context, omitting the self-reference and the
    /// history key
    pub fn snapshot(&self) -> Value {
        Value::Object(self.base_map(false))
    }

    /// Append a snapshot of the current state to the history
    pub fn push_snapshot(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    /// Template variable map for a phase render, including the one-level
    /// `context` self-view
    pub fn render_map(&self) -> Value {
        let mut map = self.full_map();
        map.insert("context".to_string(), Value::Object(self.full_map()));
        Value::Object(map)
    }

    fn full_map(&self) -> Map<String, Value> {
        self.base_map(true)
    }

    fn base_map(&self, include_history: bool) -> Map<String, Value> {
        let mut map = Map::new();
        for field in EXECUTOR_FIELDS {
            match *field {
                "context" => continue,
                "context_history" if !include_history => continue,
                name => {
                    map.insert(name.to_string(), self.field_value(name));
                }
            }
        }
        for (key, value) in &self.vars {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Shared handle to the run's context
pub type ContextHandle = Arc<Mutex<Context>>;

/// Wrap a context into a fresh per-run handle
pub fn new_handle(context: Context) -> ContextHandle {
    Arc::new(Mutex::new(context))
}

/// Lock the context, recovering from a poisoned mutex
///
/// A run is single-threaded; poisoning can only follow a panic inside a
/// helper, and the stored state is still the most recent consistent write.
pub fn lock(handle: &ContextHandle) -> MutexGuard<'_, Context> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
