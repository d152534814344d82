//! Reserved-variable scan
//!
//! A fixed set of identifiers is reserved for future language features.
//! Referencing one in an expression (`{{ name }}`) or binding one with
//! `{% set name = … %}` anywhere in a document is a validation error. The
//! executor-maintained and user-settable context variables are not reserved.

use std::sync::LazyLock;

use regex::Regex;

use super::error::ValidationError;

/// Variable names reserved for future enhancements
pub const RESERVED_VARIABLES: &[&str] = &[
    "next_steps",
    "await_steps",
    "parallel_results",
    "race_winner",
    "concurrent_limit",
    "step_graph",
    "workflow_state",
    "checkpoint",
    "rollback",
    "snapshot",
    "resume_from",
    "tool_registry",
    "tool_dependencies",
    "tool_cache",
    "streaming_tools",
    "tool_timeout",
    "memory",
    "shared_state",
    "session",
    "workspace",
    "vector_store",
    "trace",
    "metrics",
    "profiler",
    "debug_info",
    "audit_log",
    "conditions",
    "loops",
    "break_points",
    "event_triggers",
    "webhooks",
    "model_fallbacks",
    "provider_pool",
    "cost_tracking",
    "rate_limits",
    "model_routing",
    "permissions",
    "sandbox",
    "input_validation",
    "output_sanitization",
    "security_context",
    "plugins",
    "extensions",
    "middleware",
    "interceptors",
    "transformers",
    "sub_workflows",
    "workflow_imports",
    "macro_steps",
    "step_library",
    "template_inheritance",
    "streaming_mode",
    "real_time_updates",
    "push_notifications",
    "websocket_handlers",
    "sse_streams",
];

static VAR_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*[|}\[]").expect("variable reference pattern")
});

static SET_STMT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%\s*set\s+([A-Za-z_][A-Za-z0-9_]*)\s*=").expect("set statement pattern")
});

/// Scan a (lowered) document for references to reserved variables
pub fn check_reserved_variables(source: &str) -> Result<(), ValidationError> {
    for caps in VAR_REF_RE.captures_iter(source) {
        let name = &caps[1];
        if RESERVED_VARIABLES.contains(&name) {
            return Err(ValidationError::ReservedVariable(name.to_string()));
        }
    }
    for caps in SET_STMT_RE.captures_iter(source) {
        let name = &caps[1];
        if RESERVED_VARIABLES.contains(&name) {
            return Err(ValidationError::ReservedVariable(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_reference_rejected() {
        let err = check_reserved_variables("# pre: a\n{{ webhooks }}").unwrap_err();
        assert_eq!(err, ValidationError::ReservedVariable("webhooks".into()));
    }

    #[test]
    fn test_reserved_set_rejected() {
        let err = check_reserved_variables("{% set sandbox = 1 %}").unwrap_err();
        assert_eq!(err, ValidationError::ReservedVariable("sandbox".into()));
    }

    #[test]
    fn test_executor_variables_are_not_reserved() {
        assert!(check_reserved_variables("{{ result_text }} {{ model }}").is_ok());
        assert!(check_reserved_variables("{% set next_step = 'a' %}").is_ok());
    }

    #[test]
    fn test_prefix_is_not_a_reference() {
        // 'memory' is reserved; 'memory_limit' is not
        assert!(check_reserved_variables("{{ memory_limit }}").is_ok());
    }
}
