//! Executor - the step scheduling engine
//!
//! Drives the phase state machine over the parsed step table: budget checks,
//! per-step bookkeeping, pre → prompt → post, snapshotting, and the
//! explicit-termination transition contract. The executor owns the context
//! and is the only writer of its bookkeeping fields.

use std::time::Instant;

use minijinja::Environment;
use tracing::{debug, info};

use crate::context::{self, Context, ContextHandle};
use crate::document::{Document, Step};
use crate::provider::ProviderRegistry;
use crate::template;
use crate::tools::ToolRegistry;

use super::error::RuntimeError;
use super::options::RunOptions;
use super::prompt;

/// Milliseconds elapsed since an instant
fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// One run's execution engine
pub struct Executor {
    document: Document,
    timeout_ms: u64,
    max_runs: Option<u64>,
    debug: bool,
    tools: ToolRegistry,
    providers: ProviderRegistry,
    handle: ContextHandle,
    env: Environment<'static>,
}

impl Executor {
    /// Build an executor for a parsed document
    pub fn new(document: Document, options: RunOptions) -> Self {
        let handle = context::new_handle(options.build_context());
        let env = template::environment(&handle);
        Self {
            document,
            timeout_ms: options.timeout_ms,
            max_runs: options.max_runs,
            debug: options.debug,
            tools: options.tools,
            providers: options.providers,
            handle,
            env,
        }
    }

    /// Run to completion, returning the final context
    pub async fn run(self) -> Result<Context, RuntimeError> {
        let Some(first) = self.document.first() else {
            return Err(RuntimeError::EmptyDocument);
        };
        let mut current = first.identifier.clone();
        let mut prev: Option<String> = None;
        let started = Instant::now();
        info!(steps = self.document.len(), initial = %current, "starting run");

        while current != "return" {
            let elapsed = elapsed_ms(started);
            if elapsed > self.timeout_ms as f64 {
                return Err(RuntimeError::Timeout(self.timeout_ms));
            }
            if let Some(max_runs) = self.max_runs {
                if context::lock(&self.handle).global_runs >= max_runs {
                    return Err(RuntimeError::RunBudgetExceeded);
                }
            }
            let Some(step) = self.document.get(&current) else {
                return Err(RuntimeError::UnknownStep(current));
            };

            self.enter_step(step, prev.as_deref(), elapsed);
            self.execute_step(step, started).await;

            // The value of next_step at the end of post is authoritative;
            // unset means explicit termination, never fall-through
            let next = context::lock(&self.handle).next_step.clone();
            match next {
                Some(next) => {
                    debug!(from = %current, to = %next, "transition");
                    prev = Some(std::mem::replace(&mut current, next));
                }
                None => break,
            }
        }

        let final_context = {
            let mut ctx = context::lock(&self.handle);
            ctx.next_step = None;
            ctx.time_elapsed_global = elapsed_ms(started);
            ctx.clone()
        };
        info!(
            steps_executed = final_context.history.len(),
            global_runs = final_context.global_runs,
            "run finished"
        );
        Ok(final_context)
    }

    /// Per-step bookkeeping at the top of each loop iteration
    fn enter_step(&self, step: &Step, prev: Option<&str>, elapsed: f64) {
        let mut ctx = context::lock(&self.handle);
        if prev != Some(step.identifier.as_str()) {
            ctx.runs = 0;
            ctx.errors.clear();
        }
        ctx.runs += 1;
        ctx.global_runs += 1;
        ctx.prev_step = prev.map(str::to_string);
        ctx.current_step = Some(step.identifier.clone());
        ctx.next_step = None;
        ctx.time_elapsed = 0.0;
        ctx.time_elapsed_global = elapsed;
        debug!(step = %step.identifier, runs = ctx.runs, global_runs = ctx.global_runs, "entering step");
    }

    /// Execute pre → prompt → post and snapshot the result
    async fn execute_step(&self, step: &Step, started: Instant) {
        let step_started = Instant::now();

        if let Some(pre) = &step.pre {
            if !pre.trim().is_empty() {
                context::lock(&self.handle).time_elapsed = elapsed_ms(step_started);
                match template::render(&self.env, pre, &self.handle) {
                    Ok(output) => {
                        if self.debug {
                            debug!(step = %step.identifier, output, "pre phase rendered");
                        }
                    }
                    Err(e) => {
                        context::lock(&self.handle)
                            .errors
                            .push(format!("Pre phase error: {e}"));
                    }
                }
            }
        }

        // The prompt phase starts with a clean error slate
        {
            let mut ctx = context::lock(&self.handle);
            ctx.errors.clear();
            ctx.time_elapsed = elapsed_ms(step_started);
        }
        prompt::run_prompt_phase(
            &self.env,
            &step.prompt,
            &self.handle,
            &self.tools,
            &self.providers,
        )
        .await;

        if let Some(post) = &step.post {
            if !post.trim().is_empty() {
                context::lock(&self.handle).time_elapsed = elapsed_ms(step_started);
                match template::render(&self.env, post, &self.handle) {
                    Ok(output) => {
                        if self.debug {
                            debug!(step = %step.identifier, output, "post phase rendered");
                        }
                        // A post phase that ran clears the slate for the next
                        // step (or the retry of this one)
                        context::lock(&self.handle).errors.clear();
                    }
                    Err(e) => {
                        context::lock(&self.handle)
                            .errors
                            .push(format!("Post phase error: {e}"));
                    }
                }
            }
        }

        let mut ctx = context::lock(&self.handle);
        ctx.time_elapsed = elapsed_ms(step_started);
        ctx.time_elapsed_global = elapsed_ms(started);
        ctx.push_snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use serde_json::json;

    async fn run(source: &str, options: RunOptions) -> Result<Context, RuntimeError> {
        let document = parser::parse_document(&parser::lower(source)).expect("valid document");
        Executor::new(document, options).run().await
    }

    #[tokio::test]
    async fn test_single_step_executes_once() {
        let ctx = run("# prompt: only\nhi", RunOptions::new()).await.unwrap();
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.global_runs, 1);
        assert_eq!(ctx.runs, 1);
        assert_eq!(ctx.result_text, "hi");
        assert_eq!(ctx.next_step, None);
    }

    #[tokio::test]
    async fn test_unknown_step_is_fatal() {
        let src = "# pre: a\n{{ set('next_step', 'nope') }}\n# prompt: a\nx";
        let err = run(src, RunOptions::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownStep(_)));
        assert_eq!(err.to_string(), "Unknown step: nope");
    }

    #[tokio::test]
    async fn test_explicit_transition_between_steps() {
        let src = "# prompt: a\nfirst\n# post: a\n{{ set('next_step', 'b') }}\n# prompt: b\nsecond";
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert_eq!(ctx.history.len(), 2);
        assert_eq!(ctx.history[0]["current_step"], json!("a"));
        assert_eq!(ctx.history[1]["current_step"], json!("b"));
        assert_eq!(ctx.result_text, "second");
    }

    #[tokio::test]
    async fn test_no_fall_through_without_next_step() {
        // Step b exists but is never reached: a sets no next_step
        let src = "# prompt: a\nfirst\n# prompt: b\nsecond";
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.result_text, "first");
    }

    #[tokio::test]
    async fn test_return_target_terminates() {
        let src = "# prompt: a\nfirst\n# post: a\n{{ set('next_step', 'return') }}\n# prompt: b\nsecond";
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.next_step, None);
    }

    #[tokio::test]
    async fn test_accumulator_loop_terminates() {
        let src = concat!(
            "# prompt: count\ntick\n",
            "# post: count\n",
            "{{ inc('n') }}\n",
            "{% if get('n') < 5 %}{{ set('next_step', 'count') }}{% endif %}",
        );
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert_eq!(ctx.get_value("n"), Some(json!(5)));
        assert_eq!(ctx.history.len(), 5);
        assert_eq!(ctx.global_runs, 5);
        assert_eq!(ctx.runs, 5);
    }

    #[tokio::test]
    async fn test_runs_reset_on_step_change() {
        let src = concat!(
            "# prompt: a\nfirst\n",
            "# post: a\n{{ set('next_step', 'b') }}\n",
            "# prompt: b\nsecond\n",
        );
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert_eq!(ctx.runs, 1);
        assert_eq!(ctx.global_runs, 2);
        assert_eq!(ctx.prev_step.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_run_budget_exceeded() {
        let src = "# prompt: spin\ngo\n# post: spin\n{{ set('next_step', 'spin') }}";
        let err = run(src, RunOptions::new().max_runs(3)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::RunBudgetExceeded));
    }

    #[tokio::test]
    async fn test_timeout_exceeded() {
        let src = "# prompt: spin\ngo\n# post: spin\n{{ set('next_step', 'spin') }}";
        let err = run(src, RunOptions::new().timeout_ms(0)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_pre_phase_error_recoverable() {
        // The undefined reference fails the pre render; the run continues
        let src = "# pre: a\n{{ not_defined_anywhere }}\n# prompt: a\nstill here";
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert_eq!(ctx.result_text, "still here");
        // Errors were cleared at prompt-phase start
        assert!(ctx.errors.is_empty());
    }

    #[tokio::test]
    async fn test_post_phase_error_survives_into_final_context() {
        let src = "# prompt: a\nhi\n# post: a\n{{ also_undefined }}";
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert_eq!(ctx.errors.len(), 1);
        assert!(ctx.errors[0].starts_with("Post phase error:"));
    }

    #[tokio::test]
    async fn test_successful_post_clears_errors() {
        let src = "# prompt: a\nhi\n# post: a\n{{ set('done', true) }}";
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert!(ctx.errors.is_empty());
        assert_eq!(ctx.get_value("done"), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let err = Executor::new(Document::default(), RunOptions::new())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::EmptyDocument));
    }

    #[tokio::test]
    async fn test_timing_fields_monotonic() {
        let src = "# prompt: a\nhi\n# post: a\n{{ set('next_step', 'b') }}\n# prompt: b\nbye";
        let ctx = run(src, RunOptions::new()).await.unwrap();
        assert!(ctx.time_elapsed_global >= ctx.time_elapsed);
        assert!(ctx.time_elapsed >= 0.0);
    }
}
