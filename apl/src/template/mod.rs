//! Templated expression layer
//!
//! Phases are rendered with a strict-undefined template engine. Plain
//! variable references resolve against a snapshot of the context taken when
//! the render starts; the helper functions (see [`helpers`]) read and write
//! the live context and observe each other's effects left to right within a
//! single render.

use minijinja::value::Value as TemplateValue;
use minijinja::{Environment, UndefinedBehavior};

use crate::context::{self, ContextHandle};

pub mod helpers;

/// Build the per-run template environment with the helpers bound to `handle`
pub fn environment(handle: &ContextHandle) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    helpers::register(&mut env, handle.clone());
    env
}

/// Render one phase template against the current context state
pub fn render(
    env: &Environment<'static>,
    source: &str,
    handle: &ContextHandle,
) -> Result<String, minijinja::Error> {
    let vars = {
        let ctx = context::lock(handle);
        ctx.render_map()
    };
    env.render_str(source, TemplateValue::from_serialize(&vars))
}
