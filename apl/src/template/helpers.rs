//! Template helper functions
//!
//! Assignment and accumulator helpers exposed to every template. Mutators
//! write through the per-run context handle and return the empty string so
//! their use in `{{ … }}` emits nothing; writes take effect immediately and
//! are visible to later helper calls in the same render.

use minijinja::value::Value as TemplateValue;
use minijinja::{Environment, Error, ErrorKind};
use serde_json::{Value, json};
use tracing::debug;

use crate::context::{self, ContextHandle, path};

/// Register every helper on the environment, bound to the run's handle
pub fn register(env: &mut Environment<'static>, handle: ContextHandle) {
    let h = handle.clone();
    env.add_function("set", move |key: String, value: TemplateValue| {
        write_key(&h, &key, &value)
    });
    let h = handle.clone();
    env.add_function("set_context", move |key: String, value: TemplateValue| {
        write_key(&h, &key, &value)
    });

    let h = handle.clone();
    env.add_function("get", move |key: String, default: Option<TemplateValue>| {
        read_key(&h, &key, default)
    });
    let h = handle.clone();
    env.add_function("get_context", move |key: String, default: Option<TemplateValue>| {
        read_key(&h, &key, default)
    });

    let h = handle.clone();
    env.add_function(
        "add",
        move |key: String, delta: TemplateValue, default: Option<TemplateValue>| {
            accumulate(&h, &key, &delta, default, Operation::Add)
        },
    );
    let h = handle.clone();
    env.add_function(
        "add_context",
        move |key: String, delta: TemplateValue, default: Option<TemplateValue>| {
            accumulate(&h, &key, &delta, default, Operation::Add)
        },
    );

    let h = handle.clone();
    env.add_function("inc", move |key: String, default: Option<TemplateValue>| {
        accumulate(&h, &key, &TemplateValue::from(1), default, Operation::Add)
    });

    let h = handle.clone();
    env.add_function(
        "rem",
        move |key: String, delta: TemplateValue, default: Option<TemplateValue>| {
            accumulate(&h, &key, &delta, default, Operation::Subtract)
        },
    );
    let h = handle.clone();
    env.add_function(
        "rem_context",
        move |key: String, delta: TemplateValue, default: Option<TemplateValue>| {
            accumulate(&h, &key, &delta, default, Operation::Subtract)
        },
    );

    let h = handle.clone();
    env.add_function("dec", move |key: String, default: Option<TemplateValue>| {
        accumulate(&h, &key, &TemplateValue::from(1), default, Operation::Subtract)
    });

    env.add_function(
        "get_json_path",
        |value: TemplateValue, path: String, default: Option<TemplateValue>| {
            json_path(&value, &path, default)
        },
    );
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Subtract,
}

fn write_key(
    handle: &ContextHandle,
    key: &str,
    value: &TemplateValue,
) -> Result<TemplateValue, Error> {
    let json = to_json(value)?;
    debug!(key, "helper write");
    let mut ctx = context::lock(handle);
    ctx.set_value(key, json).map_err(invalid_op)?;
    Ok(empty())
}

fn read_key(
    handle: &ContextHandle,
    key: &str,
    default: Option<TemplateValue>,
) -> Result<TemplateValue, Error> {
    let ctx = context::lock(handle);
    match ctx.get_value(key) {
        Some(value) => Ok(TemplateValue::from_serialize(&value)),
        None => Ok(default.unwrap_or_else(|| TemplateValue::from(()))),
    }
}

fn accumulate(
    handle: &ContextHandle,
    key: &str,
    delta: &TemplateValue,
    default: Option<TemplateValue>,
    op: Operation,
) -> Result<TemplateValue, Error> {
    let delta = to_json(delta)?;
    let default = match default {
        Some(value) => to_json(&value)?,
        None => json!(0),
    };

    let mut ctx = context::lock(handle);
    // An unset (or explicitly null) key is initialised from the default,
    // which also fixes the value's type
    let base = ctx
        .get_value(key)
        .filter(|value| !value.is_null())
        .unwrap_or(default);
    let combined = match op {
        Operation::Add => combine(&base, &delta),
        Operation::Subtract => subtract(&base, &delta),
    }
    .map_err(invalid_op)?;
    ctx.set_value(key, combined).map_err(invalid_op)?;
    Ok(empty())
}

fn json_path(
    value: &TemplateValue,
    path: &str,
    default: Option<TemplateValue>,
) -> Result<TemplateValue, Error> {
    let json = to_json(value)?;
    match path::get_path(&json, path) {
        Some(found) if !found.is_null() => Ok(TemplateValue::from_serialize(found)),
        _ => Ok(default.unwrap_or_else(|| TemplateValue::from(()))),
    }
}

/// `base + delta` for numbers, strings and lists
fn combine(base: &Value, delta: &Value) -> Result<Value, String> {
    match (base, delta) {
        (Value::Number(a), Value::Number(b)) => Ok(numeric(a, b, false)),
        (Value::String(a), Value::String(b)) => {
            let mut out = a.clone();
            out.push_str(b);
            Ok(Value::String(out))
        }
        (Value::Array(a), Value::Array(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::Array(out))
        }
        _ => Err(format!(
            "cannot add {} and {}",
            type_name(base),
            type_name(delta)
        )),
    }
}

/// `base - delta`, numbers only
fn subtract(base: &Value, delta: &Value) -> Result<Value, String> {
    match (base, delta) {
        (Value::Number(a), Value::Number(b)) => Ok(numeric(a, b, true)),
        _ => Err(format!(
            "cannot subtract {} from {}",
            type_name(delta),
            type_name(base)
        )),
    }
}

fn numeric(a: &serde_json::Number, b: &serde_json::Number, negate: bool) -> Value {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        let result = if negate { x.checked_sub(y) } else { x.checked_add(y) };
        if let Some(n) = result {
            return json!(n);
        }
    }
    let x = a.as_f64().unwrap_or(0.0);
    let y = b.as_f64().unwrap_or(0.0);
    json!(if negate { x - y } else { x + y })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn to_json(value: &TemplateValue) -> Result<Value, Error> {
    serde_json::to_value(value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("unserialisable value: {e}")))
}

fn invalid_op(message: String) -> Error {
    Error::new(ErrorKind::InvalidOperation, message)
}

fn empty() -> TemplateValue {
    TemplateValue::from("")
}
