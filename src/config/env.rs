//! Environment variable overrides.
//!
//! Invariants:
//! - Only schema leaves are looked up; anything else in the environment is ignored.
//! - A present variable always wins over the fallback value, unless it fails to
//!   coerce, in which case a problem is recorded and the fallback is kept.
//! - Problems are aggregated over the whole walk, never fail-fast.
//! - A present but empty variable is a real value (`""` for strings, a
//!   coercion failure for other kinds).

use std::collections::HashMap;

use tracing::debug;

use super::schema::Schema;
use super::selector::Selector;
use super::value::{ConfigSection, ConfigValue, ValueKind};
use crate::error::Problem;

/// Read-only view of a flat, string-keyed variable space.
pub trait EnvLookup {
    fn get(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl<T: EnvLookup + ?Sized> EnvLookup for &T {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

/// Result of an override pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Tree holding exactly the schema leaves that have a value.
    pub tree: ConfigSection,
    /// Coercion problems, one per rejected variable.
    pub problems: Vec<Problem>,
}

/// Resolve every schema leaf from `env`, falling back to schema defaults.
pub fn resolve(schema: &Schema, selector: Selector, env: &impl EnvLookup) -> Resolved {
    resolve_over(schema, &schema.defaults(selector), env)
}

/// Resolve every schema leaf from `env`, falling back to the value in `base`.
///
/// Leaves missing from `base` stay missing unless the environment supplies
/// them; validation reports them afterwards.
pub fn resolve_over(schema: &Schema, base: &ConfigSection, env: &impl EnvLookup) -> Resolved {
    let mut tree = ConfigSection::new();
    let mut problems = Vec::new();

    for leaf in schema.leaves() {
        let fallback = base.lookup(&leaf.path);
        let value = match env.get(&leaf.variable) {
            Some(raw) => match coerce(&raw, leaf.spec.kind) {
                Some(value) => {
                    debug!(variable = %leaf.variable, "Using environment override");
                    Some(value)
                }
                None => {
                    problems.push(Problem::coercion_failure(
                        &leaf.path,
                        &leaf.variable,
                        &raw,
                        leaf.spec.kind,
                    ));
                    fallback.cloned()
                }
            },
            None => fallback.cloned(),
        };
        if let Some(value) = value {
            tree.set(&leaf.path, value);
        }
    }

    Resolved { tree, problems }
}

/// Coerce raw variable text to `kind`.
///
/// Booleans accept `true`/`false` in any case and nothing else.
pub fn coerce(raw: &str, kind: ValueKind) -> Option<ConfigValue> {
    match kind {
        ValueKind::String => Some(ConfigValue::String(raw.to_string())),
        ValueKind::Integer => raw.parse().ok().map(ConfigValue::Integer),
        ValueKind::Float => raw.parse().ok().map(ConfigValue::Float),
        ValueKind::Boolean => parse_bool(raw).map(ConfigValue::Boolean),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
