//! One-way projection of a nested document into shell assignments.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use super::mangle::mangle;
use super::value::{ConfigNode, ConfigPath, ConfigSection, ConfigValue};

/// One `export NAME=literal` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub literal: String,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "export {}={}", self.name, self.literal)
    }
}

/// Project `document` into assignments, in document order.
pub fn project(document: &ConfigSection) -> Vec<Assignment> {
    let mut out = Vec::new();
    walk(document, None, &mut out);

    let mut names = HashSet::new();
    for assignment in &out {
        if !names.insert(assignment.name.as_str()) {
            warn!(name = %assignment.name, "Several document paths export the same variable");
        }
    }
    out
}

fn walk(section: &ConfigSection, prefix: Option<&ConfigPath>, out: &mut Vec<Assignment>) {
    for (key, node) in section.iter() {
        let path = match prefix {
            Some(prefix) => prefix.child(key),
            None => ConfigPath::root(key),
        };
        match node {
            ConfigNode::Section(nested) => walk(nested, Some(&path), out),
            ConfigNode::Value(value) => out.push(Assignment {
                name: mangle(&path),
                literal: render_literal(value),
            }),
        }
    }
}

/// Render a value as shell literal text.
///
/// Strings are double-quoted with `\`, `"`, `$` and backtick escaped; other
/// scalars are written bare.
pub fn render_literal(value: &ConfigValue) -> String {
    match value {
        ConfigValue::String(s) => {
            let mut quoted = String::with_capacity(s.len() + 2);
            quoted.push('"');
            for c in s.chars() {
                if matches!(c, '\\' | '"' | '$' | '`') {
                    quoted.push('\\');
                }
                quoted.push(c);
            }
            quoted.push('"');
            quoted
        }
        other => other.to_string(),
    }
}

/// Render assignments one per line, each terminated by a newline.
pub fn render_exports(assignments: &[Assignment]) -> String {
    assignments.iter().map(|a| format!("{}\n", a)).collect()
}
