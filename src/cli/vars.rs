//! Vars subcommand: list recognised environment variables.

use crate::config::{Schema, Selector, render_literal};

/// Format one line per schema leaf: name, type, default and flags.
pub fn format_vars(schema: &Schema, selector: Selector) -> String {
    let width = schema
        .leaves()
        .iter()
        .map(|leaf| leaf.variable.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for leaf in schema.leaves() {
        let mut line = format!(
            "{:<width$}  {:<7}  {}",
            leaf.variable,
            leaf.spec.kind.to_string(),
            render_literal(leaf.spec.default_for(selector)),
            width = width
        );
        if leaf.spec.required {
            line.push_str("  (required)");
        }
        if let Some(description) = leaf.spec.description {
            line.push_str(&format!("  # {}", description));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Run the vars command.
pub fn run_vars(schema: &Schema, selector: Selector) {
    print!("{}", format_vars(schema, selector));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeafSpec;

    #[test]
    fn test_format_vars() {
        let schema = Schema::builder()
            .section("discord", |s| {
                s.leaf(
                    "token",
                    LeafSpec::string("").required().describe("Bot token"),
                )
                .leaf("guild_id", LeafSpec::integer(0))
            })
            .build()
            .unwrap();

        let text = format_vars(&schema, Selector::Production);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "KOMODO_DISCORD_TOKEN     string   \"\"  (required)  # Bot token",
                "KOMODO_DISCORD_GUILD_ID  integer  0",
            ]
        );
    }
}
