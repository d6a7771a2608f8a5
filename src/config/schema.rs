//! Declarative settings schema.
//!
//! A [`Schema`] is a tree of sections whose leaves carry a declared
//! [`ValueKind`] and a default. It is built once through [`SchemaBuilder`],
//! which rejects malformed trees (bad names, duplicate keys, defaults of the
//! wrong type, and paths that mangle to the same variable name).

use std::collections::{HashMap, HashSet};

use super::mangle::mangle;
use super::selector::Selector;
use super::value::{ConfigPath, ConfigSection, ConfigValue, ValueKind};
use crate::error::SchemaError;

/// Settings layout version written into generated documents.
///
/// Bump whenever leaves are added, changed or removed.
pub const SETTINGS_VERSION: &str = "0.1.0";

/// Specification of one leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSpec {
    pub kind: ValueKind,
    pub default: ConfigValue,
    /// Overrides `default` for [`Selector::Development`].
    pub dev_default: Option<ConfigValue>,
    /// Required leaves must resolve to a non-empty value.
    pub required: bool,
    pub description: Option<&'static str>,
}

impl LeafSpec {
    fn new(kind: ValueKind, default: ConfigValue) -> Self {
        Self {
            kind,
            default,
            dev_default: None,
            required: false,
            description: None,
        }
    }

    pub fn string(default: impl Into<String>) -> Self {
        Self::new(ValueKind::String, ConfigValue::String(default.into()))
    }

    pub fn integer(default: i64) -> Self {
        Self::new(ValueKind::Integer, ConfigValue::Integer(default))
    }

    pub fn float(default: f64) -> Self {
        Self::new(ValueKind::Float, ConfigValue::Float(default))
    }

    pub fn boolean(default: bool) -> Self {
        Self::new(ValueKind::Boolean, ConfigValue::Boolean(default))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn dev_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.dev_default = Some(value.into());
        self
    }

    pub fn describe(mut self, text: &'static str) -> Self {
        self.description = Some(text);
        self
    }

    /// Default value that applies under `selector`.
    pub fn default_for(&self, selector: Selector) -> &ConfigValue {
        match (selector, &self.dev_default) {
            (Selector::Development, Some(value)) => value,
            _ => &self.default,
        }
    }

    /// Whether `value` satisfies the `required` constraint.
    pub fn is_satisfied_by(&self, value: &ConfigValue) -> bool {
        !self.required || !matches!(value, ConfigValue::String(s) if s.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
enum SchemaNode {
    Leaf(LeafSpec),
    Section(SectionBuilder),
}

/// Builder for one section of a schema.
#[derive(Debug, Clone, Default)]
pub struct SectionBuilder {
    entries: Vec<(String, SchemaNode)>,
}

impl SectionBuilder {
    /// Declare a leaf.
    pub fn leaf(mut self, key: impl Into<String>, spec: LeafSpec) -> Self {
        self.entries.push((key.into(), SchemaNode::Leaf(spec)));
        self
    }

    /// Declare a nested section.
    pub fn section(
        mut self,
        name: impl Into<String>,
        build: impl FnOnce(SectionBuilder) -> SectionBuilder,
    ) -> Self {
        let section = build(SectionBuilder::default());
        self.entries.push((name.into(), SchemaNode::Section(section)));
        self
    }
}

/// Builder for a [`Schema`].
pub type SchemaBuilder = SectionBuilder;

impl SectionBuilder {
    /// Validate the declared tree and produce a [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut leaves = Vec::new();
        collect_leaves(&self, None, &mut leaves)?;

        let mut seen: HashMap<&str, &ConfigPath> = HashMap::new();
        for leaf in &leaves {
            if let Some(first) = seen.insert(leaf.variable.as_str(), &leaf.path) {
                return Err(SchemaError::NameCollision {
                    name: leaf.variable.clone(),
                    first: first.to_string(),
                    second: leaf.path.to_string(),
                });
            }
        }

        Ok(Schema { leaves })
    }
}

fn collect_leaves(
    section: &SectionBuilder,
    prefix: Option<&ConfigPath>,
    out: &mut Vec<SchemaLeaf>,
) -> Result<(), SchemaError> {
    let mut keys = HashSet::new();
    for (key, node) in &section.entries {
        if key.is_empty() || key.contains('.') {
            return Err(SchemaError::InvalidName);
        }
        let path = match prefix {
            Some(prefix) => prefix.child(key.clone()),
            None => ConfigPath::root(key.clone()),
        };
        if !keys.insert(key.as_str()) {
            return Err(SchemaError::DuplicateKey {
                path: path.to_string(),
            });
        }
        match node {
            SchemaNode::Leaf(spec) => {
                for default in std::iter::once(&spec.default).chain(spec.dev_default.iter()) {
                    if default.kind() != spec.kind {
                        return Err(SchemaError::DefaultTypeMismatch {
                            path: path.to_string(),
                            expected: spec.kind,
                            found: default.kind(),
                        });
                    }
                }
                out.push(SchemaLeaf {
                    variable: mangle(&path),
                    path,
                    spec: spec.clone(),
                });
            }
            SchemaNode::Section(nested) => collect_leaves(nested, Some(&path), out)?,
        }
    }
    Ok(())
}

/// A leaf together with its path and mangled variable name.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaLeaf {
    pub path: ConfigPath,
    pub variable: String,
    pub spec: LeafSpec,
}

/// An immutable, validated settings schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Leaves in declaration (pre-order) order.
    leaves: Vec<SchemaLeaf>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// All leaves in declaration order.
    pub fn leaves(&self) -> &[SchemaLeaf] {
        &self.leaves
    }

    /// Find the leaf at `path`.
    pub fn leaf(&self, path: &ConfigPath) -> Option<&SchemaLeaf> {
        self.leaves.iter().find(|leaf| leaf.path == *path)
    }

    /// Whether `path` names a section, i.e. a strict prefix of some leaf path.
    pub fn has_section(&self, path: &ConfigPath) -> bool {
        let prefix = path.elements();
        self.leaves.iter().any(|leaf| {
            let elements = leaf.path.elements();
            elements.len() > prefix.len() && elements.starts_with(prefix)
        })
    }

    /// A section tree holding every default that applies under `selector`.
    pub fn defaults(&self, selector: Selector) -> ConfigSection {
        let mut tree = ConfigSection::new();
        for leaf in &self.leaves {
            tree.set(&leaf.path, leaf.spec.default_for(selector).clone());
        }
        tree
    }

    /// The Komodo bot's settings layout.
    pub fn komodo() -> Result<Self, SchemaError> {
        Self::builder()
            .leaf(
                "version",
                LeafSpec::string(SETTINGS_VERSION).describe("Settings layout version"),
            )
            .section("discord", |s| {
                s.leaf(
                    "token",
                    LeafSpec::string("").required().describe("Bot token"),
                )
                .leaf(
                        "client_secret",
                        LeafSpec::string("").required().describe("OAuth client secret"),
                    )
                    .leaf("bot_name", LeafSpec::string("Komodo"))
                    .leaf("default_command_prefix", LeafSpec::string("!"))
                    .leaf(
                        "developer_guild_id",
                        LeafSpec::integer(0).describe("Guild that receives developer commands"),
                    )
            })
            .section("pnw", |s| {
                s.leaf("api_key", LeafSpec::string(""))
                    .leaf("bot_key", LeafSpec::string(""))
                    .leaf("username", LeafSpec::string(""))
                    .leaf("password", LeafSpec::string(""))
            })
            .section("ai", |s| {
                s.leaf("openai_key", LeafSpec::string(""))
                    .leaf("chatbot_channel_id", LeafSpec::integer(0))
                    .section("tenor", |s| s.leaf("api_key", LeafSpec::string("")))
            })
            .section("database", |s| {
                s.leaf("host", LeafSpec::string("").required())
                    .leaf("port", LeafSpec::integer(5432))
                    .leaf("database", LeafSpec::string("").required())
                    .leaf("user", LeafSpec::string("").required())
                    .leaf("password", LeafSpec::string(""))
            })
            .section("logging", |s| {
                s.section("stream", |s| {
                    s.leaf("level", LeafSpec::string("INFO").dev_default("DEBUG"))
                        .leaf("level_discord", LeafSpec::string("INFO"))
                        .leaf("datefmt", LeafSpec::string(DATEFMT))
                        .leaf("format_info", LeafSpec::string(stream_format("1;34")))
                        .leaf("format_debug", LeafSpec::string(stream_format("1;35")))
                        .leaf("format_warning", LeafSpec::string(stream_format("1;33")))
                        .leaf("format_error", LeafSpec::string(stream_format("1;31")))
                        .leaf("format_critical", LeafSpec::string(stream_format("1;41")))
                })
                .section("file", |s| {
                    s.leaf(
                        "path",
                        LeafSpec::string("").describe("Log file; empty disables file logging"),
                    )
                    .leaf("level", LeafSpec::string("INFO"))
                    .leaf("level_discord", LeafSpec::string("INFO"))
                    .leaf("datefmt", LeafSpec::string(DATEFMT))
                    .leaf(
                        "format",
                        LeafSpec::string("%(asctime)s - %(name)s - %(levelname)s - %(message)s"),
                    )
                })
            })
            .build()
    }
}

const DATEFMT: &str = "%Y-%m-%d %H:%M:%S";

/// Colored console record format, the level name highlighted with `level_color`.
fn stream_format(level_color: &str) -> String {
    format!(
        "\x1b[1;30m%(asctime)s\x1b[0m \x1b[{}m%(levelname)-8s\x1b[0m \x1b[1;35m%(name)s\x1b[0m %(message)s",
        level_color
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(dotted: &str) -> ConfigPath {
        ConfigPath::parse(dotted).unwrap()
    }

    #[test]
    fn test_komodo_schema_builds() {
        let schema = Schema::komodo().unwrap();
        let token = schema.leaf(&path("discord.token")).unwrap();
        assert_eq!(token.variable, "KOMODO_DISCORD_TOKEN");
        assert!(token.spec.required);
        assert_eq!(
            schema.leaf(&path("ai.tenor.api_key")).unwrap().variable,
            "KOMODO_AI_TENOR_API_KEY"
        );
    }

    #[test]
    fn test_komodo_logging_formats() {
        let schema = Schema::komodo().unwrap();
        let defaults = schema.defaults(Selector::Production);
        let info = defaults
            .lookup(&path("logging.stream.format_info"))
            .and_then(ConfigValue::as_str)
            .unwrap();
        assert_eq!(
            info,
            "\x1b[1;30m%(asctime)s\x1b[0m \x1b[1;34m%(levelname)-8s\x1b[0m \x1b[1;35m%(name)s\x1b[0m %(message)s"
        );
        assert_eq!(
            schema.leaf(&path("logging.stream.format_critical")).unwrap().variable,
            "KOMODO_LOGGING_STREAM_FORMAT_CRITICAL"
        );
        assert_eq!(
            defaults.lookup(&path("logging.file.format")),
            Some(&ConfigValue::from(
                "%(asctime)s - %(name)s - %(levelname)s - %(message)s"
            ))
        );
        assert!(schema.leaf(&path("logging.stream.ansi")).is_none());
    }

    #[test]
    fn test_has_section() {
        let schema = Schema::komodo().unwrap();
        assert!(schema.has_section(&path("logging")));
        assert!(schema.has_section(&path("logging.stream")));
        assert!(!schema.has_section(&path("logging.stream.level")));
        assert!(!schema.has_section(&path("version")));
        assert!(!schema.has_section(&path("legacy")));
    }

    #[test]
    fn test_leaves_in_declaration_order() {
        let schema = Schema::builder()
            .section("b", |s| s.leaf("y", LeafSpec::integer(1)))
            .section("a", |s| {
                s.leaf("x", LeafSpec::boolean(true))
                    .section("n", |s| s.leaf("z", LeafSpec::float(0.5)))
            })
            .build()
            .unwrap();
        let paths: Vec<String> = schema.leaves().iter().map(|l| l.path.to_string()).collect();
        assert_eq!(paths, vec!["b.y", "a.x", "a.n.z"]);
    }

    #[test]
    fn test_defaults_tree_per_selector() {
        let schema = Schema::builder()
            .section("logging", |s| {
                s.leaf("level", LeafSpec::string("INFO").dev_default("DEBUG"))
            })
            .build()
            .unwrap();
        let level = path("logging.level");
        assert_eq!(
            schema.defaults(Selector::Production).lookup(&level),
            Some(&ConfigValue::from("INFO"))
        );
        assert_eq!(
            schema.defaults(Selector::Development).lookup(&level),
            Some(&ConfigValue::from("DEBUG"))
        );
    }

    #[test]
    fn test_collision_rejected() {
        let err = Schema::builder()
            .section("discord_retry", |s| s.leaf("max_attempts", LeafSpec::integer(1)))
            .section("discord", |s| {
                s.section("retry", |s| s.leaf("max_attempts", LeafSpec::integer(2)))
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::NameCollision {
                name: "KOMODO_DISCORD_RETRY_MAX_ATTEMPTS".into(),
                first: "discord_retry.max_attempts".into(),
                second: "discord.retry.max_attempts".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = Schema::builder()
            .section("a", |s| s.leaf("x", LeafSpec::integer(1)).leaf("x", LeafSpec::integer(2)))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey { path: "a.x".into() });
    }

    #[test]
    fn test_default_type_mismatch_rejected() {
        let mut spec = LeafSpec::integer(1);
        spec.default = ConfigValue::from("one");
        let err = Schema::builder()
            .section("a", |s| s.leaf("x", spec))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DefaultTypeMismatch { .. }));

        let err = Schema::builder()
            .section("a", |s| s.leaf("x", LeafSpec::integer(1).dev_default(true)))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DefaultTypeMismatch { .. }));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert_eq!(
            Schema::builder().leaf("", LeafSpec::integer(1)).build(),
            Err(SchemaError::InvalidName)
        );
        assert_eq!(
            Schema::builder().leaf("a.b", LeafSpec::integer(1)).build(),
            Err(SchemaError::InvalidName)
        );
    }

    #[test]
    fn test_required_empty_string_unsatisfied() {
        let spec = LeafSpec::string("").required();
        assert!(!spec.is_satisfied_by(&ConfigValue::from("")));
        assert!(!spec.is_satisfied_by(&ConfigValue::from("   ")));
        assert!(spec.is_satisfied_by(&ConfigValue::from("token")));
        assert!(LeafSpec::string("").is_satisfied_by(&ConfigValue::from("")));
    }
}
