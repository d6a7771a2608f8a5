//! Settings facade: source precedence, validation and the resolved settings.
//!
//! Precedence, highest first: environment variables, the settings document,
//! schema defaults. When the document source is disabled the store is never
//! touched.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::document::DocumentStore;
use super::env::{EnvLookup, ProcessEnv, resolve, resolve_over};
use super::flatten::{Assignment, project};
use super::schema::Schema;
use super::selector::Selector;
use super::value::{ConfigNode, ConfigPath, ConfigSection, ConfigValue};
use crate::error::{ConfigurationCause, ConfigurationError, Problem};

/// Toggle selecting whether the settings document participates.
pub const USE_FILE_VAR: &str = "KOMODO_USE_FILE";

/// Where the resolved values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The document did not exist and was generated from defaults.
    Generated,
    /// An existing document was loaded.
    Document,
    /// Only defaults and environment variables were consulted.
    Environment,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Generated => write!(f, "generated document"),
            Source::Document => write!(f, "document"),
            Source::Environment => write!(f, "environment variables"),
        }
    }
}

/// Fully resolved, validated settings.
///
/// Every schema leaf holds a value of its declared kind. There is no mutating
/// API; share it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    selector: Selector,
    tree: ConfigSection,
}

impl Settings {
    pub fn selector(&self) -> Selector {
        self.selector
    }

    pub fn tree(&self) -> &ConfigSection {
        &self.tree
    }

    /// Value at a dotted path such as `discord.token`.
    pub fn get(&self, dotted: &str) -> Option<&ConfigValue> {
        self.tree.lookup(&ConfigPath::parse(dotted)?)
    }

    pub fn string(&self, dotted: &str) -> Option<&str> {
        self.get(dotted)?.as_str()
    }

    pub fn integer(&self, dotted: &str) -> Option<i64> {
        self.get(dotted)?.as_i64()
    }

    pub fn float(&self, dotted: &str) -> Option<f64> {
        self.get(dotted)?.as_f64()
    }

    pub fn boolean(&self, dotted: &str) -> Option<bool> {
        self.get(dotted)?.as_bool()
    }

    /// Settings as export assignments.
    pub fn exports(&self) -> Vec<Assignment> {
        project(&self.tree)
    }

    /// Settings as a JSON object, in schema order.
    pub fn to_json(&self) -> serde_json::Value {
        section_to_json(&self.tree)
    }
}

fn section_to_json(section: &ConfigSection) -> serde_json::Value {
    let map = section
        .iter()
        .map(|(key, node)| {
            let value = match node {
                ConfigNode::Section(nested) => section_to_json(nested),
                ConfigNode::Value(ConfigValue::String(s)) => serde_json::Value::String(s.clone()),
                ConfigNode::Value(ConfigValue::Integer(i)) => serde_json::Value::from(*i),
                ConfigNode::Value(ConfigValue::Float(f)) => serde_json::Value::from(*f),
                ConfigNode::Value(ConfigValue::Boolean(b)) => serde_json::Value::Bool(*b),
            };
            (key.to_string(), value)
        })
        .collect();
    serde_json::Value::Object(map)
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub settings: Settings,
    pub source: Source,
    /// Settings document consulted, if the document source was enabled.
    pub document: Option<PathBuf>,
    /// Non-fatal problems (rejected environment overrides).
    pub problems: Vec<Problem>,
}

impl Loaded {
    /// Whether the settings document was generated during this resolution.
    pub fn created(&self) -> bool {
        self.source == Source::Generated
    }
}

/// Resolves [`Settings`] from a schema, a document store and an environment.
#[derive(Debug, Clone)]
pub struct SettingsLoader<E = ProcessEnv> {
    schema: Schema,
    store: DocumentStore,
    env: E,
}

impl SettingsLoader<ProcessEnv> {
    /// Loader reading the process environment and the working directory.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            store: DocumentStore::default(),
            env: ProcessEnv,
        }
    }
}

impl<E: EnvLookup> SettingsLoader<E> {
    /// Replace the environment the loader reads from.
    pub fn with_env<F: EnvLookup>(self, env: F) -> SettingsLoader<F> {
        SettingsLoader {
            schema: self.schema,
            store: self.store,
            env,
        }
    }

    /// Resolve documents relative to `base_dir`.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.store = DocumentStore::new(base_dir);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Read the [`USE_FILE_VAR`] toggle. Unset means enabled.
    pub fn use_file(&self) -> Result<bool, ConfigurationError> {
        match self.env.get(USE_FILE_VAR) {
            None => Ok(true),
            Some(raw) => parse_toggle(&raw).ok_or_else(|| {
                ConfigurationError::from_cause(ConfigurationCause::Toggle {
                    variable: USE_FILE_VAR.to_string(),
                    value: raw,
                })
            }),
        }
    }

    /// Resolve settings, honouring the [`USE_FILE_VAR`] toggle.
    pub fn load_from_env(&self, selector: Selector) -> Result<Loaded, ConfigurationError> {
        let use_file = self.use_file()?;
        self.load(selector, use_file)
    }

    /// Resolve settings for `selector`.
    ///
    /// With `use_file` the selector's document is loaded (or generated) and
    /// environment overrides apply on top of it; without it, on top of the
    /// schema defaults.
    pub fn load(&self, selector: Selector, use_file: bool) -> Result<Loaded, ConfigurationError> {
        debug!(%selector, use_file, "Resolving settings");

        let (tree, mut problems, source, document) = if use_file {
            let loaded = self.store.load_or_create(&self.schema, selector)?;
            let source = if loaded.created {
                Source::Generated
            } else {
                Source::Document
            };
            let resolved = resolve_over(&self.schema, &loaded.tree, &self.env);
            let mut problems = loaded.problems;
            problems.extend(resolved.problems);
            (resolved.tree, problems, source, Some(loaded.path))
        } else {
            let resolved = resolve(&self.schema, selector, &self.env);
            (resolved.tree, resolved.problems, Source::Environment, None)
        };
        debug!(%source, "Validating settings");

        for problem in problems.iter().filter(|p| !p.code.is_fatal()) {
            warn!(path = %problem.path, "{}", problem.message);
        }

        let settings = match validate(&self.schema, selector, &tree) {
            Ok(settings) => Some(settings),
            Err(invalid) => {
                problems.extend(invalid);
                None
            }
        };

        match settings {
            Some(settings) if !problems.iter().any(|p| p.code.is_fatal()) => {
                info!(
                    "Using settings from {}",
                    document
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| source.to_string())
                );
                Ok(Loaded {
                    settings,
                    source,
                    document,
                    problems,
                })
            }
            _ => {
                let created = match source {
                    Source::Generated => document,
                    _ => None,
                };
                Err(ConfigurationError::from_problems(problems, created))
            }
        }
    }

    /// Path of the document that [`load`](Self::load) would use.
    pub fn document_path(&self, selector: Selector) -> PathBuf {
        self.store.path_for(selector)
    }

    pub fn base_dir(&self) -> &Path {
        self.store.base_dir()
    }
}

/// Check `tree` against `schema`, collecting every missing or invalid leaf.
pub fn validate(
    schema: &Schema,
    selector: Selector,
    tree: &ConfigSection,
) -> Result<Settings, Vec<Problem>> {
    let mut settings = ConfigSection::new();
    let mut problems = Vec::new();

    for leaf in schema.leaves() {
        let Some(value) = tree.lookup(&leaf.path) else {
            problems.push(Problem::missing_field(&leaf.path));
            continue;
        };
        match value.clone().conform(leaf.spec.kind) {
            Some(value) if leaf.spec.is_satisfied_by(&value) => settings.set(&leaf.path, value),
            Some(_) => problems.push(Problem::missing_field(&leaf.path)),
            None => problems.push(Problem::invalid_value(
                &leaf.path,
                leaf.spec.kind,
                value.kind(),
            )),
        }
    }

    if problems.is_empty() {
        Ok(Settings {
            selector,
            tree: settings,
        })
    } else {
        Err(problems)
    }
}

/// Parse the document toggle: `true`/`1`/`t` or `false`/`0`/`f`, any case.
pub fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "t" => Some(true),
        "false" | "0" | "f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LeafSpec;
    use crate::error::ProblemCode;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn schema() -> Schema {
        Schema::builder()
            .section("discord", |s| {
                s.leaf("token", LeafSpec::string("unset"))
                    .leaf("guild_id", LeafSpec::integer(0))
            })
            .section("bot", |s| s.leaf("ratio", LeafSpec::float(0.5)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let schema = Schema::builder()
            .section("a", |s| {
                s.leaf("required", LeafSpec::string("").required())
                    .leaf("number", LeafSpec::integer(1))
                    .leaf("missing", LeafSpec::boolean(true))
            })
            .build()
            .unwrap();
        let tree = ConfigSection::new().with(
            "a",
            ConfigSection::new()
                .with("required", ConfigValue::from(""))
                .with("number", ConfigValue::from("seven")),
        );

        let problems = validate(&schema, Selector::Production, &tree).unwrap_err();
        let codes: Vec<(ProblemCode, &str)> = problems
            .iter()
            .map(|p| (p.code, p.path.as_str()))
            .collect();
        assert_eq!(
            codes,
            vec![
                (ProblemCode::MissingRequiredField, "a.required"),
                (ProblemCode::InvalidFieldValue, "a.number"),
                (ProblemCode::MissingRequiredField, "a.missing"),
            ]
        );
    }

    #[test]
    fn test_validate_widens_integers_for_float_leaves() {
        let schema = schema();
        let mut tree = schema.defaults(Selector::Production);
        let ratio = ConfigPath::parse("bot.ratio").unwrap();
        tree.set(&ratio, ConfigValue::Integer(2));
        let settings = validate(&schema, Selector::Production, &tree).unwrap();
        assert_eq!(settings.float("bot.ratio"), Some(2.0));
    }

    #[test]
    fn test_env_only_never_touches_store() {
        let temp = TempDir::new().unwrap();
        let loader = SettingsLoader::new(schema())
            .with_base_dir(temp.path())
            .with_env(env(&[]));

        let loaded = loader.load(Selector::Production, false).unwrap();
        assert_eq!(loaded.source, Source::Environment);
        assert!(loaded.document.is_none());
        assert!(!loader.document_path(Selector::Production).exists());
        assert_eq!(
            loaded.settings.tree(),
            &schema().defaults(Selector::Production)
        );
    }

    #[test]
    fn test_coercion_problems_are_non_fatal() {
        let temp = TempDir::new().unwrap();
        let loader = SettingsLoader::new(schema())
            .with_base_dir(temp.path())
            .with_env(env(&[
                ("KOMODO_DISCORD_GUILD_ID", "x"),
                ("KOMODO_BOT_RATIO", "y"),
            ]));

        let loaded = loader.load(Selector::Production, false).unwrap();
        assert_eq!(loaded.problems.len(), 2);
        assert_eq!(loaded.settings.integer("discord.guild_id"), Some(0));
    }

    #[test]
    fn test_failed_resolution_carries_coercion_problems_too() {
        let schema = Schema::builder()
            .section("discord", |s| {
                s.leaf("token", LeafSpec::string("").required())
                    .leaf("guild_id", LeafSpec::integer(0))
            })
            .build()
            .unwrap();
        let loader = SettingsLoader::new(schema).with_env(env(&[("KOMODO_DISCORD_GUILD_ID", "x")]));

        let err = loader.load(Selector::Production, false).unwrap_err();
        let codes: Vec<ProblemCode> = err.problems.iter().map(|p| p.code).collect();
        assert_eq!(
            codes,
            vec![ProblemCode::TypeCoercionFailure, ProblemCode::MissingRequiredField]
        );
        assert!(err.document_created.is_none());
    }

    #[test]
    fn test_generated_document_reported_on_failure() {
        let temp = TempDir::new().unwrap();
        let schema = Schema::builder()
            .section("discord", |s| s.leaf("token", LeafSpec::string("").required()))
            .build()
            .unwrap();
        let loader = SettingsLoader::new(schema)
            .with_base_dir(temp.path())
            .with_env(env(&[]));

        let err = loader.load(Selector::Development, true).unwrap_err();
        assert_eq!(
            err.document_created,
            Some(temp.path().join("settings.dev.toml"))
        );
        assert!(temp.path().join("settings.dev.toml").exists());
    }

    #[test]
    fn test_use_file_toggle() {
        let loader = SettingsLoader::new(schema()).with_env(env(&[]));
        assert!(loader.use_file().unwrap());

        for (raw, expected) in [
            ("TRUE", true),
            ("1", true),
            ("t", true),
            ("false", false),
            ("0", false),
            ("F", false),
        ] {
            let loader = SettingsLoader::new(schema()).with_env(env(&[(USE_FILE_VAR, raw)]));
            assert_eq!(loader.use_file().unwrap(), expected, "{raw}");
        }

        let loader = SettingsLoader::new(schema()).with_env(env(&[(USE_FILE_VAR, "maybe")]));
        let err = loader.use_file().unwrap_err();
        assert!(err.to_string().contains("KOMODO_USE_FILE"));
    }

    #[test]
    fn test_settings_accessors() {
        let schema = schema();
        let settings = validate(
            &schema,
            Selector::Production,
            &schema.defaults(Selector::Production),
        )
        .unwrap();
        assert_eq!(settings.string("discord.token"), Some("unset"));
        assert_eq!(settings.integer("discord.guild_id"), Some(0));
        assert_eq!(settings.integer("discord.token"), None);
        assert_eq!(settings.get("no.such.path"), None);
        assert_eq!(
            settings.to_json(),
            serde_json::json!({"discord": {"token": "unset", "guild_id": 0}, "bot": {"ratio": 0.5}})
        );
        assert_eq!(settings.exports().len(), 3);
    }
}
