//! Settings documents on disk.
//!
//! Parses TOML, YAML and JSON documents into section trees, and loads or
//! generates the per-environment settings document.
//!
//! Arbitrary documents are converted in full and reject values the tree
//! cannot hold. The settings document is read against the schema instead:
//! unknown keys are skipped whatever they hold, and a declared path holding
//! the wrong shape becomes a [`Problem`].

use std::cmp::Ordering;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use semver::{Prerelease, Version};
use tracing::{debug, info, warn};

use super::merge::deep_merge;
use super::schema::{SETTINGS_VERSION, Schema};
use super::selector::Selector;
use super::value::{ConfigNode, ConfigPath, ConfigSection, ConfigValue};
use crate::error::{DocumentError, Problem};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "toml" => Ok(DocumentFormat::Toml),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            _ => Err(DocumentError::UnsupportedFormat(format!(
                "{} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }
}

/// Read and parse the document at `path`, detecting its format.
pub fn read_document(path: &Path) -> Result<ConfigSection, DocumentError> {
    let format = DocumentFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path).map_err(|source| DocumentError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&raw, format, path)
}

/// Parse `raw` text as a document. `origin` is only used in error messages.
pub fn parse_document(
    raw: &str,
    format: DocumentFormat,
    origin: &Path,
) -> Result<ConfigSection, DocumentError> {
    let parse_error = |message: String| DocumentError::Parse {
        path: origin.to_path_buf(),
        message,
    };
    match format {
        DocumentFormat::Toml => {
            let table: toml::Table = toml::from_str(raw).map_err(|e| parse_error(e.to_string()))?;
            from_toml_table(table, None)
        }
        DocumentFormat::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(raw).map_err(|e| parse_error(e.to_string()))?;
            match value {
                serde_yaml::Value::Mapping(mapping) => from_yaml_mapping(mapping, None),
                // An empty YAML file parses as null.
                serde_yaml::Value::Null => Ok(ConfigSection::new()),
                other => Err(unsupported_root(yaml_kind(&other))),
            }
        }
        DocumentFormat::Json => {
            let value: serde_json::Value =
                serde_json::from_str(raw).map_err(|e| parse_error(e.to_string()))?;
            match value {
                serde_json::Value::Object(map) => from_json_object(map, None),
                other => Err(unsupported_root(json_kind(&other))),
            }
        }
    }
}

fn unsupported_root(what: &str) -> DocumentError {
    DocumentError::UnsupportedValue {
        path: "<document root>".to_string(),
        what: format!("a top-level {}", what),
    }
}

fn unsupported(path: &ConfigPath, what: &str) -> DocumentError {
    DocumentError::UnsupportedValue {
        path: path.to_string(),
        what: what.to_string(),
    }
}

fn child_path(prefix: Option<&ConfigPath>, key: &str) -> ConfigPath {
    match prefix {
        Some(prefix) => prefix.child(key),
        None => ConfigPath::root(key),
    }
}

fn from_toml_table(
    table: toml::Table,
    prefix: Option<&ConfigPath>,
) -> Result<ConfigSection, DocumentError> {
    let mut section = ConfigSection::new();
    for (key, value) in table {
        let path = child_path(prefix, &key);
        let node: ConfigNode = match value {
            toml::Value::String(s) => ConfigValue::String(s).into(),
            toml::Value::Integer(i) => ConfigValue::Integer(i).into(),
            toml::Value::Float(f) => ConfigValue::Float(f).into(),
            toml::Value::Boolean(b) => ConfigValue::Boolean(b).into(),
            toml::Value::Table(nested) => from_toml_table(nested, Some(&path))?.into(),
            toml::Value::Array(_) => return Err(unsupported(&path, "an array")),
            toml::Value::Datetime(_) => return Err(unsupported(&path, "a datetime")),
        };
        section.insert(key, node);
    }
    Ok(section)
}

fn from_yaml_mapping(
    mapping: serde_yaml::Mapping,
    prefix: Option<&ConfigPath>,
) -> Result<ConfigSection, DocumentError> {
    let mut section = ConfigSection::new();
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(key) => key,
            other => {
                let path = prefix
                    .cloned()
                    .unwrap_or_else(|| ConfigPath::root("<root>"));
                return Err(unsupported(&path, &format!("a {} key", yaml_kind(&other))));
            }
        };
        let path = child_path(prefix, &key);
        let node: ConfigNode = match value {
            serde_yaml::Value::String(s) => ConfigValue::String(s).into(),
            serde_yaml::Value::Bool(b) => ConfigValue::Boolean(b).into(),
            serde_yaml::Value::Number(n) => {
                number_value(&path, n.is_f64(), n.as_i64(), n.as_f64())?.into()
            }
            serde_yaml::Value::Mapping(nested) => from_yaml_mapping(nested, Some(&path))?.into(),
            other => return Err(unsupported(&path, yaml_kind(&other))),
        };
        section.insert(key, node);
    }
    Ok(section)
}

/// Integers must fit in `i64`; converting them through `f64` would lose digits.
fn number_value(
    path: &ConfigPath,
    is_float: bool,
    integer: Option<i64>,
    float: Option<f64>,
) -> Result<ConfigValue, DocumentError> {
    match (is_float, integer, float) {
        (false, Some(i), _) => Ok(ConfigValue::Integer(i)),
        (false, None, _) => Err(unsupported(
            path,
            "an integer outside the signed 64-bit range",
        )),
        (true, _, Some(f)) => Ok(ConfigValue::Float(f)),
        (true, _, None) => Err(unsupported(path, "a number")),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

fn from_json_object(
    map: serde_json::Map<String, serde_json::Value>,
    prefix: Option<&ConfigPath>,
) -> Result<ConfigSection, DocumentError> {
    let mut section = ConfigSection::new();
    for (key, value) in map {
        let path = child_path(prefix, &key);
        let node: ConfigNode = match value {
            serde_json::Value::String(s) => ConfigValue::String(s).into(),
            serde_json::Value::Bool(b) => ConfigValue::Boolean(b).into(),
            serde_json::Value::Number(n) => {
                number_value(&path, n.is_f64(), n.as_i64(), n.as_f64())?.into()
            }
            serde_json::Value::Object(nested) => from_json_object(nested, Some(&path))?.into(),
            other => return Err(unsupported(&path, json_kind(&other))),
        };
        section.insert(key, node);
    }
    Ok(section)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Convert a settings document, keeping only the paths `schema` declares.
///
/// Entries at declared paths that cannot hold what the schema expects are
/// left out and reported in `problems`.
fn settings_from_toml(
    table: toml::Table,
    schema: &Schema,
    prefix: Option<&ConfigPath>,
    problems: &mut Vec<Problem>,
) -> ConfigSection {
    let mut section = ConfigSection::new();
    for (key, value) in table {
        let path = child_path(prefix, &key);
        if let Some(leaf) = schema.leaf(&path) {
            let value = match value {
                toml::Value::String(s) => ConfigValue::String(s),
                toml::Value::Integer(i) => ConfigValue::Integer(i),
                toml::Value::Float(f) => ConfigValue::Float(f),
                toml::Value::Boolean(b) => ConfigValue::Boolean(b),
                other => {
                    let expected = leaf.spec.kind.to_string();
                    problems.push(Problem::invalid_shape(&path, &expected, toml_kind(&other)));
                    continue;
                }
            };
            section.insert(key, value);
        } else if schema.has_section(&path) {
            match value {
                toml::Value::Table(nested) => {
                    let nested = settings_from_toml(nested, schema, Some(&path), problems);
                    section.insert(key, nested);
                }
                other => problems.push(Problem::invalid_shape(
                    &path,
                    "a section",
                    toml_kind(&other),
                )),
            }
        } else {
            debug!(%path, "Ignoring unknown settings key");
        }
    }
    section
}

fn toml_kind(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "a string",
        toml::Value::Integer(_) => "an integer",
        toml::Value::Float(_) => "a float",
        toml::Value::Boolean(_) => "a boolean",
        toml::Value::Datetime(_) => "a datetime",
        toml::Value::Array(_) => "an array",
        toml::Value::Table(_) => "a table",
    }
}

/// Convert a section tree to a TOML table.
pub fn to_toml_table(section: &ConfigSection) -> toml::Table {
    let mut table = toml::Table::new();
    for (key, node) in section.iter() {
        let value = match node {
            ConfigNode::Value(ConfigValue::String(s)) => toml::Value::String(s.clone()),
            ConfigNode::Value(ConfigValue::Integer(i)) => toml::Value::Integer(*i),
            ConfigNode::Value(ConfigValue::Float(f)) => toml::Value::Float(*f),
            ConfigNode::Value(ConfigValue::Boolean(b)) => toml::Value::Boolean(*b),
            ConfigNode::Section(nested) => toml::Value::Table(to_toml_table(nested)),
        };
        table.insert(key.to_string(), value);
    }
    table
}

/// Serialize a section tree as TOML text, verifying that it parses back.
pub fn to_toml_string(section: &ConfigSection) -> Result<String, DocumentError> {
    let text = toml::to_string_pretty(&to_toml_table(section))
        .map_err(|e| DocumentError::Serialize(e.to_string()))?;
    toml::from_str::<toml::Table>(&text)
        .map_err(|e| DocumentError::Serialize(format!("generated TOML is invalid: {}", e)))?;
    Ok(text)
}

/// A settings document obtained by [`DocumentStore::load_or_create`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Document values over schema defaults.
    pub tree: ConfigSection,
    pub path: PathBuf,
    /// Whether the document was generated by this call.
    pub created: bool,
    /// Declared paths whose document entry has the wrong shape.
    pub problems: Vec<Problem>,
}

/// Location of per-environment settings documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    base_dir: PathBuf,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DocumentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the settings document for `selector`.
    pub fn path_for(&self, selector: Selector) -> PathBuf {
        self.base_dir.join(selector.file_name())
    }

    /// Load the document for `selector`, generating it from defaults if absent.
    ///
    /// Leaves missing from an existing document fall back to their schema
    /// default, and keys the schema does not declare are ignored. An existing
    /// document is never written to.
    pub fn load_or_create(
        &self,
        schema: &Schema,
        selector: Selector,
    ) -> Result<LoadedDocument, DocumentError> {
        let path = self.path_for(selector);
        let defaults = schema.defaults(selector);

        if path.exists() {
            debug!(path = %path.display(), "Loading settings document");
            let raw = std::fs::read_to_string(&path).map_err(|source| DocumentError::Unreadable {
                path: path.clone(),
                source,
            })?;
            let table: toml::Table = toml::from_str(&raw).map_err(|e| DocumentError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let mut problems = Vec::new();
            let document = settings_from_toml(table, schema, None, &mut problems);
            if schema.leaf(&ConfigPath::root("version")).is_some() {
                check_version(&document, &path)?;
            }
            return Ok(LoadedDocument {
                tree: deep_merge(defaults, document),
                path,
                created: false,
                problems,
            });
        }

        warn!(
            path = %path.display(),
            "Settings document does not exist, creating one with default settings"
        );
        let text = to_toml_string(&defaults)?;
        write_new(&path, &text)?;
        info!(path = %path.display(), "Default settings saved");

        Ok(LoadedDocument {
            tree: defaults,
            path,
            created: true,
            problems: Vec::new(),
        })
    }
}

/// Write `text` to a file that must not exist yet.
fn write_new(path: &Path, text: &str) -> Result<(), DocumentError> {
    let write_failure = |source| DocumentError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(write_failure)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(write_failure)?;
    file.write_all(text.as_bytes()).map_err(write_failure)?;
    Ok(())
}

/// Compare the document's `version` with [`SETTINGS_VERSION`] by semver
/// precedence, so build metadata is ignored and pre-releases sort first.
///
/// Newer or unparseable versions are errors; older versions only warn.
fn check_version(document: &ConfigSection, path: &Path) -> Result<(), DocumentError> {
    let found = match document.get("version") {
        None => return Ok(()),
        Some(ConfigNode::Value(ConfigValue::String(found))) => found.as_str(),
        Some(ConfigNode::Value(other)) => {
            return Err(DocumentError::Version {
                found: other.to_string(),
                expected: SETTINGS_VERSION.to_string(),
            });
        }
        Some(ConfigNode::Section(_)) => {
            return Err(DocumentError::Version {
                found: "a section".to_string(),
                expected: SETTINGS_VERSION.to_string(),
            });
        }
    };

    let version_error = || DocumentError::Version {
        found: found.to_string(),
        expected: SETTINGS_VERSION.to_string(),
    };
    let document_version = Version::parse(found).map_err(|_| version_error())?;
    let current = Version::parse(SETTINGS_VERSION).map_err(|_| version_error())?;

    match precedence(&document_version).cmp(&precedence(&current)) {
        Ordering::Less => {
            warn!(
                path = %path.display(),
                found,
                expected = SETTINGS_VERSION,
                "Settings document version is outdated; review it against the current defaults"
            );
            Ok(())
        }
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(version_error()),
    }
}

fn precedence(version: &Version) -> (u64, u64, u64, &Prerelease) {
    (version.major, version.minor, version.patch, &version.pre)
}
