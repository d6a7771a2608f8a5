//! Scalar values, ordered sections and paths.
//!
//! Nesting is expressed only through [`ConfigSection`]; a [`ConfigValue`] is
//! always a scalar.

use std::fmt;

/// A scalar configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ConfigValue {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Integer(_) => ValueKind::Integer,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::Boolean(_) => ValueKind::Boolean,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Conform this value to `kind`, widening integers to floats.
    ///
    /// Returns `None` when the value cannot represent `kind`.
    pub fn conform(self, kind: ValueKind) -> Option<ConfigValue> {
        match (self, kind) {
            (ConfigValue::Integer(i), ValueKind::Float) => Some(ConfigValue::Float(i as f64)),
            (value, kind) if value.kind() == kind => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{}", s),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{:?}", x),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Float(f)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Boolean(b)
    }
}

/// Declared scalar type of a schema leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// A node in a section tree: either a scalar leaf or a nested section.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Value(ConfigValue),
    Section(ConfigSection),
}

impl ConfigNode {
    pub fn as_value(&self) -> Option<&ConfigValue> {
        match self {
            ConfigNode::Value(v) => Some(v),
            ConfigNode::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&ConfigSection> {
        match self {
            ConfigNode::Section(s) => Some(s),
            ConfigNode::Value(_) => None,
        }
    }
}

impl From<ConfigValue> for ConfigNode {
    fn from(value: ConfigValue) -> Self {
        ConfigNode::Value(value)
    }
}

impl From<ConfigSection> for ConfigNode {
    fn from(section: ConfigSection) -> Self {
        ConfigNode::Section(section)
    }
}

/// Ordered mapping from key to node.
///
/// Keys are unique; insertion order is kept so that generated documents and
/// projected exports are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSection {
    entries: Vec<(String, ConfigNode)>,
}

impl ConfigSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a node, replacing any existing node under `key` in place.
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<ConfigNode>) {
        let key = key.into();
        let node = node.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = node,
            None => self.entries.push((key, node)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, node: impl Into<ConfigNode>) -> Self {
        self.insert(key, node);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigNode> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, n)| n)
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigNode> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    /// Look up the scalar at `path`.
    pub fn lookup(&self, path: &ConfigPath) -> Option<&ConfigValue> {
        let (leaf, sections) = path.elements().split_last()?;
        let mut current = self;
        for name in sections {
            current = current.get(name)?.as_section()?;
        }
        current.get(leaf)?.as_value()
    }

    /// Set the scalar at `path`, creating intermediate sections as needed.
    ///
    /// An intermediate key currently holding a scalar is replaced by a section.
    pub fn set(&mut self, path: &ConfigPath, value: ConfigValue) {
        let Some((leaf, sections)) = path.elements().split_last() else {
            return;
        };
        let mut current = self;
        for name in sections {
            if !matches!(current.get(name), Some(ConfigNode::Section(_))) {
                current.insert(name.clone(), ConfigSection::new());
            }
            current = match current.get_mut(name) {
                Some(ConfigNode::Section(section)) => section,
                _ => return,
            };
        }
        current.insert(leaf.clone(), value);
    }
}

impl IntoIterator for ConfigSection {
    type Item = (String, ConfigNode);
    type IntoIter = std::vec::IntoIter<(String, ConfigNode)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Location of one leaf: section names followed by the leaf key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    /// Build a path from its elements. Returns `None` for an empty list.
    pub fn new<I, S>(elements: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        if elements.is_empty() {
            None
        } else {
            Some(Self(elements))
        }
    }

    /// Parse a dotted path such as `discord.token`.
    pub fn parse(dotted: &str) -> Option<Self> {
        if dotted.split('.').any(str::is_empty) {
            return None;
        }
        Self::new(dotted.split('.'))
    }

    pub fn elements(&self) -> &[String] {
        &self.0
    }

    /// The leaf key (last element).
    pub fn key(&self) -> &str {
        // Non-empty by construction.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// A new path with `name` appended.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut elements = self.0.clone();
        elements.push(name.into());
        Self(elements)
    }

    pub(crate) fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order_and_replaces_in_place() {
        let mut section = ConfigSection::new();
        section.insert("b", ConfigValue::from(1));
        section.insert("a", ConfigValue::from(2));
        section.insert("b", ConfigValue::from(3));

        let keys: Vec<&str> = section.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(
            section.get("b").and_then(ConfigNode::as_value),
            Some(&ConfigValue::Integer(3))
        );
    }

    #[test]
    fn test_set_and_lookup_nested() {
        let mut section = ConfigSection::new();
        let path = ConfigPath::parse("discord.retry.max_attempts").unwrap();
        section.set(&path, ConfigValue::from(3));

        assert_eq!(section.lookup(&path), Some(&ConfigValue::Integer(3)));
        assert!(section.get("discord").unwrap().as_section().is_some());
        let retry = ConfigPath::parse("discord.retry").unwrap();
        assert_eq!(section.lookup(&retry), None);
    }

    #[test]
    fn test_set_replaces_scalar_with_section() {
        let mut section = ConfigSection::new().with("discord", ConfigValue::from("flat"));
        let path = ConfigPath::parse("discord.token").unwrap();
        section.set(&path, ConfigValue::from("abc"));
        assert_eq!(section.lookup(&path), Some(&ConfigValue::from("abc")));
    }

    #[test]
    fn test_conform_widens_integer_to_float() {
        assert_eq!(
            ConfigValue::Integer(2).conform(ValueKind::Float),
            Some(ConfigValue::Float(2.0))
        );
        assert_eq!(ConfigValue::Float(2.5).conform(ValueKind::Integer), None);
        assert_eq!(ConfigValue::from("x").conform(ValueKind::Boolean), None);
    }

    #[test]
    fn test_path_parse() {
        assert_eq!(
            ConfigPath::parse("a.b").unwrap().elements(),
            &["a".to_string(), "b".to_string()]
        );
        assert!(ConfigPath::parse("").is_none());
        assert!(ConfigPath::parse("a..b").is_none());
        assert_eq!(ConfigPath::parse("a.b").unwrap().to_string(), "a.b");
        assert_eq!(ConfigPath::parse("a.b").unwrap().key(), "b");
    }
}
