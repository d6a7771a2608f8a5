//! Deep merge of section trees.
//!
//! Implements field-by-field merging where overlay values override base values,
//! which gives documents per-leaf fallback to schema defaults.

use super::value::{ConfigNode, ConfigSection};

/// Deep merge two sections, with `overlay` taking precedence over `base`.
///
/// - Sections are merged recursively: keys in overlay override keys in base
/// - Scalars are replaced entirely
/// - A section replaces a scalar and a scalar replaces a section
/// - Keys only present in `base` keep their position; new keys are appended
///
/// # Example
/// ```
/// use komodo_settings::config::{deep_merge, ConfigSection, ConfigValue};
///
/// let base = ConfigSection::new()
///     .with("database", ConfigSection::new()
///         .with("host", ConfigValue::from(""))
///         .with("port", ConfigValue::from(5432)));
/// let overlay = ConfigSection::new()
///     .with("database", ConfigSection::new().with("host", ConfigValue::from("db")));
/// let merged = deep_merge(base, overlay);
/// // Result: { database: { host: "db", port: 5432 } }
/// ```
pub fn deep_merge(mut base: ConfigSection, overlay: ConfigSection) -> ConfigSection {
    for (key, overlay_node) in overlay {
        let merged = match (base.remove_in_place(&key), overlay_node) {
            (Some(ConfigNode::Section(base_section)), ConfigNode::Section(overlay_section)) => {
                ConfigNode::Section(deep_merge(base_section, overlay_section))
            }
            (_, overlay_node) => overlay_node,
        };
        base.insert(key, merged);
    }
    base
}

impl ConfigSection {
    /// Take the node under `key`, leaving a placeholder so that a following
    /// `insert` keeps the original position.
    fn remove_in_place(&mut self, key: &str) -> Option<ConfigNode> {
        let node = self.get_mut(key)?;
        Some(std::mem::replace(
            node,
            ConfigNode::Section(ConfigSection::new()),
        ))
    }
}
