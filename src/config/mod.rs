//! Layered settings resolution.
//!
//! Consolidates settings from three sources, highest precedence first:
//! 1. **Environment** - `KOMODO_<SECTION>_..._<KEY>` variables
//! 2. **Document** - `settings.toml` (prod) or `settings.dev.toml` (dev)
//! 3. **Defaults** - declared in the [`Schema`]
//!
//! The document source is skipped entirely when `KOMODO_USE_FILE` is false.
//! A missing document is generated from defaults and never overwritten.
//!
//! [`project`] goes the other way, turning any nested document into
//! `export NAME=value` lines using the same variable naming.

mod app;
mod document;
mod env;
mod flatten;
mod loader;
mod mangle;
mod merge;
mod schema;
mod selector;
mod value;

pub use app::*;
pub use document::{
    DocumentFormat, DocumentStore, LoadedDocument, parse_document, read_document, to_toml_string,
};
pub use env::{EnvLookup, ProcessEnv, Resolved, coerce, resolve, resolve_over};
pub use flatten::{Assignment, project, render_exports, render_literal};
pub use loader::{Loaded, Settings, SettingsLoader, Source, USE_FILE_VAR, parse_toggle, validate};
pub use mangle::{PREFIX, SEPARATOR, mangle, mangle_with_prefix};
pub use merge::deep_merge;
pub use schema::{LeafSpec, SETTINGS_VERSION, Schema, SchemaBuilder, SchemaLeaf, SectionBuilder};
pub use selector::Selector;
pub use value::{ConfigNode, ConfigPath, ConfigSection, ConfigValue, ValueKind};
