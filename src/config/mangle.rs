//! Mapping from structured paths to flat environment variable names.
//!
//! `discord.retry.max_attempts` becomes `KOMODO_DISCORD_RETRY_MAX_ATTEMPTS`.
//! Element names are not escaped, so `discord_retry.max_attempts` mangles to
//! the same name; [`Schema`](super::Schema) rejects such collisions when it is
//! built.

use super::value::ConfigPath;

/// Fixed application prefix for every variable name.
pub const PREFIX: &str = "KOMODO";

/// Separator between prefix and path elements.
pub const SEPARATOR: char = '_';

/// Mangle `path` with the application prefix.
pub fn mangle(path: &ConfigPath) -> String {
    mangle_with_prefix(PREFIX, path)
}

/// Mangle `path` with an explicit prefix.
pub fn mangle_with_prefix(prefix: &str, path: &ConfigPath) -> String {
    let mut name = prefix.to_uppercase();
    for element in path.elements() {
        name.push(SEPARATOR);
        name.push_str(&element.to_uppercase());
    }
    name
}
