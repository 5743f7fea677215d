//! canonical resource names
//!
//! Every resource gets a name that is deterministic from its declared fields and safe to embed in
//! provider APIs: `^[A-Za-z][A-Za-z0-9_-]*$`.
//!
//! | type id | key | explicit name | resource name |
//! |---|---|---|---|
//! | `sql-warehouse` | `default` | | `sql-warehouse-default` |
//! | `sql-warehouse` | `sql-warehouse-main` | | `sql-warehouse-main` |
//! | `permissions` | | | `permissions` |
//! | `user` | `john.doe@example.com` | | `user-john-doe-example-com` |
//! | `sql-warehouse` | `default` | `wh` | `wh` |
use crate::reference::strip_placeholders;
use regex::Regex;
use std::sync::LazyLock;

pub const SEPARATOR: char = '-';

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("name pattern must compile")
});

/// Derives a type id from a kind name by splitting at case transitions
///
/// `WorkspaceFile` becomes `workspace-file`.
pub fn type_id(kind_name: &str) -> String {
    let mut id = String::with_capacity(kind_name.len() + 4);
    for (index, c) in kind_name.chars().enumerate() {
        if index > 0 && c.is_uppercase() {
            id.push(SEPARATOR);
        }
        id.extend(c.to_lowercase());
    }
    id
}

/// `{type_id}-{key}`, or just `key` when it already mentions the type id
pub fn default_resource_name(type_id: &str, key: &str) -> String {
    if key.contains(type_id) {
        key.to_string()
    } else {
        format!("{type_id}{SEPARATOR}{key}")
    }
}

/// Computes and validates the name of a resource
///
/// An explicit name is only validated. Otherwise the default name is derived from `type_id` and
/// `key`, placeholders are replaced by the name they point at and `.`/`@` become separators.
#[tracing::instrument(level = "trace")]
pub fn resource_name(
    type_id: &str,
    key: &str,
    explicit: Option<&str>,
) -> Result<String, NamingError> {
    if let Some(explicit) = explicit {
        validate(explicit)?;
        return Ok(explicit.to_string());
    }

    let mut name = default_resource_name(type_id, key);
    if key.is_empty() {
        if let Some(stripped) = name.strip_suffix(SEPARATOR) {
            name = stripped.to_string();
        }
    }

    let name = strip_placeholders(&name).replace(['.', '@'], &SEPARATOR.to_string());

    if name.ends_with(&SEPARATOR.to_string().repeat(2)) {
        return Err(NamingError::TrailingSeparator(name));
    }

    validate(&name)?;
    Ok(name)
}

pub fn validate(name: &str) -> Result<(), NamingError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(NamingError::Invalid(name.to_string()))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("invalid resource name `{0}`: must start with a letter and only contain letters, digits, `_` and `-`")]
    Invalid(String),
    #[error("invalid resource name `{0}`: ends with repeated separators")]
    TrailingSeparator(String),
    #[error("resource name `{0}` is used by more than one resource")]
    Duplicate(String),
}
