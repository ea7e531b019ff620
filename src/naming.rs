//! Derived report filenames.
//!
//! A report's identity is a structured name built from the project, an
//! optional data-type marker, and an ordered list of tag/value components.
//! The same name keys the source document, the rendered artifact, and the
//! current-folder mirror.

use thiserror::Error;

/// Error produced when a name cannot be derived from its components.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    /// Tag and value components must agree on key set and order.
    #[error("tag and value components do not line up (tags: [{tag_keys}], values: [{value_keys}])")]
    MismatchedComponents {
        tag_keys: String,
        value_keys: String,
    },
}

/// Specification of a derived report filename.
///
/// `tags` and `values` are ordered `(key, text)` pairs. The key identifies
/// the component and must appear in both lists, in the same order; only the
/// tag and value text end up in the rendered name. Delimiters are taken as
/// given, with no validation against the underlying filesystem.
#[derive(Debug, Clone)]
pub struct NameSpec {
    pub project: String,
    pub data_type: Option<String>,
    pub tags: Vec<(String, String)>,
    pub values: Vec<(String, String)>,
    pub tag_delimiter: String,
    pub component_delimiter: String,
}

impl NameSpec {
    /// Render the filename (no extension) for this spec.
    ///
    /// Deterministic: identical specs produce identical names, and any
    /// differing tag or value produces a differing name.
    pub fn build_name(&self) -> Result<String, NamingError> {
        let tag_keys: Vec<&str> = self.tags.iter().map(|(key, _)| key.as_str()).collect();
        let value_keys: Vec<&str> = self.values.iter().map(|(key, _)| key.as_str()).collect();
        if tag_keys != value_keys {
            return Err(NamingError::MismatchedComponents {
                tag_keys: tag_keys.join(", "),
                value_keys: value_keys.join(", "),
            });
        }

        let mut parts = Vec::with_capacity(self.tags.len() + 2);
        parts.push(self.project.clone());
        if let Some(data_type) = &self.data_type {
            parts.push(data_type.clone());
        }
        for ((_, tag), (_, value)) in self.tags.iter().zip(&self.values) {
            parts.push(format!("{}{}{}", tag, self.tag_delimiter, value));
        }
        Ok(parts.join(&self.component_delimiter))
    }
}

/// Parse a command-line `TAG=VALUE` name component.
pub fn parse_tag_argument(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((tag, value)) if !tag.trim().is_empty() && !value.trim().is_empty() => {
            Ok((tag.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected TAG=VALUE, got '{}'", raw)),
    }
}
