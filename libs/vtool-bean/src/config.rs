use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::converter::{BoxError, Converter};
use crate::value::{TypeInfo, Value};

/// Default recursion limit for deep duplication.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options for a single copy call.
///
/// Built fresh per call; there is no shared default that can be mutated.
/// Everything except the converter can be loaded from configuration:
///
/// ```json
/// { "ignore_fields": ["password"], "deep_copy": true }
/// ```
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CopyOptions {
    #[serde(skip)]
    pub converter: Option<Arc<dyn Converter>>,
    /// Destination field names that are never written.
    pub ignore_fields: HashSet<String>,
    /// Duplicate same-typed values recursively instead of assigning them.
    pub deep_copy: bool,
    /// Leave a destination field untouched when the source value is empty.
    pub ignore_empty: bool,
    /// Deep duplication fails with `DepthExceeded` past this many nested
    /// records or containers. Pointer hops do not count.
    pub max_depth: usize,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            converter: None,
            ignore_fields: HashSet::new(),
            deep_copy: false,
            ignore_empty: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for CopyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOptions")
            .field("converter", &self.converter.is_some())
            .field("ignore_fields", &self.ignore_fields)
            .field("deep_copy", &self.deep_copy)
            .field("ignore_empty", &self.ignore_empty)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl CopyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `deep_copy = true`.
    pub fn deep() -> Self {
        Self::default().deep_copy(true)
    }

    /// `deep_copy = true, ignore_empty = true`.
    pub fn deep_non_empty() -> Self {
        Self::default().deep_copy(true).ignore_empty(true)
    }

    pub fn with_converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Like [`with_converter`](Self::with_converter), but lets closure
    /// argument and return types be inferred.
    pub fn with_converter_fn<F>(self, f: F) -> Self
    where
        F: Fn(&dyn Value, TypeInfo) -> Result<Box<dyn Value>, BoxError> + Send + Sync + 'static,
    {
        self.with_converter(f)
    }

    pub fn ignore_field(mut self, name: impl Into<String>) -> Self {
        self.ignore_fields.insert(name.into());
        self
    }

    pub fn deep_copy(mut self, deep_copy: bool) -> Self {
        self.deep_copy = deep_copy;
        self
    }

    pub fn ignore_empty(mut self, ignore_empty: bool) -> Self {
        self.ignore_empty = ignore_empty;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignore_fields.contains(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_shallow_and_unfiltered() {
        let options = CopyOptions::default();
        assert!(options.converter.is_none());
        assert!(options.ignore_fields.is_empty());
        assert!(!options.deep_copy);
        assert!(!options.ignore_empty);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn presets() {
        let deep = CopyOptions::deep();
        assert!(deep.deep_copy && !deep.ignore_empty);

        let non_empty = CopyOptions::deep_non_empty();
        assert!(non_empty.deep_copy && non_empty.ignore_empty);
    }

    #[test]
    fn deserializes_partial_config() {
        let options: CopyOptions =
            serde_json::from_str(r#"{ "ignore_fields": ["age"], "ignore_empty": true }"#).unwrap();
        assert!(options.is_ignored("age"));
        assert!(!options.is_ignored("name"));
        assert!(options.ignore_empty);
        assert!(!options.deep_copy);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn debug_hides_converter() {
        let options = CopyOptions::new()
            .with_converter_fn(|value, _| Ok(value.clone_value()));
        let printed = format!("{options:?}");
        assert!(printed.contains("converter: true"));
    }
}
