//! # Config Derivation
//!
//! Building blocks the flavors use to turn a model's extras, fields and
//! types into config parameters. A flavor decides which steps apply and which
//! keys its config object knows; everything else is shared here.

use crate::extras::ModelExtras;
use crate::field::DataModelField;
use crate::imports::Import;
use crate::model::ModelKind;
use crate::python;
use crate::types::DataType;
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// What config derivation may look at.
pub struct ConfigInput<'a> {
    /// The model's class name, for diagnostics.
    pub class_name: &'a str,
    /// Regular or root model.
    pub kind: ModelKind,
    /// The model's extras (own slice with the all-models bucket applied).
    pub extras: &'a ModelExtras,
    /// The model's de-duplicated fields.
    pub fields: &'a [DataModelField],
    /// The model's base classes.
    pub base_classes: &'a [DataType],
}

impl ConfigInput<'_> {
    /// Every type node reachable from the fields and base classes.
    pub fn all_data_types(&self) -> impl Iterator<Item = &DataType> {
        self.fields
            .iter()
            .map(|f| &f.data_type)
            .chain(self.base_classes.iter())
            .flat_map(DataType::all_data_types)
    }

    /// Whether any nested type is an unrecognized custom type.
    pub fn has_custom_type(&self) -> bool {
        self.all_data_types().any(|d| d.is_custom_type)
    }

    /// Whether any field pattern uses lookahead or lookbehind.
    pub fn has_lookaround_pattern(&self) -> bool {
        self.fields
            .iter()
            .filter_map(DataModelField::pattern)
            .any(is_lookaround)
    }

    /// The extra-fields policy: `Some(true)` allow, `Some(false)` forbid,
    /// `None` unset.
    pub fn extra_policy(&self) -> Option<bool> {
        let additional = self.extras.additional_properties;
        let allow_extra = self.extras.allow_extra_fields == Some(true);
        if additional.is_some() || allow_extra {
            Some(additional == Some(true) || allow_extra)
        } else {
            None
        }
    }
}

/// Whether a regular expression contains `(?=`, `(?!`, `(?<=` or `(?<!`.
pub fn is_lookaround(pattern: &str) -> bool {
    static LOOKAROUND_RE: OnceLock<Regex> = OnceLock::new();
    let re = LOOKAROUND_RE.get_or_init(|| Regex::new(r"\(\?<?[=!]").expect("Invalid regex"));
    re.is_match(pattern)
}

/// One rendered config parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    /// Parameter name.
    pub key: String,
    /// Python expression.
    pub value: String,
}

/// The derived config object of a model. Entries follow the flavor's key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigParams {
    entries: Vec<ConfigEntry>,
    imports: Vec<Import>,
}

impl ConfigParams {
    /// Entries in render order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// Looks a rendered value up by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Imports the config block needs.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }
}

/// Accumulates derived parameters before they are filtered and ordered.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    values: IndexMap<String, String>,
    imports: Vec<Import>,
}

impl ConfigBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter to a rendered Python expression.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Sets a boolean parameter.
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, python::bool_literal(value));
    }

    /// Requests an import for the config block.
    pub fn import(&mut self, import: Import) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Applies the extra-fields policy with the flavor's spelling of allow/forbid.
    pub fn extra_policy(&mut self, input: &ConfigInput<'_>, allow: &str, forbid: &str) {
        match input.extra_policy() {
            Some(true) => self.set("extra", allow),
            Some(false) => self.set("extra", forbid),
            None => {}
        }
    }

    /// Translates declared attribute overrides through `(from, to, invert)` rows.
    pub fn translate_overrides(
        &mut self,
        extras: &ModelExtras,
        table: &[(&'static str, &'static str, bool)],
    ) {
        for (from, to, invert) in table {
            if let Some(value) = extras.overlay_bool(from) {
                self.set_bool(to, value != *invert);
            }
        }
    }

    /// Overlays the explicit `config` mapping; explicit values win.
    ///
    /// Strings are taken as Python expressions, other values are `repr`-ed.
    pub fn explicit(&mut self, extras: &ModelExtras) {
        let Some(config) = &extras.config else {
            return;
        };
        for (key, value) in config {
            let rendered = match value {
                JsonValue::String(expr) => expr.clone(),
                other => python::repr(other),
            };
            self.set(key, rendered);
        }
    }

    /// Keeps the keys the flavor's config object knows, in its order.
    ///
    /// Unknown keys are dropped with a warning. Returns `None` when nothing is left.
    pub fn finish(self, class_name: &str, known_keys: &[&str]) -> Option<ConfigParams> {
        for key in self.values.keys() {
            if !known_keys.contains(&key.as_str()) {
                warn!(model = class_name, key = %key, "Ignoring unknown config key");
            }
        }
        let entries: Vec<ConfigEntry> = known_keys
            .iter()
            .filter_map(|key| {
                self.values.get(*key).map(|value| ConfigEntry {
                    key: key.to_string(),
                    value: value.clone(),
                })
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        debug!(model = class_name, count = entries.len(), "Derived config");
        Some(ConfigParams {
            entries,
            imports: self.imports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookaround_detection() {
        assert!(is_lookaround(r"^(?=.*\d).+$"));
        assert!(is_lookaround(r"(?<!a)b"));
        assert!(is_lookaround(r"(?<=a)b"));
        assert!(!is_lookaround(r"^(?:a|b)+$"));
        assert!(!is_lookaround(r"^(?P<name>\w+)$"));
    }

    #[test]
    fn test_extra_policy() {
        let fields = [];
        let mut extras = ModelExtras::default();
        let input = |extras: &ModelExtras| {
            ConfigInput {
                class_name: "M",
                kind: ModelKind::Base,
                extras,
                fields: &fields,
                base_classes: &[],
            }
            .extra_policy()
        };
        assert_eq!(input(&extras), None);
        extras.additional_properties = Some(false);
        assert_eq!(input(&extras), Some(false));
        extras.allow_extra_fields = Some(true);
        assert_eq!(input(&extras), Some(true));
    }

    #[test]
    fn test_finish_orders_and_filters() {
        let mut builder = ConfigBuilder::new();
        builder.set_bool("frozen", true);
        builder.set("extra", "'allow'");
        builder.set("bogus", "1");
        let params = builder.finish("M", &["extra", "frozen"]).unwrap();
        let keys: Vec<&str> = params.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["extra", "frozen"]);
        assert_eq!(params.get("frozen"), Some("True"));
        assert!(ConfigBuilder::new().finish("M", &["extra"]).is_none());
    }

    #[test]
    fn test_translate_and_explicit_overlay() {
        let mut extras = ModelExtras::default();
        extras.overlay.insert("allow_mutation".into(), json!(false));
        let mut config = IndexMap::new();
        config.insert("frozen".to_string(), json!(false));
        config.insert("title".to_string(), json!("'Pet'"));
        extras.config = Some(config);

        let mut builder = ConfigBuilder::new();
        builder.translate_overrides(&extras, &[("allow_mutation", "frozen", true)]);
        assert_eq!(builder.values.get("frozen").map(String::as_str), Some("True"));
        builder.explicit(&extras);
        let params = builder.finish("Pet", &["title", "frozen"]).unwrap();
        assert_eq!(params.get("frozen"), Some("False"));
        assert_eq!(params.get("title"), Some("'Pet'"));
    }
}
