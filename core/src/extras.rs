//! # Per-Model Extras
//!
//! Extra template data keyed by model name. The keys the core interprets are
//! typed fields of [`ModelExtras`]; anything else lands in the `overlay` map,
//! which is an escape hatch passed through to templates untouched (and where
//! flavor-specific attribute overrides such as `allow_mutation` live).

use crate::config::GenerationOptions;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Name of the bucket whose entries apply to every model.
pub const ALL_MODELS: &str = "#all#";

/// Extra configuration for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelExtras {
    /// Class docstring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The schema's `additionalProperties`, reduced to its truthiness (a
    /// schema object counts as true).
    #[serde(
        default,
        rename = "additionalProperties",
        deserialize_with = "truthy",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
    /// Explicit request to allow extra fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_extra_fields: Option<bool>,
    /// Explicit config parameters; these win over derived ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<IndexMap<String, JsonValue>>,
    /// Unanticipated keys, passed through to templates.
    #[serde(flatten)]
    pub overlay: IndexMap<String, JsonValue>,
}

fn truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(b),
        JsonValue::Object(_) => Some(true),
        JsonValue::Array(items) => Some(!items.is_empty()),
        JsonValue::String(s) => Some(!s.is_empty()),
        JsonValue::Number(_) => Some(true),
    }))
}

impl ModelExtras {
    /// Applies `other` on top of `self`; values present in `other` win.
    pub fn overlay_with(&mut self, other: &ModelExtras) {
        if other.description.is_some() {
            self.description = other.description.clone();
        }
        if other.additional_properties.is_some() {
            self.additional_properties = other.additional_properties;
        }
        if other.allow_extra_fields.is_some() {
            self.allow_extra_fields = other.allow_extra_fields;
        }
        if other.config.is_some() {
            self.config = other.config.clone();
        }
        for (key, value) in &other.overlay {
            self.overlay.insert(key.clone(), value.clone());
        }
    }

    /// A boolean from the overlay (attribute-override keys).
    pub fn overlay_bool(&self, key: &str) -> Option<bool> {
        self.overlay.get(key).and_then(JsonValue::as_bool)
    }

    /// The mapping spread into the template as named variables.
    pub fn template_vars(&self) -> IndexMap<String, JsonValue> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map.into_iter().collect(),
            _ => IndexMap::new(),
        }
    }
}

/// Extras for every model of a run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ExtraTemplateData {
    models: IndexMap<String, ModelExtras>,
}

impl ExtraTemplateData {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The extras slice of one model, mutable.
    pub fn model_mut(&mut self, name: &str) -> &mut ModelExtras {
        self.models.entry(name.to_string()).or_default()
    }

    /// The bucket that applies to every model, mutable.
    pub fn all_models_mut(&mut self) -> &mut ModelExtras {
        self.model_mut(ALL_MODELS)
    }

    /// The model's own slice with the all-models bucket applied on top.
    pub fn for_model(&self, name: &str) -> ModelExtras {
        let mut extras = self.models.get(name).cloned().unwrap_or_default();
        if let Some(all) = self.models.get(ALL_MODELS) {
            extras.overlay_with(all);
        }
        extras
    }

    /// Translates global toggles into all-models entries.
    pub fn apply_global_toggles(&mut self, options: &GenerationOptions) {
        let all = self.all_models_mut();
        if options.allow_population_by_field_name {
            all.overlay
                .insert("allow_population_by_field_name".into(), JsonValue::Bool(true));
        }
        if options.allow_extra_fields {
            all.allow_extra_fields = Some(true);
        }
        if options.enable_faux_immutability {
            all.overlay
                .insert("allow_mutation".into(), JsonValue::Bool(false));
        }
    }
}
