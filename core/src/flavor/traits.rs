#![deny(missing_docs)]

//! # Model Flavor Trait
//!
//! Defines the interface a rendering target implements: base classes,
//! template bindings, field-call rendering and config derivation.

use crate::field::DataModelField;
use crate::flavor::config::{ConfigInput, ConfigParams};
use crate::imports::Import;
use crate::model::ModelKind;
use crate::types::TypeScope;

/// A strategy trait decoupling flavor-specific rendering from the model graph.
///
/// One implementor exists per output flavor; the graph selects it once from
/// the `OutputFlavor` enum and never inspects the concrete type.
pub trait ModelFlavor: Sync {
    /// The flavor's command line name.
    fn name(&self) -> &'static str;

    // --- Model shape ---

    /// The template identifier for a model of the given kind.
    fn template_id(&self, kind: ModelKind) -> &'static str;

    /// The default base class, as an import (`pydantic.BaseModel`).
    fn default_base_class(&self, kind: ModelKind) -> Option<Import>;

    /// Whether a user-supplied base class replaces the default.
    fn accepts_custom_base_class(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Base
    }

    /// Decorators placed above every class of the given kind.
    fn decorators(&self, kind: ModelKind) -> Vec<String> {
        let _ = kind;
        Vec::new()
    }

    /// Imports every model of the given kind needs regardless of its fields.
    fn default_imports(&self, kind: ModelKind) -> Vec<Import> {
        let _ = kind;
        Vec::new()
    }

    /// Whether the module starts with `from __future__ import annotations`.
    fn future_annotations(&self) -> bool {
        true
    }

    /// The statement that resolves forward references of a model after all
    /// classes exist (`Model.model_rebuild()`).
    fn rebuild_call(&self, class_name: &str) -> Option<String> {
        let _ = class_name;
        None
    }

    // --- Fields ---

    /// Whether `minItems`/`maxItems` are expressed as length bounds.
    fn item_bounds_as_length(&self) -> bool {
        false
    }

    /// Freezes a field carrying a `const` extra.
    fn process_const(&self, field: &mut DataModelField);

    /// Renders the field call (`Field(...)`), or `None` when there is nothing to say.
    fn field_call(&self, field: &DataModelField, scope: TypeScope<'_>) -> Option<String>;

    /// The import the field call needs.
    fn field_import(&self) -> Option<Import>;

    /// Reorders a model's fields before rendering.
    fn order_fields(&self, fields: &mut [DataModelField], scope: TypeScope<'_>) {
        let _ = (fields, scope);
    }

    /// Whether field metadata may move into `Annotated[...]`.
    fn supports_annotated(&self) -> bool {
        true
    }

    /// Whether an annotated field carries its default inside the field call.
    fn annotated_default_in_call(&self) -> bool {
        false
    }

    // --- Config ---

    /// Derives the model's config parameters; `None` means no config block.
    fn derive_config(&self, input: &ConfigInput<'_>) -> Option<ConfigParams> {
        let _ = input;
        None
    }
}
