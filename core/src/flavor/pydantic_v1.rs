#![deny(missing_docs)]

//! # Pydantic 1 Flavor
//!
//! `BaseModel` classes with a nested `class Config:` block; root models use
//! the `__root__` custom root type.

use crate::field::DataModelField;
use crate::flavor::config::{ConfigBuilder, ConfigInput, ConfigParams};
use crate::flavor::pydantic::{self, FieldDialect};
use crate::flavor::ModelFlavor;
use crate::imports::{self, Import};
use crate::model::ModelKind;
use crate::types::TypeScope;

/// Attributes passed through to `Config` unchanged.
const CONFIG_ATTRIBUTES: &[(&str, &str, bool)] = &[
    ("allow_population_by_field_name", "allow_population_by_field_name", false),
    ("allow_mutation", "allow_mutation", false),
];

/// Keys rendered into `class Config:`, in order.
const CONFIG_KEYS: &[&str] = &[
    "extra",
    "title",
    "allow_population_by_field_name",
    "allow_extra_fields",
    "allow_mutation",
    "arbitrary_types_allowed",
    "orm_mode",
];

const EXTRA: Import = Import::from_static("pydantic", "Extra");

const DIALECT: FieldDialect = FieldDialect {
    excluded: &[
        "alias",
        "default",
        "const",
        "gt",
        "ge",
        "lt",
        "le",
        "multiple_of",
        "min_items",
        "max_items",
        "min_length",
        "max_length",
        "regex",
    ],
    known_keys: None,
    pattern_arg: "regex",
    item_bounds_as_length: false,
    unique_items: true,
    const_marker: true,
    examples_list: false,
    default_in_annotated: false,
    parse_method: "parse_obj",
};

/// Strategy for pydantic 1 models.
pub struct PydanticV1Flavor;

impl ModelFlavor for PydanticV1Flavor {
    fn name(&self) -> &'static str {
        "pydantic.BaseModel"
    }

    fn template_id(&self, kind: ModelKind) -> &'static str {
        match kind {
            ModelKind::Base => "pydantic/BaseModel.jinja2",
            ModelKind::Root => "pydantic/BaseModel_root.jinja2",
        }
    }

    fn default_base_class(&self, _kind: ModelKind) -> Option<Import> {
        Some(Import::from_static("pydantic", "BaseModel"))
    }

    fn rebuild_call(&self, class_name: &str) -> Option<String> {
        Some(format!("{}.update_forward_refs()", class_name))
    }

    fn process_const(&self, field: &mut DataModelField) {
        freeze_const(field);
    }

    fn field_call(&self, field: &DataModelField, scope: TypeScope<'_>) -> Option<String> {
        pydantic::field_call(&DIALECT, field, scope)
    }

    fn field_import(&self) -> Option<Import> {
        Some(imports::FIELD)
    }

    fn derive_config(&self, input: &ConfigInput<'_>) -> Option<ConfigParams> {
        let mut config = ConfigBuilder::new();
        if input.kind == ModelKind::Base && input.extra_policy().is_some() {
            config.extra_policy(input, "Extra.allow", "Extra.forbid");
            config.import(EXTRA);
        }
        config.translate_overrides(input.extras, CONFIG_ATTRIBUTES);
        if input.has_custom_type() {
            config.set_bool("arbitrary_types_allowed", true);
        }
        config.explicit(input.extras);
        config.finish(input.class_name, CONFIG_KEYS)
    }
}

/// Default, required and nullable are fixed by the constant.
pub(crate) fn freeze_const(field: &mut DataModelField) {
    let Some(value) = field.const_value().cloned() else {
        return;
    };
    field.default = Some(value);
    field.is_const = true;
    field.required = false;
    field.nullable = Some(false);
}
