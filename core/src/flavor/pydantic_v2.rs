#![deny(missing_docs)]

//! # Pydantic 2 Flavor
//!
//! `BaseModel` / `RootModel` classes with `model_config = ConfigDict(...)`.

use crate::field::DataModelField;
use crate::flavor::config::{ConfigBuilder, ConfigInput, ConfigParams};
use crate::flavor::pydantic::{self, FieldDialect};
use crate::flavor::ModelFlavor;
use crate::imports::{self, Import};
use crate::model::ModelKind;
use crate::types::{DataType, TypeScope};
use serde_json::Value as JsonValue;

/// Old attribute name, `ConfigDict` key, whether the boolean is inverted.
const CONFIG_ATTRIBUTES: &[(&str, &str, bool)] = &[
    ("allow_population_by_field_name", "populate_by_name", false),
    ("populate_by_name", "populate_by_name", false),
    ("allow_mutation", "frozen", true),
    ("frozen", "frozen", false),
];

/// Keys `ConfigDict` accepts, in render order.
const CONFIG_KEYS: &[&str] = &[
    "extra",
    "title",
    "populate_by_name",
    "allow_extra_fields",
    "from_attributes",
    "frozen",
    "arbitrary_types_allowed",
    "protected_namespaces",
    "regex_engine",
    "use_enum_values",
    "coerce_numbers_to_str",
];

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
        "min_length",
        "max_length",
        "pattern",
    ],
    known_keys: Some(&[
        "default",
        "default_factory",
        "alias",
        "alias_priority",
        "validation_alias",
        "serialization_alias",
        "title",
        "description",
        "examples",
        "exclude",
        "discriminator",
        "json_schema_extra",
        "frozen",
        "validate_default",
        "repr",
        "init_var",
        "kw_only",
        "pattern",
        "strict",
        "gt",
        "ge",
        "lt",
        "le",
        "multiple_of",
        "allow_inf_nan",
        "max_digits",
        "decimal_places",
        "min_length",
        "max_length",
        "union_mode",
    ]),
    pattern_arg: "pattern",
    item_bounds_as_length: true,
    unique_items: false,
    const_marker: false,
    examples_list: true,
    default_in_annotated: true,
    parse_method: "model_validate",
};

/// Strategy for pydantic 2 models.
pub struct PydanticV2Flavor;

impl ModelFlavor for PydanticV2Flavor {
    fn name(&self) -> &'static str {
        "pydantic_v2.BaseModel"
    }

    fn template_id(&self, kind: ModelKind) -> &'static str {
        match kind {
            ModelKind::Base => "pydantic_v2/BaseModel.jinja2",
            ModelKind::Root => "pydantic_v2/RootModel.jinja2",
        }
    }

    fn default_base_class(&self, kind: ModelKind) -> Option<Import> {
        Some(match kind {
            ModelKind::Base => Import::from_static("pydantic", "BaseModel"),
            ModelKind::Root => Import::from_static("pydantic", "RootModel"),
        })
    }

    fn rebuild_call(&self, class_name: &str) -> Option<String> {
        Some(format!("{}.model_rebuild()", class_name))
    }

    fn item_bounds_as_length(&self) -> bool {
        true
    }

    fn process_const(&self, field: &mut DataModelField) {
        let Some(value) = field.const_value().cloned() else {
            return;
        };
        field.is_const = true;
        field.nullable = Some(false);
        if is_falsy(field.default.as_ref()) {
            field.default = Some(value.clone());
        }
        field.data_type = DataType::literal(vec![value]);
    }

    fn field_call(&self, field: &DataModelField, scope: TypeScope<'_>) -> Option<String> {
        pydantic::field_call(&DIALECT, field, scope)
    }

    fn field_import(&self) -> Option<Import> {
        Some(imports::FIELD)
    }

    fn annotated_default_in_call(&self) -> bool {
        true
    }

    fn derive_config(&self, input: &ConfigInput<'_>) -> Option<ConfigParams> {
        let mut config = ConfigBuilder::new();
        if input.kind == ModelKind::Base {
            config.extra_policy(input, "'allow'", "'forbid'");
        }
        config.translate_overrides(input.extras, CONFIG_ATTRIBUTES);
        if input.has_custom_type() {
            config.set_bool("arbitrary_types_allowed", true);
        }
        if input.has_lookaround_pattern() {
            config.set("regex_engine", "\"python-re\"");
        }
        config.explicit(input.extras);
        config.import(imports::CONFIG_DICT);
        config.finish(input.class_name, CONFIG_KEYS)
    }
}

/// Python truthiness of an optional default.
fn is_falsy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::Bool(b)) => !b,
        Some(JsonValue::Number(n)) => n.as_f64() == Some(0.0),
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(JsonValue::Array(items)) => items.is_empty(),
        Some(JsonValue::Object(map)) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationOptions;
    use crate::constraints::{ConstraintKind, ConstraintSet, ConstraintValue};
    use crate::extras::ModelExtras;
    use crate::field::FieldSpec;
    use crate::reference::ReferenceArena;
    use serde_json::json;

    fn render(spec: FieldSpec, options: &GenerationOptions) -> Option<String> {
        let arena = ReferenceArena::new();
        let field = DataModelField::new(spec, options);
        field.field_call(TypeScope::new(&arena, options.type_options()))
    }

    #[test]
    fn test_required_field_with_constraints() {
        let constraints = ConstraintSet::new()
            .with(ConstraintKind::MinLength, ConstraintValue::Count(1))
            .with(
                ConstraintKind::Pattern,
                ConstraintValue::Text("^[a-z]+$".to_string()),
            );
        let spec = FieldSpec::new("name", DataType::primitive("str"))
            .required(true)
            .constraints(constraints);
        assert_eq!(
            render(spec, &GenerationOptions::default()).as_deref(),
            Some("Field(..., min_length=1, pattern='^[a-z]+$')")
        );
    }

    #[test]
    fn test_default_and_alias() {
        let mut spec = FieldSpec::new("user_name", DataType::primitive("str"))
            .default_value(json!("anon"))
            .extra("description", json!("Login"));
        spec.alias = Some("user-name".to_string());
        assert_eq!(
            render(spec.clone(), &GenerationOptions::default()).as_deref(),
            Some("Field('anon', alias='user-name', description='Login')")
        );
        let kwarg = GenerationOptions {
            use_default_kwarg: true,
            ..Default::default()
        };
        assert_eq!(
            render(spec, &kwarg).as_deref(),
            Some("Field(default='anon', alias='user-name', description='Login')")
        );
    }

    #[test]
    fn test_unknown_extras_move_to_json_schema_extra() {
        let spec = FieldSpec::new("n", DataType::primitive("int"))
            .required(true)
            .extra("x-unit", json!("kg"))
            .extra("example", json!(3));
        assert_eq!(
            render(spec, &GenerationOptions::default()).as_deref(),
            Some("Field(..., examples=[3], json_schema_extra={'x-unit': 'kg'})")
        );
    }

    #[test]
    fn test_item_bounds_and_unique_items() {
        let constraints = ConstraintSet::new()
            .with(ConstraintKind::MinItems, ConstraintValue::Count(2))
            .with(ConstraintKind::UniqueItems, ConstraintValue::Flag(true));
        let spec = FieldSpec::new("tags", DataType::list_of(DataType::primitive("str")))
            .required(true)
            .constraints(constraints);
        assert_eq!(
            render(spec, &GenerationOptions::default()).as_deref(),
            Some("Field(..., min_length=2)")
        );
    }

    #[test]
    fn test_float_coercion_of_bounds() {
        let constraints = ConstraintSet::new().with(ConstraintKind::Ge, ConstraintValue::Number(0.into()));
        let spec = FieldSpec::new("price", DataType::primitive("float"))
            .required(true)
            .constraints(constraints);
        assert_eq!(
            render(spec, &GenerationOptions::default()).as_deref(),
            Some("Field(..., ge=0.0)")
        );
    }

    #[test]
    fn test_nullable_required_without_arguments() {
        let spec = FieldSpec::new("n", DataType::primitive("int"))
            .required(true)
            .nullable(Some(true));
        assert_eq!(
            render(spec, &GenerationOptions::default()).as_deref(),
            Some("Field(...)")
        );
        let plain = FieldSpec::new("n", DataType::primitive("int")).required(true);
        assert_eq!(render(plain, &GenerationOptions::default()), None);
    }

    #[test]
    fn test_annotated_moves_default_into_call() {
        let options = GenerationOptions {
            use_annotated: true,
            ..Default::default()
        };
        let spec = FieldSpec::new("n", DataType::primitive("int"))
            .default_value(json!(5))
            .extra("title", json!("N"));
        assert_eq!(render(spec, &options).as_deref(), Some("Field(5, title='N')"));
    }

    #[test]
    fn test_const_becomes_literal() {
        let options = GenerationOptions::default();
        let spec = FieldSpec::new("kind", DataType::primitive("str"))
            .required(true)
            .extra("const", json!("dog"));
        let field = DataModelField::new(spec, &options);
        let arena = ReferenceArena::new();
        let scope = TypeScope::new(&arena, options.type_options());
        assert!(field.required);
        assert_eq!(field.type_hint(scope), "Literal['dog']");
        assert_eq!(field.field_call(scope), None);
    }

    #[test]
    fn test_config_derivation() {
        let mut extras = ModelExtras::default();
        extras.allow_extra_fields = Some(true);
        extras.overlay.insert("allow_mutation".into(), json!(false));
        extras.overlay.insert("unrelated".into(), json!(1));
        let input = ConfigInput {
            class_name: "Pet",
            kind: ModelKind::Base,
            extras: &extras,
            fields: &[],
            base_classes: &[],
        };
        let config = PydanticV2Flavor.derive_config(&input).unwrap();
        assert_eq!(config.get("extra"), Some("'allow'"));
        assert_eq!(config.get("frozen"), Some("True"));
        assert_eq!(config.imports(), &[imports::CONFIG_DICT]);

        let root = ConfigInput {
            kind: ModelKind::Root,
            ..input
        };
        let root_config = PydanticV2Flavor.derive_config(&root).unwrap();
        assert_eq!(root_config.get("extra"), None);
    }

    #[test]
    fn test_no_config_without_parameters() {
        let extras = ModelExtras::default();
        let input = ConfigInput {
            class_name: "Pet",
            kind: ModelKind::Base,
            extras: &extras,
            fields: &[],
            base_classes: &[],
        };
        assert!(PydanticV2Flavor.derive_config(&input).is_none());
    }

    #[test]
    fn test_lookaround_pattern_switches_regex_engine() {
        let options = GenerationOptions::default();
        let constraints = ConstraintSet::new().with(
            ConstraintKind::Pattern,
            ConstraintValue::Text(r"^(?!admin).*$".to_string()),
        );
        let fields = [DataModelField::new(
            FieldSpec::new("login", DataType::primitive("str")).constraints(constraints),
            &options,
        )];
        let extras = ModelExtras::default();
        let input = ConfigInput {
            class_name: "User",
            kind: ModelKind::Base,
            extras: &extras,
            fields: &fields,
            base_classes: &[],
        };
        let config = PydanticV2Flavor.derive_config(&input).unwrap();
        assert_eq!(config.get("regex_engine"), Some("\"python-re\""));
    }

    #[test]
    fn test_custom_type_allows_arbitrary_types() {
        let options = GenerationOptions::default();
        let custom = DataType::from_import(Import::from_full_path("pendulum.DateTime")).custom();
        let fields = [DataModelField::new(
            FieldSpec::new("at", DataType::list_of(custom)).required(true),
            &options,
        )];
        let extras = ModelExtras::default();
        let input = ConfigInput {
            class_name: "Event",
            kind: ModelKind::Base,
            extras: &extras,
            fields: &fields,
            base_classes: &[],
        };
        let config = PydanticV2Flavor.derive_config(&input).unwrap();
        assert_eq!(config.get("arbitrary_types_allowed"), Some("True"));
    }
}
