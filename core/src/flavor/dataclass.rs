#![deny(missing_docs)]

//! # Dataclass Flavor
//!
//! Standard library `@dataclass` classes. There is no config block; root
//! models become plain type aliases.

use crate::field::DataModelField;
use crate::flavor::pydantic_v1::freeze_const;
use crate::flavor::ModelFlavor;
use crate::imports::{self, Import};
use crate::model::ModelKind;
use crate::python;
use crate::types::TypeScope;
use serde_json::Value as JsonValue;

/// Strategy for standard library dataclasses.
pub struct DataclassFlavor;

impl ModelFlavor for DataclassFlavor {
    fn name(&self) -> &'static str {
        "dataclasses.dataclass"
    }

    fn template_id(&self, kind: ModelKind) -> &'static str {
        match kind {
            ModelKind::Base => "dataclass.jinja2",
            ModelKind::Root => "dataclass_root.jinja2",
        }
    }

    fn default_base_class(&self, _kind: ModelKind) -> Option<Import> {
        None
    }

    fn decorators(&self, kind: ModelKind) -> Vec<String> {
        match kind {
            ModelKind::Base => vec!["@dataclass".to_string()],
            ModelKind::Root => Vec::new(),
        }
    }

    fn default_imports(&self, kind: ModelKind) -> Vec<Import> {
        match kind {
            ModelKind::Base => vec![imports::DATACLASS],
            ModelKind::Root => Vec::new(),
        }
    }

    fn process_const(&self, field: &mut DataModelField) {
        freeze_const(field);
    }

    /// `field(default_factory=...)` for explicit factories and mutable defaults.
    fn field_call(&self, field: &DataModelField, _scope: TypeScope<'_>) -> Option<String> {
        if field.required {
            return None;
        }
        let factory = match (field.extras.get("default_factory"), &field.default) {
            (Some(JsonValue::String(expr)), _) => expr.clone(),
            (Some(other), _) => python::repr(other),
            (None, Some(default @ (JsonValue::Array(_) | JsonValue::Object(_)))) => {
                format!("lambda: {}", python::repr(default))
            }
            _ => return None,
        };
        Some(format!("field(default_factory={})", factory))
    }

    fn field_import(&self) -> Option<Import> {
        Some(imports::DATACLASS_FIELD)
    }

    fn supports_annotated(&self) -> bool {
        false
    }

    /// Fields without defaults must precede fields with defaults.
    fn order_fields(&self, fields: &mut [DataModelField], scope: TypeScope<'_>) {
        fields.sort_by_cached_key(|f| f.assigns_value(scope));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationOptions;
    use crate::field::FieldSpec;
    use crate::flavor::OutputFlavor;
    use crate::reference::ReferenceArena;
    use crate::types::DataType;
    use serde_json::json;

    fn options() -> GenerationOptions {
        GenerationOptions {
            output_model_type: OutputFlavor::Dataclass,
            ..Default::default()
        }
    }

    #[test]
    fn test_mutable_default_uses_factory() {
        let options = options();
        let arena = ReferenceArena::new();
        let scope = TypeScope::new(&arena, options.type_options());
        let tags = DataModelField::new(
            FieldSpec::new("tags", DataType::list_of(DataType::primitive("str")))
                .default_value(json!(["a"])),
            &options,
        );
        assert_eq!(
            tags.field_call(scope).as_deref(),
            Some("field(default_factory=lambda: ['a'])")
        );
        assert!(tags.imports(scope).contains(&imports::DATACLASS_FIELD));

        let name = DataModelField::new(
            FieldSpec::new("name", DataType::primitive("str")).default_value(json!("x")),
            &options,
        );
        assert_eq!(name.field_call(scope), None);
    }

    #[test]
    fn test_no_annotated_form() {
        let options = GenerationOptions {
            use_annotated: true,
            ..options()
        };
        let arena = ReferenceArena::new();
        let scope = TypeScope::new(&arena, options.type_options());
        let field = DataModelField::new(
            FieldSpec::new("n", DataType::primitive("int")).extra("default_factory", json!("int")),
            &options,
        );
        assert_eq!(field.annotated(scope), None);
        assert_eq!(field.field_call(scope).as_deref(), Some("field(default_factory=int)"));
    }

    #[test]
    fn test_required_fields_first() {
        let options = options();
        let mut fields = vec![
            DataModelField::new(FieldSpec::new("a", DataType::primitive("int")), &options),
            DataModelField::new(
                FieldSpec::new("b", DataType::primitive("int")).required(true),
                &options,
            ),
            DataModelField::new(FieldSpec::new("c", DataType::primitive("int")), &options),
        ];
        let arena = ReferenceArena::new();
        DataclassFlavor.order_fields(&mut fields, TypeScope::new(&arena, options.type_options()));
        let names: Vec<_> = fields.iter().filter_map(|f| f.name.as_deref()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_required_nullable_field_counts_as_defaulted() {
        let options = options();
        let mut fields = vec![
            DataModelField::new(
                FieldSpec::new("a", DataType::primitive("int"))
                    .required(true)
                    .nullable(Some(true)),
                &options,
            ),
            DataModelField::new(
                FieldSpec::new("b", DataType::primitive("int")).required(true),
                &options,
            ),
        ];
        let arena = ReferenceArena::new();
        let scope = TypeScope::new(&arena, options.type_options());
        DataclassFlavor.order_fields(&mut fields, scope);
        let views: Vec<_> = fields.iter().map(|f| f.view(scope)).collect();
        assert_eq!(views[0].name, "b");
        assert!(!views[0].renders_default);
        assert_eq!(views[1].name, "a");
        assert!(views[1].renders_default);
    }
}
