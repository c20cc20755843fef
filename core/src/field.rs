//! # Field Entities
//!
//! One member of a generated type. The effective type hint, the import list
//! and the docstring are computed from the current attributes on demand; the
//! only post-construction mutation is the constant-freezing step run by
//! [`DataModelField::new`].

use crate::config::GenerationOptions;
use crate::constraints::ConstraintSet;
use crate::flavor::OutputFlavor;
use crate::imports::{self, Import};
use crate::python;
use crate::reference::{ModelId, RefId};
use crate::types::{optional_type, DataType, TypeScope, NONE};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// The attributes the schema front-end supplies for one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSpec {
    /// Attribute name; `None` for anonymous/root fields.
    pub name: Option<String>,
    /// The name before sanitizing, when it differs.
    pub original_name: Option<String>,
    /// Default value; `Some(Null)` is an explicit `None` default.
    pub default: Option<JsonValue>,
    /// Whether the field must be supplied.
    pub required: bool,
    /// Serialized name.
    pub alias: Option<String>,
    /// Tri-state nullability; `None` means infer.
    pub nullable: Option<bool>,
    /// The resolved type.
    pub data_type: DataType,
    /// Validation constraints.
    pub constraints: Option<ConstraintSet>,
    /// Free-form keyword extras (`description`, `const`, `default_factory`,
    /// `examples`, `title`, ...).
    pub extras: IndexMap<String, JsonValue>,
}

impl FieldSpec {
    /// A named field of the given type.
    pub fn new(name: &str, data_type: DataType) -> Self {
        FieldSpec {
            name: Some(name.to_string()),
            data_type,
            ..Default::default()
        }
    }

    /// Sets `required`.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the explicit nullability.
    pub fn nullable(mut self, nullable: Option<bool>) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the constraint set.
    pub fn constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Adds one extra.
    pub fn extra(mut self, key: &str, value: JsonValue) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }
}

/// A built field, owned by exactly one model.
#[derive(Debug, Clone, PartialEq)]
pub struct DataModelField {
    /// Attribute name; `None` for anonymous/root fields.
    pub name: Option<String>,
    /// The name before sanitizing, when it differs.
    pub original_name: Option<String>,
    /// Default value; `None` when no default was given.
    pub default: Option<JsonValue>,
    /// Whether the field must be supplied.
    pub required: bool,
    /// Serialized name.
    pub alias: Option<String>,
    /// Tri-state nullability.
    pub nullable: Option<bool>,
    /// The resolved type.
    pub data_type: DataType,
    /// Validation constraints.
    pub constraints: Option<ConstraintSet>,
    /// Free-form keyword extras.
    pub extras: IndexMap<String, JsonValue>,
    /// Frozen to a constant value.
    pub is_const: bool,
    /// Render metadata as `Annotated[T, Field(...)]`.
    pub use_annotated: bool,
    /// Render defaults as `default=...`.
    pub use_default_kwarg: bool,
    /// Do not render `= None`.
    pub strip_default_none: bool,
    /// Render the description as a docstring.
    pub use_field_description: bool,
    /// Non-required fields with unset nullability are optional.
    pub fall_back_to_nullable: bool,
    /// The output flavor this field renders for.
    pub flavor: OutputFlavor,
    pub(crate) parent: Option<ModelId>,
    pub(crate) parent_ref: Option<RefId>,
}

impl DataModelField {
    /// Builds a field from its spec and applies the constant-freezing step.
    pub fn new(spec: FieldSpec, options: &GenerationOptions) -> Self {
        let mut field = DataModelField {
            name: spec.name,
            original_name: spec.original_name,
            default: spec.default,
            required: spec.required,
            alias: spec.alias,
            nullable: spec.nullable,
            data_type: spec.data_type,
            constraints: spec.constraints,
            extras: spec.extras,
            is_const: false,
            use_annotated: options.use_annotated,
            use_default_kwarg: options.use_default_kwarg,
            strip_default_none: options.strip_default_none,
            use_field_description: options.use_field_description,
            fall_back_to_nullable: options.fall_back_to_nullable(),
            flavor: options.output_model_type,
            parent: None,
            parent_ref: None,
        };
        field.process_const();
        if options.use_one_literal_as_default {
            field.apply_one_literal_default();
        }
        field
    }

    /// Freezes default/required/nullable when a `const` extra is present.
    fn process_const(&mut self) {
        if !self.extras.contains_key("const") {
            return;
        }
        self.flavor.strategy().process_const(self);
    }

    fn apply_one_literal_default(&mut self) {
        let literal = match self.data_type.literals() {
            Some([single]) if self.required => single.clone(),
            _ => return,
        };
        self.default = Some(literal);
        self.required = false;
        if self.nullable != Some(true) {
            self.nullable = Some(false);
        }
    }

    /// The model this field belongs to, once attached.
    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    /// The `const` extra, if any.
    pub fn const_value(&self) -> Option<&JsonValue> {
        self.extras.get("const")
    }

    /// Whether a `default_factory` extra is set.
    pub fn has_default_factory(&self) -> bool {
        self.extras.contains_key("default_factory")
    }

    /// Whether the field's type points back at its own model.
    pub fn self_reference(&self) -> bool {
        match self.parent_ref {
            Some(parent) => self.data_type.references().any(|r| r == parent),
            None => false,
        }
    }

    /// Whether the field-level rules wrap the raw hint as optional.
    fn wraps_optional(&self, scope: TypeScope<'_>) -> bool {
        if self.has_default_factory()
            || (self.data_type.renders_optional(scope) && !self.data_type.renders_any(scope))
        {
            return false;
        }
        match self.nullable {
            Some(nullable) => nullable,
            None => !self.required && self.fall_back_to_nullable,
        }
    }

    /// The effective type hint.
    ///
    /// Priority: no hint → `None`; default factory or an already-optional
    /// non-`Any` type → raw hint; explicit nullability → honored; required or
    /// fallback disabled → raw hint; otherwise optional-wrapped.
    pub fn type_hint(&self, scope: TypeScope<'_>) -> String {
        let raw = self.data_type.type_hint(scope);
        if raw.is_empty() {
            return NONE.to_string();
        }
        if self.wraps_optional(scope) {
            optional_type(&raw, scope.options.use_union_operator)
        } else {
            raw
        }
    }

    /// Imports needed by this field, deduplicated in order of first appearance.
    pub fn imports(&self, scope: TypeScope<'_>) -> Vec<Import> {
        let use_union_operator = scope.options.use_union_operator;
        let hint = self.type_hint(scope);
        let has_union = !use_union_operator && hint.contains("Union[");

        let mut out: Vec<Import> = self
            .data_type
            .all_imports(scope)
            .into_iter()
            .filter(|i| has_union || *i != imports::UNION)
            .collect();

        if self.wraps_optional(scope) && !use_union_operator {
            out.push(imports::OPTIONAL);
        }
        if self.use_annotated && self.annotated(scope).is_some() {
            out.push(if scope.options.target.has_annotated_type() {
                imports::ANNOTATED
            } else {
                imports::ANNOTATED_BACKPORT
            });
        }
        if self.field_call(scope).is_some() {
            out.extend(self.flavor.strategy().field_import());
        }
        imports::unique_imports(out)
    }

    /// The flavor's field call (`Field(...)`, `field(...)`), if any.
    pub fn field_call(&self, scope: TypeScope<'_>) -> Option<String> {
        self.flavor
            .strategy()
            .field_call(self, scope)
            .filter(|call| !call.is_empty())
    }

    /// `Annotated[hint, call]` when annotated rendering is on and there is metadata.
    pub fn annotated(&self, scope: TypeScope<'_>) -> Option<String> {
        if !self.use_annotated || !self.flavor.strategy().supports_annotated() {
            return None;
        }
        let call = self.field_call(scope)?;
        Some(format!("Annotated[{}, {}]", self.type_hint(scope), call))
    }

    /// Python `repr` of the default (`None` when absent).
    pub fn represented_default(&self) -> String {
        python::repr(self.default.as_ref().unwrap_or(&JsonValue::Null))
    }

    /// The description, when descriptions render as docstrings.
    pub fn docstring(&self) -> Option<String> {
        if !self.use_field_description {
            return None;
        }
        match self.extras.get("description") {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    /// The pattern from the constraint set, or from a call-style type's kwargs.
    pub fn pattern(&self) -> Option<&str> {
        self.constraints
            .as_ref()
            .and_then(ConstraintSet::pattern)
            .or_else(|| {
                self.data_type
                    .kwargs()
                    .and_then(|k| k.get("pattern"))
                    .map(String::as_str)
            })
    }

    /// Whether the rendered attribute assigns anything (`= default` or a field call).
    pub fn assigns_value(&self, scope: TypeScope<'_>) -> bool {
        let view = self.view(scope);
        view.renders_default || (view.annotated.is_none() && view.field.is_some())
    }

    /// The values a template sees for this field.
    pub fn view(&self, scope: TypeScope<'_>) -> FieldView {
        let type_hint = self.type_hint(scope);
        let annotated = self.annotated(scope);
        let field = self.field_call(scope);
        let represented_default = self.represented_default();
        let optional = self.data_type.renders_optional(scope);
        let wants_default = !self.required || optional || self.nullable == Some(true);
        let assigns_call = annotated.is_none() && field.is_some();
        let default_in_annotation =
            annotated.is_some() && self.flavor.strategy().annotated_default_in_call();
        let renders_default = wants_default
            && !assigns_call
            && !default_in_annotation
            && !(self.strip_default_none && represented_default == NONE);
        FieldView {
            name: self.name.clone().unwrap_or_default(),
            alias: self.alias.clone(),
            type_hint,
            field,
            annotated,
            required: self.required,
            nullable: self.nullable,
            is_optional: optional,
            represented_default,
            renders_default,
            strip_default_none: self.strip_default_none,
            docstring: self.docstring(),
        }
    }
}

/// A template-facing, fully rendered view of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    /// Attribute name (empty for anonymous fields).
    pub name: String,
    /// Serialized name.
    pub alias: Option<String>,
    /// Effective type hint.
    pub type_hint: String,
    /// Field call, if any.
    pub field: Option<String>,
    /// `Annotated[...]` form, if any.
    pub annotated: Option<String>,
    /// Whether the field is required.
    pub required: bool,
    /// Tri-state nullability.
    pub nullable: Option<bool>,
    /// Whether the type itself renders optional.
    pub is_optional: bool,
    /// `repr` of the default.
    pub represented_default: String,
    /// Whether `= <default>` follows the hint.
    pub renders_default: bool,
    /// Whether `None` defaults are stripped.
    pub strip_default_none: bool,
    /// Docstring, if any.
    pub docstring: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceArena;
    use serde_json::json;

    fn opts() -> GenerationOptions {
        GenerationOptions::default()
    }

    fn scope<'a>(arena: &'a ReferenceArena, options: &GenerationOptions) -> TypeScope<'a> {
        TypeScope::new(arena, options.type_options())
    }

    fn string_field(required: bool, nullable: Option<bool>) -> FieldSpec {
        FieldSpec::new("name", DataType::primitive("str"))
            .required(required)
            .nullable(nullable)
    }

    #[test]
    fn test_optional_fallback_for_non_required() {
        let arena = ReferenceArena::new();
        let o = opts();
        let field = DataModelField::new(string_field(false, None), &o);
        assert_eq!(field.type_hint(scope(&arena, &o)), "Optional[str]");
        assert!(field.imports(scope(&arena, &o)).contains(&imports::OPTIONAL));
    }

    #[test]
    fn test_required_field_is_not_wrapped() {
        let arena = ReferenceArena::new();
        let o = opts();
        let field = DataModelField::new(string_field(true, None), &o);
        assert_eq!(field.type_hint(scope(&arena, &o)), "str");
        assert!(field.imports(scope(&arena, &o)).is_empty());
    }

    #[test]
    fn test_explicit_not_nullable_is_never_wrapped() {
        let arena = ReferenceArena::new();
        let o = opts();
        for required in [true, false] {
            let field = DataModelField::new(string_field(required, Some(false)), &o);
            assert_eq!(field.type_hint(scope(&arena, &o)), "str");
        }
    }

    #[test]
    fn test_explicit_nullable_wins_over_required() {
        let arena = ReferenceArena::new();
        let o = opts();
        let field = DataModelField::new(string_field(true, Some(true)), &o);
        assert_eq!(field.type_hint(scope(&arena, &o)), "Optional[str]");
    }

    #[test]
    fn test_strict_nullable_disables_fallback() {
        let arena = ReferenceArena::new();
        let o = GenerationOptions {
            strict_nullable: true,
            ..opts()
        };
        let field = DataModelField::new(string_field(false, None), &o);
        assert_eq!(field.type_hint(scope(&arena, &o)), "str");
    }

    #[test]
    fn test_default_factory_suppresses_wrapping() {
        let arena = ReferenceArena::new();
        let o = opts();
        let spec = FieldSpec::new("tags", DataType::list_of(DataType::primitive("str")))
            .extra("default_factory", json!("list"));
        let field = DataModelField::new(spec, &o);
        let s = scope(&arena, &o);
        assert_eq!(field.type_hint(s), "List[str]");
        assert_eq!(field.field_call(s).as_deref(), Some("Field(default_factory=list)"));
    }

    #[test]
    fn test_already_optional_type_not_double_wrapped() {
        let arena = ReferenceArena::new();
        let o = opts();
        let spec = FieldSpec::new("n", DataType::primitive("int").optional());
        let field = DataModelField::new(spec, &o);
        assert_eq!(field.type_hint(scope(&arena, &o)), "Optional[int]");
    }

    #[test]
    fn test_empty_hint_yields_none() {
        let arena = ReferenceArena::new();
        let o = opts();
        let field = DataModelField::new(FieldSpec::new("x", DataType::default()), &o);
        assert_eq!(field.type_hint(scope(&arena, &o)), "None");
    }

    #[test]
    fn test_union_import_dropped_when_hint_has_no_union() {
        let arena = ReferenceArena::new();
        let o = opts();
        let ty = DataType::union(vec![DataType::primitive("str"), DataType::primitive("str")]);
        let field = DataModelField::new(FieldSpec::new("u", ty).required(true), &o);
        let s = scope(&arena, &o);
        assert_eq!(field.type_hint(s), "str");
        assert!(!field.imports(s).contains(&imports::UNION));
    }

    #[test]
    fn test_annotated_import_follows_target() {
        let arena = ReferenceArena::new();
        let o = GenerationOptions {
            use_annotated: true,
            target_python_version: crate::config::PythonVersion::Py38,
            ..opts()
        };
        let spec = FieldSpec::new("name", DataType::primitive("str"))
            .required(true)
            .extra("title", json!("Name"));
        let field = DataModelField::new(spec, &o);
        let s = scope(&arena, &o);
        assert_eq!(
            field.annotated(s).as_deref(),
            Some("Annotated[str, Field(title='Name')]")
        );
        let imports = field.imports(s);
        assert!(imports.contains(&imports::ANNOTATED_BACKPORT));
        assert!(imports.contains(&imports::FIELD));

        // no metadata, no Annotated import
        let plain = DataModelField::new(string_field(true, None), &o);
        assert!(plain.imports(s).is_empty());
    }

    #[test]
    fn test_const_freezes_field() {
        let o = opts();
        let spec = FieldSpec::new("kind", DataType::primitive("str"))
            .required(true)
            .extra("const", json!("dog"));
        let field = DataModelField::new(spec, &o);
        assert!(field.is_const);
        assert_eq!(field.nullable, Some(false));
        assert_eq!(field.default, Some(json!("dog")));
        assert_eq!(field.data_type.literals(), Some(&[json!("dog")][..]));
    }

    #[test]
    fn test_one_literal_as_default() {
        let o = GenerationOptions {
            use_one_literal_as_default: true,
            ..opts()
        };
        let spec = FieldSpec::new("kind", DataType::literal(vec![json!("cat")])).required(true);
        let field = DataModelField::new(spec, &o);
        assert!(!field.required);
        assert_eq!(field.default, Some(json!("cat")));
        assert_eq!(field.nullable, Some(false));
    }

    #[test]
    fn test_docstring_only_with_field_description() {
        let spec = FieldSpec::new("a", DataType::primitive("int")).extra("description", json!("An a"));
        let off = DataModelField::new(spec.clone(), &opts());
        assert_eq!(off.docstring(), None);
        let on = DataModelField::new(
            spec,
            &GenerationOptions {
                use_field_description: true,
                ..opts()
            },
        );
        assert_eq!(on.docstring().as_deref(), Some("An a"));
    }
}
