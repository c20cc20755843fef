//! Field call rendering shared by both pydantic flavors.

use crate::constraints::ConstraintKind;
use crate::field::DataModelField;
use crate::python;
use crate::reference::RefId;
use crate::types::{DataType, TypeKind, TypeScope};
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

/// The points where pydantic 1 and 2 spell `Field(...)` differently.
pub(crate) struct FieldDialect {
    /// Extras never rendered as keyword arguments.
    pub excluded: &'static [&'static str],
    /// Keyword names `Field` accepts directly; `None` means any name.
    pub known_keys: Option<&'static [&'static str]>,
    /// Keyword used for regular expressions.
    pub pattern_arg: &'static str,
    /// `min_items`/`max_items` are spelled as length bounds.
    pub item_bounds_as_length: bool,
    /// `unique_items=` is supported.
    pub unique_items: bool,
    /// `const=True` marks frozen fields.
    pub const_marker: bool,
    /// A lone `example` becomes `examples=[...]`.
    pub examples_list: bool,
    /// An annotated field carries its default inside the call.
    pub default_in_annotated: bool,
    /// Class method that builds a model from a dict.
    pub parse_method: &'static str,
}

/// Renders `Field(...)` for a pydantic field, or `None` when there is nothing to say.
pub(crate) fn field_call(
    dialect: &FieldDialect,
    field: &DataModelField,
    scope: TypeScope<'_>,
) -> Option<String> {
    let mut extras: IndexMap<String, JsonValue> = field
        .extras
        .iter()
        .filter(|(k, v)| !dialect.excluded.contains(&k.as_str()) && !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if dialect.examples_list && !extras.contains_key("examples") {
        if let Some(example) = extras.shift_remove("example") {
            extras.insert("examples".to_string(), JsonValue::Array(vec![example]));
        }
    }
    if field.use_field_description {
        extras.shift_remove("description");
    }
    let default_factory = extras.shift_remove("default_factory");

    let mut schema_extra = Map::new();
    if let Some(known) = dialect.known_keys {
        let unknown: Vec<String> = extras
            .keys()
            .filter(|k| !known.contains(&k.as_str()))
            .cloned()
            .collect();
        for key in unknown {
            if let Some(value) = extras.shift_remove(&key) {
                schema_extra.insert(key, value);
            }
        }
    }

    let mut args: IndexMap<String, String> = extras
        .iter()
        .map(|(k, v)| (k.clone(), python::repr(v)))
        .collect();
    if !schema_extra.is_empty() {
        args.insert(
            "json_schema_extra".to_string(),
            python::repr(&JsonValue::Object(schema_extra)),
        );
    }
    if let Some(alias) = &field.alias {
        args.insert("alias".to_string(), python::str_repr(alias));
    }
    constraint_args(dialect, field, &mut args);
    if dialect.const_marker && field.is_const {
        args.insert("const".to_string(), python::bool_literal(true).to_string());
    }

    let factory = if field.required {
        None
    } else {
        match default_factory {
            Some(JsonValue::String(expr)) => Some(expr),
            Some(other) => Some(python::repr(&other)),
            None => model_default_factory(dialect, field, scope),
        }
    };

    let mut arguments: Vec<String> = args.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    arguments.sort();

    if arguments.is_empty() && factory.is_none() {
        if field.nullable == Some(true) && field.required {
            return Some("Field(...)".to_string());
        }
        return None;
    }

    let leading = if field.use_annotated && field.flavor.strategy().supports_annotated() {
        annotated_leading(dialect, field, factory)
    } else if field.required {
        Some("...".to_string())
    } else if let Some(factory) = factory {
        Some(format!("default_factory={}", factory))
    } else {
        Some(default_argument(field))
    };
    if let Some(leading) = leading {
        arguments.insert(0, leading);
    }
    Some(format!("Field({})", arguments.join(", ")))
}

fn default_argument(field: &DataModelField) -> String {
    let represented = field.represented_default();
    if field.use_default_kwarg {
        format!("default={}", represented)
    } else {
        represented
    }
}

/// Inside `Annotated[...]` the call only keeps the default when the dialect
/// moves it there.
fn annotated_leading(
    dialect: &FieldDialect,
    field: &DataModelField,
    factory: Option<String>,
) -> Option<String> {
    if !dialect.default_in_annotated {
        return None;
    }
    if let Some(factory) = factory {
        return Some(format!("default_factory={}", factory));
    }
    if !field.required || field.is_const {
        return Some(default_argument(field));
    }
    None
}

fn constraint_args(dialect: &FieldDialect, field: &DataModelField, args: &mut IndexMap<String, String>) {
    let Some(constraints) = &field.constraints else {
        return;
    };
    if field.self_reference() || field.data_type.strict {
        return;
    }
    let data_types: Vec<_> = field.data_type.all_data_types().collect();
    if data_types.iter().any(|d| d.is_any()) {
        return;
    }
    let is_float = data_types.iter().any(|d| d.type_name() == Some("float"));
    for (kind, value) in constraints.iter() {
        let name = match kind {
            ConstraintKind::Pattern => dialect.pattern_arg,
            ConstraintKind::UniqueItems if !dialect.unique_items => continue,
            ConstraintKind::MinItems if dialect.item_bounds_as_length => "min_length",
            ConstraintKind::MaxItems if dialect.item_bounds_as_length => "max_length",
            other => other.argument_name(),
        };
        let value = if kind.is_comparison() {
            value.coerced(is_float)
        } else {
            value.clone()
        };
        args.insert(name.to_string(), value.to_python());
    }
}

/// `lambda: Model.parse(...)` for an object default on a model-typed field.
fn model_default_factory(
    dialect: &FieldDialect,
    field: &DataModelField,
    scope: TypeScope<'_>,
) -> Option<String> {
    let render = |id: RefId, value: &JsonValue| {
        format!(
            "{}.{}({})",
            scope.lookup.reference(id).short_name(),
            dialect.parse_method,
            python::repr(value)
        )
    };
    match field.default.as_ref()? {
        default @ JsonValue::Object(_) => {
            let target = direct_reference(&field.data_type)?;
            Some(format!("lambda: {}", render(target, default)))
        }
        JsonValue::Array(items) if !items.is_empty() && items.iter().all(JsonValue::is_object) => {
            let TypeKind::Container { item, .. } = &field.data_type.kind else {
                return None;
            };
            let target = direct_reference(item)?;
            let inner: Vec<String> = items.iter().map(|v| render(target, v)).collect();
            Some(format!("lambda: [{}]", inner.join(", ")))
        }
        _ => None,
    }
}

fn direct_reference(data_type: &DataType) -> Option<RefId> {
    match &data_type.kind {
        TypeKind::Reference(id) => Some(*id),
        TypeKind::Union(members) => members.iter().find_map(DataType::reference_id),
        _ => None,
    }
}
