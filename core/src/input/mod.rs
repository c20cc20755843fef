#![deny(missing_docs)]

//! # Input Adapters
//!
//! Front-ends that lower an input document into model specs against a
//! [`ModelGraph`]'s reference arena.
//!
//! Two adapters exist:
//! - [`ModelsDocument`]: an explicit list of model definitions with type expressions.
//! - [`JsonSchemaDocument`]: object definitions written as JSON Schema.

/// Explicit model definition documents.
pub mod document;

/// JSON Schema lowering.
pub mod jsonschema;

pub use document::ModelsDocument;
pub use jsonschema::JsonSchemaDocument;

use crate::constraints::ConstraintSet;
use crate::error::{AppError, AppResult};
use crate::model::{ModelGraph, ModelKind, ModelSpec};
use crate::reference::RefId;
use crate::registry::TypeRegistry;
use crate::types::{DataType, TypeKind};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Which adapter reads the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFileType {
    /// JSON Schema object definitions.
    #[default]
    JsonSchema,
    /// Explicit model definitions.
    Models,
}

impl Display for InputFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFileType::JsonSchema => write!(f, "jsonschema"),
            InputFileType::Models => write!(f, "models"),
        }
    }
}

impl FromStr for InputFileType {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "jsonschema" => Ok(InputFileType::JsonSchema),
            "models" => Ok(InputFileType::Models),
            other => Err(AppError::Config(format!("Unknown input file type: {}", other))),
        }
    }
}

/// A front-end that turns a parsed document into model specs.
///
/// References for every model are allocated in the graph's arena before any
/// spec is returned, so specs may point at each other freely.
pub trait SchemaSource {
    /// Lowers the document. Specs are returned in input order.
    fn lower(&self, graph: &mut ModelGraph, registry: &TypeRegistry) -> AppResult<Vec<ModelSpec>>;
}

/// Parses JSON or YAML text into a JSON value.
pub fn parse_text(text: &str) -> AppResult<JsonValue> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Reads `text` with the adapter selected by `file_type`.
pub fn load_source(file_type: InputFileType, text: &str) -> AppResult<Box<dyn SchemaSource>> {
    let value = parse_text(text)?;
    Ok(match file_type {
        InputFileType::JsonSchema => Box::new(JsonSchemaDocument::from_value(value)?),
        InputFileType::Models => Box::new(ModelsDocument::from_value(value)?),
    })
}

/// Inlines root models that wrap a reference-free type.
///
/// Every reference to such a model is replaced by the wrapped type (keeping
/// the reference's own optionality); a field that pointed directly at the
/// model also inherits its constraints, with the field's own values winning.
/// The inlined models are removed from `specs`.
pub fn collapse_root_models(specs: Vec<ModelSpec>) -> Vec<ModelSpec> {
    let mut inlined: HashMap<RefId, (DataType, Option<ConstraintSet>)> = HashMap::new();
    for spec in &specs {
        let (Some(reference), ModelKind::Root, [field]) =
            (spec.reference, spec.kind, spec.fields.as_slice())
        else {
            continue;
        };
        if spec.nullable || field.data_type.references().next().is_some() {
            continue;
        }
        inlined.insert(reference, (field.data_type.clone(), field.constraints.clone()));
    }
    if inlined.is_empty() {
        return specs;
    }
    debug!(count = inlined.len(), "Collapsing root models");

    specs
        .into_iter()
        .filter(|spec| spec.reference.map_or(true, |r| !inlined.contains_key(&r)))
        .map(|mut spec| {
            for field in &mut spec.fields {
                if let Some((_, constraints)) =
                    field.data_type.reference_id().and_then(|r| inlined.get(&r))
                {
                    field.constraints =
                        ConstraintSet::merge(constraints.as_ref(), field.constraints.as_ref());
                }
                inline_references(&mut field.data_type, &inlined);
            }
            spec
        })
        .collect()
}

fn inline_references(
    data_type: &mut DataType,
    inlined: &HashMap<RefId, (DataType, Option<ConstraintSet>)>,
) {
    match &mut data_type.kind {
        TypeKind::Reference(id) => {
            let id = *id;
            if let Some((wrapped, _)) = inlined.get(&id) {
                let optional = data_type.is_optional;
                *data_type = wrapped.clone();
                data_type.is_optional |= optional;
            }
        }
        TypeKind::Container { item, key, .. } => {
            inline_references(item, inlined);
            if let Some(key) = key {
                inline_references(key, inlined);
            }
        }
        TypeKind::Union(members) => {
            for member in members {
                inline_references(member, inlined);
            }
        }
        _ => {}
    }
}

/// Builds every spec into the graph, in order.
pub fn build_models(graph: &mut ModelGraph, specs: Vec<ModelSpec>) -> AppResult<()> {
    let specs = if graph.options().collapse_root_models {
        collapse_root_models(specs)
    } else {
        specs
    };
    for spec in specs {
        graph.add_model(spec)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationOptions;
    use crate::constraints::{ConstraintKind, ConstraintValue};
    use crate::extras::ExtraTemplateData;
    use crate::field::FieldSpec;

    #[test]
    fn test_parse_text_json_and_yaml() {
        assert_eq!(parse_text("{\"a\": 1}").unwrap()["a"], 1);
        assert_eq!(parse_text("a: 1\nb: [x]\n").unwrap()["b"][0], "x");
        assert!(matches!(parse_text("{").unwrap_err(), AppError::Input(_)));
    }

    #[test]
    fn test_input_file_type_parse() {
        assert_eq!("models".parse::<InputFileType>().unwrap(), InputFileType::Models);
        assert_eq!(InputFileType::JsonSchema.to_string(), "jsonschema");
        assert!("openapi".parse::<InputFileType>().is_err());
    }

    #[test]
    fn test_collapse_root_models() {
        let mut graph = ModelGraph::new(GenerationOptions::default(), ExtraTemplateData::new());
        let name = graph.reference("#/Name", "Name");
        let pet = graph.reference("#/Pet", "Pet");
        let name_field = FieldSpec {
            data_type: DataType::primitive("str"),
            required: true,
            constraints: Some(
                ConstraintSet::new().with(ConstraintKind::MinLength, ConstraintValue::Count(1)),
            ),
            ..Default::default()
        };
        let specs = vec![
            ModelSpec::root(name, name_field),
            ModelSpec::new(
                pet,
                vec![
                    FieldSpec::new("name", DataType::reference(name)).required(true),
                    FieldSpec::new("aliases", DataType::list_of(DataType::reference(name))),
                ],
            ),
        ];
        let collapsed = collapse_root_models(specs);
        assert_eq!(collapsed.len(), 1);
        let fields = &collapsed[0].fields;
        assert_eq!(fields[0].data_type, DataType::primitive("str"));
        assert!(fields[0].constraints.as_ref().unwrap().has_constraints());
        assert_eq!(fields[1].data_type, DataType::list_of(DataType::primitive("str")));
        assert_eq!(fields[1].constraints, None);
    }
}
