#![deny(missing_docs)]

//! # JSON Schema Lowering
//!
//! Lowers JSON Schema object definitions into model specs.
//!
//! Handles:
//! - The root object plus `$defs`/`definitions`, referenced through `$ref`.
//! - Primitive types and string formats, or custom types from the registry.
//! - Inline objects, which become their own models (`<Parent><Field>`, and
//!   `<Parent><Field>Item` for array items).
//! - `enum`/`const`, `anyOf`/`oneOf` unions and `allOf` inheritance.
//! - Nullability via `nullable` or a `"null"` member of `type`.
//! - Property names that are not identifiers, which keep their original
//!   spelling as alias.

use crate::constraints::ConstraintSet;
use crate::error::{AppError, AppResult};
use crate::field::FieldSpec;
use crate::flavor::OutputFlavor;
use crate::imports::Import;
use crate::input::SchemaSource;
use crate::model::{ModelGraph, ModelSpec};
use crate::python;
use crate::reference::RefId;
use crate::registry::TypeRegistry;
use crate::types::DataType;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Keyword naming a custom type for a schema node.
pub const PYTHON_TYPE_KEY: &str = "x-python-type";

/// Field keywords passed through as field extras.
const FIELD_EXTRA_KEYS: &[&str] = &["examples", "example", "deprecated"];

/// A JSON Schema document.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaDocument {
    /// The root schema.
    pub schema: JsonSchemaObject,
}

/// `type`: one name or a list of names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaTypes {
    /// `"type": "string"`
    One(String),
    /// `"type": ["string", "null"]`
    Many(Vec<String>),
}

/// `items`: one schema or a tuple of schemas.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaItems {
    /// Every item has this schema.
    Single(Box<JsonSchemaObject>),
    /// Positional item schemas.
    Tuple(Vec<JsonSchemaObject>),
}

/// `additionalProperties`: a flag or a value schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` / `false`
    Flag(bool),
    /// Values must match this schema.
    Schema(Box<JsonSchemaObject>),
}

/// One schema node. Keywords the lowering does not name are kept in
/// `keywords` (constraints, examples, vendor extensions).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonSchemaObject {
    /// `$ref`
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// `type`
    #[serde(rename = "type")]
    pub types: Option<SchemaTypes>,
    /// `title`
    pub title: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `format`
    pub format: Option<String>,
    /// `properties`
    pub properties: IndexMap<String, JsonSchemaObject>,
    /// `required`
    pub required: Vec<String>,
    /// `items`
    pub items: Option<SchemaItems>,
    /// `additionalProperties`
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties>,
    /// `enum`
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<JsonValue>>,
    /// `const`; an explicit `null` is kept.
    #[serde(rename = "const", deserialize_with = "present")]
    pub const_value: Option<JsonValue>,
    /// `default`; an explicit `null` is kept.
    #[serde(deserialize_with = "present")]
    pub default: Option<JsonValue>,
    /// OpenAPI-style `nullable`.
    pub nullable: bool,
    /// `anyOf`
    #[serde(rename = "anyOf")]
    pub any_of: Vec<JsonSchemaObject>,
    /// `oneOf`
    #[serde(rename = "oneOf")]
    pub one_of: Vec<JsonSchemaObject>,
    /// `allOf`
    #[serde(rename = "allOf")]
    pub all_of: Vec<JsonSchemaObject>,
    /// `$defs`
    #[serde(rename = "$defs")]
    pub defs: IndexMap<String, JsonSchemaObject>,
    /// `definitions`
    pub definitions: IndexMap<String, JsonSchemaObject>,
    /// Everything else.
    #[serde(flatten)]
    pub keywords: IndexMap<String, JsonValue>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

impl JsonSchemaObject {
    /// Declared type names, in order.
    pub fn type_names(&self) -> Vec<&str> {
        match &self.types {
            Some(SchemaTypes::One(t)) => vec![t.as_str()],
            Some(SchemaTypes::Many(ts)) => ts.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// `nullable: true`, or `"null"` among several declared types.
    pub fn is_nullable(&self) -> bool {
        let types = self.type_names();
        self.nullable || (types.len() > 1 && types.contains(&"null"))
    }

    /// Whether this node defines a class (properties or `allOf` composition).
    pub fn is_object_model(&self) -> bool {
        !self.properties.is_empty() || !self.all_of.is_empty()
    }

    /// A node that only carries definitions.
    fn is_container_only(&self) -> bool {
        self.reference.is_none()
            && self.types.is_none()
            && self.properties.is_empty()
            && self.items.is_none()
            && self.enum_values.is_none()
            && self.const_value.is_none()
            && self.any_of.is_empty()
            && self.one_of.is_empty()
            && self.all_of.is_empty()
    }

    fn additional_properties_flag(&self) -> Option<bool> {
        match &self.additional_properties {
            Some(AdditionalProperties::Flag(flag)) => Some(*flag),
            Some(AdditionalProperties::Schema(_)) => Some(true),
            None => None,
        }
    }
}

impl JsonSchemaDocument {
    /// Reads a document from an already parsed value.
    pub fn from_value(value: JsonValue) -> AppResult<Self> {
        let schema = serde_json::from_value(value)
            .map_err(|e| AppError::Input(format!("Invalid JSON Schema: {}", e)))?;
        Ok(JsonSchemaDocument { schema })
    }

    /// The definition sections with their pointer prefixes.
    fn sections(&self) -> [(&'static str, &IndexMap<String, JsonSchemaObject>); 2] {
        [
            ("#/$defs/", &self.schema.defs),
            ("#/definitions/", &self.schema.definitions),
        ]
    }
}

impl SchemaSource for JsonSchemaDocument {
    fn lower(&self, graph: &mut ModelGraph, registry: &TypeRegistry) -> AppResult<Vec<ModelSpec>> {
        let emit_root = !self.schema.is_container_only();
        let root_name = graph
            .options()
            .class_name
            .clone()
            .or_else(|| self.schema.title.as_deref().map(class_name))
            .unwrap_or_else(|| "Model".to_string());

        let mut known = HashMap::new();
        let root = emit_root.then(|| graph.reference("#", &root_name));
        if let Some(root) = root {
            known.insert("#".to_string(), root);
        }
        for (prefix, section) in self.sections() {
            for key in section.keys() {
                let path = format!("{}{}", prefix, key);
                let id = graph.reference(&path, &class_name(key));
                known.insert(path, id);
            }
        }

        let mut lowering = Lowering {
            item_bounds_as_length: graph.flavor().item_bounds_as_length(),
            graph,
            registry,
            known,
            specs: Vec::new(),
        };
        if let Some(root) = root {
            lowering.lower_definition(root, "#", &self.schema)?;
        }
        for (prefix, section) in self.sections() {
            for (key, schema) in section {
                let path = format!("{}{}", prefix, key);
                let reference = lowering.known[&path];
                lowering.lower_definition(reference, &path, schema)?;
            }
        }
        debug!(models = lowering.specs.len(), "Lowered JSON Schema");
        Ok(lowering.specs)
    }
}

struct Lowering<'g, 'r> {
    graph: &'g mut ModelGraph,
    registry: &'r TypeRegistry,
    known: HashMap<String, RefId>,
    specs: Vec<ModelSpec>,
    item_bounds_as_length: bool,
}

impl Lowering<'_, '_> {
    fn resolve_ref(&self, pointer: &str) -> AppResult<RefId> {
        self.known
            .get(pointer)
            .copied()
            .ok_or_else(|| AppError::Input(format!("Unresolvable reference: {}", pointer)))
    }

    fn constraints(&self, schema: &JsonSchemaObject) -> Option<ConstraintSet> {
        let set = ConstraintSet::from_keywords(&schema.keywords, self.item_bounds_as_length);
        set.has_constraints().then_some(set)
    }

    fn description(&self, schema: &JsonSchemaObject) -> Option<String> {
        if self.graph.options().use_schema_description {
            schema.description.clone()
        } else {
            None
        }
    }

    fn lower_definition(
        &mut self,
        reference: RefId,
        path: &str,
        schema: &JsonSchemaObject,
    ) -> AppResult<()> {
        if schema.is_object_model() {
            return self.lower_object(reference, path, schema);
        }
        let name = self.graph.references().get(reference).short_name().to_string();
        let mut data_type = self.lower_type(schema, path, &name)?;
        if schema.is_nullable() {
            data_type = data_type.optional();
        }
        let field = FieldSpec {
            default: schema.default.clone(),
            required: schema.default.is_none(),
            data_type,
            constraints: self.constraints(schema),
            ..Default::default()
        };
        let spec = ModelSpec {
            nullable: schema.is_nullable(),
            description: self.description(schema),
            ..ModelSpec::root(reference, field)
        };
        self.specs.push(spec);
        Ok(())
    }

    fn lower_object(
        &mut self,
        reference: RefId,
        path: &str,
        schema: &JsonSchemaObject,
    ) -> AppResult<()> {
        let (owner, display_name) = {
            let r = self.graph.references().get(reference);
            (r.short_name().to_string(), r.name.clone())
        };

        let mut base_classes = Vec::new();
        let mut parts = vec![schema];
        for member in &schema.all_of {
            match &member.reference {
                Some(pointer) if member.properties.is_empty() => {
                    base_classes.push(self.resolve_ref(pointer)?)
                }
                _ => parts.push(member),
            }
        }
        let required: HashSet<&str> = parts
            .iter()
            .flat_map(|p| p.required.iter().map(String::as_str))
            .collect();

        let mut fields = Vec::new();
        for part in &parts {
            for (name, property) in &part.properties {
                let is_required = required.contains(name.as_str());
                fields.push(self.lower_property(&owner, path, name, property, is_required)?);
            }
        }

        if let Some(flag) = schema.additional_properties_flag() {
            self.graph
                .extras_mut()
                .model_mut(&display_name)
                .additional_properties
                .get_or_insert(flag);
        }

        self.specs.push(ModelSpec {
            reference: Some(reference),
            fields,
            base_classes,
            description: self.description(schema),
            ..Default::default()
        });
        Ok(())
    }

    fn lower_property(
        &mut self,
        owner: &str,
        owner_path: &str,
        name: &str,
        schema: &JsonSchemaObject,
        required: bool,
    ) -> AppResult<FieldSpec> {
        let path = format!("{}/properties/{}", owner_path, name);
        let suggested = format!("{}{}", owner, class_name(name));
        let data_type = self.lower_type(schema, &path, &suggested)?;

        let attribute = field_name(name);
        let alias = (attribute != name).then(|| name.to_string());

        let mut extras = IndexMap::new();
        if let Some(description) = &schema.description {
            extras.insert("description".to_string(), JsonValue::String(description.clone()));
        }
        for key in FIELD_EXTRA_KEYS {
            if let Some(value) = schema.keywords.get(*key) {
                extras.insert(key.to_string(), value.clone());
            }
        }
        if let Some(value) = &schema.const_value {
            extras.insert("const".to_string(), value.clone());
        }

        Ok(FieldSpec {
            name: Some(attribute),
            original_name: alias.clone(),
            default: schema.default.clone(),
            required,
            alias,
            nullable: schema.is_nullable().then_some(true),
            data_type,
            constraints: self.constraints(schema),
            extras,
        })
    }

    fn lower_type(
        &mut self,
        schema: &JsonSchemaObject,
        path: &str,
        suggested: &str,
    ) -> AppResult<DataType> {
        if let Some(pointer) = &schema.reference {
            return Ok(DataType::reference(self.resolve_ref(pointer)?));
        }
        if let Some(custom) = self.python_type(schema) {
            return Ok(custom);
        }
        if let Some(values) = &schema.enum_values {
            let has_null = values.iter().any(JsonValue::is_null);
            let literal =
                DataType::literal(values.iter().filter(|v| !v.is_null()).cloned().collect());
            return Ok(if has_null { literal.optional() } else { literal });
        }

        let (keyword, alternatives) = if schema.any_of.is_empty() {
            ("oneOf", &schema.one_of)
        } else {
            ("anyOf", &schema.any_of)
        };
        if !alternatives.is_empty() {
            let members = alternatives
                .iter()
                .enumerate()
                .map(|(i, member)| {
                    self.lower_type(member, &format!("{}/{}/{}", path, keyword, i), suggested)
                })
                .collect::<AppResult<Vec<_>>>()?;
            return Ok(DataType::union(members));
        }

        if schema.is_object_model() {
            if let ([single], true) = (schema.all_of.as_slice(), schema.properties.is_empty()) {
                return self.lower_type(single, &format!("{}/allOf/0", path), suggested);
            }
            let reference = self.graph.reference(path, suggested);
            self.lower_object(reference, path, schema)?;
            return Ok(DataType::reference(reference));
        }

        let types: Vec<&str> = schema
            .type_names()
            .into_iter()
            .filter(|t| *t != "null")
            .collect();
        let mut members = types
            .iter()
            .map(|t| self.lower_named_type(t, schema, path, suggested))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(match members.len() {
            0 if schema.type_names() == ["null"] => DataType::none(),
            0 => match &schema.const_value {
                Some(value) => value_type(value),
                None => DataType::any(),
            },
            1 => members.remove(0),
            _ => DataType::union(members),
        })
    }

    fn lower_named_type(
        &mut self,
        type_name: &str,
        schema: &JsonSchemaObject,
        path: &str,
        suggested: &str,
    ) -> AppResult<DataType> {
        Ok(match type_name {
            "object" => match &schema.additional_properties {
                Some(AdditionalProperties::Schema(values)) => {
                    let value_path = format!("{}/additionalProperties", path);
                    DataType::dict_of(None, self.lower_type(values, &value_path, suggested)?)
                }
                _ => DataType::dict_of(None, DataType::any()),
            },
            "array" => {
                let item_name = if self.graph.options().disable_appending_item_suffix {
                    suggested.to_string()
                } else {
                    format!("{}Item", suggested)
                };
                let item_path = format!("{}/items", path);
                match &schema.items {
                    Some(SchemaItems::Single(item)) => {
                        DataType::list_of(self.lower_type(item, &item_path, &item_name)?)
                    }
                    Some(SchemaItems::Tuple(items)) => {
                        let members = items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| {
                                self.lower_type(item, &format!("{}/{}", item_path, i), &item_name)
                            })
                            .collect::<AppResult<Vec<_>>>()?;
                        DataType::list_of(DataType::union(members))
                    }
                    None => DataType::list_of(DataType::any()),
                }
            }
            "string" => self.string_type(schema),
            "integer" => DataType::primitive("int"),
            "number" => match schema.format.as_deref() {
                Some("decimal") => DataType::from_import(Import::from_full_path("decimal.Decimal")),
                _ => DataType::primitive("float"),
            },
            "boolean" => DataType::primitive("bool"),
            "null" => DataType::none(),
            other => {
                return Err(AppError::Input(format!(
                    "Unsupported type '{}' at {}",
                    other, path
                )))
            }
        })
    }

    fn python_type(&self, schema: &JsonSchemaObject) -> Option<DataType> {
        let name = schema.keywords.get(PYTHON_TYPE_KEY)?.as_str()?;
        self.registry.data_type(name).or_else(|| {
            name.contains('.')
                .then(|| DataType::from_import(Import::from_full_path(name)).custom())
        })
    }

    fn string_type(&self, schema: &JsonSchemaObject) -> DataType {
        let Some(format) = schema.format.as_deref() else {
            return DataType::primitive("str");
        };
        if let Some(custom) = self.registry.data_type(format) {
            return custom;
        }
        let pydantic_types = self.graph.options().output_model_type != OutputFlavor::Dataclass;
        let path = match format {
            "date-time" => "datetime.datetime",
            "date" => "datetime.date",
            "time" => "datetime.time",
            "duration" => "datetime.timedelta",
            "uuid" | "uuid1" | "uuid3" | "uuid4" | "uuid5" => "uuid.UUID",
            "ipv4" => "ipaddress.IPv4Address",
            "ipv6" => "ipaddress.IPv6Address",
            "decimal" => "decimal.Decimal",
            "email" if pydantic_types => "pydantic.EmailStr",
            "uri" if pydantic_types => "pydantic.AnyUrl",
            "binary" => return DataType::primitive("bytes"),
            _ => return DataType::primitive("str"),
        };
        DataType::from_import(Import::from_full_path(path))
    }
}

/// The primitive type of a constant value.
fn value_type(value: &JsonValue) -> DataType {
    match value {
        JsonValue::Null => DataType::none(),
        JsonValue::Bool(_) => DataType::primitive("bool"),
        JsonValue::Number(n) if n.is_f64() => DataType::primitive("float"),
        JsonValue::Number(_) => DataType::primitive("int"),
        JsonValue::String(_) => DataType::primitive("str"),
        JsonValue::Array(_) => DataType::list_of(DataType::any()),
        JsonValue::Object(_) => DataType::dict_of(None, DataType::any()),
    }
}

/// `pet-owner` / `pet_owner` / `petOwner` → `PetOwner`.
pub fn class_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for part in raw.split(|c: char| !c.is_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    match out.chars().next() {
        None => "Model".to_string(),
        Some(c) if c.is_ascii_digit() => format!("Model{}", out),
        Some(_) => out,
    }
}

/// A Python attribute name for a property name.
///
/// Invalid characters become `_`, a leading underscore or digit gets a
/// `field` prefix and keywords get a trailing `_`.
pub fn field_name(raw: &str) -> String {
    if python::is_identifier(raw) && !raw.starts_with('_') {
        return raw.to_string();
    }
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match name.chars().next() {
        None => return "field".to_string(),
        Some('_') => name = format!("field{}", name),
        Some(c) if c.is_ascii_digit() => name = format!("field_{}", name),
        Some(_) => {}
    }
    if python::is_keyword(&name) {
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationOptions;
    use crate::extras::ExtraTemplateData;
    use crate::model::ModelKind;
    use serde_json::json;

    fn lower(value: JsonValue, options: GenerationOptions) -> (ModelGraph, Vec<ModelSpec>) {
        let mut graph = ModelGraph::new(options, ExtraTemplateData::new());
        let doc = JsonSchemaDocument::from_value(value).unwrap();
        let specs = doc.lower(&mut graph, &TypeRegistry::new()).unwrap();
        (graph, specs)
    }

    fn name_of(graph: &ModelGraph, spec: &ModelSpec) -> String {
        let reference = spec.reference.unwrap();
        graph.references().get(reference).name.clone()
    }

    #[test]
    fn test_names() {
        assert_eq!(class_name("pet-owner"), "PetOwner");
        assert_eq!(class_name("petOwner"), "PetOwner");
        assert_eq!(class_name("1st"), "Model1st");
        assert_eq!(class_name(""), "Model");
        assert_eq!(field_name("name"), "name");
        assert_eq!(field_name("first-name"), "first_name");
        assert_eq!(field_name("_id"), "field_id");
        assert_eq!(field_name("1x"), "field_1x");
        assert_eq!(field_name("class"), "class_");
    }

    #[test]
    fn test_object_properties() {
        let (graph, specs) = lower(
            json!({
                "title": "Pet",
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string", "maxLength": 20},
                    "birth-date": {"type": "string", "format": "date"},
                    "tag": {"type": ["string", "null"], "description": "A tag"}
                }
            }),
            GenerationOptions::default(),
        );
        assert_eq!(specs.len(), 1);
        assert_eq!(name_of(&graph, &specs[0]), "Pet");
        let fields = &specs[0].fields;
        assert!(fields[0].required);
        assert!(fields[0].constraints.is_some());
        assert_eq!(fields[1].name.as_deref(), Some("birth_date"));
        assert_eq!(fields[1].alias.as_deref(), Some("birth-date"));
        assert_eq!(
            fields[1].data_type,
            DataType::from_import(Import::from_full_path("datetime.date"))
        );
        assert_eq!(fields[2].nullable, Some(true));
        assert_eq!(fields[2].extras.get("description"), Some(&json!("A tag")));
    }

    #[test]
    fn test_definitions_and_inline_items() {
        let (graph, specs) = lower(
            json!({
                "$defs": {
                    "Owner": {
                        "type": "object",
                        "properties": {
                            "pets": {
                                "type": "array",
                                "items": {"type": "object", "properties": {"name": {"type": "string"}}}
                            },
                            "best": {"$ref": "#/$defs/Pet"}
                        }
                    },
                    "Pet": {"type": "string", "enum": ["cat", "dog"]}
                }
            }),
            GenerationOptions::default(),
        );
        let names: Vec<_> = specs.iter().map(|s| name_of(&graph, s)).collect();
        assert_eq!(names, vec!["OwnerPetsItem", "Owner", "Pet"]);
        assert_eq!(specs[2].kind, ModelKind::Root);
        assert_eq!(
            specs[2].fields[0].data_type,
            DataType::literal(vec![json!("cat"), json!("dog")])
        );
        let pet = graph.references().find("#/$defs/Pet").unwrap();
        assert_eq!(specs[1].fields[1].data_type, DataType::reference(pet));
    }

    #[test]
    fn test_item_suffix_can_be_disabled() {
        let (graph, specs) = lower(
            json!({
                "title": "Shelf",
                "type": "object",
                "properties": {
                    "books": {"type": "array", "items": {"type": "object", "properties": {"t": {"type": "string"}}}}
                }
            }),
            GenerationOptions {
                disable_appending_item_suffix: true,
                ..Default::default()
            },
        );
        assert_eq!(name_of(&graph, &specs[0]), "ShelfBooks");
    }

    #[test]
    fn test_all_of_references_become_bases() {
        let (graph, specs) = lower(
            json!({
                "definitions": {
                    "Animal": {"type": "object", "properties": {"id": {"type": "integer"}}},
                    "Dog": {"allOf": [
                        {"$ref": "#/definitions/Animal"},
                        {"properties": {"bark": {"type": "boolean"}}, "required": ["bark"]}
                    ]}
                }
            }),
            GenerationOptions::default(),
        );
        let animal = graph.references().find("#/definitions/Animal").unwrap();
        assert_eq!(specs[1].base_classes, vec![animal]);
        assert_eq!(specs[1].fields.len(), 1);
        assert!(specs[1].fields[0].required);
    }

    #[test]
    fn test_additional_properties_feed_extras() {
        let (graph, _) = lower(
            json!({"title": "Closed", "type": "object", "additionalProperties": false,
                   "properties": {"a": {"type": "integer"}}}),
            GenerationOptions::default(),
        );
        let mut graph = graph;
        assert_eq!(
            graph.extras_mut().for_model("Closed").additional_properties,
            Some(false)
        );
    }

    #[test]
    fn test_class_name_override_and_unresolved_ref() {
        let (graph, specs) = lower(
            json!({"title": "Ignored", "type": "object", "properties": {"a": {"type": "integer"}}}),
            GenerationOptions {
                class_name: Some("Renamed".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(name_of(&graph, &specs[0]), "Renamed");

        let mut graph = ModelGraph::new(GenerationOptions::default(), ExtraTemplateData::new());
        let doc = JsonSchemaDocument::from_value(json!({
            "type": "object",
            "properties": {"a": {"$ref": "#/$defs/Missing"}}
        }))
        .unwrap();
        let err = doc.lower(&mut graph, &TypeRegistry::new()).unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[test]
    fn test_custom_python_type() {
        let mut registry = TypeRegistry::new();
        registry.register("Money", "money.Money");
        let mut graph = ModelGraph::new(GenerationOptions::default(), ExtraTemplateData::new());
        let doc = JsonSchemaDocument::from_value(json!({
            "title": "Price",
            "type": "object",
            "properties": {"amount": {"type": "string", "x-python-type": "Money"}}
        }))
        .unwrap();
        let specs = doc.lower(&mut graph, &registry).unwrap();
        assert!(specs[0].fields[0].data_type.is_custom_type);
    }
}
