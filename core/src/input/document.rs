//! # Model Documents
//!
//! A direct serialization of model definitions: each entry names a model,
//! its kind, base classes and fields. Field types are written as Python-like
//! type expressions (`List[Pet]`, `Optional[int]`, `Literal['a', 'b']`,
//! `Dict[str, Any]`), where bare names resolve to declared models, then to
//! registered custom types, then to dotted import paths, then to builtins.

use crate::constraints::ConstraintSet;
use crate::error::{AppError, AppResult};
use crate::field::FieldSpec;
use crate::imports::Import;
use crate::input::SchemaSource;
use crate::model::{ModelGraph, ModelKind, ModelSpec};
use crate::reference::RefId;
use crate::registry::TypeRegistry;
use crate::types::DataType;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// A list of model definitions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsDocument {
    /// Definitions in input order.
    #[serde(default)]
    pub models: Vec<ModelDef>,
}

/// One model definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelDef {
    /// Stable path; defaults to `#/<name>`.
    pub path: Option<String>,
    /// Class name (dotted names keep a module prefix).
    pub name: String,
    /// Regular or root model.
    pub kind: ModelKind,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Base classes, by model name or path.
    pub base_classes: Vec<String>,
    /// Extra decorators.
    pub decorators: Vec<String>,
    /// Method bodies.
    pub methods: Vec<String>,
    /// Class docstring.
    pub description: Option<String>,
    /// References to this model count as optional.
    pub nullable: bool,
    /// Template override.
    pub template: Option<String>,
}

/// One field definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    /// Attribute name; omitted for root fields.
    pub name: Option<String>,
    /// Type expression.
    #[serde(rename = "type")]
    pub type_expr: String,
    /// Whether the field must be supplied.
    pub required: bool,
    /// Tri-state nullability.
    pub nullable: Option<bool>,
    /// Default value; an explicit `null` is a `None` default.
    #[serde(deserialize_with = "present")]
    pub default: Option<JsonValue>,
    /// Serialized name.
    pub alias: Option<String>,
    /// Constraint keywords (`minLength`, `maximum`, `pattern`, ...).
    pub constraints: IndexMap<String, JsonValue>,
    /// Free-form field extras.
    pub extras: IndexMap<String, JsonValue>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

impl ModelsDocument {
    /// Reads a document from an already parsed value.
    pub fn from_value(value: JsonValue) -> AppResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Input(format!("Invalid models document: {}", e)))
    }

    fn path_of(model: &ModelDef) -> String {
        model
            .path
            .clone()
            .unwrap_or_else(|| format!("#/{}", model.name))
    }
}

impl SchemaSource for ModelsDocument {
    fn lower(&self, graph: &mut ModelGraph, registry: &TypeRegistry) -> AppResult<Vec<ModelSpec>> {
        let mut known: HashMap<String, RefId> = HashMap::new();
        for model in &self.models {
            if model.name.is_empty() {
                return Err(AppError::Input("Model definition without a name".into()));
            }
            let path = Self::path_of(model);
            let id = graph.reference(&path, &model.name);
            known.insert(path, id);
            known.entry(model.name.clone()).or_insert(id);
        }
        let resolver = NameResolver {
            models: &known,
            registry,
        };
        let item_bounds_as_length = graph.flavor().item_bounds_as_length();

        let mut specs = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let reference = known[&Self::path_of(model)];
            let base_classes = model
                .base_classes
                .iter()
                .map(|b| {
                    known.get(b).copied().ok_or_else(|| {
                        AppError::Input(format!("Unknown base class '{}' of {}", b, model.name))
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;
            let fields = model
                .fields
                .iter()
                .map(|f| lower_field(f, &resolver, item_bounds_as_length))
                .collect::<AppResult<Vec<_>>>()?;

            specs.push(ModelSpec {
                reference: Some(reference),
                kind: model.kind,
                fields,
                base_classes,
                decorators: model.decorators.clone(),
                methods: model.methods.clone(),
                description: model.description.clone(),
                nullable: model.nullable,
                template_id: model.template.clone(),
            });
        }
        Ok(specs)
    }
}

fn lower_field(
    field: &FieldDef,
    resolver: &NameResolver<'_>,
    item_bounds_as_length: bool,
) -> AppResult<FieldSpec> {
    let data_type = parse_type_expr(&field.type_expr, resolver)?;
    let constraints = (!field.constraints.is_empty())
        .then(|| ConstraintSet::from_keywords(&field.constraints, item_bounds_as_length));
    Ok(FieldSpec {
        name: field.name.clone(),
        original_name: None,
        default: field.default.clone(),
        required: field.required,
        alias: field.alias.clone(),
        nullable: field.nullable,
        data_type,
        constraints,
        extras: field.extras.clone(),
    })
}

struct NameResolver<'a> {
    models: &'a HashMap<String, RefId>,
    registry: &'a TypeRegistry,
}

impl NameResolver<'_> {
    fn resolve(&self, name: &str) -> DataType {
        if let Some(id) = self.models.get(name) {
            return DataType::reference(*id);
        }
        if let Some(custom) = self.registry.data_type(name) {
            return custom;
        }
        match name {
            "Any" => DataType::any(),
            "None" => DataType::none(),
            _ if name.contains('.') => DataType::from_import(Import::from_full_path(name)),
            _ => DataType::primitive(name),
        }
    }
}

/// A parsed, not yet resolved, type expression.
#[derive(Debug, Clone, PartialEq)]
enum TypeExpr {
    Name(String, Vec<TypeExpr>),
    Value(JsonValue),
}

/// Parses a type expression such as `Dict[str, List[Pet]]`.
fn parse_type_expr(text: &str, resolver: &NameResolver<'_>) -> AppResult<DataType> {
    let mut parser = ExprParser { src: text, pos: 0 };
    let expr = parser.expr()?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("trailing input"));
    }
    to_data_type(&expr, resolver, text)
}

fn to_data_type(expr: &TypeExpr, resolver: &NameResolver<'_>, text: &str) -> AppResult<DataType> {
    let bad = |what: &str| AppError::Input(format!("Invalid type expression '{}': {}", text, what));
    let (name, args) = match expr {
        TypeExpr::Name(name, args) => (name.as_str(), args.as_slice()),
        TypeExpr::Value(_) => return Err(bad("literal value outside Literal[...]")),
    };
    let convert = |e: &TypeExpr| to_data_type(e, resolver, text);

    Ok(match (name, args) {
        ("Literal", values) if !values.is_empty() => DataType::literal(
            values
                .iter()
                .map(|v| literal_value(v).ok_or_else(|| bad("unsupported literal")))
                .collect::<AppResult<_>>()?,
        ),
        ("List" | "list" | "Sequence", [item]) => DataType::list_of(convert(item)?),
        ("Set" | "set" | "FrozenSet", [item]) => DataType::set_of(convert(item)?),
        ("Dict" | "dict" | "Mapping", []) => DataType::dict_of(None, DataType::any()),
        ("Dict" | "dict" | "Mapping", [value]) => DataType::dict_of(None, convert(value)?),
        ("Dict" | "dict" | "Mapping", [key, value]) => {
            DataType::dict_of(Some(convert(key)?), convert(value)?)
        }
        ("Optional", [inner]) => convert(inner)?.optional(),
        ("Union", members) if !members.is_empty() => {
            DataType::union(members.iter().map(convert).collect::<AppResult<_>>()?)
        }
        (name, []) => resolver.resolve(name),
        (name, _) => return Err(bad(&format!("unexpected arguments for '{}'", name))),
    })
}

fn literal_value(expr: &TypeExpr) -> Option<JsonValue> {
    match expr {
        TypeExpr::Value(v) => Some(v.clone()),
        TypeExpr::Name(name, args) if args.is_empty() => match name.as_str() {
            "True" => Some(JsonValue::Bool(true)),
            "False" => Some(JsonValue::Bool(false)),
            "None" => Some(JsonValue::Null),
            _ => None,
        },
        TypeExpr::Name(..) => None,
    }
}

struct ExprParser<'a> {
    src: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn error(&self, what: &str) -> AppError {
        AppError::Input(format!(
            "Invalid type expression '{}' at {}: {}",
            self.src, self.pos, what
        ))
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> AppResult<TypeExpr> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('\'' | '"')) => self.string(quote),
            Some(c) if c.is_ascii_digit() || c == '-' => self.number(),
            Some(_) => self.name(),
            None => Err(self.error("unexpected end")),
        }
    }

    fn name(&mut self) -> AppResult<TypeExpr> {
        let start = self.pos;
        while let Some(c) = self
            .peek()
            .filter(|c| !c.is_whitespace() && !matches!(c, '[' | ']' | ','))
        {
            self.pos += c.len_utf8();
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        let name = self.src[start..self.pos].to_string();

        let mut args = Vec::new();
        if self.eat('[') {
            loop {
                args.push(self.expr()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat(']') {
                    break;
                }
                return Err(self.error("expected ',' or ']'"));
            }
        }
        Ok(TypeExpr::Name(name, args))
    }

    fn string(&mut self, quote: char) -> AppResult<TypeExpr> {
        self.pos += quote.len_utf8();
        let mut out = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                _ if escaped => {
                    out.push(c);
                    escaped = false;
                }
                '\\' => escaped = true,
                _ if c == quote => return Ok(TypeExpr::Value(JsonValue::String(out))),
                _ => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> AppResult<TypeExpr> {
        let start = self.pos;
        while let Some(c) = self
            .peek()
            .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += c.len_utf8();
        }
        serde_json::from_str(&self.src[start..self.pos])
            .map(TypeExpr::Value)
            .map_err(|_| self.error("invalid number"))
    }
}
