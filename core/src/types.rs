//! # Type Descriptors
//!
//! Resolved (or partially resolved) type nodes of fields and base classes.
//! A descriptor renders itself into a Python type hint and enumerates the
//! imports that hint needs. Cycles only ever go through [`RefId`]s, so a
//! descriptor is always a finite tree.

use crate::config::TypeOptions;
use crate::imports::{self, Import};
use crate::python;
use crate::reference::{RefId, Reference, ReferenceArena};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// The Python name of the catch-all type.
pub const ANY: &str = "Any";
/// The Python name of the null type.
pub const NONE: &str = "None";

/// Resolves references while rendering type hints.
pub trait ReferenceLookup {
    /// Borrows the reference behind `id`.
    fn reference(&self, id: RefId) -> &Reference;

    /// Whether the model bound to `id` is nullable.
    fn source_nullable(&self, id: RefId) -> bool {
        let _ = id;
        false
    }
}

impl ReferenceLookup for ReferenceArena {
    fn reference(&self, id: RefId) -> &Reference {
        self.get(id)
    }
}

/// Everything a descriptor needs to render: reference names and type options.
#[derive(Clone, Copy)]
pub struct TypeScope<'a> {
    /// Reference resolution.
    pub lookup: &'a dyn ReferenceLookup,
    /// Collection/union/target settings.
    pub options: TypeOptions,
}

impl<'a> TypeScope<'a> {
    /// Creates a scope.
    pub fn new(lookup: &'a dyn ReferenceLookup, options: TypeOptions) -> Self {
        TypeScope { lookup, options }
    }
}

/// Built-in container shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `List[T]`
    List,
    /// `Set[T]`
    Set,
    /// `Dict[K, V]`
    Dict,
}

/// A named type, optionally rendered as a call (`constr(pattern=...)`).
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// The rendered name.
    pub name: String,
    /// Where the name comes from, when it is not a builtin.
    pub import: Option<Import>,
    /// Pre-rendered keyword arguments for call-style types.
    pub kwargs: IndexMap<String, String>,
    /// Render as `name(kwargs)`.
    pub is_func: bool,
}

/// The shape of a descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeKind {
    /// No renderable hint at all.
    #[default]
    Empty,
    /// A builtin, imported or call-style type.
    Primitive(Primitive),
    /// Another generated model.
    Reference(RefId),
    /// `Literal[...]` over the given values.
    Literal(Vec<JsonValue>),
    /// A list, set or dict. `item` is the element (or value) type.
    Container {
        /// Which container.
        kind: ContainerKind,
        /// Element type, or value type for dicts.
        item: Box<DataType>,
        /// Key type for dicts; defaults to `str`.
        key: Option<Box<DataType>>,
    },
    /// Alternatives; `None` members turn into optionality.
    Union(Vec<DataType>),
}

/// A type descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataType {
    /// The node itself.
    pub kind: TypeKind,
    /// Explicitly optional (`Optional[T]`).
    pub is_optional: bool,
    /// An unrecognized user type the validator cannot introspect.
    pub is_custom_type: bool,
    /// A strict type (`StrictStr`, ...), whose field constraints are not rendered.
    pub strict: bool,
}

impl DataType {
    fn of(kind: TypeKind) -> Self {
        DataType {
            kind,
            ..Default::default()
        }
    }

    /// A builtin name such as `str` or `int`.
    pub fn primitive(name: &str) -> Self {
        Self::of(TypeKind::Primitive(Primitive {
            name: name.to_string(),
            import: None,
            kwargs: IndexMap::new(),
            is_func: false,
        }))
    }

    /// A type that needs an import; the hint is the imported name.
    pub fn from_import(import: Import) -> Self {
        Self::of(TypeKind::Primitive(Primitive {
            name: import.import.to_string(),
            import: Some(import),
            kwargs: IndexMap::new(),
            is_func: false,
        }))
    }

    /// A call-style type (`constr(pattern=r'...')`).
    pub fn func(import: Import, kwargs: IndexMap<String, String>) -> Self {
        Self::of(TypeKind::Primitive(Primitive {
            name: import.import.to_string(),
            import: Some(import),
            kwargs,
            is_func: true,
        }))
    }

    /// `typing.Any`.
    pub fn any() -> Self {
        Self::from_import(imports::ANY)
    }

    /// `None`.
    pub fn none() -> Self {
        Self::primitive(NONE)
    }

    /// A reference to another model.
    pub fn reference(id: RefId) -> Self {
        Self::of(TypeKind::Reference(id))
    }

    /// `Literal[...]`.
    pub fn literal(values: Vec<JsonValue>) -> Self {
        Self::of(TypeKind::Literal(values))
    }

    /// `List[item]`.
    pub fn list_of(item: DataType) -> Self {
        Self::of(TypeKind::Container {
            kind: ContainerKind::List,
            item: Box::new(item),
            key: None,
        })
    }

    /// `Set[item]`.
    pub fn set_of(item: DataType) -> Self {
        Self::of(TypeKind::Container {
            kind: ContainerKind::Set,
            item: Box::new(item),
            key: None,
        })
    }

    /// `Dict[key, value]`; a missing key renders as `str`.
    pub fn dict_of(key: Option<DataType>, value: DataType) -> Self {
        Self::of(TypeKind::Container {
            kind: ContainerKind::Dict,
            item: Box::new(value),
            key: key.map(Box::new),
        })
    }

    /// `Union[...]`.
    pub fn union(members: Vec<DataType>) -> Self {
        Self::of(TypeKind::Union(members))
    }

    /// Marks the descriptor explicitly optional.
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Marks the descriptor as an unrecognized custom type.
    pub fn custom(mut self) -> Self {
        self.is_custom_type = true;
        self
    }

    /// Marks the descriptor strict.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// The primitive name, if this is a primitive.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Primitive(p) => Some(&p.name),
            _ => None,
        }
    }

    /// The referenced model, if this is a reference.
    pub fn reference_id(&self) -> Option<RefId> {
        match self.kind {
            TypeKind::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// Keyword arguments of a call-style type.
    pub fn kwargs(&self) -> Option<&IndexMap<String, String>> {
        match &self.kind {
            TypeKind::Primitive(p) if !p.kwargs.is_empty() => Some(&p.kwargs),
            _ => None,
        }
    }

    /// Whether this node is `Any`.
    pub fn is_any(&self) -> bool {
        self.type_name() == Some(ANY)
    }

    /// Literal values when this node is a literal set.
    pub fn literals(&self) -> Option<&[JsonValue]> {
        match &self.kind {
            TypeKind::Literal(values) => Some(values),
            _ => None,
        }
    }

    /// Direct children in declaration order.
    fn children(&self) -> Vec<&DataType> {
        match &self.kind {
            TypeKind::Container { item, key, .. } => {
                let mut out: Vec<&DataType> = key.iter().map(|k| &**k).collect();
                out.push(&**item);
                out
            }
            TypeKind::Union(members) => members.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Walks this node and every nested node, parents before children.
    ///
    /// Each call starts a fresh traversal.
    pub fn all_data_types(&self) -> DataTypes<'_> {
        DataTypes { stack: vec![self] }
    }

    /// Every model referenced anywhere in this tree.
    pub fn references(&self) -> impl Iterator<Item = RefId> + '_ {
        self.all_data_types().filter_map(DataType::reference_id)
    }

    /// The hint without optional wrapping, and whether it is optional.
    fn bare(&self, scope: TypeScope<'_>) -> (String, bool) {
        let opts = scope.options;
        let mut optional = self.is_optional;
        let text = match &self.kind {
            TypeKind::Empty => String::new(),
            TypeKind::Primitive(p) => {
                if p.is_func {
                    let args: Vec<String> =
                        p.kwargs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                    format!("{}({})", p.name, args.join(", "))
                } else {
                    p.name.clone()
                }
            }
            TypeKind::Reference(id) => {
                if scope.lookup.source_nullable(*id) {
                    optional = true;
                }
                scope.lookup.reference(*id).short_name().to_string()
            }
            TypeKind::Literal(values) => {
                let items: Vec<String> = values.iter().map(python::repr).collect();
                format!("Literal[{}]", items.join(", "))
            }
            TypeKind::Container { kind, item, key } => {
                let name = container_name(*kind, opts);
                let inner = item.type_hint(scope);
                match kind {
                    ContainerKind::Dict => {
                        let key = key
                            .as_ref()
                            .map(|k| k.type_hint(scope))
                            .unwrap_or_else(|| "str".to_string());
                        let value = if inner.is_empty() { ANY.to_string() } else { inner };
                        format!("{}[{}, {}]", name, key, value)
                    }
                    _ if inner.is_empty() => name.to_string(),
                    _ => format!("{}[{}]", name, inner),
                }
            }
            TypeKind::Union(members) => {
                let mut seen: Vec<String> = Vec::new();
                for member in members {
                    let (text, member_optional) = member.bare(scope);
                    if text == NONE {
                        optional = true;
                        continue;
                    }
                    if member_optional {
                        optional = true;
                    }
                    if !seen.contains(&text) {
                        seen.push(text);
                    }
                }
                match seen.len() {
                    0 => String::new(),
                    1 => seen.remove(0),
                    _ if opts.use_union_operator => seen.join(" | "),
                    _ => format!("Union[{}]", seen.join(", ")),
                }
            }
        };
        (text, optional)
    }

    /// The rendered type hint, including optional wrapping.
    pub fn type_hint(&self, scope: TypeScope<'_>) -> String {
        let (text, optional) = self.bare(scope);
        if optional && text != ANY {
            optional_type(&text, scope.options.use_union_operator)
        } else {
            text
        }
    }

    /// Whether the rendered hint is optional (explicitly, via a `None` union
    /// member, or via a nullable referenced model).
    pub fn renders_optional(&self, scope: TypeScope<'_>) -> bool {
        self.bare(scope).1
    }

    /// Whether the un-wrapped hint is `Any`.
    pub fn renders_any(&self, scope: TypeScope<'_>) -> bool {
        self.bare(scope).0 == ANY
    }

    /// Imports of this node alone.
    pub fn imports(&self, scope: TypeScope<'_>) -> Vec<Import> {
        let opts = scope.options;
        let (_, optional) = self.bare(scope);
        let mut out = Vec::new();
        if let TypeKind::Primitive(Primitive {
            import: Some(import),
            ..
        }) = &self.kind
        {
            out.push(import.clone());
        }
        if optional && !opts.use_union_operator {
            out.push(imports::OPTIONAL);
        }
        match &self.kind {
            TypeKind::Union(members) if members.len() > 1 && !opts.use_union_operator => {
                out.push(imports::UNION);
            }
            TypeKind::Literal(values) if !values.is_empty() => {
                out.push(if opts.target.has_literal_type() {
                    imports::LITERAL
                } else {
                    imports::LITERAL_BACKPORT
                });
            }
            TypeKind::Container { kind, item, .. } => {
                out.extend(container_import(*kind, opts));
                if *kind == ContainerKind::Dict && matches!(item.kind, TypeKind::Empty) {
                    out.push(imports::ANY);
                }
            }
            _ => {}
        }
        out
    }

    /// Imports of this node and every nested node, children first, deduplicated
    /// in order of first appearance.
    pub fn all_imports(&self, scope: TypeScope<'_>) -> Vec<Import> {
        let mut out = Vec::new();
        self.collect_imports(scope, &mut out);
        imports::unique_imports(out)
    }

    fn collect_imports(&self, scope: TypeScope<'_>, out: &mut Vec<Import>) {
        for child in self.children() {
            child.collect_imports(scope, out);
        }
        out.extend(self.imports(scope));
    }
}

/// Restartable pre-order traversal over a descriptor tree.
pub struct DataTypes<'a> {
    stack: Vec<&'a DataType>,
}

impl<'a> Iterator for DataTypes<'a> {
    type Item = &'a DataType;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children().into_iter().rev());
        Some(next)
    }
}

/// Wraps a hint as optional; `None`/empty stays `None`.
pub fn optional_type(hint: &str, use_union_operator: bool) -> String {
    if hint.is_empty() || hint == NONE {
        return NONE.to_string();
    }
    if use_union_operator {
        format!("{} | {}", hint, NONE)
    } else {
        format!("Optional[{}]", hint)
    }
}

fn container_name(kind: ContainerKind, opts: TypeOptions) -> &'static str {
    match (kind, opts.use_generic_container_types, opts.use_standard_collections) {
        (ContainerKind::List, true, _) => "Sequence",
        (ContainerKind::Set, true, _) => "FrozenSet",
        (ContainerKind::Dict, true, _) => "Mapping",
        (ContainerKind::List, false, true) => "list",
        (ContainerKind::Set, false, true) => "set",
        (ContainerKind::Dict, false, true) => "dict",
        (ContainerKind::List, false, false) => "List",
        (ContainerKind::Set, false, false) => "Set",
        (ContainerKind::Dict, false, false) => "Dict",
    }
}

fn container_import(kind: ContainerKind, opts: TypeOptions) -> Option<Import> {
    match (kind, opts.use_generic_container_types, opts.use_standard_collections) {
        (ContainerKind::List, true, true) => Some(imports::ABC_SEQUENCE),
        (ContainerKind::Dict, true, true) => Some(imports::ABC_MAPPING),
        (ContainerKind::List, true, false) => Some(imports::SEQUENCE),
        (ContainerKind::Dict, true, false) => Some(imports::MAPPING),
        (ContainerKind::Set, true, _) => Some(imports::FROZEN_SET),
        (_, false, true) => None,
        (ContainerKind::List, false, false) => Some(imports::LIST),
        (ContainerKind::Set, false, false) => Some(imports::SET),
        (ContainerKind::Dict, false, false) => Some(imports::DICT),
    }
}
