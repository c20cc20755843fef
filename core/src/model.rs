//! # Model Entities
//!
//! One generated type definition per [`DataModel`], owned by a [`ModelGraph`]
//! that also owns the reference arena. Models are built once through
//! [`ModelGraph::add_model`] and read many times afterwards.

use crate::config::GenerationOptions;
use crate::error::{AppError, AppResult};
use crate::extras::{ExtraTemplateData, ModelExtras};
use crate::field::{DataModelField, FieldSpec};
use crate::flavor::{ConfigInput, ConfigParams, ModelFlavor};
use crate::imports::{self, Import};
use crate::reference::{ModelId, RefId, Reference, ReferenceArena};
use crate::types::{DataType, ReferenceLookup, TypeScope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use tracing::{debug, warn};

/// Regular models carry named fields; root models wrap a single type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// A class with named fields.
    #[default]
    Base,
    /// A class wrapping one anonymous value.
    Root,
}

/// A recoverable condition observed while building the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A field name repeated within one model; the later field was dropped.
    DuplicateField {
        /// Display name of the model.
        model: String,
        /// The repeated field name.
        field: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DuplicateField { model, field } => {
                write!(f, "Field name `{}` is duplicated on {}", field, model)
            }
        }
    }
}

/// What the front-end supplies for one model.
#[derive(Debug, Clone, Default)]
pub struct ModelSpec {
    /// The (possibly pre-registered) reference this model binds.
    pub reference: Option<RefId>,
    /// Regular or root model.
    pub kind: ModelKind,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Explicit base classes; when empty the flavor's default is used.
    pub base_classes: Vec<RefId>,
    /// Extra decorators, after the flavor's own.
    pub decorators: Vec<String>,
    /// Pre-rendered method bodies.
    pub methods: Vec<String>,
    /// Class docstring.
    pub description: Option<String>,
    /// Whether references to this model count as optional.
    pub nullable: bool,
    /// Overrides the flavor's template identifier.
    pub template_id: Option<String>,
}

impl ModelSpec {
    /// A regular model bound to `reference`.
    pub fn new(reference: RefId, fields: Vec<FieldSpec>) -> Self {
        ModelSpec {
            reference: Some(reference),
            fields,
            ..Default::default()
        }
    }

    /// A root model bound to `reference` wrapping `field`.
    pub fn root(reference: RefId, field: FieldSpec) -> Self {
        ModelSpec {
            reference: Some(reference),
            kind: ModelKind::Root,
            fields: vec![field],
            ..Default::default()
        }
    }
}

/// A built model.
#[derive(Debug, Clone, PartialEq)]
pub struct DataModel {
    /// Position in input order.
    pub id: ModelId,
    /// The reference this model is bound to.
    pub reference: RefId,
    /// Regular or root model.
    pub kind: ModelKind,
    /// The template this model renders with.
    pub template_id: String,
    /// De-duplicated fields.
    pub fields: Vec<DataModelField>,
    /// Base classes as type descriptors.
    pub base_classes: Vec<DataType>,
    /// Decorators, rendered above the class.
    pub decorators: Vec<String>,
    /// Method bodies.
    pub methods: Vec<String>,
    /// Class docstring.
    pub description: Option<String>,
    /// This model's extras slice.
    pub extras: ModelExtras,
    /// Derived config parameters, if any.
    pub config: Option<ConfigParams>,
    /// Whether references to this model count as optional.
    pub nullable: bool,
    additional_imports: Vec<Import>,
}

impl DataModel {
    /// Field imports followed by the model's own, deduplicated.
    pub fn imports(&self, scope: TypeScope<'_>) -> Vec<Import> {
        let field_imports = self.fields.iter().flat_map(|f| f.imports(scope));
        imports::unique_imports(field_imports.chain(self.additional_imports.iter().cloned()))
    }

    /// Comma-joined base class hints.
    pub fn base_class(&self, scope: TypeScope<'_>) -> String {
        self.base_classes
            .iter()
            .map(|b| b.type_hint(scope))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Every type node of the fields followed by the base classes.
    pub fn all_data_types(&self) -> impl Iterator<Item = &DataType> {
        self.fields
            .iter()
            .flat_map(|f| f.data_type.all_data_types())
            .chain(self.base_classes.iter())
    }

    /// Every model reference this model depends on.
    pub fn dependencies(&self) -> impl Iterator<Item = RefId> + '_ {
        self.all_data_types().filter_map(DataType::reference_id)
    }
}

/// The reference arena plus every model built against it.
#[derive(Debug)]
pub struct ModelGraph {
    options: GenerationOptions,
    extras: ExtraTemplateData,
    references: ReferenceArena,
    models: Vec<DataModel>,
    diagnostics: Vec<Diagnostic>,
}

impl ReferenceLookup for ModelGraph {
    fn reference(&self, id: RefId) -> &Reference {
        self.references.get(id)
    }

    fn source_nullable(&self, id: RefId) -> bool {
        self.references
            .get(id)
            .source()
            .map(|m| self.models[m.index()].nullable)
            .unwrap_or(false)
    }
}

impl ModelGraph {
    /// Creates an empty graph. Global toggles are folded into the extras'
    /// all-models bucket here.
    pub fn new(options: GenerationOptions, mut extras: ExtraTemplateData) -> Self {
        extras.apply_global_toggles(&options);
        ModelGraph {
            options,
            extras,
            references: ReferenceArena::new(),
            models: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// The options this graph was built with.
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// The flavor strategy selected by the options.
    pub fn flavor(&self) -> &'static dyn ModelFlavor {
        self.options.output_model_type.strategy()
    }

    /// The rendering scope: this graph as reference lookup plus type options.
    pub fn scope(&self) -> TypeScope<'_> {
        TypeScope::new(self, self.options.type_options())
    }

    /// Returns the reference for `path`, creating a placeholder if needed.
    pub fn reference(&mut self, path: &str, name: &str) -> RefId {
        self.references.get_or_insert(path, name)
    }

    /// Extras of every model, for front-ends that derive entries from the
    /// schema (e.g. `additionalProperties`). Only models added afterwards
    /// see the changes.
    pub fn extras_mut(&mut self) -> &mut ExtraTemplateData {
        &mut self.extras
    }

    /// The reference arena.
    pub fn references(&self) -> &ReferenceArena {
        &self.references
    }

    /// Models in input order.
    pub fn models(&self) -> &[DataModel] {
        &self.models
    }

    /// Borrows a model.
    pub fn model(&self, id: ModelId) -> &DataModel {
        &self.models[id.index()]
    }

    /// The model bound to `reference`, if it was built.
    pub fn model_for(&self, reference: RefId) -> Option<&DataModel> {
        self.references
            .get(reference)
            .source()
            .map(|id| self.model(id))
    }

    /// Recoverable conditions observed so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The class name a model renders with: the last dotted segment of its
    /// reference's display name.
    pub fn class_name(&self, id: ModelId) -> &str {
        self.references.get(self.model(id).reference).short_name()
    }

    /// Renames a model's class, keeping any dotted module prefix.
    pub fn set_class_name(&mut self, id: ModelId, class_name: &str) {
        let reference = self.model(id).reference;
        self.references.set_class_name(reference, class_name);
    }

    /// Builds a model and binds it to its reference.
    ///
    /// In order: base classes, reference binding, extras selection, field
    /// de-duplication (first occurrence wins), child registration on base
    /// references, default imports, then config derivation.
    pub fn add_model(&mut self, spec: ModelSpec) -> AppResult<ModelId> {
        let flavor = self.flavor();
        let reference = spec
            .reference
            .ok_or_else(|| AppError::Config("Model built without a reference".to_string()))?;
        let name = self.references.get(reference).name.clone();
        let template_id = spec
            .template_id
            .unwrap_or_else(|| flavor.template_id(spec.kind).to_string());
        if template_id.is_empty() {
            return Err(AppError::Config(format!(
                "Model '{}' has no template binding",
                name
            )));
        }

        let id = ModelId(self.models.len());
        let mut additional_imports = Vec::new();

        // (a) base classes
        let base_classes: Vec<DataType> = if spec.base_classes.is_empty() {
            let custom = self
                .options
                .custom_base_class
                .as_deref()
                .filter(|_| flavor.accepts_custom_base_class(spec.kind))
                .map(Import::from_full_path);
            match custom.or_else(|| flavor.default_base_class(spec.kind)) {
                Some(import) => {
                    additional_imports.push(import.clone());
                    vec![DataType::from_import(import)]
                }
                None => Vec::new(),
            }
        } else {
            spec.base_classes.iter().copied().map(DataType::reference).collect()
        };

        // (b) bind
        self.references.bind_source(reference, id)?;

        // (c) extras
        let extras = self.extras.for_model(&name);

        // (d) fields
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(spec.fields.len());
        for field_spec in spec.fields {
            if let Some(field_name) = &field_spec.name {
                if !seen.insert(field_name.clone()) {
                    warn!(model = %name, field = %field_name, "Field name is duplicated; dropping");
                    self.diagnostics.push(Diagnostic::DuplicateField {
                        model: name.clone(),
                        field: field_name.clone(),
                    });
                    continue;
                }
            }
            let mut field = DataModelField::new(field_spec, &self.options);
            field.parent = Some(id);
            field.parent_ref = Some(reference);
            fields.push(field);
        }
        flavor.order_fields(&mut fields, self.scope());

        // (e) children
        for base in &spec.base_classes {
            self.references.add_child(*base, id);
        }

        // (f) default imports
        additional_imports.extend(flavor.default_imports(spec.kind));
        if spec.kind == ModelKind::Root && fields.is_empty() {
            additional_imports.push(imports::ANY);
        }

        let class_name = self.references.get(reference).short_name().to_string();
        let config = flavor.derive_config(&ConfigInput {
            class_name: &class_name,
            kind: spec.kind,
            extras: &extras,
            fields: &fields,
            base_classes: &base_classes,
        });
        if let Some(config) = &config {
            additional_imports.extend(config.imports().iter().cloned());
        }

        let mut decorators = flavor.decorators(spec.kind);
        decorators.extend(spec.decorators);
        let description = spec.description.or_else(|| extras.description.clone());

        debug!(model = %name, fields = fields.len(), kind = ?spec.kind, "Built model");
        self.models.push(DataModel {
            id,
            reference,
            kind: spec.kind,
            template_id,
            fields,
            base_classes,
            decorators,
            methods: spec.methods,
            description,
            extras,
            config,
            nullable: spec.nullable,
            additional_imports,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::OutputFlavor;
    use serde_json::json;

    fn graph() -> ModelGraph {
        ModelGraph::new(GenerationOptions::default(), ExtraTemplateData::new())
    }

    fn str_field(name: &str) -> FieldSpec {
        FieldSpec::new(name, DataType::primitive("str")).required(true)
    }

    #[test]
    fn test_duplicate_fields_first_wins() {
        let mut graph = graph();
        let r = ModelGraph::reference(&mut graph, "#/Pet", "Pet");
        let id = graph
            .add_model(ModelSpec::new(
                r,
                vec![
                    str_field("x"),
                    FieldSpec::new("x", DataType::primitive("int")),
                    str_field("y"),
                ],
            ))
            .unwrap();
        let model = graph.model(id);
        let names: Vec<_> = model.fields.iter().filter_map(|f| f.name.as_deref()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(model.fields[0].data_type.type_name(), Some("str"));
        assert_eq!(
            graph.diagnostics(),
            &[Diagnostic::DuplicateField {
                model: "Pet".into(),
                field: "x".into()
            }]
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_duplicate_field_is_logged() {
        let mut graph = graph();
        let r = ModelGraph::reference(&mut graph, "#/Pet", "Pet");
        graph
            .add_model(ModelSpec::new(r, vec![str_field("x"), str_field("x")]))
            .unwrap();
        assert!(logs_contain("Field name is duplicated"));
    }

    #[test]
    fn test_default_base_class_and_imports() {
        let mut graph = graph();
        let r = ModelGraph::reference(&mut graph, "#/Pet", "Pet");
        let id = graph.add_model(ModelSpec::new(r, vec![str_field("name")])).unwrap();
        let scope = graph.scope();
        let model = graph.model(id);
        assert_eq!(model.base_class(scope), "BaseModel");
        assert_eq!(
            model.imports(scope),
            vec![Import::from_static("pydantic", "BaseModel")]
        );
        assert_eq!(graph.references().get(r).source(), Some(id));
    }

    #[test]
    fn test_custom_base_class_ignored_for_root() {
        let options = GenerationOptions {
            custom_base_class: Some("app.base.Model".to_string()),
            ..Default::default()
        };
        let mut graph = ModelGraph::new(options, ExtraTemplateData::new());
        let a = ModelGraph::reference(&mut graph, "#/A", "A");
        let b = ModelGraph::reference(&mut graph, "#/B", "B");
        let a_id = graph.add_model(ModelSpec::new(a, vec![])).unwrap();
        let b_id = graph.add_model(ModelSpec::root(b, str_field("root"))).unwrap();
        let scope = graph.scope();
        assert_eq!(graph.model(a_id).base_class(scope), "Model");
        assert_eq!(graph.model(b_id).base_class(scope), "RootModel");
    }

    #[test]
    fn test_explicit_bases_register_children() {
        let mut graph = graph();
        let base = ModelGraph::reference(&mut graph, "#/Base", "Base");
        let child = ModelGraph::reference(&mut graph, "#/Child", "Child");
        let base_id = graph.add_model(ModelSpec::new(base, vec![str_field("a")])).unwrap();
        let mut spec = ModelSpec::new(child, vec![str_field("b")]);
        spec.base_classes = vec![base];
        let child_id = graph.add_model(spec).unwrap();
        assert_eq!(graph.references().get(base).children(), &[child_id]);
        assert_eq!(graph.model(child_id).base_class(graph.scope()), "Base");
        assert_eq!(graph.model_for(base).map(|m| m.id), Some(base_id));
    }

    #[test]
    fn test_second_bind_and_missing_template_are_config_errors() {
        let mut graph = graph();
        let r = ModelGraph::reference(&mut graph, "#/Pet", "Pet");
        graph.add_model(ModelSpec::new(r, vec![])).unwrap();
        let err = graph.add_model(ModelSpec::new(r, vec![])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let other = ModelGraph::reference(&mut graph, "#/Other", "Other");
        let mut spec = ModelSpec::new(other, vec![]);
        spec.template_id = Some(String::new());
        let err = graph.add_model(spec).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_extras_select_model_and_all_bucket() {
        let extras: ExtraTemplateData = serde_json::from_value(json!({
            "Pet": {"description": "A pet"},
            "#all#": {"allow_extra_fields": true}
        }))
        .unwrap();
        let mut graph = ModelGraph::new(GenerationOptions::default(), extras);
        let r = ModelGraph::reference(&mut graph, "#/Pet", "Pet");
        let id = graph.add_model(ModelSpec::new(r, vec![])).unwrap();
        let model = graph.model(id);
        assert_eq!(model.description.as_deref(), Some("A pet"));
        assert_eq!(
            model.config.as_ref().and_then(|c| c.get("extra")),
            Some("'allow'")
        );
        assert!(model
            .imports(graph.scope())
            .contains(&imports::CONFIG_DICT));
    }

    #[test]
    fn test_nullable_model_makes_references_optional() {
        let mut graph = graph();
        let target = ModelGraph::reference(&mut graph, "#/Maybe", "Maybe");
        let mut spec = ModelSpec::root(target, str_field("root"));
        spec.nullable = true;
        graph.add_model(spec).unwrap();
        let hint = DataType::reference(target).type_hint(graph.scope());
        assert_eq!(hint, "Optional[Maybe]");
    }

    #[test]
    fn test_dataclass_flavor_decorates() {
        let options = GenerationOptions {
            output_model_type: OutputFlavor::Dataclass,
            ..Default::default()
        };
        let mut graph = ModelGraph::new(options, ExtraTemplateData::new());
        let r = ModelGraph::reference(&mut graph, "#/Point", "Point");
        let id = graph.add_model(ModelSpec::new(r, vec![str_field("x")])).unwrap();
        let model = graph.model(id);
        assert_eq!(model.decorators, vec!["@dataclass".to_string()]);
        assert!(model.base_classes.is_empty());
        assert!(model.config.is_none());
        assert_eq!(model.imports(graph.scope()), vec![imports::DATACLASS]);
    }
}
