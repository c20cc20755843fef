#![deny(missing_docs)]

//! # Code Generation
//!
//! Renders a [`ModelGraph`] into the body of a Python module.
//!
//! This module handles:
//! - Model ordering (input order, or dependencies first with cycles kept together).
//! - Template context assembly for each model.
//! - Import aggregation across all models.
//! - Forward-reference rebuild calls for models that take part in cycles.

use crate::error::AppResult;
use crate::field::FieldView;
use crate::flavor::ConfigEntry;
use crate::imports::Imports;
use crate::model::ModelGraph;
use crate::reference::ModelId;
use crate::template::TemplateResolver;
use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

/// The named values every template receives, besides the spread extras.
#[derive(Debug, Serialize)]
struct ModelContext<'a> {
    class_name: &'a str,
    fields: Vec<FieldView>,
    decorators: &'a [String],
    base_class: String,
    methods: &'a [String],
    description: Option<&'a str>,
    config: Option<&'a [ConfigEntry]>,
}

/// Renders one model with its bound template.
///
/// `class_name` overrides the name derived from the model's reference.
pub fn render_model(
    graph: &ModelGraph,
    resolver: &TemplateResolver,
    id: ModelId,
    class_name: Option<&str>,
) -> AppResult<String> {
    let model = graph.model(id);
    let scope = graph.scope();
    let context = ModelContext {
        class_name: class_name.unwrap_or_else(|| graph.class_name(id)),
        fields: model.fields.iter().map(|f| f.view(scope)).collect(),
        decorators: &model.decorators,
        base_class: model.base_class(scope),
        methods: &model.methods,
        description: model.description.as_deref(),
        config: model.config.as_ref().map(|c| c.entries()),
    };

    // Extras first, so the core's own names win.
    let mut vars: IndexMap<String, JsonValue> = model.extras.template_vars();
    if let JsonValue::Object(core) = serde_json::to_value(&context)? {
        vars.extend(core);
    }
    resolver.render(&model.template_id, &vars)
}

/// The order models are emitted in.
///
/// With `keep_model_order` this is input order. Otherwise every model follows
/// the models it references; models that reference each other form one group
/// emitted in input order, and independent groups are emitted by their
/// earliest input position.
pub fn model_order(graph: &ModelGraph) -> Vec<ModelId> {
    let models = graph.models();
    if graph.options().keep_model_order {
        return models.iter().map(|m| m.id).collect();
    }

    let deps = dependency_graph(graph);
    let sccs = tarjan_scc(&deps);
    let mut component = vec![0usize; models.len()];
    for (c, scc) in sccs.iter().enumerate() {
        for node in scc {
            component[node.index()] = c;
        }
    }

    let mut pending = vec![0usize; sccs.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); sccs.len()];
    for edge in deps.edge_references() {
        let from = component[edge.source().index()];
        let to = component[edge.target().index()];
        if from != to {
            pending[from] += 1;
            dependents[to].push(from);
        }
    }

    let first_position = |c: usize| sccs[c].iter().map(|n| n.index()).min().unwrap_or(0);
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = (0..sccs.len())
        .filter(|c| pending[*c] == 0)
        .map(|c| Reverse((first_position(c), c)))
        .collect();

    let mut order = Vec::with_capacity(models.len());
    while let Some(Reverse((_, c))) = ready.pop() {
        let mut members: Vec<usize> = sccs[c].iter().map(|n| n.index()).collect();
        members.sort_unstable();
        order.extend(members.into_iter().map(ModelId));
        for &dependent in &dependents[c] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse((first_position(dependent), dependent)));
            }
        }
    }
    order
}

/// Models that reach themselves through references.
pub fn cyclic_models(graph: &ModelGraph) -> BTreeSet<ModelId> {
    let deps = dependency_graph(graph);
    tarjan_scc(&deps)
        .into_iter()
        .filter(|scc| scc.len() > 1 || deps.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|node| ModelId(node.index()))
        .collect()
}

/// Edge `a -> b` when model `a` references model `b`.
fn dependency_graph(graph: &ModelGraph) -> DiGraph<ModelId, ()> {
    let models = graph.models();
    let mut deps = DiGraph::with_capacity(models.len(), models.len());
    let nodes: Vec<NodeIndex> = models.iter().map(|m| deps.add_node(m.id)).collect();
    for model in models {
        for reference in model.dependencies() {
            if let Some(target) = graph.references().get(reference).source() {
                deps.add_edge(nodes[model.id.index()], nodes[target.index()], ());
            }
        }
    }
    deps
}

/// Renders every model into one module body: the import block, the models
/// separated by two blank lines, then rebuild calls for cyclic models.
///
/// An empty graph renders as the empty string.
pub fn generate_module(graph: &ModelGraph, resolver: &TemplateResolver) -> AppResult<String> {
    if graph.models().is_empty() {
        return Ok(String::new());
    }
    let flavor = graph.flavor();
    let scope = graph.scope();
    let order = model_order(graph);

    let mut imports = Imports::new();
    if flavor.future_annotations() {
        imports = imports.with_future_annotations();
    }
    let mut bodies = Vec::with_capacity(order.len());
    for id in &order {
        imports.extend(&graph.model(*id).imports(scope));
        bodies.push(render_model(graph, resolver, *id, None)?);
    }

    let mut code = String::new();
    let import_block = imports.render();
    if !import_block.is_empty() {
        code.push_str(&import_block);
        code.push_str("\n\n\n");
    }
    code.push_str(&bodies.join("\n\n\n"));

    let cyclic = cyclic_models(graph);
    let rebuilds: Vec<String> = order
        .iter()
        .filter(|id| cyclic.contains(*id))
        .filter_map(|id| flavor.rebuild_call(graph.class_name(*id)))
        .collect();
    if !rebuilds.is_empty() {
        code.push_str("\n\n\n");
        code.push_str(&rebuilds.join("\n"));
    }
    code.push('\n');
    Ok(code)
}
