//! # Pipeline
//!
//! Wires the stages together: input lowering, model construction, module
//! rendering and emission. A [`Generator`] owns its template cache, so
//! repeated runs through the same generator never re-parse a template.

use crate::codegen;
use crate::config::GenerationOptions;
use crate::emit::{self, FileHeader};
use crate::error::AppResult;
use crate::extras::ExtraTemplateData;
use crate::input::{self, InputFileType, SchemaSource};
use crate::model::{Diagnostic, ModelGraph};
use crate::registry::TypeRegistry;
use crate::template::TemplateResolver;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// The rendered module plus what was observed while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// The module body (imports and models), without header.
    pub code: String,
    /// Recoverable conditions such as dropped duplicate fields.
    pub diagnostics: Vec<Diagnostic>,
}

/// One configured generation run.
pub struct Generator {
    options: GenerationOptions,
    extras: ExtraTemplateData,
    registry: TypeRegistry,
    resolver: TemplateResolver,
}

impl Generator {
    /// A generator with no extras and an empty custom type registry.
    pub fn new(options: GenerationOptions) -> Self {
        let resolver = TemplateResolver::new(options.custom_template_dir.clone());
        Generator {
            options,
            extras: ExtraTemplateData::new(),
            registry: TypeRegistry::new(),
            resolver,
        }
    }

    /// Sets the extra template data.
    pub fn with_extras(mut self, extras: ExtraTemplateData) -> Self {
        self.extras = extras;
        self
    }

    /// Sets the custom type registry.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The generation options.
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// The template cache.
    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Lowers `source` and builds every model.
    pub fn build_graph(&self, source: &dyn SchemaSource) -> AppResult<ModelGraph> {
        let mut graph = ModelGraph::new(self.options.clone(), self.extras.clone());
        let specs = source.lower(&mut graph, &self.registry)?;
        input::build_models(&mut graph, specs)?;
        debug!(
            models = graph.models().len(),
            references = graph.references().len(),
            "Built model graph"
        );
        Ok(graph)
    }

    /// Renders `source` into a module body.
    pub fn generate(&self, source: &dyn SchemaSource) -> AppResult<Generated> {
        let graph = self.build_graph(source)?;
        let code = codegen::generate_module(&graph, &self.resolver)?;
        Ok(Generated {
            code,
            diagnostics: graph.diagnostics().to_vec(),
        })
    }

    /// Parses `text` with the selected adapter and renders it.
    pub fn generate_text(&self, file_type: InputFileType, text: &str) -> AppResult<Generated> {
        let source = input::load_source(file_type, text)?;
        self.generate(source.as_ref())
    }

    /// The header for a module generated from `filename`.
    pub fn header(&self, filename: &str) -> FileHeader {
        FileHeader::from_options(&self.options, filename)
    }

    /// Writes header and body to `destination`, or to `writer` when there is none.
    pub fn emit<W: Write>(
        &self,
        generated: &Generated,
        filename: &str,
        destination: Option<&Path>,
        writer: &mut W,
    ) -> AppResult<()> {
        let header = self.header(filename);
        match destination {
            Some(path) => emit::write_file(path, &header, &generated.code),
            None => emit::write_module(writer, &header, &generated.code),
        }
    }
}
