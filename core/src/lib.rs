#![deny(missing_docs)]

//! # Modelsmith Core
//!
//! Middle and back end of the schema-to-Python compiler: type descriptors,
//! fields and models built against a reference arena, per-flavor config
//! derivation, template rendering and emission.

/// Shared error types.
pub mod error;

/// Generation options and target Python capabilities.
pub mod config;

/// Python literal rendering.
pub mod python;

/// Import requirements and the module import block.
pub mod imports;

/// Validation constraint sets.
pub mod constraints;

/// Forward-declared references and their arena.
pub mod reference;

/// Type descriptors.
pub mod types;

/// Custom type registry.
pub mod registry;

/// Per-model extra template data.
pub mod extras;

/// Field entities.
pub mod field;

/// Output flavors (pydantic v2, pydantic v1, dataclasses).
pub mod flavor;

/// Model entities and the model graph.
pub mod model;

/// Template resolution and caching.
pub mod template;

/// Module assembly and model ordering.
pub mod codegen;

/// Header and output writing.
pub mod emit;

/// Front-end adapters.
pub mod input;

/// End-to-end generation.
pub mod pipeline;

pub use codegen::{generate_module, model_order, render_model};
pub use config::{GenerationOptions, PythonVersion};
pub use constraints::{ConstraintKind, ConstraintSet, ConstraintValue};
pub use emit::FileHeader;
pub use error::{AppError, AppResult};
pub use extras::{ExtraTemplateData, ModelExtras};
pub use field::{DataModelField, FieldSpec};
pub use flavor::{ModelFlavor, OutputFlavor};
pub use imports::{Import, Imports};
pub use input::{InputFileType, JsonSchemaDocument, ModelsDocument, SchemaSource};
pub use model::{DataModel, Diagnostic, ModelGraph, ModelKind, ModelSpec};
pub use pipeline::{Generated, Generator};
pub use reference::{ModelId, RefId, Reference, ReferenceArena};
pub use registry::TypeRegistry;
pub use template::TemplateResolver;
pub use types::DataType;
