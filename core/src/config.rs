//! # Generation Options
//!
//! The knobs handed to the core by the CLI/config layer: the output flavor,
//! the target Python capability set, and every generation toggle.

use crate::error::{AppError, AppResult};
use crate::flavor::OutputFlavor;
use serde::Deserialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// The Python release the generated module targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
pub enum PythonVersion {
    /// Python 3.8.
    #[serde(rename = "3.8")]
    Py38,
    /// Python 3.9.
    #[serde(rename = "3.9")]
    Py39,
    /// Python 3.10.
    #[serde(rename = "3.10")]
    Py310,
    /// Python 3.11.
    #[serde(rename = "3.11")]
    Py311,
    /// Python 3.12.
    #[default]
    #[serde(rename = "3.12")]
    Py312,
    /// Python 3.13.
    #[serde(rename = "3.13")]
    Py313,
}

impl PythonVersion {
    /// `typing.Annotated` exists natively (otherwise `typing_extensions`).
    pub fn has_annotated_type(self) -> bool {
        self >= PythonVersion::Py39
    }

    /// `typing.Literal` exists natively.
    pub fn has_literal_type(self) -> bool {
        self >= PythonVersion::Py38
    }

    /// `X | Y` is valid at runtime.
    pub fn has_union_operator(self) -> bool {
        self >= PythonVersion::Py310
    }

    /// `list[int]` / `dict[str, int]` are valid at runtime.
    pub fn has_native_collections(self) -> bool {
        self >= PythonVersion::Py39
    }
}

impl Display for PythonVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PythonVersion::Py38 => "3.8",
            PythonVersion::Py39 => "3.9",
            PythonVersion::Py310 => "3.10",
            PythonVersion::Py311 => "3.11",
            PythonVersion::Py312 => "3.12",
            PythonVersion::Py313 => "3.13",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PythonVersion {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "3.8" => Ok(PythonVersion::Py38),
            "3.9" => Ok(PythonVersion::Py39),
            "3.10" => Ok(PythonVersion::Py310),
            "3.11" => Ok(PythonVersion::Py311),
            "3.12" => Ok(PythonVersion::Py312),
            "3.13" => Ok(PythonVersion::Py313),
            other => Err(AppError::Config(format!(
                "Unsupported target Python version: {}",
                other
            ))),
        }
    }
}

/// Every toggle that reaches the core.
///
/// Deserializable so the CLI can load it from a YAML/JSON config file; keys
/// use the snake_case names of the fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Which model/field variants and templates are used.
    pub output_model_type: OutputFlavor,
    /// Capability set of the generated code's runtime.
    pub target_python_version: PythonVersion,

    /// Move `Field(...)` metadata into `Annotated[...]`.
    pub use_annotated: bool,
    /// `list`/`dict`/`set` instead of `typing.List`/`Dict`/`Set`.
    pub use_standard_collections: bool,
    /// `Sequence`/`Mapping`/`FrozenSet` instead of concrete containers.
    pub use_generic_container_types: bool,
    /// `A | B` / `A | None` instead of `Union[...]` / `Optional[...]`.
    pub use_union_operator: bool,
    /// Disables the fallback that treats non-required fields as nullable.
    pub strict_nullable: bool,
    /// Adds `allow_population_by_field_name` to every model's extras.
    pub allow_population_by_field_name: bool,
    /// Adds `allow_extra_fields` to every model's extras.
    pub allow_extra_fields: bool,
    /// Adds `allow_mutation = false` to every model's extras.
    pub enable_faux_immutability: bool,
    /// Inline array item models are not suffixed with `Item`.
    pub disable_appending_item_suffix: bool,
    /// Emit models in input order instead of dependency order.
    pub keep_model_order: bool,
    /// Inline simple root models into the fields that reference them.
    pub collapse_root_models: bool,
    /// Render defaults as `Field(default=...)`.
    pub use_default_kwarg: bool,
    /// A required single-literal field gets that literal as its default.
    pub use_one_literal_as_default: bool,
    /// Do not render `= None` defaults.
    pub strip_default_none: bool,
    /// Field descriptions become docstrings instead of `description=`.
    pub use_field_description: bool,
    /// Schema descriptions become class docstrings.
    pub use_schema_description: bool,

    /// Replaces the flavor's default base class for non-root models.
    pub custom_base_class: Option<String>,
    /// Overrides the class name of the root schema object.
    pub class_name: Option<String>,
    /// Directory whose templates shadow the built-in ones.
    pub custom_template_dir: Option<PathBuf>,

    /// Omit the `timestamp:` header line.
    pub disable_timestamp: bool,
    /// Add a `version:` header line.
    pub enable_version_header: bool,
    /// Replaces the generated header verbatim.
    pub custom_file_header: Option<String>,
}

impl GenerationOptions {
    /// Whether non-required fields with unset nullability become optional.
    pub fn fall_back_to_nullable(&self) -> bool {
        !self.strict_nullable
    }

    /// The capability flags the type renderer needs.
    ///
    /// Standard collections are only used when the target can subscript them.
    pub fn type_options(&self) -> TypeOptions {
        TypeOptions {
            use_standard_collections: self.use_standard_collections
                && self.target_python_version.has_native_collections(),
            use_generic_container_types: self.use_generic_container_types,
            use_union_operator: self.use_union_operator,
            target: self.target_python_version,
        }
    }
}

/// The subset of options that changes how a type descriptor renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeOptions {
    /// See [`GenerationOptions::use_standard_collections`].
    pub use_standard_collections: bool,
    /// See [`GenerationOptions::use_generic_container_types`].
    pub use_generic_container_types: bool,
    /// See [`GenerationOptions::use_union_operator`].
    pub use_union_operator: bool,
    /// See [`GenerationOptions::target_python_version`].
    pub target: PythonVersion,
}
