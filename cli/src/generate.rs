#![deny(missing_docs)]

//! # Generate Command
//!
//! Reads a schema document, renders it into a Python module and writes the
//! result to a file or stdout.
//!
//! Options come from two layers: an optional YAML/JSON config file, then the
//! command line. A flag given on the command line always wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use modelsmith_core::{
    AppError, AppResult, ExtraTemplateData, GenerationOptions, Generator, InputFileType,
    OutputFlavor, PythonVersion, TypeRegistry,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Schema document to read.
    #[clap(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// How the input is interpreted (`jsonschema` or `models`).
    #[clap(long)]
    pub input_file_type: Option<InputFileType>,

    /// Output file. The module goes to stdout when omitted.
    #[clap(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// `pydantic_v2.BaseModel`, `pydantic.BaseModel` or `dataclasses.dataclass`.
    #[clap(long)]
    pub output_model_type: Option<OutputFlavor>,

    /// Python release the generated code targets (e.g. `3.9`).
    #[clap(long)]
    pub target_python_version: Option<PythonVersion>,

    /// YAML or JSON file with generation options.
    #[clap(long, env = "MODELSMITH_CONFIG")]
    pub config: Option<PathBuf>,

    /// YAML or JSON file with extra template data keyed by model name.
    #[clap(long)]
    pub extra_template_data: Option<PathBuf>,

    /// Directory whose templates shadow the built-in ones.
    #[clap(long)]
    pub custom_template_dir: Option<PathBuf>,

    /// Custom type as `Name=module.Symbol`. May be repeated.
    #[clap(long = "custom-type")]
    pub custom_types: Vec<String>,

    /// Base class for every non-root model.
    #[clap(long)]
    pub custom_base_class: Option<String>,

    /// Class name of the root schema object.
    #[clap(long)]
    pub class_name: Option<String>,

    /// Replaces the generated file header.
    #[clap(long)]
    pub custom_file_header: Option<String>,

    /// Move `Field(...)` metadata into `Annotated[...]`.
    #[clap(long)]
    pub use_annotated: bool,

    /// Use `list`/`dict`/`set` instead of the `typing` aliases.
    #[clap(long)]
    pub use_standard_collections: bool,

    /// Use `Sequence`/`Mapping`/`FrozenSet` for containers.
    #[clap(long)]
    pub use_generic_container_types: bool,

    /// Render unions and optionals with `|`.
    #[clap(long)]
    pub use_union_operator: bool,

    /// Only explicitly nullable fields become optional.
    #[clap(long)]
    pub strict_nullable: bool,

    /// Allow populating aliased fields by name.
    #[clap(long)]
    pub allow_population_by_field_name: bool,

    /// Allow extra fields on every model.
    #[clap(long)]
    pub allow_extra_fields: bool,

    /// Make every model immutable.
    #[clap(long)]
    pub enable_faux_immutability: bool,

    /// Do not suffix inline array item models with `Item`.
    #[clap(long)]
    pub disable_appending_item_suffix: bool,

    /// Emit models in input order.
    #[clap(long)]
    pub keep_model_order: bool,

    /// Inline simple root models into the fields that use them.
    #[clap(long)]
    pub collapse_root_models: bool,

    /// Render defaults as `Field(default=...)`.
    #[clap(long)]
    pub use_default_kwarg: bool,

    /// Use a single required literal as the default.
    #[clap(long)]
    pub use_one_literal_as_default: bool,

    /// Do not render `= None` defaults.
    #[clap(long)]
    pub strip_default_none: bool,

    /// Render field descriptions as docstrings.
    #[clap(long)]
    pub use_field_description: bool,

    /// Render schema descriptions as class docstrings.
    #[clap(long)]
    pub use_schema_description: bool,

    /// Omit the timestamp from the file header.
    #[clap(long)]
    pub disable_timestamp: bool,

    /// Add the generator version to the file header.
    #[clap(long)]
    pub enable_version_header: bool,
}

/// The config file layout: generation options plus the run-level settings
/// that are not part of [`GenerationOptions`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    input: Option<PathBuf>,
    input_file_type: Option<String>,
    output: Option<PathBuf>,
    extra_template_data: Option<PathBuf>,
    custom_types: Vec<String>,
    #[serde(flatten)]
    options: GenerationOptions,
}

/// Everything a run needs, after both layers are merged.
#[derive(Debug)]
struct Settings {
    input: PathBuf,
    input_file_type: InputFileType,
    output: Option<PathBuf>,
    extras: ExtraTemplateData,
    registry: TypeRegistry,
    options: GenerationOptions,
}

/// Parses a YAML or JSON file, picking the parser by extension.
fn read_document<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::General(format!("Failed to read {:?}: {}", path, e)))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_yaml::from_str(&text)?)
    }
}

fn merge_flag(target: &mut bool, flag: bool) {
    if flag {
        *target = true;
    }
}

fn merge_value<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

impl Settings {
    fn resolve(args: &GenerateArgs) -> AppResult<Self> {
        let file = match &args.config {
            Some(path) => {
                debug!(config = %path.display(), "Loading config file");
                read_document::<ConfigFile>(path)?
            }
            None => ConfigFile::default(),
        };

        let input = args
            .input
            .clone()
            .or(file.input)
            .ok_or_else(|| AppError::Config("No input file given (--input)".to_string()))?;

        let input_file_type = match (args.input_file_type, file.input_file_type) {
            (Some(kind), _) => kind,
            (None, Some(name)) => name.parse()?,
            (None, None) => InputFileType::default(),
        };

        let mut options = file.options;
        if let Some(flavor) = args.output_model_type {
            options.output_model_type = flavor;
        }
        if let Some(version) = args.target_python_version {
            options.target_python_version = version;
        }
        merge_value(&mut options.custom_template_dir, &args.custom_template_dir);
        merge_value(&mut options.custom_base_class, &args.custom_base_class);
        merge_value(&mut options.class_name, &args.class_name);
        merge_value(&mut options.custom_file_header, &args.custom_file_header);

        merge_flag(&mut options.use_annotated, args.use_annotated);
        merge_flag(&mut options.use_standard_collections, args.use_standard_collections);
        merge_flag(
            &mut options.use_generic_container_types,
            args.use_generic_container_types,
        );
        merge_flag(&mut options.use_union_operator, args.use_union_operator);
        merge_flag(&mut options.strict_nullable, args.strict_nullable);
        merge_flag(
            &mut options.allow_population_by_field_name,
            args.allow_population_by_field_name,
        );
        merge_flag(&mut options.allow_extra_fields, args.allow_extra_fields);
        merge_flag(&mut options.enable_faux_immutability, args.enable_faux_immutability);
        merge_flag(
            &mut options.disable_appending_item_suffix,
            args.disable_appending_item_suffix,
        );
        merge_flag(&mut options.keep_model_order, args.keep_model_order);
        merge_flag(&mut options.collapse_root_models, args.collapse_root_models);
        merge_flag(&mut options.use_default_kwarg, args.use_default_kwarg);
        merge_flag(
            &mut options.use_one_literal_as_default,
            args.use_one_literal_as_default,
        );
        merge_flag(&mut options.strip_default_none, args.strip_default_none);
        merge_flag(&mut options.use_field_description, args.use_field_description);
        merge_flag(&mut options.use_schema_description, args.use_schema_description);
        merge_flag(&mut options.disable_timestamp, args.disable_timestamp);
        merge_flag(&mut options.enable_version_header, args.enable_version_header);

        let extras = match args.extra_template_data.as_ref().or(file.extra_template_data.as_ref()) {
            Some(path) => read_document::<ExtraTemplateData>(path)?,
            None => ExtraTemplateData::new(),
        };

        let mut registry = TypeRegistry::new();
        for spec in file.custom_types.iter().chain(&args.custom_types) {
            registry.register_spec(spec).ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid custom type `{}`, expected Name=module.Symbol",
                    spec
                ))
            })?;
        }

        Ok(Settings {
            input,
            input_file_type,
            output: args.output.clone().or(file.output),
            extras,
            registry,
            options,
        })
    }
}

/// Executes the generate command.
///
/// # Arguments
///
/// * `args` - Command arguments.
pub fn execute(args: &GenerateArgs) -> AppResult<()> {
    let settings = Settings::resolve(args)?;

    let text = fs::read_to_string(&settings.input).map_err(|e| {
        AppError::General(format!("Failed to read input {:?}: {}", settings.input, e))
    })?;
    let filename = settings
        .input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| settings.input.display().to_string());

    let generator = Generator::new(settings.options)
        .with_extras(settings.extras)
        .with_registry(settings.registry);
    let generated = generator.generate_text(settings.input_file_type, &text)?;
    debug!(
        diagnostics = generated.diagnostics.len(),
        "Generated module"
    );

    if let Some(parent) = settings.output.as_deref().and_then(Path::parent) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::General(format!("Failed to create output dir: {}", e)))?;
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    generator.emit(&generated, &filename, settings.output.as_deref(), &mut handle)?;

    if let Some(output) = &settings.output {
        info!(output = %output.display(), "Generation finished");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCHEMA: &str = r#"{
        "title": "Item",
        "type": "object",
        "required": ["id"],
        "properties": {"id": {"type": "integer"}, "tags": {"type": "array", "items": {"type": "string"}}}
    }"#;

    #[test]
    fn test_execute_writes_output_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("item.json");
        let output = dir.path().join("out/item.py");
        fs::write(&input, SCHEMA).unwrap();

        let args = GenerateArgs {
            input: Some(input),
            output: Some(output.clone()),
            disable_timestamp: true,
            ..Default::default()
        };
        execute(&args).unwrap();

        let contents = fs::read_to_string(output).unwrap();
        assert!(contents.starts_with("# generated by modelsmith:\n#   filename:  item.json\n\n"));
        assert!(contents.contains("class Item(BaseModel):\n    id: int\n"));
        assert!(contents.contains("    tags: Optional[List[str]] = None\n"));
    }

    #[test]
    fn test_execute_missing_input() {
        let dir = tempdir().unwrap();
        let args = GenerateArgs {
            input: Some(dir.path().join("missing.json")),
            ..Default::default()
        };
        let err = execute(&args).unwrap_err();
        assert!(matches!(err, AppError::General(_)));
    }

    #[test]
    fn test_no_input_is_config_error() {
        let err = Settings::resolve(&GenerateArgs::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_config_file_merged_with_flags() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("modelsmith.yaml");
        fs::write(
            &config,
            "input: schema.json\n\
             input_file_type: models\n\
             output_model_type: dataclasses.dataclass\n\
             use_union_operator: true\n\
             class_name: FromFile\n\
             custom_types:\n  - Money=shop.types.Money\n",
        )
        .unwrap();

        let args = GenerateArgs {
            config: Some(config),
            class_name: Some("FromFlag".to_string()),
            keep_model_order: true,
            ..Default::default()
        };
        let settings = Settings::resolve(&args).unwrap();

        assert_eq!(settings.input, PathBuf::from("schema.json"));
        assert_eq!(settings.input_file_type, InputFileType::Models);
        assert_eq!(settings.options.output_model_type, OutputFlavor::Dataclass);
        assert!(settings.options.use_union_operator);
        assert!(settings.options.keep_model_order);
        assert_eq!(settings.options.class_name.as_deref(), Some("FromFlag"));
        assert!(settings.registry.get("Money").is_some());
    }

    #[test]
    fn test_flag_overrides_config_flavor() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("modelsmith.json");
        fs::write(&config, r#"{"output_model_type": "pydantic.BaseModel"}"#).unwrap();

        let args = GenerateArgs {
            input: Some(PathBuf::from("schema.json")),
            config: Some(config),
            output_model_type: Some(OutputFlavor::PydanticV2),
            ..Default::default()
        };
        let settings = Settings::resolve(&args).unwrap();
        assert_eq!(settings.options.output_model_type, OutputFlavor::PydanticV2);
    }

    #[test]
    fn test_invalid_custom_type() {
        let args = GenerateArgs {
            input: Some(PathBuf::from("schema.json")),
            custom_types: vec!["NoPath".to_string()],
            ..Default::default()
        };
        let err = Settings::resolve(&args).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_extra_template_data_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("item.json");
        let extras = dir.path().join("extras.yaml");
        let output = dir.path().join("item.py");
        fs::write(&input, SCHEMA).unwrap();
        fs::write(&extras, "Item:\n  config:\n    frozen: true\n").unwrap();

        let args = GenerateArgs {
            input: Some(input),
            output: Some(output.clone()),
            extra_template_data: Some(extras),
            disable_timestamp: true,
            ..Default::default()
        };
        execute(&args).unwrap();

        let contents = fs::read_to_string(output).unwrap();
        assert!(contents.contains("    model_config = ConfigDict(\n        frozen=True,\n    )\n"));
    }
}
