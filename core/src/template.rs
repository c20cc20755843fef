//! # Template Resolution
//!
//! Maps a template identifier (a relative path such as
//! `pydantic_v2/BaseModel.jinja2`) to a compiled template. A file of the same
//! relative path inside the custom template directory shadows the built-in
//! one. Compiled templates are memoized by the owned environment under their
//! resolved identifier (the custom file's path or `builtin://<id>`), so each
//! resolved source is loaded and parsed at most once per resolver.

use crate::error::{AppError, AppResult};
use minijinja::{AutoEscape, Environment, ErrorKind, Template};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Scheme prefix of resolved identifiers for built-in templates.
pub const BUILTIN_SCHEME: &str = "builtin://";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "pydantic_v2/BaseModel.jinja2",
        include_str!("../templates/pydantic_v2/BaseModel.jinja2"),
    ),
    (
        "pydantic_v2/RootModel.jinja2",
        include_str!("../templates/pydantic_v2/RootModel.jinja2"),
    ),
    (
        "pydantic/BaseModel.jinja2",
        include_str!("../templates/pydantic/BaseModel.jinja2"),
    ),
    (
        "pydantic/BaseModel_root.jinja2",
        include_str!("../templates/pydantic/BaseModel_root.jinja2"),
    ),
    (
        "dataclass.jinja2",
        include_str!("../templates/dataclass.jinja2"),
    ),
    (
        "dataclass_root.jinja2",
        include_str!("../templates/dataclass_root.jinja2"),
    ),
];

/// The source of a built-in template.
pub fn builtin_template(template_id: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(id, _)| *id == template_id)
        .map(|(_, source)| *source)
}

/// An owned template cache with an optional override directory.
pub struct TemplateResolver {
    env: Environment<'static>,
    custom_dir: Option<PathBuf>,
    loads: Arc<AtomicUsize>,
}

impl TemplateResolver {
    /// Creates a resolver; `custom_dir` shadows the built-in templates.
    pub fn new(custom_dir: Option<PathBuf>) -> Self {
        let loads = Arc::new(AtomicUsize::new(0));
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);

        let counter = Arc::clone(&loads);
        env.set_loader(move |identifier| {
            counter.fetch_add(1, Ordering::Relaxed);
            load_source(identifier)
        });

        TemplateResolver {
            env,
            custom_dir,
            loads,
        }
    }

    /// The custom template directory, if any.
    pub fn custom_dir(&self) -> Option<&Path> {
        self.custom_dir.as_deref()
    }

    /// The identifier a template resolves to: the custom file's path when
    /// it exists, otherwise `builtin://<id>`.
    pub fn resolved_identifier(&self, template_id: &str) -> String {
        match self.custom_path(template_id) {
            Some(path) => path.display().to_string(),
            None => format!("{}{}", BUILTIN_SCHEME, template_id),
        }
    }

    /// Looks up (loading and compiling on first use) a template.
    pub fn resolve(&self, template_id: &str) -> AppResult<Template<'_, '_>> {
        let before = self.load_count();
        let resolved = self.resolved_identifier(template_id);
        let template = self.env.get_template(&resolved).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                AppError::TemplateNotFound {
                    path: self.expected_path(template_id),
                }
            } else {
                AppError::Template(err.to_string())
            }
        })?;
        if self.load_count() == before {
            debug!(template = template_id, "Template cache hit");
        } else {
            debug!(template = template_id, resolved = %resolved, "Loaded template");
        }
        Ok(template)
    }

    /// Resolves and renders a template with the given context.
    pub fn render<S: Serialize>(&self, template_id: &str, context: S) -> AppResult<String> {
        self.resolve(template_id)?
            .render(context)
            .map_err(|err| AppError::Template(format!("{}: {}", template_id, err)))
    }

    /// How many times a template source was loaded from disk or the built-ins.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn custom_path(&self, template_id: &str) -> Option<PathBuf> {
        let path = self.custom_dir.as_ref()?.join(template_id);
        path.is_file().then_some(path)
    }

    fn expected_path(&self, template_id: &str) -> PathBuf {
        match &self.custom_dir {
            Some(dir) => dir.join(template_id),
            None => Path::new("templates").join(template_id),
        }
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Loads the source behind a resolved identifier.
fn load_source(identifier: &str) -> Result<Option<String>, minijinja::Error> {
    if let Some(template_id) = identifier.strip_prefix(BUILTIN_SCHEME) {
        return Ok(builtin_template(template_id).map(str::to_string));
    }
    let path = Path::new(identifier);
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(path).map(Some).map_err(|e| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", path.display()),
        )
        .with_source(e)
    })
}
