//! # Imports
//!
//! Python import requirements collected from type descriptors, fields and
//! models, and their rendering into a module's import block.

use indexmap::IndexSet;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// A single imported symbol: `from <from> import <import>` or `import <import>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Import {
    /// The module the symbol comes from; `None` for a bare `import x`.
    pub from: Option<Cow<'static, str>>,
    /// The imported name.
    pub import: Cow<'static, str>,
}

impl Import {
    /// Builds an import from static strings (usable in `const` position).
    pub const fn from_static(from: &'static str, import: &'static str) -> Self {
        Import {
            from: Some(Cow::Borrowed(from)),
            import: Cow::Borrowed(import),
        }
    }

    /// Splits a dotted path into module and symbol.
    ///
    /// `pydantic.BaseModel` → `from pydantic import BaseModel`;
    /// a path without dots becomes a bare `import`.
    pub fn from_full_path(path: &str) -> Self {
        match path.rsplit_once('.') {
            Some((module, name)) => Import {
                from: Some(Cow::Owned(module.to_string())),
                import: Cow::Owned(name.to_string()),
            },
            None => Import {
                from: None,
                import: Cow::Owned(path.to_string()),
            },
        }
    }
}

/// `typing.Optional`
pub const OPTIONAL: Import = Import::from_static("typing", "Optional");
/// `typing.Union`
pub const UNION: Import = Import::from_static("typing", "Union");
/// `typing.Any`
pub const ANY: Import = Import::from_static("typing", "Any");
/// `typing.List`
pub const LIST: Import = Import::from_static("typing", "List");
/// `typing.Dict`
pub const DICT: Import = Import::from_static("typing", "Dict");
/// `typing.Set`
pub const SET: Import = Import::from_static("typing", "Set");
/// `typing.Sequence`
pub const SEQUENCE: Import = Import::from_static("typing", "Sequence");
/// `typing.Mapping`
pub const MAPPING: Import = Import::from_static("typing", "Mapping");
/// `typing.FrozenSet`
pub const FROZEN_SET: Import = Import::from_static("typing", "FrozenSet");
/// `collections.abc.Sequence`
pub const ABC_SEQUENCE: Import = Import::from_static("collections.abc", "Sequence");
/// `collections.abc.Mapping`
pub const ABC_MAPPING: Import = Import::from_static("collections.abc", "Mapping");
/// `typing.Literal`
pub const LITERAL: Import = Import::from_static("typing", "Literal");
/// `typing_extensions.Literal`
pub const LITERAL_BACKPORT: Import = Import::from_static("typing_extensions", "Literal");
/// `typing.Annotated`
pub const ANNOTATED: Import = Import::from_static("typing", "Annotated");
/// `typing_extensions.Annotated`
pub const ANNOTATED_BACKPORT: Import = Import::from_static("typing_extensions", "Annotated");
/// `pydantic.Field`
pub const FIELD: Import = Import::from_static("pydantic", "Field");
/// `pydantic.ConfigDict`
pub const CONFIG_DICT: Import = Import::from_static("pydantic", "ConfigDict");
/// `dataclasses.dataclass`
pub const DATACLASS: Import = Import::from_static("dataclasses", "dataclass");
/// `dataclasses.field`
pub const DATACLASS_FIELD: Import = Import::from_static("dataclasses", "field");

/// Deduplicates imports while keeping the order of first appearance.
pub fn unique_imports<I>(imports: I) -> Vec<Import>
where
    I: IntoIterator<Item = Import>,
{
    imports
        .into_iter()
        .collect::<IndexSet<Import>>()
        .into_iter()
        .collect()
}

/// The aggregated import block of one generated module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Imports {
    modules: BTreeMap<String, BTreeSet<String>>,
    bare: BTreeSet<String>,
    future_annotations: bool,
}

impl Imports {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests `from __future__ import annotations` at the top of the block.
    pub fn with_future_annotations(mut self) -> Self {
        self.future_annotations = true;
        self
    }

    /// Adds one import.
    pub fn append(&mut self, import: &Import) {
        match &import.from {
            Some(module) => {
                self.modules
                    .entry(module.to_string())
                    .or_default()
                    .insert(import.import.to_string());
            }
            None => {
                self.bare.insert(import.import.to_string());
            }
        }
    }

    /// Adds every import of the iterator.
    pub fn extend<'a, I>(&mut self, imports: I)
    where
        I: IntoIterator<Item = &'a Import>,
    {
        for import in imports {
            self.append(import);
        }
    }

    /// Whether nothing but (possibly) the future import would be rendered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.bare.is_empty()
    }

    /// Renders the import block, one statement per line, no trailing newline.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        if self.future_annotations {
            lines.push("from __future__ import annotations".to_string());
            if !self.is_empty() {
                lines.push(String::new());
            }
        }
        for module in &self.bare {
            lines.push(format!("import {}", module));
        }
        for (module, names) in &self.modules {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            lines.push(format!("from {} import {}", module, names.join(", ")));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_full_path() {
        let imp = Import::from_full_path("pydantic.BaseModel");
        assert_eq!(imp.from.as_deref(), Some("pydantic"));
        assert_eq!(imp.import, "BaseModel");

        let bare = Import::from_full_path("decimal");
        assert_eq!(bare.from, None);
        assert_eq!(bare.import, "decimal");
    }

    #[test]
    fn test_unique_imports_keeps_first_order() {
        let out = unique_imports(vec![LIST, OPTIONAL, LIST, FIELD]);
        assert_eq!(out, vec![LIST, OPTIONAL, FIELD]);
    }

    #[test]
    fn test_render_groups_and_sorts() {
        let mut imports = Imports::new().with_future_annotations();
        imports.extend(&[OPTIONAL, FIELD, LIST, Import::from_full_path("pydantic.BaseModel")]);
        imports.append(&Import::from_full_path("decimal"));
        assert_eq!(
            imports.render(),
            "from __future__ import annotations\n\nimport decimal\nfrom pydantic import BaseModel, Field\nfrom typing import List, Optional"
        );
    }
}
