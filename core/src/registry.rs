//! # Custom Type Registry
//!
//! Maps user-declared type names (e.g. a schema `format` or an
//! `x-python-type` annotation) to the Python symbols that implement them.
//! The registry is an ordinary value built by the caller and handed to the
//! front-end adapters; nothing registers itself implicitly.

use crate::imports::Import;
use crate::types::DataType;
use indexmap::IndexMap;

/// A registered custom type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomType {
    /// Dotted import path of the implementing symbol.
    pub import_path: String,
}

/// Registry of custom types, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, CustomType>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a custom type.
    pub fn register(&mut self, name: &str, import_path: &str) {
        self.types.insert(
            name.to_string(),
            CustomType {
                import_path: import_path.to_string(),
            },
        );
    }

    /// Parses `Name=module.Symbol` and registers it.
    pub fn register_spec(&mut self, spec: &str) -> Option<()> {
        let (name, path) = spec.split_once('=')?;
        let (name, path) = (name.trim(), path.trim());
        if name.is_empty() || path.is_empty() {
            return None;
        }
        self.register(name, path);
        Some(())
    }

    /// Looks a custom type up by name.
    pub fn get(&self, name: &str) -> Option<&CustomType> {
        self.types.get(name)
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// A descriptor for a registered type, flagged as custom.
    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.get(name)
            .map(|t| DataType::from_import(Import::from_full_path(&t.import_path)).custom())
    }
}
