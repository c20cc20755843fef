//! # References
//!
//! Forward-declared symbol slots. A `Reference` is allocated (keyed by its
//! stable path) before the model it names exists, so models can point at
//! siblings that are built later or at themselves. Back-links are stored as
//! plain ids into the arena, never as owning pointers.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Index of a [`Reference`] inside a [`ReferenceArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefId(pub(crate) usize);

/// Index of a model inside the model graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) usize);

impl ModelId {
    /// Position of the model in input order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named slot that is bound to exactly one model once that model is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Stable dotted path (e.g. `#/$defs/User` or `api.models.User`).
    pub path: String,
    /// The name as it appeared in the schema.
    pub original_name: String,
    /// Display name, possibly de-duplicated.
    pub name: String,
    /// The name this reference would have had without de-duplication.
    pub duplicate_name: Option<String>,
    source: Option<ModelId>,
    children: Vec<ModelId>,
}

impl Reference {
    /// The last dotted segment of the display name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The model this reference denotes, once bound.
    pub fn source(&self) -> Option<ModelId> {
        self.source
    }

    /// Models that use this reference as a base class.
    pub fn children(&self) -> &[ModelId] {
        &self.children
    }
}

/// Path-keyed storage of every reference in a run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceArena {
    refs: Vec<Reference>,
    by_path: IndexMap<String, RefId>,
    taken_names: HashSet<String>,
}

impl ReferenceArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reference for `path`, creating a placeholder if needed.
    ///
    /// A new reference whose `name` collides with an existing display name is
    /// renamed to `Name1`, `Name2`, ... and remembers the colliding name in
    /// `duplicate_name`. Existing references are returned unchanged.
    pub fn get_or_insert(&mut self, path: &str, name: &str) -> RefId {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        let unique = self.unique_name(name);
        let duplicate_name = (unique != name).then(|| name.to_string());
        let id = RefId(self.refs.len());
        self.taken_names.insert(unique.clone());
        self.refs.push(Reference {
            path: path.to_string(),
            original_name: name.to_string(),
            name: unique,
            duplicate_name,
            source: None,
            children: Vec::new(),
        });
        self.by_path.insert(path.to_string(), id);
        id
    }

    /// Looks up a reference by path.
    pub fn find(&self, path: &str) -> Option<RefId> {
        self.by_path.get(path).copied()
    }

    /// Borrows a reference.
    ///
    /// Ids are only minted by this arena, so indexing cannot fail for ids
    /// obtained from it.
    pub fn get(&self, id: RefId) -> &Reference {
        &self.refs[id.0]
    }

    /// Iterates references in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (RefId, &Reference)> {
        self.refs.iter().enumerate().map(|(i, r)| (RefId(i), r))
    }

    /// Number of allocated references.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether no reference was allocated yet.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Binds a reference to the model it denotes. A second bind is an error.
    pub fn bind_source(&mut self, id: RefId, model: ModelId) -> AppResult<()> {
        let reference = &mut self.refs[id.0];
        if let Some(existing) = reference.source {
            return Err(AppError::Config(format!(
                "Reference '{}' is already bound to model #{}",
                reference.path, existing.0
            )));
        }
        reference.source = Some(model);
        Ok(())
    }

    /// Records `child` as deriving from the model behind `id`.
    pub fn add_child(&mut self, id: RefId, child: ModelId) {
        let children = &mut self.refs[id.0].children;
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Replaces the last dotted segment of a reference's display name.
    pub fn set_class_name(&mut self, id: RefId, class_name: &str) {
        let reference = &mut self.refs[id.0];
        self.taken_names.remove(&reference.name);
        reference.name = match reference.name.rsplit_once('.') {
            Some((prefix, _)) => format!("{}.{}", prefix, class_name),
            None => class_name.to_string(),
        };
        self.taken_names.insert(reference.name.clone());
    }

    fn unique_name(&self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut count = 1;
        while self.taken_names.contains(&candidate) {
            candidate = format!("{}{}", name, count);
            count += 1;
        }
        candidate
    }
}
