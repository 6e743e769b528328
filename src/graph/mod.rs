//! The whole-project symbol graph.
//!
//! This module provides the read-only view of the symbol graph the resolver
//! operates on. It is built once per documentation run by the external
//! indexing pass through [`GraphBuilder`] and is immutable afterwards; the
//! resolver only reads it and keeps its memoization in a separate session
//! object.
//!
//! ## Key Data Structures
//!
//! - [`Entity`] - One declared entity (class, namespace, member, file,
//!   group, page), stored in a single arena addressed by [`EntityId`]
//! - the **glossary** - a local-name → entities multimap, the entry point
//!   of every bare-name lookup
//! - qualified-name maps for classes and namespaces, plus member name
//!   tables split by owning-scope kind

mod builder;
mod entity;

pub use builder::GraphBuilder;
pub use entity::{
    Argument, BaseRef, ClassData, Entity, EntityKind, FileData, GroupData, MemberData,
    MemberKind, PageData, Protection, RefQualifier, ScopeData, TemplateParam, UsingDecl,
};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::EntityId;

/// A labelled section inside a page or compound's documentation.
#[derive(Clone, Debug)]
pub struct Section {
    /// The entity whose output file contains the section.
    pub entity: EntityId,
    /// The anchor label.
    pub label: SmolStr,
}

/// Result of a file lookup, which must distinguish an ambiguous name from a
/// missing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileMatch {
    Unique(EntityId),
    Ambiguous,
    NotFound,
}

/// Error raised while constructing the symbol graph.
///
/// Resolution itself never errors; an unresolvable name is a normal return
/// value. Only the indexing facade can reject structurally impossible
/// input.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("entity '{qualified}' cannot contain declarations")]
    NotAScope { qualified: SmolStr },
    #[error("entity '{qualified}' is not a class")]
    NotAClass { qualified: SmolStr },
    #[error("entity '{qualified}' is not an enumeration member")]
    NotAnEnum { qualified: SmolStr },
}

/// The immutable whole-project symbol graph.
#[derive(Clone, Debug, Default)]
pub struct SymbolGraph {
    /// The single source of truth for all entities. Index 0 is the global
    /// sentinel scope.
    pub(crate) entities: Vec<Entity>,
    /// Local name → every class, namespace or member carrying it.
    pub(crate) glossary: IndexMap<SmolStr, Vec<EntityId>>,
    /// Qualified name → class.
    pub(crate) classes: FxHashMap<SmolStr, EntityId>,
    /// Qualified name → namespace.
    pub(crate) namespaces: FxHashMap<SmolStr, EntityId>,
    /// Local name → members owned by a class.
    pub(crate) class_members: IndexMap<SmolStr, Vec<EntityId>>,
    /// Local name → members owned by a namespace or file.
    pub(crate) scope_members: IndexMap<SmolStr, Vec<EntityId>>,
    /// File base name → files carrying it (several directories may).
    pub(crate) files: IndexMap<SmolStr, Vec<EntityId>>,
    pub(crate) groups: FxHashMap<SmolStr, EntityId>,
    /// Page name → page.
    pub(crate) pages: FxHashMap<SmolStr, EntityId>,
    /// Example name → example page.
    pub(crate) examples: FxHashMap<SmolStr, EntityId>,
    /// Section label → section.
    pub(crate) sections: FxHashMap<SmolStr, Section>,
    /// Directory path (with trailing separator) → directory entity.
    pub(crate) directories: FxHashMap<SmolStr, EntityId>,
    /// Namespace alias → substitution text. Chains are followed with a
    /// bounded hop count by the resolver.
    pub(crate) namespace_aliases: FxHashMap<SmolStr, SmolStr>,
}

impl SymbolGraph {
    /// The sentinel global scope.
    #[inline]
    pub fn global_scope(&self) -> EntityId {
        EntityId::GLOBAL
    }

    /// Get an entity by id.
    ///
    /// Ids are only minted by [`GraphBuilder`], so an out-of-range id is a
    /// construction bug, not input data.
    #[inline]
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index() as usize]
    }

    /// The enclosing scope of an entity; the global sentinel's outer scope
    /// is itself, which keeps outward walks total.
    pub fn outer_scope(&self, id: EntityId) -> EntityId {
        self.entity(id).outer.unwrap_or(EntityId::GLOBAL)
    }

    /// All entities registered under a local name.
    pub fn glossary_entries(&self, name: &str) -> &[EntityId] {
        self.glossary.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Class by exact qualified name.
    pub fn class_by_qualified(&self, name: &str) -> Option<EntityId> {
        self.classes.get(name).copied()
    }

    /// Namespace by exact qualified name.
    pub fn namespace_by_qualified(&self, name: &str) -> Option<EntityId> {
        self.namespaces.get(name).copied()
    }

    /// Members with a local name that are owned by classes.
    pub fn class_members(&self, name: &str) -> &[EntityId] {
        self.class_members
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Members with a local name that are owned by namespaces or files.
    pub fn scope_members(&self, name: &str) -> &[EntityId] {
        self.scope_members
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn group(&self, name: &str) -> Option<EntityId> {
        self.groups.get(name).copied()
    }

    pub fn page(&self, name: &str) -> Option<EntityId> {
        self.pages.get(name).copied()
    }

    pub fn example(&self, name: &str) -> Option<EntityId> {
        self.examples.get(name).copied()
    }

    pub fn section(&self, label: &str) -> Option<&Section> {
        self.sections.get(label)
    }

    pub fn directory(&self, path: &str) -> Option<EntityId> {
        self.directories.get(path).copied()
    }

    /// One step of namespace-alias substitution.
    pub fn namespace_alias(&self, name: &str) -> Option<&SmolStr> {
        self.namespace_aliases.get(name)
    }

    /// Find a file by name or path suffix.
    ///
    /// A bare name matches any file with that base name; a name containing
    /// a path separator must be a suffix of the file's full path. More than
    /// one surviving candidate is reported as ambiguous rather than picking
    /// one.
    pub fn find_file(&self, name: &str, case_insensitive: bool) -> FileMatch {
        let wants_path = name.contains('/');
        let key = if wants_path {
            name.rsplit('/').next().unwrap_or(name)
        } else {
            name
        };

        let candidates: Vec<EntityId> = self
            .files
            .iter()
            .filter(|(base, _)| {
                if case_insensitive {
                    base.eq_ignore_ascii_case(key)
                } else {
                    base.as_str() == key
                }
            })
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|&id| {
                if !wants_path {
                    return true;
                }
                match &self.entity(id).kind {
                    EntityKind::File(f) => {
                        if case_insensitive {
                            f.path.to_ascii_lowercase().ends_with(&name.to_ascii_lowercase())
                        } else {
                            f.path.ends_with(name)
                        }
                    }
                    _ => false,
                }
            })
            .collect();

        match candidates.as_slice() {
            [] => FileMatch::NotFound,
            [one] => FileMatch::Unique(*one),
            _ => FileMatch::Ambiguous,
        }
    }

    /// Whether a file scope carries any using-imports. Lookups through such
    /// a file must key their memo on the file as well.
    pub fn has_using_imports(&self, file: EntityId) -> bool {
        self.entity(file)
            .scope_data()
            .is_some_and(|s| !s.using_namespaces.is_empty() || !s.using_classes.is_empty())
    }

    /// Total number of entities, including the global sentinel.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.len() <= 1
    }
}
