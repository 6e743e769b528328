//! Accessibility resolution.
//!
//! Answers whether a candidate entity can be reached from a lookup scope,
//! and at what cost. The distance is a hop count: enclosing-scope steps
//! count 2, a using-import or direct containment counts 0, an inherited
//! nested class counts 1 — so "one level up" is always worse than "one
//! using-import away", and a directly nested match beats an inherited one.
//!
//! Every traversal that can revisit a scope — using-namespace chains,
//! base-class lists, explicit-path recursion — carries a visited set or a
//! bounded stack. Re-entering an in-flight query returns unreachable, which
//! is what makes using-cycles and self-referential imports terminate.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::warn;

use crate::base::text::scope_fragments;
use crate::base::EntityId;
use crate::graph::{MemberKind, Protection, UsingDecl};

use super::{AccessFrame, Resolver, MAX_ACCESS_DEPTH};

/// Inheritance walks deeper than this are reported and treated as
/// unreachable.
const MAX_INHERITANCE_DEPTH: u32 = 256;

impl<'g> Resolver<'g> {
    /// Distance from `scope` to `item`: `None` when unreachable, `Some(0)`
    /// when `item` is directly inside `scope` (or a member accessible on
    /// class `scope`). An inherited nested class costs 1; each enclosing
    /// scope hop costs 2.
    pub fn distance(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        item: EntityId,
    ) -> Option<u32> {
        let frame = AccessFrame {
            scope,
            file_scope,
            item,
            path: SmolStr::default(),
        };
        if self.access_stack.len() >= MAX_ACCESS_DEPTH || self.access_stack.contains(&frame) {
            return None;
        }
        self.access_stack.push(frame);
        let result = self.distance_unguarded(scope, file_scope, item);
        self.access_stack.pop();
        result
    }

    fn distance_unguarded(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        item: EntityId,
    ) -> Option<u32> {
        let graph = self.graph;
        let item_entity = graph.entity(item);
        let item_outer = item_entity.outer;
        let scope_is_class = graph.entity(scope).is_class();

        if item_outer == Some(scope) {
            return Some(0);
        }

        let outer_is_class = item_outer.is_some_and(|o| graph.entity(o).is_class());
        if item_entity.is_member() && outer_is_class && scope_is_class
            && self.class_has_accessible_member(scope, item)
        {
            return Some(0);
        }
        if item_entity.is_class() && outer_is_class && scope_is_class {
            if let Some(o) = item_outer {
                if self.is_base_class(scope, o, 0) {
                    // inherited nested class: penalize so a directly nested
                    // match wins
                    return Some(1);
                }
            }
        }

        if scope.is_global() {
            if let Some(fs) = file_scope {
                if let Some(sd) = graph.entity(fs).scope_data() {
                    if self.accessible_via_using_class(&sd.using_classes, file_scope, item, "") {
                        return Some(0);
                    }
                    let mut visited = FxHashSet::default();
                    if self.accessible_via_using_namespace(
                        &sd.using_namespaces,
                        file_scope,
                        item,
                        "",
                        &mut visited,
                    ) {
                        return Some(0);
                    }
                }
            }
            return None;
        }

        if graph.entity(scope).is_namespace() {
            if let Some(sd) = graph.entity(scope).scope_data() {
                if self.accessible_via_using_class(&sd.using_classes, file_scope, item, "") {
                    return Some(0);
                }
                let mut visited = FxHashSet::default();
                if self.accessible_via_using_namespace(
                    &sd.using_namespaces,
                    file_scope,
                    item,
                    "",
                    &mut visited,
                ) {
                    return Some(0);
                }
            }
        }

        let parent = graph.outer_scope(scope);
        self.distance(parent, file_scope, item).map(|d| d + 2)
    }

    /// Like [`Resolver::distance`], but the lookup name carried an explicit
    /// scope qualifier: resolve `path` against `scope` first, then apply
    /// the same rules relative to the resolved scope.
    ///
    /// Example: looking for item `A::I` from scope `B` first tries `B::A::I`
    /// and, failing that, resolves `A::I` against the global scope at one
    /// enclosing hop, so the result is a parent-level distance.
    pub fn distance_with_path(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        item: EntityId,
        path: &str,
    ) -> Option<u32> {
        if path.is_empty() {
            return self.distance(scope, file_scope, item);
        }
        let frame = AccessFrame {
            scope,
            file_scope,
            item,
            path: path.into(),
        };
        if self.access_stack_x.len() >= MAX_ACCESS_DEPTH || self.access_stack_x.contains(&frame) {
            return None;
        }
        self.access_stack_x.push(frame);
        let result = self.distance_with_path_unguarded(scope, file_scope, item, path);
        self.access_stack_x.pop();
        result
    }

    fn distance_with_path_unguarded(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        item: EntityId,
        path: &str,
    ) -> Option<u32> {
        let graph = self.graph;

        if let Some(new_scope) = self.follow_path(scope, file_scope, path) {
            let item_outer = graph.entity(item).outer;
            if item_outer == Some(new_scope) {
                return Some(0);
            }
            if let Some(o) = item_outer {
                if graph.entity(o).is_class()
                    && graph.entity(new_scope).is_class()
                    && self.is_base_class(new_scope, o, 0)
                {
                    // found through inheritance; a direct nesting elsewhere
                    // should still win
                    return Some(1);
                }
            }

            if graph.entity(new_scope).is_namespace() {
                // item may be A::B::C referenced as A::C, with B imported
                // into A via a using directive
                self.visited_namespaces.insert(new_scope);
                if let Some(sd) = graph.entity(new_scope).scope_data() {
                    if sd.using_classes.iter().any(|u| u.target == item) {
                        return Some(0);
                    }
                    for und in &sd.using_namespaces {
                        if self.visited_namespaces.contains(&und.target) {
                            continue;
                        }
                        let nested_path = graph.entity(und.target).qualified.clone();
                        if self
                            .distance_with_path(scope, file_scope, item, &nested_path)
                            .is_some()
                        {
                            return Some(0);
                        }
                    }
                }
            }

            if !scope.is_global() {
                let parent = graph.outer_scope(scope);
                return self
                    .distance_with_path(parent, file_scope, item, path)
                    .map(|d| d + 2);
            }
            return None;
        }

        // the explicit scope does not exist below `scope`
        if graph.entity(scope).is_namespace() {
            if let Some(sd) = graph.entity(scope).scope_data() {
                let mut visited = FxHashSet::default();
                if self.accessible_via_using_namespace(
                    &sd.using_namespaces,
                    file_scope,
                    item,
                    path,
                    &mut visited,
                ) {
                    return Some(0);
                }
            }
        }

        if scope.is_global() {
            if let Some(fs) = file_scope {
                if let Some(sd) = graph.entity(fs).scope_data() {
                    let mut visited = FxHashSet::default();
                    if self.accessible_via_using_namespace(
                        &sd.using_namespaces,
                        file_scope,
                        item,
                        path,
                        &mut visited,
                    ) {
                        return Some(0);
                    }
                }
            }
            return None;
        }

        let parent = graph.outer_scope(scope);
        self.distance_with_path(parent, file_scope, item, path)
            .map(|d| d + 2)
    }

    // ========================================================================
    // PATH FOLLOWING
    // ========================================================================

    /// Interpret `path` as a partial qualified scope name starting at
    /// `start` and walk it through nested-compound maps. Typedef segments
    /// are substituted; a segment that is not a nested compound may still
    /// match a class or namespace imported into the current scope.
    pub(crate) fn follow_path(
        &mut self,
        start: EntityId,
        file_scope: Option<EntityId>,
        path: &str,
    ) -> Option<EntityId> {
        let graph = self.graph;
        let mut current = start;

        for fragment in scope_fragments(path) {
            let (replacement, typedef) = self.subst_typedef(current, file_scope, fragment);
            if let Some(td) = typedef {
                let res = self.resolve_alias(file_scope, td, None);
                if let Some(class) = res.class {
                    return Some(class);
                }
            }

            let next = graph.entity(current).find_inner(&replacement).or_else(|| {
                graph.entity(current).scope_data().and_then(|sd| {
                    sd.using_classes
                        .iter()
                        .chain(sd.using_namespaces.iter())
                        .map(|u| u.target)
                        .find(|&t| graph.entity(t).name == replacement)
                })
            });
            current = next?;
        }
        Some(current)
    }

    /// Substitute a single unqualified path segment if an accessible
    /// typedef with that name exists. Returns the (possibly substituted)
    /// segment text and the typedef member used.
    fn subst_typedef(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        fragment: &str,
    ) -> (SmolStr, Option<EntityId>) {
        let graph = self.graph;
        let mut best = None;
        let mut best_dist = u32::MAX;

        for &id in graph.glossary_entries(fragment) {
            let is_typedef = graph
                .entity(id)
                .member()
                .is_some_and(|m| m.kind == MemberKind::Typedef);
            if !is_typedef {
                continue;
            }
            if let Some(d) = self.distance(scope, file_scope, id) {
                if d < best_dist {
                    best_dist = d;
                    best = Some(id);
                }
            }
        }

        match best {
            Some(id) => match graph.entity(id).member() {
                Some(m) => (m.type_text.clone(), Some(id)),
                None => (fragment.into(), None),
            },
            None => (fragment.into(), None),
        }
    }

    // ========================================================================
    // USING-IMPORT REACHABILITY
    // ========================================================================

    fn accessible_via_using_class(
        &mut self,
        decls: &[UsingDecl],
        file_scope: Option<EntityId>,
        item: EntityId,
        path: &str,
    ) -> bool {
        for ucd in decls {
            let base = match &ucd.explicit_path {
                Some(p) => self.follow_path(ucd.target, file_scope, p),
                None => Some(ucd.target),
            };
            let Some(base) = base else { continue };
            let sc = if path.is_empty() {
                Some(base)
            } else {
                self.follow_path(base, file_scope, path)
            };
            if sc == Some(item) {
                return true;
            }
        }
        false
    }

    fn accessible_via_using_namespace(
        &mut self,
        decls: &[UsingDecl],
        file_scope: Option<EntityId>,
        item: EntityId,
        path: &str,
        visited: &mut FxHashSet<EntityId>,
    ) -> bool {
        let graph = self.graph;
        for und in decls {
            let base = match &und.explicit_path {
                Some(p) => self.follow_path(und.target, file_scope, p),
                None => Some(und.target),
            };
            let Some(base) = base else { continue };
            let sc = if path.is_empty() {
                Some(base)
            } else {
                self.follow_path(base, file_scope, path)
            };
            if let Some(sc) = sc {
                if graph.entity(item).outer == Some(sc) {
                    return true;
                }
            }

            // C++ using-directives are transitive; imports in other
            // languages are not
            if graph.entity(item).lang == crate::base::SrcLang::Cpp
                && visited.insert(und.target)
            {
                if let Some(nested) = graph.entity(und.target).scope_data() {
                    if self.accessible_via_using_namespace(
                        &nested.using_namespaces,
                        file_scope,
                        item,
                        path,
                        visited,
                    ) {
                        return true;
                    }
                }
                visited.remove(&und.target);
            }
        }
        false
    }

    // ========================================================================
    // INHERITANCE
    // ========================================================================

    /// Whether `base` appears anywhere in `derived`'s base-class graph.
    /// Bounded: base lists may cycle in malformed input.
    pub(crate) fn is_base_class(&self, derived: EntityId, base: EntityId, level: u32) -> bool {
        if level == MAX_INHERITANCE_DEPTH {
            warn!(
                class = %self.graph.entity(derived).qualified,
                "inheritance graph too deep or cyclic"
            );
            return false;
        }
        let Some(cd) = self.graph.entity(derived).class() else {
            return false;
        };
        cd.bases
            .iter()
            .any(|b| b.class == base || self.is_base_class(b.class, base, level + 1))
    }

    /// Smallest number of inheritance steps from `derived` down to `base`;
    /// `Some(0)` when they are the same class.
    pub(crate) fn min_class_distance(&self, derived: EntityId, base: EntityId) -> Option<u32> {
        self.min_class_distance_rec(derived, base, 0)
    }

    fn min_class_distance_rec(&self, derived: EntityId, base: EntityId, level: u32) -> Option<u32> {
        if derived == base {
            return Some(level);
        }
        if level == MAX_INHERITANCE_DEPTH {
            warn!(
                class = %self.graph.entity(derived).qualified,
                "recursive inheritance relation"
            );
            return None;
        }
        let cd = self.graph.entity(derived).class()?;
        cd.bases
            .iter()
            .filter_map(|b| self.min_class_distance_rec(b.class, base, level + 1))
            .min()
    }

    /// Whether a member declared in a class (or one of its bases) is
    /// visible on `class`. Private members do not propagate through
    /// inheritance unless private extraction is enabled.
    fn class_has_accessible_member(&self, class: EntityId, member: EntityId) -> bool {
        let graph = self.graph;
        let Some(m) = graph.entity(member).member() else {
            return false;
        };
        let Some(owner) = graph.entity(member).outer else {
            return false;
        };
        if owner == class {
            return true;
        }
        if self.is_base_class(class, owner, 0) {
            return m.protection != Protection::Private || self.config.extract_private;
        }
        false
    }
}
