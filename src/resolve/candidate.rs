//! Candidate selection.
//!
//! Given one bare name, picks the best accessible class among all entities
//! carrying that name. Typedef candidates are followed through the alias
//! resolver; template-argument placeholders are never selected. Results are
//! memoized per `(scope, name, qualifier[, file])`, and a sentinel entry is
//! written before searching so a query that re-enters itself through
//! mutually-referential typedefs or base classes sees a miss instead of
//! looping.

use smol_str::{SmolStr, ToSmolStr};
use tracing::{trace, warn};

use crate::base::text::{normalize_type_spacing, split_qualifier, split_template_suffix, template_span_end};
use crate::base::{EntityId, SrcLang};
use crate::graph::{Argument, EntityKind, MemberKind};

use super::{parse_template_args, LookupInfo, Resolver};

/// Initial "infinite" candidate distance.
const INFINITE_DISTANCE: u32 = 10000;

/// Namespace-alias chains longer than this are reported and cut off.
const MAX_ALIAS_HOPS: u32 = 10;

/// Best class match for a name.
#[derive(Clone, Debug, Default)]
pub struct ClassHit {
    pub class: Option<EntityId>,
    /// The typedef or enumeration member the name matched through, if any.
    pub typedef: Option<EntityId>,
    /// Template-specifier text that remained after matching.
    pub template_spec: SmolStr,
    /// The resolved type text, qualified.
    pub resolved_type: SmolStr,
}

impl ClassHit {
    pub fn is_found(&self) -> bool {
        self.class.is_some() || self.typedef.is_some()
    }
}

impl<'g> Resolver<'g> {
    /// Resolve a class or typedef name from a lookup scope. The scope walk,
    /// using-imports and alias following all apply; non-linkable results
    /// are dropped, as renderers must not emit dead links.
    pub fn resolve_class(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        name: &str,
    ) -> ClassHit {
        let mut hit = self.resolve_class_unchecked(scope, file_scope, name);
        if let Some(c) = hit.class {
            if !self.graph.entity(c).linkable {
                hit.class = None;
            }
        }
        hit
    }

    /// Like [`Resolver::resolve_class`] but keeps non-linkable results.
    /// Canonicalization wants those: an undocumented class still names a
    /// type.
    pub(crate) fn resolve_class_unchecked(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        name: &str,
    ) -> ClassHit {
        self.resolving_aliases.clear();
        let graph = self.graph;

        let scope_entity = graph.entity(scope);
        let scope = if !(scope_entity.is_class() || scope_entity.is_namespace())
            || (scope_entity.lang == SrcLang::Java && name.contains("::"))
        {
            // Java has no global operator; a qualified name is absolute
            graph.global_scope()
        } else {
            scope
        };

        let mut hit = self.resolve_class_rec(scope, file_scope, name);
        if hit.class.is_none() {
            // nested classes imported from external reference files may
            // lack scope metadata; try the name as-is
            hit.class = self.get_class(name);
        }
        hit
    }

    /// The recursive worker behind class resolution, memoized.
    pub(crate) fn resolve_class_rec(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        name: &str,
    ) -> ClassHit {
        let graph = self.graph;

        let normalized = normalize_type_spacing(name);
        let (descoped, stripped_parent) = self.strip_template_specifiers(&normalized, true);
        let (qualifier, rest) = split_qualifier(&descoped);
        let explicit = match qualifier {
            Some(q) => self.replace_namespace_aliases(q),
            None => String::new(),
        };
        let (bare, trailing) = split_template_suffix(rest);
        if bare.is_empty() {
            return ClassHit::default();
        }

        // actual template arguments for typedef substitution: an explicit
        // trailing spec wins over one stripped from the qualifier
        let spec_text = trailing.map(str::to_string).or(stripped_parent);
        let act_args: Vec<Argument> = spec_text
            .as_deref()
            .map(parse_template_args)
            .unwrap_or_default();

        let mut entries = graph.glossary_entries(bare);
        if entries.is_empty() {
            // Objective-C protocols are registered with a -p suffix
            let protocol = format!("{bare}-p");
            entries = graph.glossary_entries(&protocol);
            if entries.is_empty() {
                return ClassHit::default();
            }
        }

        // a class name can live in two namespaces with a file-level using
        // statement selecting one of them, so such files key the memo too
        let has_usings = file_scope.is_some_and(|f| graph.has_using_imports(f));
        let mut key = format!(
            "{}+{}+{}",
            graph.entity(scope).qualified,
            rest,
            explicit
        );
        if has_usings {
            if let Some(f) = file_scope {
                key.push('+');
                key.push_str(&graph.entity(f).qualified);
            }
        }
        let key: SmolStr = key.to_smolstr();

        if let Some(info) = self.lookup_cache.get(&key) {
            trace!(%key, "lookup cache hit");
            return hit_from_info(info, trailing);
        }
        // sentinel guard against endless recursion through this same query
        self.lookup_cache.insert(key.clone(), LookupInfo::default());

        let mut min_distance = INFINITE_DISTANCE;
        let mut best = LookupInfo::default();
        for &id in entries {
            self.visited_namespaces.clear();
            self.consider_candidate(
                scope,
                file_scope,
                id,
                &explicit,
                &act_args,
                &mut min_distance,
                &mut best,
            );
        }

        let hit = hit_from_info(&best, trailing);
        self.lookup_cache.insert(key, best);
        hit
    }

    /// Score one glossary candidate against the running best match.
    fn consider_candidate(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        def: EntityId,
        explicit: &str,
        act_args: &[Argument],
        min_distance: &mut u32,
        best: &mut LookupInfo,
    ) {
        let graph = self.graph;
        let entity = graph.entity(def);

        // only classes, typedefs and enums can answer a type lookup
        let eligible = match &entity.kind {
            EntityKind::Class(_) => true,
            EntityKind::Member(m) => {
                matches!(m.kind, MemberKind::Typedef | MemberKind::Enumeration)
            }
            _ => false,
        };
        if !eligible {
            return;
        }

        let Some(distance) = self.distance_with_path(scope, file_scope, def, explicit) else {
            return;
        };

        match &entity.kind {
            EntityKind::Class(cd) => {
                if cd.is_template_argument {
                    return;
                }
                if distance < *min_distance {
                    *min_distance = distance;
                    *best = LookupInfo {
                        class: Some(def),
                        typedef: None,
                        template_spec: SmolStr::default(),
                        resolved_type: entity.qualified.clone(),
                    };
                } else if distance == *min_distance {
                    // A class X defined both in a namespace and in the
                    // global scope ties when searched from the global
                    // scope. Prefer the namespaced one when the file scope
                    // imports namespaces and the incumbent is global. A
                    // fixed heuristic, kept as documented.
                    let file_imports = file_scope.is_some_and(|f| {
                        graph
                            .entity(f)
                            .scope_data()
                            .is_some_and(|s| !s.using_namespaces.is_empty())
                    });
                    let def_in_namespace = entity.outer.is_some_and(|o| {
                        !o.is_global() && graph.entity(o).is_namespace()
                    });
                    let best_in_global = best
                        .class
                        .is_some_and(|c| graph.entity(c).outer == Some(graph.global_scope()));
                    if file_imports && def_in_namespace && best_in_global {
                        *best = LookupInfo {
                            class: Some(def),
                            typedef: None,
                            template_spec: SmolStr::default(),
                            resolved_type: entity.qualified.clone(),
                        };
                    }
                }
            }
            EntityKind::Member(m) if m.kind == MemberKind::Typedef => {
                // "typedef t a[4]" and friends do not alias a type
                if !m.is_simple_typedef() {
                    return;
                }
                if distance < *min_distance {
                    // even when the alias resolves to nothing, the phrase
                    // at this distance hides anything farther away
                    *min_distance = distance;
                    let actual = (!act_args.is_empty()).then_some(act_args);
                    let res = self.resolve_alias(file_scope, def, actual);
                    *best = if let Some(class) = res.class {
                        LookupInfo {
                            class: Some(class),
                            typedef: Some(def),
                            template_spec: res.template_spec,
                            resolved_type: res.resolved_type,
                        }
                    } else if let Some(enum_hit) = res.enum_hit {
                        LookupInfo {
                            class: None,
                            typedef: Some(enum_hit),
                            template_spec: SmolStr::default(),
                            resolved_type: graph.entity(enum_hit).qualified.clone(),
                        }
                    } else if entity.is_external() {
                        LookupInfo {
                            class: None,
                            typedef: Some(def),
                            template_spec: res.template_spec,
                            resolved_type: res.resolved_type,
                        }
                    } else {
                        LookupInfo {
                            class: None,
                            typedef: Some(def),
                            template_spec: SmolStr::default(),
                            resolved_type: SmolStr::default(),
                        }
                    };
                }
            }
            EntityKind::Member(m) if m.kind == MemberKind::Enumeration => {
                if distance < *min_distance {
                    *min_distance = distance;
                    *best = LookupInfo {
                        class: None,
                        typedef: Some(def),
                        template_spec: SmolStr::default(),
                        resolved_type: entity.qualified.clone(),
                    };
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // DIRECT LOOKUPS
    // ========================================================================

    /// Class by exact name, with no scope context. Last-resort fallback for
    /// entities that lack scope metadata.
    pub fn get_class(&self, name: &str) -> Option<EntityId> {
        if name.is_empty() {
            return None;
        }
        self.graph.class_by_qualified(name)
    }

    /// Namespace by exact name, following namespace aliases.
    pub fn get_namespace(&self, name: &str) -> Option<EntityId> {
        if name.is_empty() {
            return None;
        }
        match self.follow_namespace_alias(name) {
            Some(subst) => self.graph.namespace_by_qualified(&subst),
            None => self.graph.namespace_by_qualified(name),
        }
    }

    /// Follow a namespace-alias chain to its end, bounded. A chain that has
    /// not converged within the hop limit is a configuration anomaly: it is
    /// reported and the last value reached is used.
    fn follow_namespace_alias(&self, name: &str) -> Option<SmolStr> {
        let mut subst = self.graph.namespace_alias(name)?.clone();
        let mut hops = 0u32;
        while let Some(next) = self.graph.namespace_alias(&subst) {
            if hops == MAX_ALIAS_HOPS {
                warn!(alias = name, "possible recursive namespace alias");
                break;
            }
            subst = next.clone();
            hops += 1;
        }
        Some(subst)
    }

    /// Substitute namespace aliases inside an explicit scope qualifier.
    fn replace_namespace_aliases(&self, qualifier: &str) -> String {
        if let Some(subst) = self.follow_namespace_alias(qualifier) {
            return subst.to_string();
        }
        // the first fragment alone may be aliased
        if let Some((head, tail)) = qualifier.split_once("::") {
            if let Some(subst) = self.follow_namespace_alias(head) {
                return format!("{subst}::{tail}");
            }
        }
        qualifier.to_string()
    }

    // ========================================================================
    // TEMPLATE STRIPPING
    // ========================================================================

    /// Strip template-specifier spans from the scope-qualifier portion of a
    /// name, keeping a span when the prefix including it names a known
    /// class (an explicit specialization). With `parent_only` the trailing
    /// component keeps its specifier. Returns the stripped name and the
    /// last removed span.
    pub(crate) fn strip_template_specifiers(
        &self,
        full_name: &str,
        parent_only: bool,
    ) -> (String, Option<String>) {
        let mut result = String::with_capacity(full_name.len());
        let mut last_stripped = None;
        let mut p = 0usize;
        let mut open = full_name.find('<');

        while let Some(i) = open {
            let e = template_span_end(full_name, i);
            let has_more_scope = full_name[e.min(full_name.len())..].contains("::");
            if parent_only && !has_more_scope {
                break;
            }
            result.push_str(&full_name[p..i]);
            let with_spec = format!("{}{}", result, &full_name[i..e.min(full_name.len())]);
            if self.graph.class_by_qualified(&with_spec).is_some() {
                // an explicit specialization exists under this exact name
                result.push_str(&full_name[i..e.min(full_name.len())]);
            } else {
                last_stripped = Some(full_name[i..e.min(full_name.len())].to_string());
            }
            p = e.min(full_name.len());
            open = full_name[p..].find('<').map(|x| p + x);
        }
        result.push_str(&full_name[p..]);
        (result, last_stripped)
    }
}

fn hit_from_info(info: &LookupInfo, trailing: Option<&str>) -> ClassHit {
    ClassHit {
        class: info.class,
        typedef: info.typedef,
        template_spec: match trailing {
            Some(t) if !t.is_empty() => t.into(),
            _ => info.template_spec.clone(),
        },
        resolved_type: info.resolved_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SrcLang;
    use crate::graph::GraphBuilder;

    #[test]
    fn test_shadowing_prefers_inner_scope() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n = b.add_namespace(b.global_scope(), "N").unwrap();
        let inner_a = b.add_class(n, "A").unwrap();
        let outer_a = b.add_class(b.global_scope(), "A").unwrap();
        let lookup_class = b.add_class(n, "B").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        // from inside N::B the namespaced A wins
        assert_eq!(r.resolve_class(lookup_class, None, "A").class, Some(inner_a));
        // from the global scope the global A wins
        assert_eq!(
            r.resolve_class(graph.global_scope(), None, "A").class,
            Some(outer_a)
        );
    }

    #[test]
    fn test_qualified_name_resolves_from_anywhere() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n = b.add_namespace(b.global_scope(), "N").unwrap();
        let a = b.add_class(n, "A").unwrap();
        let elsewhere = b.add_namespace(b.global_scope(), "Other").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        assert_eq!(r.resolve_class(elsewhere, None, "N::A").class, Some(a));
        assert_eq!(
            r.resolve_class(graph.global_scope(), None, "N::A").class,
            Some(a)
        );
    }

    #[test]
    fn test_typedef_candidate_resolves_through_alias() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let a = b.add_class(b.global_scope(), "A").unwrap();
        let t = b.add_typedef(b.global_scope(), "T", "A").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let hit = r.resolve_class(graph.global_scope(), None, "T");
        assert_eq!(hit.class, Some(a));
        assert_eq!(hit.typedef, Some(t));
        assert_eq!(hit.resolved_type.as_str(), "A");
    }

    #[test]
    fn test_template_argument_placeholder_never_selected() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let holder = b.add_class(b.global_scope(), "T").unwrap();
        b.mark_template_argument(holder).unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        assert!(r.resolve_class(graph.global_scope(), None, "T").class.is_none());
    }

    #[test]
    fn test_memoized_second_call_identical() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n = b.add_namespace(b.global_scope(), "N").unwrap();
        b.add_class(n, "A").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let first = r.resolve_class(n, None, "A");
        let cached_entries = r.lookup_cache_len();
        let second = r.resolve_class(n, None, "A");

        assert_eq!(first.class, second.class);
        // the repeat query added nothing: pure cache hit
        assert_eq!(r.lookup_cache_len(), cached_entries);
    }

    #[test]
    fn test_file_scope_with_usings_keys_cache_separately() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n1 = b.add_namespace(b.global_scope(), "N1").unwrap();
        let n2 = b.add_namespace(b.global_scope(), "N2").unwrap();
        let a1 = b.add_class(n1, "A").unwrap();
        let a2 = b.add_class(n2, "A").unwrap();
        let f1 = b.add_file("one.cpp");
        let f2 = b.add_file("two.cpp");
        b.add_using_namespace(f1, n1, None).unwrap();
        b.add_using_namespace(f2, n2, None).unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let via_f1 = r.resolve_class(graph.global_scope(), Some(f1), "A").class;
        let via_f2 = r.resolve_class(graph.global_scope(), Some(f2), "A").class;
        assert_eq!(via_f1, Some(a1));
        assert_eq!(via_f2, Some(a2));
    }

    #[test]
    fn test_namespace_over_global_tiebreak() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        // global A first so it becomes the incumbent on a tie
        let global_a = b.add_class(b.global_scope(), "A").unwrap();
        let n = b.add_namespace(b.global_scope(), "N").unwrap();
        let ns_a = b.add_class(n, "A").unwrap();
        let f = b.add_file("main.cpp");
        b.add_using_namespace(f, n, None).unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        // with the importing file in scope, the namespaced A is preferred
        let hit = r.resolve_class(graph.global_scope(), Some(f), "A");
        assert_eq!(hit.class, Some(ns_a));
        // without it, the global A wins outright
        let hit = r.resolve_class(graph.global_scope(), None, "A");
        assert_eq!(hit.class, Some(global_a));
    }

    #[test]
    fn test_namespace_alias_in_qualifier() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n = b.add_namespace(b.global_scope(), "VeryLongName").unwrap();
        let a = b.add_class(n, "A").unwrap();
        b.add_namespace_alias("vl", "VeryLongName");
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        assert_eq!(
            r.resolve_class(graph.global_scope(), None, "vl::A").class,
            Some(a)
        );
    }

    #[test]
    fn test_namespace_alias_loop_capped() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        b.add_namespace_alias("a", "b");
        b.add_namespace_alias("b", "a");
        let graph = b.finish();
        let r = Resolver::new(&graph);

        // must terminate; the chain never converges so nothing is found
        assert!(r.get_namespace("a").is_none());
    }

    #[test]
    fn test_nonlinkable_dropped_from_public_lookup() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let a = b.add_class(b.global_scope(), "A").unwrap();
        b.set_linkable(a, false);
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        assert!(r.resolve_class(graph.global_scope(), None, "A").class.is_none());
        // canonicalization still sees the type
        assert_eq!(
            r.resolve_class_unchecked(graph.global_scope(), None, "A").class,
            Some(a)
        );
    }

    #[test]
    fn test_strip_template_specifiers() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        b.add_class(b.global_scope(), "A").unwrap();
        let graph = b.finish();
        let r = Resolver::new(&graph);

        let (stripped, last) = r.strip_template_specifiers("A<T>::B", true);
        assert_eq!(stripped, "A::B");
        assert_eq!(last.as_deref(), Some("<T>"));

        // parent-only keeps a trailing specifier in place
        let (stripped, last) = r.strip_template_specifiers("A<T>", true);
        assert_eq!(stripped, "A<T>");
        assert!(last.is_none());

        let (stripped, _) = r.strip_template_specifiers("A<T>", false);
        assert_eq!(stripped, "A");
    }
}
