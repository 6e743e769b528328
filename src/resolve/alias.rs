//! Typedef and template resolution.
//!
//! A typedef is followed to the class or enum its right-hand side
//! ultimately names. Chains are followed through the candidate selector,
//! which may re-enter this module; the currently-resolving set turns alias
//! cycles (`typedef A B; typedef B A;`) into a plain "not found".
//!
//! The second half of this module canonicalizes type text: every
//! identifier-like token is replaced by the qualified name of whatever it
//! resolves to, which is what makes two differently-spelled but equivalent
//! types comparable.

use smol_str::{SmolStr, ToSmolStr};
use tracing::trace;

use crate::base::text::{
    next_identifier, next_type_identifier, normalize_type_spacing, strip_irrelevant_qualifiers,
    strip_keyword_prefix,
};
use crate::base::EntityId;
use crate::graph::{Argument, MemberKind, TemplateParam};

use super::Resolver;

/// Recursion bound for identifier canonicalization; typedefs feeding each
/// other deeper than this pass through unresolved.
const MAX_CANONICAL_DEPTH: u32 = 10;

/// Result of following a typedef to its underlying type.
#[derive(Clone, Debug, Default)]
pub struct AliasResolution {
    /// The class the typedef ultimately names, when it names one.
    pub class: Option<EntityId>,
    /// The enumeration member it aliases instead, when it names an enum.
    pub enum_hit: Option<EntityId>,
    /// Template-specifier text split off while resolving.
    pub template_spec: SmolStr,
    /// The resolved right-hand side with the stripped pointer/reference
    /// affixes re-attached.
    pub resolved_type: SmolStr,
}

impl<'g> Resolver<'g> {
    /// Follow `typedef_member` to the class or enum its value names.
    ///
    /// `actual_template_args` substitutes for the owner's formal template
    /// parameters when the typedef lives inside a template that has been
    /// instantiated.
    ///
    /// The result is memoized on the member, except for members synthesized
    /// from transient code fragments, which must not pollute the permanent
    /// cache.
    pub fn resolve_alias(
        &mut self,
        file_scope: Option<EntityId>,
        typedef_member: EntityId,
        actual_template_args: Option<&[Argument]>,
    ) -> AliasResolution {
        let graph = self.graph;
        let entity = graph.entity(typedef_member);
        let Some(member) = entity.member() else {
            return AliasResolution::default();
        };
        if member.kind != MemberKind::Typedef {
            return AliasResolution::default();
        }

        if let Some(memoized) = self.alias_memo.get(&typedef_member) {
            return memoized.clone();
        }

        let qualified = entity.qualified.clone();
        if !self.resolving_aliases.insert(qualified.clone()) {
            // alias cycle
            trace!(typedef = %qualified, "typedef cycle detected");
            return AliasResolution::default();
        }

        let resolution =
            self.resolve_alias_inner(file_scope, typedef_member, actual_template_args);

        if !member.from_code_fragment {
            self.alias_memo
                .insert(typedef_member, resolution.clone());
        }
        self.resolving_aliases.remove(&qualified);
        resolution
    }

    fn resolve_alias_inner(
        &mut self,
        file_scope: Option<EntityId>,
        typedef_member: EntityId,
        actual_template_args: Option<&[Argument]>,
    ) -> AliasResolution {
        let graph = self.graph;
        let entity = graph.entity(typedef_member);
        let member = match entity.member() {
            Some(m) => m,
            None => return AliasResolution::default(),
        };
        let owner_scope = graph.outer_scope(typedef_member);

        // the "value" of the typedef, with actual template arguments
        // substituted when the owner is an instantiated template
        let mut value = member.type_text.to_string();
        if let (Some(actual), Some(owner_class)) =
            (actual_template_args, graph.entity(owner_scope).class())
        {
            if owner_class.is_template() && !actual.is_empty() {
                value =
                    substitute_template_args(&value, &owner_class.template_params, actual);
            }
        }

        // strip trailing pointer/reference affixes and leading keywords
        let core_end = value.trim_end_matches(['*', '&', ' ']).len();
        let suffix = value[core_end..].to_string();
        let mut core = &value[..core_end];
        for prefix in ["const ", "struct ", "union "] {
            core = strip_keyword_prefix(core, prefix);
        }
        let core = core.trim_start().to_string();

        let hit = self.resolve_class_rec(owner_scope, file_scope, &core);

        let mut resolution = AliasResolution {
            class: hit.class,
            enum_hit: None,
            template_spec: hit.template_spec.clone(),
            resolved_type: SmolStr::default(),
        };

        // the right-hand side may itself be a typedef or an enum
        if let Some(md) = hit.typedef {
            match graph.entity(md).member().map(|m| m.kind) {
                Some(MemberKind::Typedef) if md != typedef_member => {
                    let nested = self.resolve_alias(file_scope, md, None);
                    resolution.class = nested.class;
                    resolution.enum_hit = nested.enum_hit;
                    resolution.template_spec = nested.template_spec;
                }
                Some(MemberKind::Enumeration) => {
                    resolution.enum_hit = Some(md);
                }
                _ => {}
            }
        }

        resolution.resolved_type = match resolution.class {
            Some(class) => {
                format!("{}{}", graph.entity(class).qualified, suffix).to_smolstr()
            }
            None => value.to_smolstr(),
        };
        resolution
    }

    // ========================================================================
    // CANONICAL TYPES
    // ========================================================================

    /// Canonicalize a type string: every identifier-like token is replaced
    /// by the qualified name of whatever it resolves to in `scope`;
    /// unresolved tokens pass through unchanged.
    ///
    /// Idempotent: canonicalizing an already-canonical string returns it
    /// unchanged.
    pub fn canonical_type(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        type_text: &str,
    ) -> String {
        let stripped = strip_irrelevant_qualifiers(type_text.trim());
        let mut core = stripped.as_str();
        for prefix in ["class ", "struct ", "union ", "enum ", "typename "] {
            core = strip_keyword_prefix(core, prefix);
        }
        let text = normalize_type_spacing(core);

        let mut canonical = String::with_capacity(text.len());
        let mut copy_from = 0usize;
        let mut pos = 0usize;

        while let Some(token) = next_type_identifier(&text, pos) {
            canonical.push_str(&text[copy_from..token.start]);
            // always present at the top level, mirroring a caller that asks
            // for the leftover spec; empty when the token carried none
            let mut spec = Some(token.template_spec.unwrap_or("").to_string());
            let resolved =
                self.canonical_for_identifier(scope, file_scope, token.word, &mut spec, 0);
            pos = token.next;
            if resolved.is_empty() && text[pos..].starts_with("::") {
                // the token names the lookup scope itself; skip it and its
                // separator
                pos += 2;
            } else {
                canonical.push_str(&resolved);
            }

            if let Some(spec) = spec {
                // the specifier was not absorbed into the class name;
                // canonicalize the identifiers inside it
                canonical.push_str(&self.canonical_spec_identifiers(scope, file_scope, &spec));
            }
            copy_from = pos;
        }
        canonical.push_str(&text[copy_from..]);
        normalize_type_spacing(&canonical)
    }

    fn canonical_spec_identifiers(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        spec: &str,
    ) -> String {
        let mut out = String::with_capacity(spec.len());
        let mut last = 0usize;
        while let Some((start, end)) = next_identifier(spec, last) {
            out.push_str(&spec[last..start]);
            let mut no_spec = None;
            out.push_str(&self.canonical_for_identifier(
                scope,
                file_scope,
                &spec[start..end],
                &mut no_spec,
                0,
            ));
            last = end;
        }
        out.push_str(&spec[last..]);
        out
    }

    /// Canonical replacement for one identifier token. `spec` carries the
    /// token's template specifier in and is cleared when the replacement
    /// absorbs it.
    fn canonical_for_identifier(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        word: &str,
        spec: &mut Option<String>,
        depth: u32,
    ) -> String {
        if depth > MAX_CANONICAL_DEPTH {
            return word.to_string();
        }
        let graph = self.graph;

        let canonical_spec = match spec.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => {
                let c = self.canonical_template_spec(scope, file_scope, s);
                strip_decl_keywords(&c)
            }
            None => String::new(),
        };

        let lookup = if canonical_spec.is_empty() {
            word.to_string()
        } else {
            format!("{word}{canonical_spec}")
        };
        let mut hit = self.resolve_class_rec(scope, file_scope, &lookup);
        if hit.class.is_none() {
            // external-reference classes may carry no scope metadata
            hit.class = self.get_class(word);
        }
        let is_template_instance = hit.class.is_some() && !canonical_spec.is_empty();

        let class = hit.class.filter(|&c| {
            // ignore artifacts introduced only by usage relations
            !graph.entity(c).class().is_some_and(|cd| cd.used_only)
        });

        if let Some(cd) = class {
            let matched_typedef = hit.typedef.is_some_and(|md| {
                graph
                    .entity(md)
                    .member()
                    .is_some_and(|m| m.kind == MemberKind::Typedef)
            });
            if matched_typedef {
                return format!("{}{}", hit.resolved_type, hit.template_spec);
            }

            let cdata = graph.entity(cd).class();
            let is_template = cdata.is_some_and(|c| c.is_template());
            let mut effective_spec = canonical_spec;
            if is_template_instance {
                // the specifier is already part of the matched class type
                *spec = None;
                effective_spec = String::new();
            } else if effective_spec.is_empty() && !hit.template_spec.is_empty() {
                let c =
                    self.canonical_template_spec(scope, file_scope, &hit.template_spec);
                effective_spec = strip_decl_keywords(&c);
            }

            let qualified = &graph.entity(cd).qualified;
            if is_template && spec.is_some() {
                *spec = None;
                if !effective_spec.is_empty() {
                    // a specific instantiation
                    return normalize_type_spacing(&format!("{qualified}{effective_spec}"));
                }
                // fall back to the formal parameter list
                return qualified_with_template_params(
                    qualified,
                    &graph.entity(cd).class().map(|c| c.template_params.clone()).unwrap_or_default(),
                );
            }
            if hit.template_spec.is_empty() && !effective_spec.is_empty() && !is_template {
                // a non-template used with arguments, e.g. loaded from an
                // external reference file; the argument text adds nothing
                *spec = None;
            }
            return normalize_type_spacing(&format!("{qualified}{effective_spec}"));
        }

        if let Some(md) = hit.typedef {
            match graph.entity(md).member().map(|m| (m.kind, m.type_text.clone())) {
                Some((MemberKind::Enumeration, _)) => {
                    return graph.entity(md).qualified.to_string();
                }
                Some((MemberKind::Typedef, underlying)) => {
                    if word != underlying {
                        let stripped =
                            strip_keyword_prefix(underlying.as_str(), "typename ").to_string();
                        return self.canonical_for_identifier(
                            scope, file_scope, &stripped, spec, depth + 1,
                        );
                    }
                    return underlying.to_string();
                }
                _ => {}
            }
        }

        word.to_string()
    }

    /// Canonicalize the contents of a template specifier.
    fn canonical_template_spec(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        spec: &str,
    ) -> String {
        let trimmed = spec.trim();
        match trimmed.strip_prefix('<') {
            Some(inner) => format!("< {}", self.canonical_type(scope, file_scope, inner.trim())),
            None => trimmed.to_string(),
        }
    }
}

/// Remove declaration keywords that may appear inside template argument
/// text (`<class T>` vs `<T>`).
fn strip_decl_keywords(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0usize;
    let mut pos = 0usize;
    while let Some((start, end)) = next_identifier(s, pos) {
        let word = &s[start..end];
        if matches!(word, "class" | "typename" | "struct" | "union") {
            out.push_str(&s[last..start]);
            last = s[end..]
                .char_indices()
                .find(|&(_, c)| c != ' ')
                .map(|(i, _)| end + i)
                .unwrap_or(s.len());
        }
        pos = end;
    }
    out.push_str(&s[last..]);
    out
}

/// Render a template class with its formal parameter list,
/// `Map` + `[K, V]` → `Map<K, V>`.
fn qualified_with_template_params(qualified: &str, params: &[TemplateParam]) -> String {
    if params.is_empty() {
        return qualified.to_string();
    }
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    format!("{qualified}<{}>", names.join(", "))
}

/// Substitute actual template arguments for formal parameter names inside
/// raw type text, token-wise. Missing actuals fall back to the formal
/// parameter's default.
fn substitute_template_args(
    type_text: &str,
    formals: &[TemplateParam],
    actuals: &[Argument],
) -> String {
    let mut out = String::with_capacity(type_text.len());
    let mut last = 0usize;
    let mut pos = 0usize;
    while let Some((start, end)) = next_identifier(type_text, pos) {
        let word = &type_text[start..end];
        if let Some(idx) = formals.iter().position(|f| f.name == word) {
            let replacement = actuals
                .get(idx)
                .map(|a| a.type_text.as_str())
                .or(formals[idx].default_text.as_deref());
            if let Some(replacement) = replacement {
                out.push_str(&type_text[last..start]);
                out.push_str(replacement);
                last = end;
            }
        }
        pos = end;
    }
    out.push_str(&type_text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SrcLang;
    use crate::graph::GraphBuilder;

    #[test]
    fn test_substitute_template_args() {
        let formals = vec![
            TemplateParam {
                name: "T".into(),
                default_text: None,
                constraint: None,
            },
            TemplateParam {
                name: "U".into(),
                default_text: Some("int".into()),
                constraint: None,
            },
        ];
        let actuals = vec![Argument {
            type_text: "A".into(),
            ..Argument::default()
        }];
        assert_eq!(
            substitute_template_args("const T*", &formals, &actuals),
            "const A*"
        );
        // second parameter falls back to its default
        assert_eq!(
            substitute_template_args("Pair<T, U>", &formals, &actuals),
            "Pair<A, int>"
        );
    }

    #[test]
    fn test_strip_decl_keywords() {
        assert_eq!(strip_decl_keywords("<class T>"), "<T>");
        assert_eq!(strip_decl_keywords("<typename T, class U>"), "<T, U>");
        assert_eq!(strip_decl_keywords("<int>"), "<int>");
    }

    #[test]
    fn test_resolve_alias_simple() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let a = b.add_class(b.global_scope(), "A").unwrap();
        let t = b.add_typedef(b.global_scope(), "T", "A").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let res = r.resolve_alias(None, t, None);
        assert_eq!(res.class, Some(a));
        assert_eq!(res.resolved_type.as_str(), "A");
    }

    #[test]
    fn test_resolve_alias_chain() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let a = b.add_class(b.global_scope(), "A").unwrap();
        b.add_typedef(b.global_scope(), "T1", "A").unwrap();
        let t2 = b.add_typedef(b.global_scope(), "T2", "T1").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let res = r.resolve_alias(None, t2, None);
        assert_eq!(res.class, Some(a));
    }

    #[test]
    fn test_resolve_alias_pointer_affix() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        b.add_class(b.global_scope(), "A").unwrap();
        let t = b.add_typedef(b.global_scope(), "T", "const A*").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let res = r.resolve_alias(None, t, None);
        assert!(res.class.is_some());
        assert_eq!(res.resolved_type.as_str(), "A*");
    }

    #[test]
    fn test_resolve_alias_cycle_terminates() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let t1 = b.add_typedef(b.global_scope(), "T1", "T2").unwrap();
        let t2 = b.add_typedef(b.global_scope(), "T2", "T1").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        assert!(r.resolve_alias(None, t1, None).class.is_none());
        assert!(r.resolve_alias(None, t2, None).class.is_none());
    }

    #[test]
    fn test_resolve_alias_enum_hit() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let e = b.add_enum(b.global_scope(), "Color", false).unwrap();
        let t = b.add_typedef(b.global_scope(), "Hue", "Color").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let res = r.resolve_alias(None, t, None);
        assert!(res.class.is_none());
        assert_eq!(res.enum_hit, Some(e));
    }

    #[test]
    fn test_resolve_alias_memoized() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        b.add_class(b.global_scope(), "A").unwrap();
        let t = b.add_typedef(b.global_scope(), "T", "A").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        let first = r.resolve_alias(None, t, None);
        let second = r.resolve_alias(None, t, None);
        assert_eq!(first.class, second.class);
        assert!(r.alias_memo.contains_key(&t));

        r.invalidate_member(t);
        assert!(!r.alias_memo.contains_key(&t));
    }

    #[test]
    fn test_canonical_type_resolves_to_qualified() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n = b.add_namespace(b.global_scope(), "N").unwrap();
        b.add_class(n, "A").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        assert_eq!(r.canonical_type(n, None, "A"), "N::A");
        assert_eq!(r.canonical_type(n, None, "const A&"), "const N::A&");
    }

    #[test]
    fn test_canonical_type_unresolved_passes_through() {
        let b = GraphBuilder::new(SrcLang::Cpp);
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        assert_eq!(r.canonical_type(graph.global_scope(), None, "int"), "int");
        assert_eq!(
            r.canonical_type(graph.global_scope(), None, "unsigned long"),
            "unsigned long"
        );
    }

    #[test]
    fn test_canonical_type_idempotent() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n = b.add_namespace(b.global_scope(), "N").unwrap();
        b.add_class(n, "A").unwrap();
        b.add_typedef(n, "T", "A").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        for input in ["A", "T", "const T*", "Unknown", "T , A"] {
            let once = r.canonical_type(n, None, input);
            let twice = r.canonical_type(n, None, &once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_canonical_type_through_typedef() {
        let mut b = GraphBuilder::new(SrcLang::Cpp);
        let n = b.add_namespace(b.global_scope(), "N").unwrap();
        b.add_class(n, "A").unwrap();
        b.add_typedef(n, "T", "A").unwrap();
        let graph = b.finish();
        let mut r = Resolver::new(&graph);

        // the alias and its target canonicalize identically
        assert_eq!(r.canonical_type(n, None, "T"), r.canonical_type(n, None, "A"));
    }
}
