//! Overload and reference resolution — the public facade.
//!
//! Renderers and the documentation-text linkifier call only this layer.
//! `resolve_member` walks a textual scope outward looking for a member —
//! classes first, then namespaces, then file-scope globals, finally
//! related and friend declarations — disambiguating overloads by canonical
//! argument comparison. `resolve_link_target` tries the non-code target
//! namespaces (pages, sections, examples, groups, files, directories)
//! before falling through to code symbols, since those names never overlap.

use smol_str::{SmolStr, ToSmolStr};
use tracing::trace;

use crate::base::text::{find_parameter_list, normalize_type_spacing, right_scope_match};
use crate::base::{EntityId, SrcLang};
use crate::graph::{Argument, FileMatch, MemberKind};

use super::{parse_arg_list, LinkTarget, ParsedArgs, Resolved, Resolver};

impl<'g> Resolver<'g> {
    // ========================================================================
    // MEMBER RESOLUTION
    // ========================================================================

    /// Resolve a member reference written as `scope_name` + `member_name`
    /// (which may itself carry a partial scope) + an optional argument
    /// string.
    ///
    /// Passing `None` for `args` means any overload will do; passing
    /// `"()"` prefers a nullary overload but falls back to an arbitrary
    /// accessible one.
    pub fn resolve_member(
        &mut self,
        scope_name: &str,
        member_name: &str,
        args: Option<&str>,
    ) -> Resolved {
        self.get_defs(scope_name, member_name, args, false, None, true)
    }

    /// The worker behind member resolution, with the knobs `resolve_ref`
    /// needs: forcing an empty scope for `::name` references, preferring
    /// the current file for statics, and toggling cv-qualifier checking.
    pub(crate) fn get_defs(
        &mut self,
        scope_name_in: &str,
        member_name_in: &str,
        args: Option<&str>,
        force_empty_scope: bool,
        current_file: Option<EntityId>,
        check_cv: bool,
    ) -> Resolved {
        if member_name_in.is_empty() {
            return Resolved::NotFound;
        }
        let graph = self.graph;

        // PHP writes scopes with backslashes
        let mut scope_name = scope_name_in.replace('\\', "::");
        let member_name = member_name_in.replace('\\', "::");

        // strip the common trailing fragment shared between the context
        // scope and the member's own scope path, so N::f seen from inside
        // N::C is not treated as doubly qualified
        let mut pm = 0usize;
        while let (Some(is), Some(im_rel)) =
            (scope_name.rfind("::"), member_name[pm..].find("::"))
        {
            let im = pm + im_rel;
            if scope_name[is + 2..] != member_name[pm..im] {
                break;
            }
            scope_name.truncate(is);
            pm = im + 2;
        }

        // split the member's own scope path from its local name; conversion
        // operators ("operator std::string") keep their separators
        let (m_scope, m_name) = if !member_name.starts_with("operator ")
            && member_name
                .rfind("::")
                .is_some_and(|im| im + 2 < member_name.len())
        {
            let im = member_name.rfind("::").unwrap_or(0);
            (
                member_name[..im].to_string(),
                member_name[im + 2..].to_string(),
            )
        } else {
            (String::new(), member_name.clone())
        };
        if m_scope == scope_name {
            scope_name.clear();
        }

        // --- pass 1: class members ---------------------------------------
        let class_candidates = graph.class_members(&m_name);
        if (!force_empty_scope || scope_name.is_empty())
            && !class_candidates.is_empty()
            && !(scope_name.is_empty() && m_scope.is_empty())
        {
            if let Some(res) = self.member_in_classes(
                &scope_name,
                &m_scope,
                &m_name,
                class_candidates,
                args,
                check_cv,
            ) {
                return res;
            }
        }

        // --- pass 2: namespace members, then file-scope globals -----------
        let scope_candidates = graph.scope_members(&m_name);
        if !scope_candidates.is_empty() {
            if let Some(res) = self.member_in_namespaces(
                &scope_name,
                &m_scope,
                scope_candidates,
                args,
                check_cv,
            ) {
                return res;
            }
            if let Some(res) =
                self.global_member(scope_candidates, args, current_file, check_cv)
            {
                return res;
            }
        }

        // --- pass 3: related and friend members, as a last resort ---------
        if !class_candidates.is_empty() && scope_name.is_empty() && m_scope.is_empty() {
            if let Some(res) = self.related_member(class_candidates, args, check_cv) {
                return res;
            }
        }

        Resolved::NotFound
    }

    /// Walk the scope outward, at each level resolving `prefix::m_scope` to
    /// a class and scoring its same-named members.
    fn member_in_classes(
        &mut self,
        scope_name: &str,
        m_scope: &str,
        m_name: &str,
        candidates: &[EntityId],
        args: Option<&str>,
        check_cv: bool,
    ) -> Option<Resolved> {
        let graph = self.graph;
        let parsed = args.filter(|a| !a.is_empty()).map(parse_arg_list);
        let mut scope_offset = scope_name.len();

        loop {
            let prefix = &scope_name[..scope_offset];
            let class_name = join_scopes(prefix, m_scope);

            if !class_name.is_empty() {
                let mut hit =
                    self.resolve_class(graph.global_scope(), None, &class_name);
                if hit.class.is_none() && class_name.contains('<') {
                    let (no_templates, _) =
                        self.strip_template_specifiers(&class_name, false);
                    hit = self.resolve_class(graph.global_scope(), None, &no_templates);
                }

                if let Some(fcd) = hit.class {
                    let mut best_distance = u32::MAX;
                    let mut best: Option<(EntityId, EntityId)> = None;

                    for &mmd in candidates {
                        let Some(m) = graph.entity(mmd).member() else {
                            continue;
                        };
                        if m.is_strong_enum_value() {
                            continue;
                        }
                        let matches = match (&parsed, args) {
                            (Some(p), Some(_)) => {
                                self.member_args_match(mmd, fcd, None, p, check_cv)
                            }
                            _ => true,
                        };
                        if !matches {
                            continue;
                        }
                        let Some(mcd) = member_class(self, mmd) else {
                            continue;
                        };
                        if let Some(delta) = self.min_class_distance(fcd, mcd) {
                            if delta < best_distance && graph.entity(mcd).linkable {
                                best_distance = delta;
                                best = Some((mmd, mcd));
                            }
                        }
                    }

                    if best.is_none() && args == Some("()") {
                        // no exact match, but any documented overload will do
                        for &mmd in candidates {
                            let Some(mcd) = member_class(self, mmd) else {
                                continue;
                            };
                            if let Some(delta) = self.min_class_distance(fcd, mcd) {
                                if delta < best_distance && graph.entity(mmd).linkable {
                                    best_distance = delta;
                                    best = Some((mmd, mcd));
                                }
                            }
                        }
                    }

                    if let Some((md, mcd)) = best {
                        let m = graph.entity(md).member();
                        let unlinkable = !graph.entity(md).linkable
                            || m.is_some_and(|m| m.is_strong_enum_value());
                        if unlinkable {
                            // a match we cannot link to ends the search
                            return Some(Resolved::NotFound);
                        }
                        let container = m
                            .and_then(|m| m.group)
                            .unwrap_or(mcd);
                        return Some(Resolved::Member {
                            member: md,
                            container,
                        });
                    }
                }

                // the class path may have matched a scoped enum instead
                if let Some(tmd) = hit.typedef {
                    if let Some(res) = self.scoped_enum_value(tmd, m_name) {
                        return Some(res);
                    }
                }
            }

            if scope_offset == 0 {
                return None;
            }
            scope_offset = scope_name[..scope_offset].rfind("::").unwrap_or(0);
        }
    }

    /// An exact value match inside a scoped enum; unlinkable values end the
    /// search rather than degrading.
    fn scoped_enum_value(&self, tmd: EntityId, m_name: &str) -> Option<Resolved> {
        let graph = self.graph;
        let m = graph.entity(tmd).member()?;
        if m.kind != MemberKind::Enumeration || !m.strong {
            return None;
        }
        for &emd in &m.enum_values {
            if graph.entity(emd).name == m_name {
                if graph.entity(emd).linkable {
                    return Some(Resolved::Member {
                        member: emd,
                        container: graph.outer_scope(tmd),
                    });
                }
                return Some(Resolved::NotFound);
            }
        }
        None
    }

    /// Members documented as related to or friends of a class.
    fn related_member(
        &mut self,
        candidates: &[EntityId],
        args: Option<&str>,
        check_cv: bool,
    ) -> Option<Resolved> {
        let graph = self.graph;
        let parsed = args.filter(|a| !a.is_empty()).map(parse_arg_list);
        let wants_any = args == Some("()");
        let mut fuzzy = None;
        let mut found = None;

        for &item in candidates {
            let entity = graph.entity(item);
            let Some(m) = entity.member() else { continue };
            if !entity.linkable || (!m.is_related && !m.is_foreign) {
                continue;
            }
            let Some(mcd) = member_class(self, item) else {
                continue;
            };
            match &parsed {
                None => {
                    found = Some((item, mcd));
                    break;
                }
                Some(p) => {
                    if self.member_args_match(item, graph.global_scope(), None, p, check_cv) {
                        found = Some((item, mcd));
                        break;
                    }
                    if fuzzy.is_none() && wants_any {
                        fuzzy = Some((item, mcd));
                    }
                }
            }
        }

        let (md, mcd) = found.or(fuzzy)?;
        let strong_value = graph
            .entity(md)
            .member()
            .is_some_and(|m| m.is_strong_enum_value());
        if strong_value {
            return None;
        }
        Some(Resolved::Member {
            member: md,
            container: mcd,
        })
    }

    /// Walk the scope outward over namespaces.
    fn member_in_namespaces(
        &mut self,
        scope_name: &str,
        m_scope: &str,
        candidates: &[EntityId],
        args: Option<&str>,
        check_cv: bool,
    ) -> Option<Resolved> {
        let graph = self.graph;
        let parsed = args.filter(|a| !a.is_empty()).map(parse_arg_list);
        let mut scope_offset = scope_name.len();

        loop {
            let prefix = &scope_name[..scope_offset];
            let namespace_name = join_scopes(prefix, m_scope);

            let fnd = (!namespace_name.is_empty())
                .then(|| graph.namespace_by_qualified(&namespace_name))
                .flatten()
                .filter(|&nd| graph.entity(nd).linkable);

            if let Some(fnd) = fnd {
                let mut found = None;
                for &mmd in candidates {
                    let Some(m) = graph.entity(mmd).member() else {
                        continue;
                    };

                    if let Some(emd) = m.enum_scope {
                        let strong = graph
                            .entity(emd)
                            .member()
                            .is_some_and(|em| em.strong);
                        if strong {
                            let enum_entity = graph.entity(emd);
                            if enum_entity.outer == Some(fnd)
                                && right_scope_match(m_scope, &enum_entity.name)
                            {
                                found = Some(mmd);
                                break;
                            }
                            // a scoped value that does not match exactly is
                            // hidden, not shadowed by something farther out
                            return Some(Resolved::NotFound);
                        }
                    }

                    if graph.entity(mmd).outer == Some(fnd) {
                        let matches = match (&parsed, args) {
                            (Some(p), Some(a)) if a != "()" => {
                                self.member_args_match(mmd, fnd, None, p, check_cv)
                            }
                            _ => true,
                        };
                        if matches {
                            found = Some(mmd);
                            break;
                        }
                    }
                }

                if found.is_none() && args == Some("()") {
                    found = candidates
                        .iter()
                        .copied()
                        .find(|&mmd| graph.entity(mmd).outer == Some(fnd));
                }

                if let Some(md) = found {
                    if !graph.entity(md).linkable {
                        return Some(Resolved::NotFound);
                    }
                    let group = graph
                        .entity(md)
                        .member()
                        .and_then(|m| m.group)
                        .filter(|&g| graph.entity(g).linkable);
                    return Some(Resolved::Member {
                        member: md,
                        container: group.unwrap_or(fnd),
                    });
                }
            } else if !namespace_name.is_empty() {
                // not a namespace; the path may name a scoped enum at file
                // or global level
                for &mmd in candidates {
                    let Some(m) = graph.entity(mmd).member() else {
                        continue;
                    };
                    let Some(tmd) = m.enum_scope else { continue };
                    let strong = graph.entity(tmd).member().is_some_and(|em| em.strong);
                    if !strong {
                        continue;
                    }
                    let enum_entity = graph.entity(tmd);
                    let enum_ns = enum_entity
                        .outer
                        .filter(|&o| !o.is_global() && graph.entity(o).is_namespace());
                    let (not_in_ns, same_ns) = match namespace_name.rfind("::") {
                        None => (
                            enum_ns.is_none()
                                && (m_scope.is_empty() || m_scope == enum_entity.name),
                            false,
                        ),
                        Some(ni) => (
                            false,
                            enum_ns.is_some_and(|ns| {
                                graph.entity(ns).qualified == namespace_name[..ni]
                            }),
                        ),
                    };
                    if not_in_ns || same_ns {
                        let group = m.group.filter(|&g| graph.entity(g).linkable);
                        let container = group
                            .or_else(|| self.member_file(mmd))
                            .unwrap_or(graph.global_scope());
                        return Some(Resolved::Member {
                            member: mmd,
                            container,
                        });
                    }
                }
            }

            if scope_offset == 0 {
                return None;
            }
            scope_offset = scope_name[..scope_offset].rfind("::").unwrap_or(0);
        }
    }

    /// Unscoped file-level members.
    fn global_member(
        &mut self,
        candidates: &[EntityId],
        args: Option<&str>,
        current_file: Option<EntityId>,
        check_cv: bool,
    ) -> Option<Resolved> {
        let graph = self.graph;

        // statics must appear in the same file; try strict first
        let mut members =
            self.find_members_with_name(candidates, args, true, current_file, check_cv);
        if members.is_empty() {
            members =
                self.find_members_with_name(candidates, args, false, current_file, check_cv);
        }

        if members.len() != 1 && args == Some("()") {
            for &mmd in candidates {
                if members.contains(&mmd) {
                    continue;
                }
                let entity = graph.entity(mmd);
                let Some(m) = entity.member() else { continue };
                let fd_ok = self
                    .member_file(mmd)
                    .is_some_and(|f| graph.entity(f).linkable);
                let gd_ok = m.group.is_some_and(|g| graph.entity(g).linkable);
                let strong_enum = m
                    .enum_scope
                    .is_some_and(|e| graph.entity(e).member().is_some_and(|em| em.strong));
                if fd_ok || gd_ok || strong_enum {
                    members.push(mmd);
                }
            }
        }

        if members.is_empty() {
            return None;
        }

        let md = match current_file {
            Some(cf) => members
                .iter()
                .copied()
                .find(|&m| self.member_file(m) == Some(cf))
                .or_else(|| members.last().copied()),
            None => members.last().copied(),
        }?;

        let m = graph.entity(md).member()?;
        let in_strong_enum = m
            .enum_scope
            .is_some_and(|e| graph.entity(e).member().is_some_and(|em| em.strong));
        if in_strong_enum {
            return None;
        }
        let group = m.group.filter(|&g| graph.entity(g).linkable);
        let container = group
            .or_else(|| self.member_file(md))
            .unwrap_or(graph.global_scope());
        Some(Resolved::Member {
            member: md,
            container,
        })
    }

    /// Filter file-scope members by linkability, static locality and
    /// argument match.
    fn find_members_with_name(
        &mut self,
        candidates: &[EntityId],
        args: Option<&str>,
        check_statics: bool,
        current_file: Option<EntityId>,
        check_cv: bool,
    ) -> Vec<EntityId> {
        let graph = self.graph;
        let parsed = args
            .filter(|a| !a.is_empty() && *a != "()")
            .map(parse_arg_list);
        let mut members = Vec::new();

        for &md in candidates {
            let entity = graph.entity(md);
            let Some(m) = entity.member() else { continue };

            // namespace members are handled by the namespace walk
            let owner_is_namespace = entity
                .outer
                .is_some_and(|o| !o.is_global() && graph.entity(o).is_namespace());
            if owner_is_namespace {
                continue;
            }

            let fd = self.member_file(md);
            let fd_ok = fd.is_some_and(|f| graph.entity(f).linkable);
            let gd_ok = m.group.is_some_and(|g| graph.entity(g).linkable);
            if !(fd_ok || gd_ok || entity.is_external()) || !entity.linkable {
                continue;
            }

            if check_statics
                && (m.is_static || m.kind == MemberKind::Define)
                && current_file.is_some()
                && fd != current_file
            {
                continue;
            }

            let matches = match &parsed {
                Some(p) if m.kind != MemberKind::Define => {
                    self.member_args_match(md, graph.global_scope(), fd, p, check_cv)
                }
                _ => true,
            };
            if matches {
                members.push(md);
            }
        }
        members
    }

    // ========================================================================
    // ARGUMENT MATCHING
    // ========================================================================

    /// Compare the full argument lists of two declared members.
    pub fn match_argument_lists(
        &mut self,
        src_member: EntityId,
        dst_member: EntityId,
        check_cv: bool,
    ) -> bool {
        let graph = self.graph;
        let (Some(src), Some(dst)) = (
            graph.entity(src_member).member(),
            graph.entity(dst_member).member(),
        ) else {
            return false;
        };
        if src.args.len() != dst.args.len() {
            return false;
        }
        if check_cv
            && (src.const_qualified != dst.const_qualified
                || src.volatile_qualified != dst.volatile_qualified)
        {
            return false;
        }
        if src.ref_qualifier != dst.ref_qualifier {
            return false;
        }
        for i in 0..src.args.len() {
            let a = self.canonical_member_arg(src_member, i);
            let b = self.canonical_member_arg(dst_member, i);
            if !canonical_types_equal(&a, &b) {
                return false;
            }
        }
        true
    }

    /// Compare a declared member against a parsed argument list.
    fn member_args_match(
        &mut self,
        member: EntityId,
        query_scope: EntityId,
        query_file: Option<EntityId>,
        query: &ParsedArgs,
        check_cv: bool,
    ) -> bool {
        let graph = self.graph;
        let Some(m) = graph.entity(member).member() else {
            return false;
        };
        if m.args.len() != query.args.len() {
            return false;
        }
        if check_cv
            && (m.const_qualified != query.const_qualified
                || m.volatile_qualified != query.volatile_qualified)
        {
            return false;
        }
        if m.ref_qualifier != query.ref_qualifier {
            return false;
        }
        for (i, query_arg) in query.args.iter().enumerate() {
            let src = self.canonical_member_arg(member, i);
            let dst = self.canonical_arg_type(query_scope, query_file, query_arg);
            if !canonical_types_equal(&src, &dst) {
                return false;
            }
        }
        true
    }

    /// Canonical type of one declared argument of a member, memoized and
    /// recomputed only after explicit invalidation.
    fn canonical_member_arg(&mut self, member: EntityId, index: usize) -> SmolStr {
        if let Some(cached) = self.canonical_args.get(&(member, index)) {
            return cached.clone();
        }
        let graph = self.graph;
        let arg = graph
            .entity(member)
            .member()
            .and_then(|m| m.args.get(index))
            .cloned()
            .unwrap_or_default();
        let scope = graph.outer_scope(member);
        let file = self.member_file(member);
        let canonical: SmolStr = self.canonical_arg_type(scope, file, &arg).to_smolstr();
        self.canonical_args
            .insert((member, index), canonical.clone());
        canonical
    }

    fn canonical_arg_type(
        &mut self,
        scope: EntityId,
        file_scope: Option<EntityId>,
        arg: &Argument,
    ) -> String {
        let mut type_text = arg.type_text.trim().to_string();
        // a lone qualifier means the splitter put the real type in the name
        if (type_text == "const" || type_text == "volatile") && !arg.name.is_empty() {
            type_text.push(' ');
            type_text.push_str(&arg.name);
        }
        if arg.name == "const" || arg.name == "volatile" {
            if !type_text.is_empty() {
                type_text.push(' ');
            }
            type_text.push_str(&arg.name);
        }
        if !arg.array.is_empty() {
            type_text.push_str(&arg.array);
        }
        self.canonical_type(scope, file_scope, &type_text)
    }

    /// The file a member belongs to, when its owner is a file scope.
    pub(crate) fn member_file(&self, member: EntityId) -> Option<EntityId> {
        let graph = self.graph;
        graph
            .entity(member)
            .outer
            .filter(|&o| graph.entity(o).is_file())
    }

    // ========================================================================
    // FREE-FORM REFERENCES
    // ========================================================================

    /// Resolve a free-form code reference as written in documentation text.
    ///
    /// `in_see_block` loosens the rules the way an explicit cross-reference
    /// command does: group names become valid targets and all-lowercase
    /// words are no longer dismissed as prose. `check_scope` rejects a
    /// global member found while the reference was explicitly scoped.
    pub fn resolve_ref(
        &mut self,
        context_scope: &str,
        target: &str,
        in_see_block: bool,
        check_scope: bool,
    ) -> Resolved {
        self.resolve_ref_inner(context_scope, target, in_see_block, check_scope, false)
    }

    fn resolve_ref_inner(
        &mut self,
        context_scope: &str,
        target: &str,
        in_see_block: bool,
        check_scope: bool,
        template_stripped: bool,
    ) -> Resolved {
        let graph = self.graph;
        let full = {
            let hashless = target.replace('#', "::");
            let dotless = if hashless.contains("anonymous_namespace{") {
                hashless
            } else {
                hashless.replace('.', "::")
            };
            normalize_type_spacing(&dotless)
        };

        let brace = find_parameter_list(&full);
        let end_name = brace.unwrap_or(full.len());
        let scope_pos = full[..end_name].rfind("::");
        let explicit_global = full.starts_with("::");

        if brace.is_none() {
            // a simple name may be a class or namespace reference
            if !in_see_block && scope_pos.is_none() && is_lower_case(&full) {
                // lower case only, do not auto-link prose words
                return Resolved::NotFound;
            }
            if context_scope != full {
                if let Some(res) = self.get_scope_defs(context_scope, &full) {
                    return res;
                }
            } else {
                // self reference, output plain text
                return Resolved::NotFound;
            }
        }

        let name_str = if explicit_global {
            &full[2..end_name]
        } else {
            &full[..end_name]
        };
        let args_str = brace.map(|b| &full[b..]);

        let res = self.get_defs(
            context_scope,
            name_str,
            args_str,
            explicit_global,
            None,
            true,
        );
        if let Resolved::Member { member, .. } = res {
            // a global member does not satisfy an explicitly scoped
            // reference
            let is_global = graph.entity(member).outer == Some(graph.global_scope())
                || self.member_file(member).is_some();
            let strong_value = graph
                .entity(member)
                .member()
                .is_some_and(|m| m.is_strong_enum_value());
            let explicitly_scoped =
                !context_scope.is_empty() || name_str.contains("::");
            if check_scope && is_global && !strong_value && explicitly_scoped {
                return Resolved::NotFound;
            }
        }
        if res.is_found() {
            return res;
        }

        if in_see_block && !name_str.is_empty() {
            if let Some(gd) = graph.group(name_str) {
                return Resolved::Group(gd);
            }
        }
        if target.contains('.') {
            // maybe a link to a file
            if let FileMatch::Unique(fd) =
                graph.find_file(target, self.config.case_insensitive_files)
            {
                return Resolved::File(fd);
            }
        }

        // strip a template specifier and try again
        if !template_stripped && !name_str.contains("operator") {
            if let (Some(open), Some(close)) = (name_str.find('<'), name_str.rfind('>')) {
                if open < close {
                    let retry = format!("{}{}", &name_str[..open], &name_str[close + 1..]);
                    trace!(from = name_str, to = %retry, "retrying without template args");
                    return self.resolve_ref_inner(
                        context_scope,
                        &retry,
                        in_see_block,
                        check_scope,
                        true,
                    );
                }
            }
        }

        if let Some(b) = brace {
            // could be a constructor reference, Name(args)
            if let Some(cd) = self.get_class(&full[..b]) {
                return Resolved::Class(cd);
            }
        }

        Resolved::NotFound
    }

    /// Resolve a name as a class or namespace, walking the documentation
    /// scope outward. A leading `::` pins the search to the global scope.
    fn get_scope_defs(&mut self, doc_scope: &str, scope_ref: &str) -> Option<Resolved> {
        let graph = self.graph;
        let (scope_name, explicit) = match scope_ref.strip_prefix("::") {
            Some(rest) => (rest, true),
            None => (scope_ref, false),
        };
        if scope_name.is_empty() {
            return None;
        }

        let mut offset = if explicit { 0 } else { doc_scope.len() };
        loop {
            let full_name = if offset > 0 {
                format!("{}::{}", &doc_scope[..offset], scope_name)
            } else {
                scope_name.to_string()
            };

            let class = self
                .get_class(&full_name)
                .or_else(|| self.get_class(&format!("{full_name}-p")));
            if let Some(cd) = class.filter(|&c| graph.entity(c).linkable) {
                return Some(Resolved::Class(cd));
            }
            if let Some(nd) = graph
                .namespace_by_qualified(&full_name)
                .filter(|&n| graph.entity(n).linkable)
            {
                return Some(Resolved::Namespace(nd));
            }

            if offset == 0 {
                return None;
            }
            offset = doc_scope[..offset].rfind("::").unwrap_or(0);
        }
    }

    // ========================================================================
    // LINK TARGETS
    // ========================================================================

    /// Resolve an explicit link reference to a target and anchor.
    ///
    /// Non-code targets are tried first, in a fixed order — page title,
    /// section label, example, group, file path, class, class minus
    /// template arguments, Objective-C protocol, namespace, directory —
    /// and only then code symbols via [`Resolver::resolve_ref`].
    pub fn resolve_link_target(
        &mut self,
        context_scope: &str,
        link_ref: &str,
    ) -> Option<LinkTarget> {
        if link_ref.is_empty() {
            return None;
        }
        let graph = self.graph;

        if let Some(pd) = graph.page(link_ref) {
            // a page filed under a group links to the group, anchored at
            // the page's own section
            if let Some(group) = graph.entity(pd).page_data().and_then(|p| p.group) {
                let anchor = graph
                    .section(&graph.entity(pd).name)
                    .map(|s| s.label.clone())
                    .unwrap_or_default();
                return Some(LinkTarget {
                    entity: group,
                    member: None,
                    anchor,
                });
            }
            return Some(link_to(pd, ""));
        }

        if let Some(section) = graph.section(link_ref) {
            return Some(LinkTarget {
                entity: section.entity,
                member: None,
                anchor: section.label.clone(),
            });
        }
        if let Some(example) = graph.example(link_ref) {
            return Some(link_to(example, ""));
        }
        if let Some(gd) = graph.group(link_ref) {
            return Some(link_to(gd, ""));
        }
        if let FileMatch::Unique(fd) =
            graph.find_file(link_ref, self.config.case_insensitive_files)
        {
            if graph.entity(fd).linkable {
                return Some(link_to(fd, ""));
            }
        }

        if let Some(cd) = self.get_class(link_ref) {
            return Some(class_link(self, cd));
        }
        let without_templates = self.strip_template_specifiers(link_ref, false).0;
        if without_templates != link_ref {
            if let Some(cd) = self.get_class(&without_templates) {
                return Some(class_link(self, cd));
            }
        }
        if let Some(cd) = self.get_class(&format!("{link_ref}-p")) {
            return Some(class_link(self, cd));
        }

        if let Some(nd) = graph.namespace_by_qualified(link_ref) {
            return Some(link_to(nd, ""));
        }
        let dir_path = if link_ref.ends_with('/') {
            link_ref.to_smolstr()
        } else {
            format!("{link_ref}/").to_smolstr()
        };
        if let Some(dir) = graph.directory(&dir_path) {
            if graph.entity(dir).linkable {
                return Some(link_to(dir, ""));
            }
        }

        // probably a member reference
        match self.resolve_ref(context_scope, link_ref, true, false) {
            Resolved::Member { member, container } => Some(LinkTarget {
                entity: container,
                member: Some(member),
                anchor: graph.entity(member).anchor.clone(),
            }),
            Resolved::Class(cd) => Some(class_link(self, cd)),
            Resolved::Namespace(nd) => Some(link_to(nd, "")),
            Resolved::File(fd) => Some(link_to(fd, "")),
            Resolved::Group(gd) => Some(link_to(gd, "")),
            Resolved::Page(pd) => Some(link_to(pd, "")),
            Resolved::NotFound => None,
        }
    }

    /// Display text for a link, with the separator of the target language.
    pub fn link_text(&self, lang: SrcLang, link: &str, is_file_name: bool) -> String {
        if link.is_empty() {
            return String::new();
        }
        let mut result = link.replace('#', "::");
        if !is_file_name && !result.contains('<') {
            result = result.replace('.', "::");
        }
        if let Some(stripped) = result.strip_prefix("::") {
            result = stripped.to_string();
        }
        let sep = lang.separator();
        if sep != "::" {
            result = result.replace("::", sep);
        }
        if self.config.hide_scope_names {
            if let Some(idx) = result.rfind(sep) {
                result = result[idx + sep.len()..].to_string();
            }
        }
        result
    }
}

/// The class that owns a member, if any.
fn member_class(resolver: &Resolver<'_>, member: EntityId) -> Option<EntityId> {
    let graph = resolver.graph;
    graph
        .entity(member)
        .outer
        .filter(|&o| graph.entity(o).is_class())
}

fn link_to(entity: EntityId, anchor: &str) -> LinkTarget {
    LinkTarget {
        entity,
        member: None,
        anchor: anchor.into(),
    }
}

fn class_link(resolver: &Resolver<'_>, cd: EntityId) -> LinkTarget {
    LinkTarget {
        entity: cd,
        member: None,
        anchor: resolver.graph.entity(cd).anchor.clone(),
    }
}

fn join_scopes(prefix: &str, suffix: &str) -> String {
    if !prefix.is_empty() && !suffix.is_empty() {
        format!("{prefix}::{suffix}")
    } else if !suffix.is_empty() {
        suffix.to_string()
    } else {
        prefix.to_string()
    }
}

/// Canonical types compare equal modulo spacing.
fn canonical_types_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let mut ai = a.chars().filter(|c| *c != ' ');
    let mut bi = b.chars().filter(|c| *c != ' ');
    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return true,
            (x, y) if x == y => {}
            _ => return false,
        }
    }
}

fn is_lower_case(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_lowercase() || !c.is_alphabetic())
}
